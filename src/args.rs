//! These structs provide the CLI interface for the mesa CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// mesa: reconciles a restaurant's spreadsheet exports into a local ledger.
///
/// Daily revenue, expense and salary rows exported from the bookkeeping
/// spreadsheet are synced into a SQLite database without creating duplicates
/// across repeated runs, and the derived financial figures (card fees,
/// commission totals, net profit) are computed from the records at rest.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, configuration file and SQLite database.
    ///
    /// Run this once before anything else. Decide where data should live and
    /// pass it as --mesa-home (default: ~/mesa). If your spreadsheet exports
    /// land somewhere other than $MESA_HOME/exports, pass --source-dir.
    Init(InitArgs),
    /// Run one reconciliation pass over the Net Sale, Expenses and Salaries
    /// exports and print the per-table outcome summary.
    Sync(SyncArgs),
    /// Aggregate the stored records into the derived financial summary.
    Report(ReportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where mesa data and configuration is held.
    #[arg(long, env = "MESA_HOME", default_value_t = default_mesa_home())]
    mesa_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, mesa_home: PathBuf) -> Self {
        Self {
            log_level,
            mesa_home: mesa_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn mesa_home(&self) -> &DisplayPath {
        &self.mesa_home
    }
}

#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Directory containing the table exports (net_sale.csv, expenses.csv,
    /// salaries.csv). Defaults to $MESA_HOME/exports, which init creates.
    #[arg(long)]
    source_dir: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(source_dir: Option<PathBuf>) -> Self {
        Self { source_dir }
    }

    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }
}

#[derive(Debug, Parser, Clone)]
pub struct SyncArgs {
    /// Read exports from this directory instead of the configured one.
    #[arg(long)]
    source_dir: Option<PathBuf>,
}

impl SyncArgs {
    pub fn new(source_dir: Option<PathBuf>) -> Self {
        Self { source_dir }
    }

    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// Limit the report to one year, e.g. 2023.
    #[arg(long)]
    year: Option<i32>,

    /// Limit the report to one month by three-letter abbreviation, e.g. Nov.
    #[arg(long)]
    month: Option<String>,
}

impl ReportArgs {
    pub fn new(year: Option<i32>, month: Option<String>) -> Self {
        Self { year, month }
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }
}

fn default_mesa_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("mesa"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --mesa-home or MESA_HOME instead of relying on the default \
                mesa home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("mesa")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
