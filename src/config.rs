//! Configuration file handling.
//!
//! The configuration file is stored at `$MESA_HOME/config.json` and holds
//! the settings the program needs beyond its home directory: where the
//! spreadsheet exports land and the config format version.

use crate::{utils, Result, Store};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "mesa";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const MESA_SQLITE: &str = "mesa.sqlite";
const DEFAULT_SOURCE_DIR: &str = "exports";

/// Represents the program's home directory. Instantiate it with the path to
/// `$MESA_HOME`; from there it loads `$MESA_HOME/config.json` and provides
/// the paths to everything the home directory contains.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the home directory and:
    /// - writes an initial `config.json`
    /// - creates the source-export directory (unless a custom one was given)
    /// - initializes the SQLite store
    pub async fn create(dir: impl Into<PathBuf>, source_dir: Option<&Path>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the mesa home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            source_dir: source_dir
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIR)),
        };
        if source_dir.is_none() {
            utils::make_dir(root.join(DEFAULT_SOURCE_DIR)).await?;
        }
        let config_path = root.join(CONFIG_JSON);
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(MESA_SQLITE);
        let _ = Store::init(&sqlite_path)
            .await
            .context("Unable to create the SQLite store")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            sqlite_path,
        })
    }

    /// Validates that the home directory and config file exist, then loads
    /// the configuration.
    pub async fn load(mesa_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = mesa_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Mesa home is missing, run 'mesa init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display());
        }
        let config_file = ConfigFile::load(&config_path).await?;
        if config_file.app_name != APP_NAME {
            bail!(
                "'{}' does not look like a mesa config file",
                config_path.display()
            );
        }

        let sqlite_path = root.join(MESA_SQLITE);
        Ok(Self {
            root,
            config_path,
            config_file,
            sqlite_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    /// The directory the spreadsheet exports are read from. A relative value
    /// in the config file resolves against the home directory.
    pub fn source_dir(&self) -> PathBuf {
        if self.config_file.source_dir.is_absolute() {
            self.config_file.source_dir.clone()
        } else {
            self.root.join(&self.config_file.source_dir)
        }
    }
}

/// The serialization format of the configuration file.
///
/// Example:
/// ```json
/// {
///   "app_name": "mesa",
///   "config_version": 1,
///   "source_dir": "exports"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "mesa".
    app_name: String,

    /// Configuration file version.
    config_version: u8,

    /// Directory containing the table exports, absolute or relative to the
    /// home directory.
    source_dir: PathBuf,
}

impl ConfigFile {
    async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, json).await
    }

    async fn load(path: &Path) -> Result<Self> {
        utils::deserialize(path).await
    }
}
