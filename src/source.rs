//! Source-row access for the three logical spreadsheet tables.
//!
//! A source row is a map from column header to cell text, exactly as the
//! export wrote it: header synonyms, stray whitespace and blank cells are
//! all preserved here and tolerated downstream by the mapper.

use crate::Result;
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// One raw row: column header -> cell text.
pub type SourceRow = BTreeMap<String, String>;

/// The three logical tables a sync pass reads.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTable {
    NetSale,
    Expenses,
    Salaries,
}

serde_plain::derive_display_from_serialize!(SourceTable);
serde_plain::derive_fromstr_from_deserialize!(SourceTable);

impl SourceTable {
    /// The table's name as the spreadsheet labels it.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            SourceTable::NetSale => "Net Sale",
            SourceTable::Expenses => "Expenses",
            SourceTable::Salaries => "Salaries",
        }
    }

    /// Default file name of the table's export in the source directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            SourceTable::NetSale => "net_sale.csv",
            SourceTable::Expenses => "expenses.csv",
            SourceTable::Salaries => "salaries.csv",
        }
    }
}

/// Where a sync pass gets its raw rows. Implemented by [`CsvSource`] for the
/// real export directory and by [`MemorySource`] for tests.
#[async_trait]
pub trait Source: Send + Sync {
    /// Fetches every row of one table. A failure here aborts processing for
    /// that table only; the orchestrator continues with the other tables.
    async fn rows(&self, table: SourceTable) -> Result<Vec<SourceRow>>;
}

/// Reads table exports as CSV files from a directory.
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Source for CsvSource {
    async fn rows(&self, table: SourceTable) -> Result<Vec<SourceRow>> {
        let path = self.dir.join(table.file_name());
        let contents = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Unable to read {} export at {}", table, path.display()))?;

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(contents.as_slice());
        let headers = reader
            .headers()
            .with_context(|| format!("Unable to read headers from {}", path.display()))?
            .clone();

        let mut rows = Vec::new();
        for (ix, record) in reader.records().enumerate() {
            let record =
                record.with_context(|| format!("Bad CSV row {} in {}", ix + 2, path.display()))?;
            let mut row = SourceRow::new();
            for (header, value) in headers.iter().zip(record.iter()) {
                row.insert(header.to_string(), value.to_string());
            }
            rows.push(row);
        }
        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }
}

/// In-memory source for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: BTreeMap<SourceTable, Vec<SourceRow>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table from a header row plus data rows.
    pub fn with_table<S: Into<String>>(
        mut self,
        table: SourceTable,
        headers: Vec<S>,
        data: Vec<Vec<S>>,
    ) -> Self {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let rows = data
            .into_iter()
            .map(|cells| {
                headers
                    .iter()
                    .cloned()
                    .zip(cells.into_iter().map(Into::into))
                    .collect()
            })
            .collect();
        self.tables.insert(table, rows);
        self
    }
}

#[async_trait]
impl Source for MemorySource {
    async fn rows(&self, table: SourceTable) -> Result<Vec<SourceRow>> {
        Ok(self.tables.get(&table).cloned().unwrap_or_default())
    }
}
