//! The reconciliation pass: fetch source rows, normalize and map them,
//! check each candidate against the store by natural key, and insert the
//! new ones.
//!
//! A run is sequential and makes one pass over each of the three tables.
//! A failing row never aborts the run: it is counted, its reason recorded,
//! and processing continues with the next row. A failed source fetch aborts
//! that table only. Running the same pass twice on unchanged data leaves the
//! store unchanged (the second run skips every row as a duplicate).

use crate::dedupe::{decide_expense, decide_revenue, decide_salary, Decision};
use crate::mapper::{map_expense, map_revenue, map_salary};
use crate::source::{Source, SourceTable};
use crate::{Result, Store};
use anyhow::anyhow;
use serde::Serialize;
use std::fmt;
use std::fmt::{Display, Formatter};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Per-table outcome counters for one run. Immutable once the run returns;
/// nothing here is shared between runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KindSummary {
    /// Rows fetched from the source.
    pub seen: usize,
    /// Rows written as new records.
    pub inserted: usize,
    /// Rows skipped because the natural key already exists. Normal outcome,
    /// not an error.
    pub skipped: usize,
    /// Rows the mapper rejected (bad date, missing required field).
    pub rejected: usize,
    /// Rows that failed at the store (lookup or insert).
    pub errored: usize,
    /// One entry per rejected or errored row, for manual follow-up.
    pub reasons: Vec<String>,
    /// Set when the source fetch for this table failed; no rows were
    /// processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
}

impl KindSummary {
    fn note(&mut self, row: usize, reason: impl Display) {
        // Row numbers match the spreadsheet: 1-based plus the header row.
        self.reasons.push(format!("row {}: {}", row + 2, reason));
    }
}

impl Display for KindSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.source_error {
            return write!(f, "source unavailable ({error})");
        }
        write!(
            f,
            "{} seen, {} inserted, {} skipped, {} rejected, {} errored",
            self.seen, self.inserted, self.skipped, self.rejected, self.errored
        )
    }
}

/// The outcome of one full reconciliation pass across all three tables.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub revenue: KindSummary,
    pub expenses: KindSummary,
    pub salaries: KindSummary,
}

impl RunSummary {
    pub fn total_seen(&self) -> usize {
        self.revenue.seen + self.expenses.seen + self.salaries.seen
    }

    pub fn total_inserted(&self) -> usize {
        self.revenue.inserted + self.expenses.inserted + self.salaries.inserted
    }

    /// Share of seen rows that ended as inserted or skipped-as-duplicate.
    /// 100 when there was nothing to do.
    pub fn success_percent(&self) -> f64 {
        let seen = self.total_seen();
        if seen == 0 {
            return 100.0;
        }
        let ok = self.total_inserted()
            + self.revenue.skipped
            + self.expenses.skipped
            + self.salaries.skipped;
        (ok as f64 / seen as f64) * 100.0
    }
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sync complete ({:.0}% ok). Net Sale: {}. Expenses: {}. Salaries: {}.",
            self.success_percent(),
            self.revenue,
            self.expenses,
            self.salaries
        )
    }
}

/// Drives reconciliation passes against one store.
///
/// Two passes must not run concurrently against the same store: the
/// read-then-write duplicate check is not atomic across rows. `run` takes an
/// internal lock and refuses (rather than queues) a second caller.
pub struct Syncer {
    store: Store,
    running: Mutex<()>,
}

impl Syncer {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            running: Mutex::new(()),
        }
    }

    /// Executes one full pass and returns its summary. Always produces a
    /// summary when it runs at all, even if every row failed.
    pub async fn run(&self, source: &dyn Source) -> Result<RunSummary> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| anyhow!("A sync run is already in progress"))?;

        info!("Starting sync run");
        let summary = RunSummary {
            revenue: self.sync_revenue(source).await,
            expenses: self.sync_expenses(source).await,
            salaries: self.sync_salaries(source).await,
        };
        info!("{summary}");
        Ok(summary)
    }

    async fn sync_revenue(&self, source: &dyn Source) -> KindSummary {
        let mut summary = KindSummary::default();
        let rows = match source.rows(SourceTable::NetSale).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Net Sale fetch failed, skipping the table: {e:#}");
                summary.source_error = Some(format!("{e:#}"));
                return summary;
            }
        };
        summary.seen = rows.len();

        for (ix, row) in rows.iter().enumerate() {
            let record = match map_revenue(row) {
                Ok(record) => record,
                Err(rejection) => {
                    summary.rejected += 1;
                    summary.note(ix, rejection);
                    continue;
                }
            };
            match decide_revenue(&self.store, &record).await {
                Ok(Decision::SkipExisting) => summary.skipped += 1,
                Ok(Decision::Insert) => match self.store.insert_revenue(&record).await {
                    Ok(_) => summary.inserted += 1,
                    Err(e) => {
                        summary.errored += 1;
                        summary.note(ix, format!("{e:#}"));
                    }
                },
                Err(e) => {
                    summary.errored += 1;
                    summary.note(ix, format!("{e:#}"));
                }
            }
        }
        summary
    }

    async fn sync_expenses(&self, source: &dyn Source) -> KindSummary {
        let mut summary = KindSummary::default();
        let rows = match source.rows(SourceTable::Expenses).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Expenses fetch failed, skipping the table: {e:#}");
                summary.source_error = Some(format!("{e:#}"));
                return summary;
            }
        };
        summary.seen = rows.len();

        for (ix, row) in rows.iter().enumerate() {
            let record = match map_expense(row) {
                Ok(record) => record,
                Err(rejection) => {
                    summary.rejected += 1;
                    summary.note(ix, rejection);
                    continue;
                }
            };
            match decide_expense(&self.store, &record).await {
                Ok(Decision::SkipExisting) => summary.skipped += 1,
                Ok(Decision::Insert) => match self.store.insert_expense(&record).await {
                    Ok(_) => summary.inserted += 1,
                    Err(e) => {
                        summary.errored += 1;
                        summary.note(ix, format!("{e:#}"));
                    }
                },
                Err(e) => {
                    summary.errored += 1;
                    summary.note(ix, format!("{e:#}"));
                }
            }
        }
        summary
    }

    async fn sync_salaries(&self, source: &dyn Source) -> KindSummary {
        let mut summary = KindSummary::default();
        let rows = match source.rows(SourceTable::Salaries).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Salaries fetch failed, skipping the table: {e:#}");
                summary.source_error = Some(format!("{e:#}"));
                return summary;
            }
        };
        summary.seen = rows.len();

        for (ix, row) in rows.iter().enumerate() {
            let record = match map_salary(row) {
                Ok(record) => record,
                Err(rejection) => {
                    summary.rejected += 1;
                    summary.note(ix, rejection);
                    continue;
                }
            };
            match decide_salary(&self.store, &record).await {
                Ok(Decision::SkipExisting) => summary.skipped += 1,
                Ok(Decision::Insert) => match self.store.insert_salary(&record).await {
                    Ok(_) => summary.inserted += 1,
                    Err(e) => {
                        summary.errored += 1;
                        summary.note(ix, format!("{e:#}"));
                    }
                },
                Err(e) => {
                    summary.errored += 1;
                    summary.note(ix, format!("{e:#}"));
                }
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::test::TestEnv;

    fn full_source() -> MemorySource {
        MemorySource::new()
            .with_table(
                SourceTable::NetSale,
                vec!["Date", "Cash", "Card", "Card2", "DoorDash", "DoorDash Fees"],
                vec![
                    vec!["23-Nov-23", "150.00", "100", "97", "80", "12"],
                    vec!["24-Nov-23", "$1,200.50", "", "", "", ""],
                ],
            )
            .with_table(
                SourceTable::Expenses,
                vec!["Date", "Cost Type", "Amount"],
                vec![
                    vec!["23-Nov-23", "Produce", "45.00"],
                    vec!["23-Nov-23", "Rent", "2000"],
                ],
            )
            .with_table(
                SourceTable::Salaries,
                vec!["Pay Period", "Name", "Amount"],
                vec![vec!["15-Nov-23", "Ana", "900"]],
            )
    }

    #[tokio::test]
    async fn test_full_run_inserts_everything() {
        let env = TestEnv::new().await;
        let syncer = Syncer::new(env.store());

        let summary = syncer.run(&full_source()).await.unwrap();
        assert_eq!(summary.revenue.inserted, 2);
        assert_eq!(summary.expenses.inserted, 2);
        assert_eq!(summary.salaries.inserted, 1);
        assert_eq!(summary.success_percent(), 100.0);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let env = TestEnv::new().await;
        let syncer = Syncer::new(env.store());
        let source = full_source();

        syncer.run(&source).await.unwrap();
        let second = syncer.run(&source).await.unwrap();

        assert_eq!(second.total_inserted(), 0);
        assert_eq!(second.revenue.skipped, 2);
        assert_eq!(second.expenses.skipped, 2);
        assert_eq!(second.salaries.skipped, 1);
        let store = env.store();
        assert_eq!(store.count("revenue", None, None, None).await.unwrap(), 2);
        assert_eq!(store.count("expenses", None, None, None).await.unwrap(), 2);
        assert_eq!(store.count("salaries", None, None, None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bad_rows_counted_not_fatal() {
        let env = TestEnv::new().await;
        let syncer = Syncer::new(env.store());
        let source = MemorySource::new()
            .with_table(
                SourceTable::Expenses,
                vec!["Date", "Cost Type", "Amount"],
                vec![
                    vec!["not a date", "Produce", "45.00"],
                    vec!["24-Nov-23", "Meat", "80.00"],
                ],
            )
            .with_table(
                SourceTable::Salaries,
                vec!["Pay Period", "Name", "Amount"],
                vec![vec!["15-Nov-23", "", "900"]],
            );

        let summary = syncer.run(&source).await.unwrap();
        assert_eq!(summary.expenses.seen, 2);
        assert_eq!(summary.expenses.rejected, 1);
        assert_eq!(summary.expenses.inserted, 1);
        assert!(summary.expenses.reasons[0].contains("invalid date"));
        assert_eq!(summary.salaries.rejected, 1);
        assert!(summary.salaries.reasons[0].contains("employee name"));
    }

    #[tokio::test]
    async fn test_empty_source_still_summarizes() {
        let env = TestEnv::new().await;
        let syncer = Syncer::new(env.store());
        let summary = syncer.run(&MemorySource::new()).await.unwrap();
        assert_eq!(summary.total_seen(), 0);
        assert_eq!(summary.success_percent(), 100.0);
        // The summary renders even when nothing happened.
        assert!(summary.to_string().contains("0 inserted"));
    }

    #[tokio::test]
    async fn test_lock_released_between_runs() {
        let env = TestEnv::new().await;
        let syncer = Syncer::new(env.store());
        syncer.run(&full_source()).await.unwrap();
        // The single-flight guard from the first run does not leak.
        assert!(syncer.run(&full_source()).await.is_ok());
    }
}
