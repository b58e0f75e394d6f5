//! The SQLite store for canonical ledger records.
//!
//! The core consumes a deliberately small surface from this module: point
//! lookup by natural key, insert, update-by-id, and list/count with equality
//! filters on year and month. The natural keys carry UNIQUE indexes as a
//! backstop, so even a racing duplicate check cannot produce two rows with
//! the same key.

mod migrations;

use crate::model::{
    Amount, EntryDate, ExpenseKey, ExpenseRecord, RevenueKey, RevenueRecord, SalaryKey,
    SalaryRecord,
};
use crate::Result;
use anyhow::{bail, Context};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Creates a new SQLite file at `path` (errors if one exists) and brings
    /// the schema to the current version.
    pub async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at {}", path.display());
        }
        let pool = connect(path, true).await?;
        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Failed to create schema_version table")?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Failed to seed schema_version")?;
        migrations::run(&pool, 0, migrations::CURRENT_VERSION).await?;
        debug!("Initialized database at {}", path.display());
        Ok(Self { pool })
    }

    /// Opens an existing SQLite file and migrates the schema up if it is
    /// behind the version this build expects.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("No database found at {}", path.display());
        }
        let pool = connect(path, false).await?;
        let (version,): (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&pool)
            .await
            .context("Failed to read schema version")?;
        migrations::run(&pool, version, migrations::CURRENT_VERSION).await?;
        Ok(Self { pool })
    }

    // ---- revenue ----

    /// Point lookup by natural key: zero or one row.
    pub async fn find_revenue(&self, key: &RevenueKey) -> Result<Option<RevenueRecord>> {
        let row = sqlx::query("SELECT * FROM revenue WHERE date = ? AND month = ? AND year = ?")
            .bind(key.date.to_iso())
            .bind(key.month())
            .bind(key.year())
            .fetch_optional(&self.pool)
            .await
            .context("Revenue lookup failed")?;
        row.map(|r| revenue_from_row(&r)).transpose()
    }

    pub async fn insert_revenue(&self, record: &RevenueRecord) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO revenue (date, month, year, cash, card, card_net, doordash, ubereats, \
             grubhub, chownow, catering, other_cash, foodja, zelle, ezcater, relish, \
             waiter_service, doordash_fees, ubereats_fees, grubhub_fees, chownow_fees, \
             foodja_fees, ezcater_fees, relish_fees, waiter_fees, created_by) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.date.to_iso())
        .bind(record.date.month_abbr())
        .bind(record.date.year())
        .bind(record.cash.to_storage())
        .bind(record.card.to_storage())
        .bind(record.card_net.to_storage())
        .bind(record.doordash.to_storage())
        .bind(record.ubereats.to_storage())
        .bind(record.grubhub.to_storage())
        .bind(record.chownow.to_storage())
        .bind(record.catering.to_storage())
        .bind(record.other_cash.to_storage())
        .bind(record.foodja.to_storage())
        .bind(record.zelle.to_storage())
        .bind(record.ezcater.to_storage())
        .bind(record.relish.to_storage())
        .bind(record.waiter_service.to_storage())
        .bind(record.doordash_fees.to_storage())
        .bind(record.ubereats_fees.to_storage())
        .bind(record.grubhub_fees.to_storage())
        .bind(record.chownow_fees.to_storage())
        .bind(record.foodja_fees.to_storage())
        .bind(record.ezcater_fees.to_storage())
        .bind(record.relish_fees.to_storage())
        .bind(record.waiter_fees.to_storage())
        .bind(&record.created_by)
        .execute(&self.pool)
        .await
        .context("Revenue insert failed")?;
        Ok(result.last_insert_rowid())
    }

    /// Targeted correction of an existing row. Date, month and year are
    /// rewritten together so they cannot drift apart.
    pub async fn update_revenue(&self, record: &RevenueRecord) -> Result<()> {
        let Some(id) = record.id else {
            bail!("Cannot update a revenue record that has no id");
        };
        let result = sqlx::query(
            "UPDATE revenue SET date = ?, month = ?, year = ?, cash = ?, card = ?, card_net = ?, \
             doordash = ?, ubereats = ?, grubhub = ?, chownow = ?, catering = ?, other_cash = ?, \
             foodja = ?, zelle = ?, ezcater = ?, relish = ?, waiter_service = ?, \
             doordash_fees = ?, ubereats_fees = ?, grubhub_fees = ?, chownow_fees = ?, \
             foodja_fees = ?, ezcater_fees = ?, relish_fees = ?, waiter_fees = ?, created_by = ? \
             WHERE id = ?",
        )
        .bind(record.date.to_iso())
        .bind(record.date.month_abbr())
        .bind(record.date.year())
        .bind(record.cash.to_storage())
        .bind(record.card.to_storage())
        .bind(record.card_net.to_storage())
        .bind(record.doordash.to_storage())
        .bind(record.ubereats.to_storage())
        .bind(record.grubhub.to_storage())
        .bind(record.chownow.to_storage())
        .bind(record.catering.to_storage())
        .bind(record.other_cash.to_storage())
        .bind(record.foodja.to_storage())
        .bind(record.zelle.to_storage())
        .bind(record.ezcater.to_storage())
        .bind(record.relish.to_storage())
        .bind(record.waiter_service.to_storage())
        .bind(record.doordash_fees.to_storage())
        .bind(record.ubereats_fees.to_storage())
        .bind(record.grubhub_fees.to_storage())
        .bind(record.chownow_fees.to_storage())
        .bind(record.foodja_fees.to_storage())
        .bind(record.ezcater_fees.to_storage())
        .bind(record.relish_fees.to_storage())
        .bind(record.waiter_fees.to_storage())
        .bind(&record.created_by)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Revenue update failed")?;
        if result.rows_affected() == 0 {
            bail!("No revenue record with id {id}");
        }
        Ok(())
    }

    pub async fn list_revenue(
        &self,
        year: Option<i32>,
        month: Option<&str>,
    ) -> Result<Vec<RevenueRecord>> {
        let rows = filtered(&self.pool, "revenue", year, month, None).await?;
        rows.iter().map(revenue_from_row).collect()
    }

    // ---- expenses ----

    pub async fn find_expense(&self, key: &ExpenseKey) -> Result<Option<ExpenseRecord>> {
        let row = sqlx::query(
            "SELECT * FROM expenses WHERE date = ? AND month = ? AND year = ? \
             AND cost_type = ? AND amount = ?",
        )
        .bind(key.date.to_iso())
        .bind(key.month())
        .bind(key.year())
        .bind(&key.cost_type)
        .bind(key.amount.to_storage())
        .fetch_optional(&self.pool)
        .await
        .context("Expense lookup failed")?;
        row.map(|r| expense_from_row(&r)).transpose()
    }

    pub async fn insert_expense(&self, record: &ExpenseRecord) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO expenses (date, month, year, cost_type, sub_type, item, amount, \
             created_by) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.date.to_iso())
        .bind(record.date.month_abbr())
        .bind(record.date.year())
        .bind(&record.cost_type)
        .bind(record.sub_type.as_deref())
        .bind(record.item.as_deref())
        .bind(record.amount.to_storage())
        .bind(&record.created_by)
        .execute(&self.pool)
        .await
        .context("Expense insert failed")?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_expense(&self, record: &ExpenseRecord) -> Result<()> {
        let Some(id) = record.id else {
            bail!("Cannot update an expense record that has no id");
        };
        let result = sqlx::query(
            "UPDATE expenses SET date = ?, month = ?, year = ?, cost_type = ?, sub_type = ?, \
             item = ?, amount = ?, created_by = ? WHERE id = ?",
        )
        .bind(record.date.to_iso())
        .bind(record.date.month_abbr())
        .bind(record.date.year())
        .bind(&record.cost_type)
        .bind(record.sub_type.as_deref())
        .bind(record.item.as_deref())
        .bind(record.amount.to_storage())
        .bind(&record.created_by)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Expense update failed")?;
        if result.rows_affected() == 0 {
            bail!("No expense record with id {id}");
        }
        Ok(())
    }

    pub async fn list_expenses(
        &self,
        year: Option<i32>,
        month: Option<&str>,
        cost_type: Option<&str>,
    ) -> Result<Vec<ExpenseRecord>> {
        let rows = filtered(&self.pool, "expenses", year, month, cost_type).await?;
        rows.iter().map(expense_from_row).collect()
    }

    // ---- salaries ----

    pub async fn find_salary(&self, key: &SalaryKey) -> Result<Option<SalaryRecord>> {
        let row = sqlx::query(
            "SELECT * FROM salaries WHERE date = ? AND month = ? AND year = ? \
             AND employee = ? AND amount = ?",
        )
        .bind(key.date.to_iso())
        .bind(key.month())
        .bind(key.year())
        .bind(&key.employee)
        .bind(key.amount.to_storage())
        .fetch_optional(&self.pool)
        .await
        .context("Salary lookup failed")?;
        row.map(|r| salary_from_row(&r)).transpose()
    }

    pub async fn insert_salary(&self, record: &SalaryRecord) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO salaries (date, month, year, employee, amount, paid_date, created_by) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.date.to_iso())
        .bind(record.date.month_abbr())
        .bind(record.date.year())
        .bind(&record.employee)
        .bind(record.amount.to_storage())
        .bind(record.paid_date.map(|d| d.to_iso()))
        .bind(&record.created_by)
        .execute(&self.pool)
        .await
        .context("Salary insert failed")?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_salary(&self, record: &SalaryRecord) -> Result<()> {
        let Some(id) = record.id else {
            bail!("Cannot update a salary record that has no id");
        };
        let result = sqlx::query(
            "UPDATE salaries SET date = ?, month = ?, year = ?, employee = ?, amount = ?, \
             paid_date = ?, created_by = ? WHERE id = ?",
        )
        .bind(record.date.to_iso())
        .bind(record.date.month_abbr())
        .bind(record.date.year())
        .bind(&record.employee)
        .bind(record.amount.to_storage())
        .bind(record.paid_date.map(|d| d.to_iso()))
        .bind(&record.created_by)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Salary update failed")?;
        if result.rows_affected() == 0 {
            bail!("No salary record with id {id}");
        }
        Ok(())
    }

    pub async fn list_salaries(
        &self,
        year: Option<i32>,
        month: Option<&str>,
    ) -> Result<Vec<SalaryRecord>> {
        let rows = filtered(&self.pool, "salaries", year, month, None).await?;
        rows.iter().map(salary_from_row).collect()
    }

    /// Row count for one of the three tables, with optional equality filters.
    /// `cost_type` applies to the expenses table only.
    pub async fn count(
        &self,
        table: &'static str,
        year: Option<i32>,
        month: Option<&str>,
        cost_type: Option<&str>,
    ) -> Result<u64> {
        let mut sql = format!("SELECT COUNT(*) FROM {table} WHERE 1=1");
        if year.is_some() {
            sql.push_str(" AND year = ?");
        }
        if month.is_some() {
            sql.push_str(" AND month = ?");
        }
        if cost_type.is_some() {
            sql.push_str(" AND cost_type = ?");
        }
        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        if let Some(year) = year {
            query = query.bind(year);
        }
        if let Some(month) = month {
            query = query.bind(month);
        }
        if let Some(cost_type) = cost_type {
            query = query.bind(cost_type);
        }
        let (count,) = query
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Count on {table} failed"))?;
        Ok(count as u64)
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .with_context(|| format!("Bad SQLite path {}", path.display()))?
        .create_if_missing(create);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open SQLite database at {}", path.display()))
}

async fn filtered(
    pool: &SqlitePool,
    table: &'static str,
    year: Option<i32>,
    month: Option<&str>,
    cost_type: Option<&str>,
) -> Result<Vec<SqliteRow>> {
    let mut sql = format!("SELECT * FROM {table} WHERE 1=1");
    if year.is_some() {
        sql.push_str(" AND year = ?");
    }
    if month.is_some() {
        sql.push_str(" AND month = ?");
    }
    if cost_type.is_some() {
        sql.push_str(" AND cost_type = ?");
    }
    sql.push_str(" ORDER BY date, id");
    let mut query = sqlx::query(&sql);
    if let Some(year) = year {
        query = query.bind(year);
    }
    if let Some(month) = month {
        query = query.bind(month);
    }
    if let Some(cost_type) = cost_type {
        query = query.bind(cost_type);
    }
    query
        .fetch_all(pool)
        .await
        .with_context(|| format!("List on {table} failed"))
}

fn date_col(row: &SqliteRow, column: &str) -> Result<EntryDate> {
    let raw: String = row.try_get(column)?;
    raw.parse()
}

fn amount_col(row: &SqliteRow, column: &str) -> Result<Amount> {
    let raw: String = row.try_get(column)?;
    Ok(Amount::parse_lossy(&raw))
}

fn revenue_from_row(row: &SqliteRow) -> Result<RevenueRecord> {
    Ok(RevenueRecord {
        id: Some(row.try_get("id")?),
        date: date_col(row, "date")?,
        cash: amount_col(row, "cash")?,
        card: amount_col(row, "card")?,
        card_net: amount_col(row, "card_net")?,
        doordash: amount_col(row, "doordash")?,
        ubereats: amount_col(row, "ubereats")?,
        grubhub: amount_col(row, "grubhub")?,
        chownow: amount_col(row, "chownow")?,
        catering: amount_col(row, "catering")?,
        other_cash: amount_col(row, "other_cash")?,
        foodja: amount_col(row, "foodja")?,
        zelle: amount_col(row, "zelle")?,
        ezcater: amount_col(row, "ezcater")?,
        relish: amount_col(row, "relish")?,
        waiter_service: amount_col(row, "waiter_service")?,
        doordash_fees: amount_col(row, "doordash_fees")?,
        ubereats_fees: amount_col(row, "ubereats_fees")?,
        grubhub_fees: amount_col(row, "grubhub_fees")?,
        chownow_fees: amount_col(row, "chownow_fees")?,
        foodja_fees: amount_col(row, "foodja_fees")?,
        ezcater_fees: amount_col(row, "ezcater_fees")?,
        relish_fees: amount_col(row, "relish_fees")?,
        waiter_fees: amount_col(row, "waiter_fees")?,
        created_by: row.try_get("created_by")?,
    })
}

fn expense_from_row(row: &SqliteRow) -> Result<ExpenseRecord> {
    Ok(ExpenseRecord {
        id: Some(row.try_get("id")?),
        date: date_col(row, "date")?,
        cost_type: row.try_get("cost_type")?,
        sub_type: row.try_get("sub_type")?,
        item: row.try_get("item")?,
        amount: amount_col(row, "amount")?,
        created_by: row.try_get("created_by")?,
    })
}

fn salary_from_row(row: &SqliteRow) -> Result<SalaryRecord> {
    let paid_date: Option<String> = row.try_get("paid_date")?;
    Ok(SalaryRecord {
        id: Some(row.try_get("id")?),
        date: date_col(row, "date")?,
        employee: row.try_get("employee")?,
        amount: amount_col(row, "amount")?,
        paid_date: paid_date.and_then(|d| EntryDate::parse(&d)),
        created_by: row.try_get("created_by")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, EntryDate};
    use tempfile::TempDir;

    async fn test_store() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::init(temp_dir.path().join("mesa.sqlite"))
            .await
            .unwrap();
        (temp_dir, store)
    }

    fn expense(date: &str, cost_type: &str, amount: &str) -> ExpenseRecord {
        ExpenseRecord {
            date: EntryDate::parse(date).unwrap(),
            cost_type: cost_type.to_string(),
            amount: Amount::parse_lossy(amount),
            created_by: "test".to_string(),
            ..ExpenseRecord::default()
        }
    }

    #[tokio::test]
    async fn test_init_refuses_existing_file() {
        let (temp_dir, _store) = test_store().await;
        assert!(Store::init(temp_dir.path().join("mesa.sqlite"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_insert_and_point_lookup() {
        let (_temp_dir, store) = test_store().await;
        let record = expense("23-Nov-23", "Produce", "45.00");
        store.insert_expense(&record).await.unwrap();

        let found = store
            .find_expense(&record.natural_key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.cost_type, "Produce");
        assert_eq!(found.amount, record.amount);
        assert!(found.id.is_some());

        // A different amount is a different key.
        let other = expense("23-Nov-23", "Produce", "45.01");
        assert!(store
            .find_expense(&other.natural_key())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_month_year_written_from_date() {
        let (_temp_dir, store) = test_store().await;
        store
            .insert_expense(&expense("23-Nov-23", "Produce", "45.00"))
            .await
            .unwrap();
        assert_eq!(
            store
                .count("expenses", Some(2023), Some("Nov"), None)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .count("expenses", Some(2023), Some("Dec"), None)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_update_by_id() {
        let (_temp_dir, store) = test_store().await;
        let mut record = expense("23-Nov-23", "Produce", "45.00");
        let id = store.insert_expense(&record).await.unwrap();
        record.id = Some(id);
        record.amount = Amount::parse_lossy("50.00");
        store.update_expense(&record).await.unwrap();

        let listed = store.list_expenses(Some(2023), None, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].amount, Amount::parse_lossy("50.00"));
    }

    #[tokio::test]
    async fn test_update_without_id_is_an_error() {
        let (_temp_dir, store) = test_store().await;
        let record = expense("23-Nov-23", "Produce", "45.00");
        assert!(store.update_expense(&record).await.is_err());
    }

    #[tokio::test]
    async fn test_revenue_round_trip() {
        let (_temp_dir, store) = test_store().await;
        let record = RevenueRecord {
            date: EntryDate::parse("23-Nov-23").unwrap(),
            cash: Amount::parse_lossy("100"),
            card: Amount::parse_lossy("200"),
            card_net: Amount::parse_lossy("194"),
            doordash_fees: Amount::parse_lossy("7.50"),
            created_by: "test".to_string(),
            ..RevenueRecord::default()
        };
        store.insert_revenue(&record).await.unwrap();
        let found = store
            .find_revenue(&record.natural_key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.card_fee(), Amount::parse_lossy("6"));
        assert_eq!(found.doordash_fees, Amount::parse_lossy("7.50"));
    }

    #[tokio::test]
    async fn test_salary_round_trip_with_paid_date() {
        let (_temp_dir, store) = test_store().await;
        let record = SalaryRecord {
            date: EntryDate::parse("15-Nov-23").unwrap(),
            employee: "Ana".to_string(),
            amount: Amount::parse_lossy("900"),
            paid_date: EntryDate::parse("17-Nov-23"),
            created_by: "test".to_string(),
            ..SalaryRecord::default()
        };
        store.insert_salary(&record).await.unwrap();
        let found = store
            .find_salary(&record.natural_key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.paid_date.unwrap().to_iso(), "2023-11-17");
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (_temp_dir, store) = test_store().await;
        store
            .insert_expense(&expense("23-Nov-23", "Produce", "45.00"))
            .await
            .unwrap();
        store
            .insert_expense(&expense("5-Dec-23", "Rent", "2000"))
            .await
            .unwrap();
        store
            .insert_expense(&expense("5-Dec-22", "Rent", "1900"))
            .await
            .unwrap();

        assert_eq!(store.list_expenses(None, None, None).await.unwrap().len(), 3);
        assert_eq!(
            store.list_expenses(Some(2023), None, None).await.unwrap().len(),
            2
        );
        let dec_2023 = store
            .list_expenses(Some(2023), Some("Dec"), None)
            .await
            .unwrap();
        assert_eq!(dec_2023.len(), 1);
        assert_eq!(dec_2023[0].cost_type, "Rent");
    }

    #[tokio::test]
    async fn test_expense_cost_type_filter() {
        let (_temp_dir, store) = test_store().await;
        store
            .insert_expense(&expense("23-Nov-23", "Produce", "45.00"))
            .await
            .unwrap();
        store
            .insert_expense(&expense("24-Nov-23", "Produce", "30.00"))
            .await
            .unwrap();
        store
            .insert_expense(&expense("24-Nov-23", "Rent", "2000"))
            .await
            .unwrap();

        let produce = store
            .list_expenses(None, None, Some("Produce"))
            .await
            .unwrap();
        assert_eq!(produce.len(), 2);
        assert!(produce.iter().all(|e| e.cost_type == "Produce"));

        // Combines with the year/month filters.
        let scoped = store
            .list_expenses(Some(2023), Some("Nov"), Some("Rent"))
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(
            store.count("expenses", None, None, Some("Rent")).await.unwrap(),
            1
        );
        assert_eq!(
            store
                .count("expenses", None, None, Some("Utilities"))
                .await
                .unwrap(),
            0
        );
    }
}
