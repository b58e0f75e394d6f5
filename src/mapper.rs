//! Maps one raw source row into a canonical record.
//!
//! Column headers are matched against an ordered synonym list per canonical
//! field (different sheets, and different years of the same sheet, label the
//! same column differently); the first non-blank match wins. Numeric cells go
//! through the lossy amount parser, date cells through the date cascade. A
//! row that cannot produce a valid record is rejected with a specific reason
//! that the sync summary reports, never silently dropped.

use crate::model::{Amount, EntryDate, ExpenseRecord, RevenueRecord, SalaryRecord};
use crate::source::SourceRow;
use serde::Serialize;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Records created by a sync pass carry this creator reference.
const SYNC_CREATOR: &str = "sync";

/// Why a source row could not be mapped to a canonical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The date cell is blank or matches no supported format.
    InvalidDate,
    /// A required field is blank. Carries the canonical field name.
    MissingField(&'static str),
    /// The amount cell is blank where a value is required.
    InvalidAmount,
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::InvalidDate => write!(f, "invalid date"),
            Rejection::MissingField(name) => write!(f, "missing required field '{name}'"),
            Rejection::InvalidAmount => write!(f, "invalid amount"),
        }
    }
}

const DATE: &[&str] = &["Date", "DATE", "Date "];
const PAY_PERIOD: &[&str] = &["Pay Period", "Pay period", "Date", "DATE", "Date "];
const PAID_DATE: &[&str] = &["Paid Date", "Actual Paid Date", "Paid date"];

const CASH: &[&str] = &["Cash", "CASH"];
const CARD: &[&str] = &["Card", "Credit Card", "CARD"];
const CARD_NET: &[&str] = &["Card2", "Card Net", "Card net", "Card 2"];
const DOORDASH: &[&str] = &["DoorDash", "Doordash", "Door Dash"];
const UBEREATS: &[&str] = &["UberEats", "Uber Eats", "Ubereats"];
const GRUBHUB: &[&str] = &["GrubHub", "Grubhub"];
const CHOWNOW: &[&str] = &["ChowNow", "Chownow"];
const CATERING: &[&str] = &["Catering", "CATERING"];
const OTHER_CASH: &[&str] = &["Other Cash", "Other cash", "OtherCash"];
const FOODJA: &[&str] = &["Foodja", "FOODJA"];
const ZELLE: &[&str] = &["Zelle", "ZELLE"];
const EZCATER: &[&str] = &["EZCater", "EzCater", "Ezcater"];
const RELISH: &[&str] = &["Relish", "RELISH"];
const WAITER: &[&str] = &["Waiter.com", "Waiter", "Waiter Service"];
const DOORDASH_FEES: &[&str] = &["DoorDash Fees", "Doordash Fees", "Doordash fees"];
const UBEREATS_FEES: &[&str] = &["UberEats Fees", "Uber Eats Fees", "Ubereats fees"];
const GRUBHUB_FEES: &[&str] = &["GrubHub Fees", "Grubhub Fees", "Grubhub fees"];
const CHOWNOW_FEES: &[&str] = &["ChowNow Fees", "Chownow Fees", "Chownow fees"];
const FOODJA_FEES: &[&str] = &["Foodja Fees", "Foodja fees"];
const EZCATER_FEES: &[&str] = &["EZCater Fees", "EzCater Fees", "Ezcater fees"];
const RELISH_FEES: &[&str] = &["Relish Fees", "Relish fees"];
const WAITER_FEES: &[&str] = &["Waiter.com Fees", "Waiter Fees", "Waiter fees"];

const COST_TYPE: &[&str] = &["Cost Type", "Cost type", "Category"];
const SUB_TYPE: &[&str] = &["Sub Type", "Sub type", "Subtype"];
const ITEM: &[&str] = &["Item", "Vendor", "Vendor/Item"];
const EXPENSE_AMOUNT: &[&str] = &["Amount", "Cost", "AMOUNT"];

const EMPLOYEE: &[&str] = &["Name", "Employee", "Employee Name"];
const SALARY_AMOUNT: &[&str] = &["Amount", "Salary", "AMOUNT"];

/// First non-blank cell among the synonym headers, if any.
fn cell<'a>(row: &'a SourceRow, synonyms: &[&str]) -> Option<&'a str> {
    synonyms.iter().find_map(|header| {
        row.get(*header)
            .map(String::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    })
}

/// Amount cell under the missing-means-zero policy.
fn amount(row: &SourceRow, synonyms: &[&str]) -> Amount {
    cell(row, synonyms).map(Amount::parse_lossy).unwrap_or_default()
}

/// Date cell; blank or unparseable is a rejection, not a default.
fn date(row: &SourceRow, synonyms: &[&str]) -> Result<EntryDate, Rejection> {
    cell(row, synonyms)
        .and_then(EntryDate::parse)
        .ok_or(Rejection::InvalidDate)
}

pub fn map_revenue(row: &SourceRow) -> Result<RevenueRecord, Rejection> {
    Ok(RevenueRecord {
        id: None,
        date: date(row, DATE)?,
        cash: amount(row, CASH),
        card: amount(row, CARD),
        card_net: amount(row, CARD_NET),
        doordash: amount(row, DOORDASH),
        ubereats: amount(row, UBEREATS),
        grubhub: amount(row, GRUBHUB),
        chownow: amount(row, CHOWNOW),
        catering: amount(row, CATERING),
        other_cash: amount(row, OTHER_CASH),
        foodja: amount(row, FOODJA),
        zelle: amount(row, ZELLE),
        ezcater: amount(row, EZCATER),
        relish: amount(row, RELISH),
        waiter_service: amount(row, WAITER),
        doordash_fees: amount(row, DOORDASH_FEES),
        ubereats_fees: amount(row, UBEREATS_FEES),
        grubhub_fees: amount(row, GRUBHUB_FEES),
        chownow_fees: amount(row, CHOWNOW_FEES),
        foodja_fees: amount(row, FOODJA_FEES),
        ezcater_fees: amount(row, EZCATER_FEES),
        relish_fees: amount(row, RELISH_FEES),
        waiter_fees: amount(row, WAITER_FEES),
        created_by: SYNC_CREATOR.to_string(),
    })
}

pub fn map_expense(row: &SourceRow) -> Result<ExpenseRecord, Rejection> {
    Ok(ExpenseRecord {
        id: None,
        date: date(row, DATE)?,
        cost_type: cell(row, COST_TYPE).unwrap_or_default().to_string(),
        sub_type: cell(row, SUB_TYPE).map(String::from),
        item: cell(row, ITEM).map(String::from),
        amount: amount(row, EXPENSE_AMOUNT),
        created_by: SYNC_CREATOR.to_string(),
    })
}

/// Salary rows are stricter than the other kinds: a payment with no
/// employee, no date, or no amount is not a record at all.
pub fn map_salary(row: &SourceRow) -> Result<SalaryRecord, Rejection> {
    let employee = cell(row, EMPLOYEE)
        .ok_or(Rejection::MissingField("employee name"))?
        .to_string();
    let date = date(row, PAY_PERIOD)?;
    let amount = cell(row, SALARY_AMOUNT)
        .map(Amount::parse_lossy)
        .ok_or(Rejection::InvalidAmount)?;
    Ok(SalaryRecord {
        id: None,
        date,
        employee,
        amount,
        paid_date: cell(row, PAID_DATE).and_then(EntryDate::parse),
        created_by: SYNC_CREATOR.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> SourceRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_revenue_with_card_synonyms() {
        let r = map_revenue(&row(&[
            ("Date", "23-Nov-23"),
            ("Card", "100"),
            ("Card2", "97"),
        ]))
        .unwrap();
        assert_eq!(r.card, Amount::parse_lossy("100"));
        assert_eq!(r.card_net, Amount::parse_lossy("97"));
        assert_eq!(r.card_fee(), Amount::parse_lossy("3"));
    }

    #[test]
    fn test_revenue_blank_channels_are_zero() {
        let r = map_revenue(&row(&[("Date", "6/30/2025"), ("Cash", "250.00")])).unwrap();
        assert_eq!(r.cash, Amount::parse_lossy("250"));
        assert_eq!(r.doordash, Amount::ZERO);
        assert_eq!(r.gross(), Amount::parse_lossy("250"));
    }

    #[test]
    fn test_revenue_bad_date_rejected() {
        let err = map_revenue(&row(&[("Date", "soon"), ("Cash", "1")])).unwrap_err();
        assert_eq!(err, Rejection::InvalidDate);
        assert_eq!(err.to_string(), "invalid date");
    }

    #[test]
    fn test_expense_header_case_synonyms() {
        let r = map_expense(&row(&[
            ("Date ", "2023-11-23"),
            ("Cost type", "Produce"),
            ("Amount", "$45.00"),
        ]))
        .unwrap();
        assert_eq!(r.cost_type, "Produce");
        assert_eq!(r.amount, Amount::parse_lossy("45"));
        assert_eq!(r.date.month_abbr(), "Nov");
    }

    #[test]
    fn test_salary_uses_pay_period_before_date() {
        let r = map_salary(&row(&[
            ("Pay Period", "15-Nov-23"),
            ("Date", "1-Jan-20"),
            ("Name", "Ana"),
            ("Amount", "900"),
        ]))
        .unwrap();
        assert_eq!(r.date.to_iso(), "2023-11-15");
    }

    #[test]
    fn test_salary_missing_name_rejected() {
        let err = map_salary(&row(&[("Pay Period", "15-Nov-23"), ("Amount", "900")])).unwrap_err();
        assert_eq!(err, Rejection::MissingField("employee name"));
    }

    #[test]
    fn test_salary_blank_amount_rejected() {
        let err = map_salary(&row(&[
            ("Pay Period", "15-Nov-23"),
            ("Name", "Ana"),
            ("Amount", "  "),
        ]))
        .unwrap_err();
        assert_eq!(err, Rejection::InvalidAmount);
    }

    #[test]
    fn test_salary_optional_paid_date() {
        let r = map_salary(&row(&[
            ("Pay Period", "15-Nov-23"),
            ("Paid Date", "17-Nov-23"),
            ("Name", "Ana"),
            ("Amount", "900"),
        ]))
        .unwrap();
        assert_eq!(r.paid_date.unwrap().to_iso(), "2023-11-17");
    }
}
