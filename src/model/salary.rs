//! The salary record: one payment to one employee for a pay period.

use crate::model::{Amount, EntryDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SalaryRecord {
    /// Store row id, `None` until persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// The nominal pay-period date.
    pub date: EntryDate,
    pub employee: String,
    pub amount: Amount,
    /// When the payment actually went out, if different from the pay period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<EntryDate>,
    pub created_by: String,
}

impl SalaryRecord {
    /// Multiple people can be paid on the same day, so the key includes the
    /// employee name and the amount.
    pub fn natural_key(&self) -> SalaryKey {
        SalaryKey {
            date: self.date,
            employee: self.employee.clone(),
            amount: self.amount,
        }
    }
}

/// Natural key for salaries: date + employee + amount (month/year derived
/// from the date).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SalaryKey {
    pub date: EntryDate,
    pub employee: String,
    pub amount: Amount,
}

impl SalaryKey {
    pub fn month(&self) -> String {
        self.date.month_abbr()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}
