//! The expense record: one cost line item, categorized by free-text cost
//! type with an optional sub-type and vendor/item label.

use crate::model::{Amount, EntryDate};
use serde::{Deserialize, Serialize};

/// Cost-type/sub-type values that identify a credit-card-processing line.
/// Matching rows are excluded from cost totals because the card fee is
/// already derived from the revenue rows; counting both would double it.
const CARD_PROCESSING_MARKERS: &[&str] = &["credit card", "card processing", "cc fee"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExpenseRecord {
    /// Store row id, `None` until persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub date: EntryDate,
    pub cost_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    pub amount: Amount,
    pub created_by: String,
}

impl ExpenseRecord {
    /// True when this row records the card processor's fee as an expense
    /// line. See [`CARD_PROCESSING_MARKERS`].
    pub fn is_card_processing(&self) -> bool {
        let matches = |s: &str| {
            let lower = s.to_lowercase();
            CARD_PROCESSING_MARKERS.iter().any(|m| lower.contains(m))
        };
        matches(&self.cost_type) || self.sub_type.as_deref().is_some_and(matches)
    }

    /// Expense rows can repeat on the same day for different categories, so
    /// the key includes the cost type and the amount.
    ///
    /// Known limitation: two genuinely distinct expenses with the same
    /// date, cost type, and coincidentally equal amount collapse into one
    /// row. The deduplicator logs every skip with the full key so such
    /// collisions stay auditable.
    pub fn natural_key(&self) -> ExpenseKey {
        ExpenseKey {
            date: self.date,
            cost_type: self.cost_type.clone(),
            amount: self.amount,
        }
    }
}

/// Natural key for expenses: date + cost type + amount (month/year derived
/// from the date).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpenseKey {
    pub date: EntryDate,
    pub cost_type: String,
    pub amount: Amount,
}

impl ExpenseKey {
    pub fn month(&self) -> String {
        self.date.month_abbr()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}
