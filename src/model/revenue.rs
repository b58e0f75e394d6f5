//! The daily revenue record: one row per calendar day, one currency field per
//! payment or delivery channel, plus a parallel fee field per platform.

use crate::model::{Amount, EntryDate};
use serde::{Deserialize, Serialize};

/// A single day's revenue across every channel the restaurant takes money
/// through.
///
/// `card` is the gross card total and `card_net` is the amount the processor
/// actually deposited; the processing fee is derived from their difference,
/// never stored. The `*_fees` fields are the platform commissions as reported
/// by each platform, stored directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RevenueRecord {
    /// Store row id, `None` until persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub date: EntryDate,
    pub cash: Amount,
    pub card: Amount,
    pub card_net: Amount,
    pub doordash: Amount,
    pub ubereats: Amount,
    pub grubhub: Amount,
    pub chownow: Amount,
    pub catering: Amount,
    pub other_cash: Amount,
    pub foodja: Amount,
    pub zelle: Amount,
    pub ezcater: Amount,
    pub relish: Amount,
    pub waiter_service: Amount,
    pub doordash_fees: Amount,
    pub ubereats_fees: Amount,
    pub grubhub_fees: Amount,
    pub chownow_fees: Amount,
    pub foodja_fees: Amount,
    pub ezcater_fees: Amount,
    pub relish_fees: Amount,
    pub waiter_fees: Amount,
    pub created_by: String,
}

impl RevenueRecord {
    /// Sum of the channel-level gross fields. Excludes `card_net` and every
    /// `*_fees` field: those are deductions, not revenue.
    pub fn gross(&self) -> Amount {
        self.cash
            + self.card
            + self.doordash
            + self.ubereats
            + self.grubhub
            + self.chownow
            + self.catering
            + self.other_cash
            + self.foodja
            + self.zelle
            + self.ezcater
            + self.relish
            + self.waiter_service
    }

    /// Card-processing fee: gross card total minus the processor deposit,
    /// clamped to zero when the deposit exceeds the gross (which shows up in
    /// source data when a chargeback reversal lands on the wrong day). The
    /// clamp is the single policy for this figure; no caller re-derives it.
    pub fn card_fee(&self) -> Amount {
        (self.card - self.card_net).clamp_zero()
    }

    /// Total platform commission for the day: the six platforms that report
    /// a dedicated fee column.
    pub fn commission_fees(&self) -> Amount {
        self.doordash_fees
            + self.ubereats_fees
            + self.grubhub_fees
            + self.foodja_fees
            + self.ezcater_fees
            + self.relish_fees
    }

    pub fn natural_key(&self) -> RevenueKey {
        RevenueKey { date: self.date }
    }
}

/// Natural key for revenue: at most one entry per calendar day. The store
/// also filters on the redundant month/year columns, both derived from the
/// date here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevenueKey {
    pub date: EntryDate,
}

impl RevenueKey {
    pub fn month(&self) -> String {
        self.date.month_abbr()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}
