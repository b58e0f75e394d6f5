//! The one source of truth for derived financial figures.
//!
//! Every reporting surface (dashboard, exports, comparisons) calls
//! [`aggregate`] instead of re-deriving card fees, commission totals or net
//! profit on its own. The aggregator works at full decimal precision;
//! rounding to whole currency units happens only in the display form
//! produced by [`FinancialSummary::rounded`].

use crate::model::{Amount, ExpenseRecord, RevenueRecord, SalaryRecord};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

/// Canonical derived figures for one set of records, at full precision.
///
/// The caller owns the record set: year/month filtering happens upstream at
/// the store, and the aggregator computes over whatever it is given. Each
/// breakdown map sums exactly to its corresponding total.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FinancialSummary {
    /// Sum of all channel-level revenue fields before fee deduction.
    pub gross_revenue: Amount,
    /// Card-processing fee derived per revenue record (clamped at zero).
    pub card_fee_total: Amount,
    /// Sum of the platform commission fee fields.
    pub commission_fee_total: Amount,
    /// Expense rows, excluding credit-card-processing lines (those would
    /// double count against `card_fee_total`).
    pub expense_total: Amount,
    pub salary_total: Amount,
    /// expense + salary + card fee + commission fee.
    pub total_cost: Amount,
    /// gross revenue − total cost.
    pub net_profit: Amount,
    /// net profit ÷ gross revenue as a fraction; exactly zero when gross
    /// revenue is zero.
    pub profit_margin: Decimal,
    /// Expense totals by cost type (card-processing lines excluded).
    pub by_cost_type: BTreeMap<String, Amount>,
    /// Salary totals by employee.
    pub by_employee: BTreeMap<String, Amount>,
    /// Gross revenue by `YYYY-MM` month key.
    pub gross_by_month: BTreeMap<String, Amount>,
}

/// Computes the canonical derived figures over a set of persisted records.
pub fn aggregate(
    revenue: &[RevenueRecord],
    expenses: &[ExpenseRecord],
    salaries: &[SalaryRecord],
) -> FinancialSummary {
    let mut summary = FinancialSummary::default();

    for record in revenue {
        let gross = record.gross();
        summary.gross_revenue += gross;
        summary.card_fee_total += record.card_fee();
        summary.commission_fee_total += record.commission_fees();
        *summary
            .gross_by_month
            .entry(month_key(record))
            .or_default() += gross;
    }

    for record in expenses {
        if record.is_card_processing() {
            continue;
        }
        summary.expense_total += record.amount;
        *summary
            .by_cost_type
            .entry(record.cost_type.clone())
            .or_default() += record.amount;
    }

    for record in salaries {
        summary.salary_total += record.amount;
        *summary
            .by_employee
            .entry(record.employee.clone())
            .or_default() += record.amount;
    }

    summary.total_cost = summary.expense_total
        + summary.salary_total
        + summary.card_fee_total
        + summary.commission_fee_total;
    summary.net_profit = summary.gross_revenue - summary.total_cost;
    summary.profit_margin = ratio(summary.net_profit.value(), summary.gross_revenue.value());
    summary
}

impl FinancialSummary {
    /// Display form: whole currency units, percentages to one decimal place.
    pub fn rounded(&self) -> RoundedSummary {
        RoundedSummary {
            gross_revenue: self.gross_revenue.rounded(),
            card_fee_total: self.card_fee_total.rounded(),
            commission_fee_total: self.commission_fee_total.rounded(),
            expense_total: self.expense_total.rounded(),
            salary_total: self.salary_total.rounded(),
            total_cost: self.total_cost.rounded(),
            net_profit: self.net_profit.rounded(),
            profit_margin_percent: percent(self.profit_margin),
            cost_share_percent: self
                .by_cost_type
                .iter()
                .map(|(cost_type, amount)| {
                    let share = ratio(amount.value(), self.total_cost.value());
                    (cost_type.clone(), percent(share))
                })
                .collect(),
        }
    }
}

/// The rounded, display-ready summary. This is the only place whole-unit
/// rounding happens; nothing upstream rounds mid-calculation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoundedSummary {
    pub gross_revenue: i64,
    pub card_fee_total: i64,
    pub commission_fee_total: i64,
    pub expense_total: i64,
    pub salary_total: i64,
    pub total_cost: i64,
    pub net_profit: i64,
    pub profit_margin_percent: f64,
    pub cost_share_percent: BTreeMap<String, f64>,
}

fn month_key(record: &RevenueRecord) -> String {
    record.date.to_iso()[..7].to_string()
}

fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

fn percent(fraction: Decimal) -> f64 {
    (fraction * Decimal::from(100))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}
