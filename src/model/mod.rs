//! Types that represent the canonical ledger records and their value types.

mod amount;
mod date;
mod expense;
mod revenue;
mod salary;

pub use amount::Amount;
pub use date::EntryDate;
pub use expense::{ExpenseKey, ExpenseRecord};
pub use revenue::{RevenueKey, RevenueRecord};
pub use salary::{SalaryKey, SalaryRecord};
