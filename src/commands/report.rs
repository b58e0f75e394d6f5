use crate::commands::Out;
use crate::report::{aggregate, RoundedSummary};
use crate::{Config, Result, Store};

/// Aggregates the stored records (optionally filtered by year/month at the
/// store) into the derived financial summary.
pub async fn report(
    config: Config,
    year: Option<i32>,
    month: Option<&str>,
) -> Result<Out<RoundedSummary>> {
    let store = Store::load(config.sqlite_path()).await?;
    let revenue = store.list_revenue(year, month).await?;
    let expenses = store.list_expenses(year, month, None).await?;
    let salaries = store.list_salaries(year, month).await?;

    let summary = aggregate(&revenue, &expenses, &salaries).rounded();
    let scope = match (year, month) {
        (Some(year), Some(month)) => format!("{month} {year}"),
        (Some(year), None) => year.to_string(),
        (None, Some(month)) => format!("{month} (all years)"),
        (None, None) => "all records".to_string(),
    };
    let message = format!(
        "{scope}: gross {}, total cost {}, net profit {} (margin {:.1}%)",
        whole_dollars(summary.gross_revenue),
        whole_dollars(summary.total_cost),
        whole_dollars(summary.net_profit),
        summary.profit_margin_percent
    );
    Ok(Out::new(message, summary))
}

/// Renders a rounded figure with the sign ahead of the currency symbol,
/// matching how amounts display everywhere else (`-$123`, not `$-123`).
fn whole_dollars(value: i64) -> String {
    if value < 0 {
        format!("-${}", value.unsigned_abs())
    } else {
        format!("${value}")
    }
}
