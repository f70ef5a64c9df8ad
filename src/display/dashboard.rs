//! Dashboard display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::services::{DashboardStats, DayStatus, PaymentTotal, StoreFundStatus, WeeklySales, YearOverYear};

pub fn format_stats(stats: &DashboardStats, currency: &str) -> String {
    let money = |m: crate::models::Money| m.format_with_symbol(currency);

    let mut output = String::new();
    output.push_str(&format!("Closes:       {}\n", stats.total_closes));
    output.push_str(&format!(
        "  OK {} / WARNING {} / KO {}\n",
        stats.ok_count, stats.warning_count, stats.ko_count
    ));
    output.push_str(&format!("Total sales:  {}\n", money(stats.total_sales)));
    output.push_str(&format!("By payments:  {}\n", money(stats.sales_from_payments)));
    output.push_str(&format!("Withdrawals:  {}\n", money(stats.total_withdrawals)));
    output.push_str(&format!("Expenses:     {}\n", money(stats.total_expenses)));
    output.push_str(&format!("Difference:   {}\n", stats.total_difference.format_signed()));
    output
}

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Closed")]
    closed: String,
    #[tabled(rename = "Complete")]
    complete: &'static str,
    #[tabled(rename = "Worst")]
    worst: &'static str,
}

/// One row per day
pub fn format_calendar(days: &[DayStatus]) -> String {
    let rows = days.iter().map(|d| DayRow {
        date: d.date.format("%a %Y-%m-%d").to_string(),
        closed: format!("{}/{}", d.stores_closed, d.total_stores),
        complete: if d.complete { "yes" } else { "no" },
        worst: d.worst.map(|s| s.label()).unwrap_or("-"),
    });
    Table::new(rows).with(Style::psql()).to_string()
}

#[derive(Tabled)]
struct FundRow {
    #[tabled(rename = "Store")]
    store: String,
    #[tabled(rename = "Last Close")]
    last_close: String,
    #[tabled(rename = "Current Fund")]
    current: String,
    #[tabled(rename = "Counted")]
    counted: String,
}

pub fn format_fund_status(funds: &[StoreFundStatus], currency: &str) -> String {
    if funds.is_empty() {
        return "No stores found.".to_string();
    }

    let rows = funds.iter().map(|f| FundRow {
        store: f.store.name.clone(),
        last_close: f
            .latest_close
            .as_ref()
            .map(|c| c.date.to_string())
            .unwrap_or_else(|| "-".into()),
        current: f.current_fund.format_with_symbol(currency),
        counted: f
            .counted_fund
            .map(|m| m.format_with_symbol(currency))
            .unwrap_or_else(|| "-".into()),
    });
    Table::new(rows).with(Style::psql()).to_string()
}

pub fn format_payment_breakdown(totals: &[PaymentTotal], currency: &str) -> String {
    if totals.is_empty() {
        return "No payments in range.".to_string();
    }

    let width = totals.iter().map(|t| t.name.chars().count()).max().unwrap_or(6).max(6);
    totals
        .iter()
        .map(|t| format!("{:<width$}  {:>12}\n", t.name, t.amount.format_with_symbol(currency)))
        .collect()
}

pub fn format_weekly_sales(weeks: &[WeeklySales], currency: &str) -> String {
    weeks
        .iter()
        .map(|w| {
            format!(
                "{}-W{:02}  {:>12}\n",
                w.year,
                w.week,
                w.sales.format_with_symbol(currency)
            )
        })
        .collect()
}

pub fn format_year_over_year(yoy: &YearOverYear, currency: &str) -> String {
    let growth = match yoy.growth_percent {
        Some(pct) => format!("{:+.1}%", pct),
        None => "n/a".to_string(),
    };
    format!(
        "This period:   {}\nYear before:   {}\nGrowth:        {}\n",
        yoy.current.format_with_symbol(currency),
        yoy.previous.format_with_symbol(currency),
        growth
    )
}
