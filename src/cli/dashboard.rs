//! Dashboard CLI commands

use chrono::{Datelike, NaiveDate};
use clap::{Args, Subcommand};

use crate::auth::Route;
use crate::display::{
    format_calendar, format_fund_status, format_payment_breakdown, format_stats,
    format_weekly_sales, format_year_over_year,
};
use crate::error::{CloseError, CloseResult};
use crate::services::{CloseFilter, DashboardService, StoreService};

use super::{parse_optional_date, today, CliContext};

/// Store and date range shared by the aggregate views
#[derive(Args, Debug, Default)]
pub struct RangeArgs {
    /// Store name or ID
    #[arg(short, long)]
    pub store: Option<String>,
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,
    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Subcommand)]
pub enum DashboardCommands {
    /// Close counts by status and money totals
    Stats(RangeArgs),
    /// Which stores closed on a day
    Day {
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Day-by-day close completion, current month by default
    Calendar {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    /// Cash fund each store holds going into today
    Funds,
    /// Totals by payment method
    Payments(RangeArgs),
    /// Declared sales per ISO week
    Weekly(RangeArgs),
    /// Sales against the same period last year, year to date by default
    Yoy(RangeArgs),
}

pub fn handle_dashboard_command(ctx: &CliContext, cmd: DashboardCommands) -> CloseResult<()> {
    ctx.authorize(Route::Dashboard)?;
    let service = DashboardService::new(ctx.storage);
    let currency = &ctx.settings.currency_symbol;

    match cmd {
        DashboardCommands::Stats(range) => {
            let stats = service.stats(&range_filter(ctx, &range)?)?;
            print!("{}", format_stats(&stats, currency));
        }
        DashboardCommands::Day { date } => {
            let date = parse_optional_date(date.as_deref())?.unwrap_or_else(today);
            println!("{}", format_calendar(&[service.day_status(date)?]));
        }
        DashboardCommands::Calendar { from, to } => {
            let end = parse_optional_date(to.as_deref())?.unwrap_or_else(today);
            let start = parse_optional_date(from.as_deref())?.unwrap_or_else(|| month_start(end));
            if start > end {
                return Err(CloseError::Validation(format!(
                    "Range starts after it ends ({} > {})",
                    start, end
                )));
            }
            println!("{}", format_calendar(&service.calendar(start, end)?));
        }
        DashboardCommands::Funds => {
            println!("{}", format_fund_status(&service.store_fund_status(today())?, currency));
        }
        DashboardCommands::Payments(range) => {
            let totals = service.payment_breakdown(&range_filter(ctx, &range)?)?;
            println!("{}", format_payment_breakdown(&totals, currency));
        }
        DashboardCommands::Weekly(range) => {
            let weeks = service.weekly_sales(&range_filter(ctx, &range)?)?;
            println!("{}", format_weekly_sales(&weeks, currency));
        }
        DashboardCommands::Yoy(range) => {
            let mut filter = range_filter(ctx, &range)?;
            if filter.start.is_none() && filter.end.is_none() {
                let end = today();
                filter.start = NaiveDate::from_ymd_opt(end.year(), 1, 1);
                filter.end = Some(end);
            }
            let yoy = service.year_over_year(&filter)?;
            print!("{}", format_year_over_year(&yoy, currency));
        }
    }

    Ok(())
}

fn range_filter(ctx: &CliContext, range: &RangeArgs) -> CloseResult<CloseFilter> {
    let store_id = match &range.store {
        Some(s) => Some(StoreService::new(ctx.storage).resolve(s)?.id),
        None => None,
    };
    Ok(CloseFilter {
        store_id,
        start: parse_optional_date(range.from.as_deref())?,
        end: parse_optional_date(range.to.as_deref())?,
        ..Default::default()
    })
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 17).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }
}
