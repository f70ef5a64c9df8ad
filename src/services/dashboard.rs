//! Dashboard statistics
//!
//! Aggregations for administrators: status counts and totals over a range,
//! per-day completeness across stores, current fund per store, totals by
//! payment method, weekly sales and the comparison with the previous year.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::error::CloseResult;
use crate::models::{CashClose, CloseStatus, Money, PaymentMethodId, Store, StoreId};
use crate::services::close::CloseFilter;
use crate::services::reconciliation::UNKNOWN_METHOD_LABEL;
use crate::storage::Storage;

/// Counts and totals over a set of closes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_closes: usize,
    pub ok_count: usize,
    pub warning_count: usize,
    pub ko_count: usize,
    pub total_sales: Money,
    /// Sum of all payments by method
    pub sales_from_payments: Money,
    pub total_withdrawals: Money,
    pub total_expenses: Money,
    pub total_difference: Money,
}

/// How one calendar day looks across stores
#[derive(Debug, Clone)]
pub struct DayStatus {
    pub date: NaiveDate,
    pub closes: Vec<CashClose>,
    pub stores_closed: usize,
    pub total_stores: usize,
    /// Every active store has at least one close
    pub complete: bool,
    /// Worst status among the day's closes (`None` without closes)
    pub worst: Option<CloseStatus>,
}

/// Fund a store holds going into a day
#[derive(Debug, Clone)]
pub struct StoreFundStatus {
    pub store: Store,
    /// Latest close strictly before the day
    pub latest_close: Option<CashClose>,
    /// Theoretical fund of `latest_close`, else the configured fund
    pub current_fund: Money,
    /// Cash counted at `latest_close`
    pub counted_fund: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTotal {
    pub name: String,
    pub amount: Money,
}

/// Declared sales of one ISO week
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklySales {
    pub year: i32,
    pub week: u32,
    pub sales: Money,
}

/// Declared sales of a range against the same range one year earlier
#[derive(Debug, Clone, PartialEq)]
pub struct YearOverYear {
    pub current: Money,
    pub previous: Money,
    /// `None` when the previous year has no sales
    pub growth_percent: Option<f64>,
}

/// Same calendar day one year earlier (29 February maps to 28 February)
fn one_year_earlier(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year() - 1, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(date.year() - 1, date.month(), date.day() - 1))
        .unwrap_or(date)
}

pub struct DashboardService<'a> {
    storage: &'a Storage,
}

impl<'a> DashboardService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn closes(&self, filter: &CloseFilter) -> CloseResult<Vec<CashClose>> {
        Ok(self
            .storage
            .closes
            .get_all()?
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect())
    }

    pub fn stats(&self, filter: &CloseFilter) -> CloseResult<DashboardStats> {
        let closes = self.closes(filter)?;
        let mut stats = DashboardStats {
            total_closes: closes.len(),
            ..Default::default()
        };

        for close in &closes {
            match close.status {
                CloseStatus::Ok => stats.ok_count += 1,
                CloseStatus::Warning => stats.warning_count += 1,
                CloseStatus::Ko => stats.ko_count += 1,
            }
            stats.total_sales += close.total_sales_amount;
            stats.sales_from_payments += close.payments_total();
            stats.total_withdrawals += close.bank_withdrawal_amount;
            stats.total_expenses += close.expenses_total();
            stats.total_difference += close.difference;
        }

        Ok(stats)
    }

    /// Closes of one day and whether every active store has closed
    pub fn day_status(&self, date: NaiveDate) -> CloseResult<DayStatus> {
        let active = self.active_store_ids()?;
        self.day_status_with(date, &active)
    }

    fn active_store_ids(&self) -> CloseResult<HashSet<StoreId>> {
        Ok(self
            .storage
            .stores
            .get_active()?
            .into_iter()
            .map(|s| s.id)
            .collect())
    }

    /// Closes of deactivated stores are listed but never count towards
    /// completeness
    fn day_status_with(&self, date: NaiveDate, active: &HashSet<StoreId>) -> CloseResult<DayStatus> {
        let closes = self.storage.closes.get_by_date_range(date, date)?;
        let stores_closed = closes
            .iter()
            .map(|c| c.store_id)
            .filter(|id| active.contains(id))
            .collect::<HashSet<_>>()
            .len();
        let total_stores = active.len();

        Ok(DayStatus {
            date,
            stores_closed,
            total_stores,
            complete: total_stores > 0 && stores_closed >= total_stores,
            worst: closes.iter().map(|c| c.status).max(),
            closes,
        })
    }

    /// One `DayStatus` per day of an inclusive range
    pub fn calendar(&self, start: NaiveDate, end: NaiveDate) -> CloseResult<Vec<DayStatus>> {
        let active = self.active_store_ids()?;
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| self.day_status_with(d, &active))
            .collect()
    }

    /// Fund of every store going into `today`, from the last close before it
    pub fn store_fund_status(&self, today: NaiveDate) -> CloseResult<Vec<StoreFundStatus>> {
        let mut result = Vec::new();

        for store in self.storage.stores.get_all()? {
            let latest_close = self.storage.closes.latest_before(store.id, today)?;
            let (current_fund, counted_fund) = match &latest_close {
                Some(close) => (close.theoretical_cash_fund, Some(close.actual_cash_fund)),
                None => (store.opening_cash_fund, None),
            };
            result.push(StoreFundStatus {
                store,
                latest_close,
                current_fund,
                counted_fund,
            });
        }

        Ok(result)
    }

    /// Totals per payment method name, largest first
    pub fn payment_breakdown(&self, filter: &CloseFilter) -> CloseResult<Vec<PaymentTotal>> {
        let names: HashMap<PaymentMethodId, String> = self
            .storage
            .payment_methods
            .get_all()?
            .into_iter()
            .map(|m| (m.id, m.name))
            .collect();

        let mut totals: BTreeMap<String, Money> = BTreeMap::new();
        for close in self.closes(filter)? {
            for payment in &close.payments {
                let name = names
                    .get(&payment.payment_method_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_METHOD_LABEL.to_string());
                *totals.entry(name).or_default() += payment.amount;
            }
        }

        let mut breakdown: Vec<_> = totals
            .into_iter()
            .map(|(name, amount)| PaymentTotal { name, amount })
            .collect();
        breakdown.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
        Ok(breakdown)
    }

    /// Declared sales grouped by ISO week, oldest week first
    pub fn weekly_sales(&self, filter: &CloseFilter) -> CloseResult<Vec<WeeklySales>> {
        let mut weeks: BTreeMap<(i32, u32), Money> = BTreeMap::new();
        for close in self.closes(filter)? {
            let iso = close.date.iso_week();
            *weeks.entry((iso.year(), iso.week())).or_default() += close.total_sales_amount;
        }

        Ok(weeks
            .into_iter()
            .map(|((year, week), sales)| WeeklySales { year, week, sales })
            .collect())
    }

    /// Compare declared sales in a range with the same range a year before
    pub fn year_over_year(&self, filter: &CloseFilter) -> CloseResult<YearOverYear> {
        let current = self.stats(filter)?.total_sales;

        let shifted = CloseFilter {
            date: filter.date.map(one_year_earlier),
            start: filter.start.map(one_year_earlier),
            end: filter.end.map(one_year_earlier),
            ..filter.clone()
        };
        let previous = self.stats(&shifted)?.total_sales;

        let growth_percent = (previous.is_positive())
            .then(|| (current.as_f64() - previous.as_f64()) / previous.as_f64() * 100.0);

        Ok(YearOverYear {
            current,
            previous,
            growth_percent,
        })
    }
}
