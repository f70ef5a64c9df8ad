//! Display formatting for terminal output
//!
//! List views are rendered with `tabled`; detail views are plain text.

pub mod close;
pub mod dashboard;
pub mod store;
pub mod user;

pub use close::{format_close_details, format_close_list};
pub use dashboard::{
    format_calendar, format_fund_status, format_payment_breakdown, format_stats,
    format_weekly_sales, format_year_over_year,
};
pub use store::{format_payment_method_list, format_store_details, format_store_list};
pub use user::format_profile_list;
