//! Daily and period income summaries with per-platform breakdowns.

mod core;
mod daily_endpoint;
mod period_endpoint;

pub use core::{PeriodSummary, summarize_day, summarize_period};
pub use daily_endpoint::{SummaryState, daily_summary_endpoint};
pub use period_endpoint::{PeriodQuery, period_summary_endpoint};
