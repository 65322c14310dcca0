//! Settling outstanding per-platform debt with offset records.

mod clear_endpoint;
mod core;

pub use clear_endpoint::{ClearDebtState, clear_debt_endpoint};
pub use core::{SettlementReport, settle_debt};
