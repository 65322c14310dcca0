//! Defines the endpoint for today's income summary.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    summary::{PeriodSummary, core::summarize_day},
    user::UserID,
};

/// The state needed to build a summary.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection for reading transactions and expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for the calling user's aggregates over the current UTC day.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn daily_summary_endpoint(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<PeriodSummary>, Error> {
    let connection = state.db_connection.lock().unwrap();

    let summary = summarize_day(user_id, OffsetDateTime::now_utc().date(), &connection)?;

    Ok(Json(summary))
}
