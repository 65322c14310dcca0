//! Defines the endpoint for income summaries over an arbitrary window.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    Error,
    summary::{PeriodSummary, core::summarize_period, daily_endpoint::SummaryState},
    user::UserID,
};

/// The query parameters for a period summary.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    /// The inclusive start of the window, as an RFC 3339 timestamp.
    #[serde(default)]
    pub start_date: Option<String>,
    /// The exclusive end of the window, as an RFC 3339 timestamp.
    #[serde(default)]
    pub end_date: Option<String>,
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<OffsetDateTime, Error> {
    let value = value.ok_or_else(|| Error::Validation(format!("{name} is required")))?;

    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|_| Error::Validation(format!("{name} must be an RFC 3339 timestamp")))
}

/// A route handler for the calling user's aggregates over `[start_date, end_date)`.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn period_summary_endpoint(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PeriodSummary>, Error> {
    let start = parse_bound("start_date", query.start_date.as_deref())?;
    let end = parse_bound("end_date", query.end_date.as_deref())?;

    if start > end {
        return Err(Error::Validation(
            "start_date must not be after end_date".to_owned(),
        ));
    }

    let connection = state.db_connection.lock().unwrap();

    let summary = summarize_period(user_id, start, end, &connection)?;

    Ok(Json(summary))
}
