//! Defines the endpoints for recording expenses, including the bridge route.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    authenticity::{self, IngestMode},
    expense::{Category, Expense, core::create_expense},
    user::UserID,
};

/// The state needed to record an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The shared secret authenticity tags are computed with.
    pub ingest_secret: Vec<u8>,
    /// Whether mismatched authenticity tags reject the request.
    pub ingest_mode: IngestMode,
    /// The user bridge records are bound to, if one is configured.
    pub bridge_user_id: Option<UserID>,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            ingest_secret: state.ingest_secret.clone(),
            ingest_mode: state.ingest_mode,
            bridge_user_id: state.bridge_user_id,
        }
    }
}

/// The request body for recording an expense.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpensePayload {
    /// The amount of money spent.
    pub amount: f64,
    /// What the money was spent on.
    pub category: Category,
    /// A free-text note about the expense.
    #[serde(default)]
    pub description: String,
    /// When the money was spent; defaults to now.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    /// The authenticity tag over the canonical request fields.
    #[serde(default)]
    pub auth_tag: Option<String>,
}

fn ingest_expense(
    user_id: UserID,
    payload: ExpensePayload,
    tag_required: bool,
    ingest_mode: IngestMode,
    ingest_secret: &[u8],
    connection: &Connection,
) -> Result<Expense, Error> {
    if payload.amount < 0.0 {
        return Err(Error::Validation("amount must not be negative".to_owned()));
    }

    let canonical =
        authenticity::expense_canonical(payload.amount, payload.category, &payload.description);
    authenticity::check_tag(
        ingest_mode,
        ingest_secret,
        &canonical,
        payload.auth_tag.as_deref(),
        tag_required,
    )?;

    create_expense(
        user_id,
        payload.amount,
        payload.category,
        &payload.description,
        payload.created_at.unwrap_or_else(OffsetDateTime::now_utc),
        connection,
    )
}

/// A route handler for recording an expense for an authenticated caller.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Extension(user_id): Extension<UserID>,
    Json(payload): Json<ExpensePayload>,
) -> Result<(StatusCode, Json<Expense>), Error> {
    let connection = state.db_connection.lock().unwrap();

    let expense = ingest_expense(
        user_id,
        payload,
        false,
        state.ingest_mode,
        &state.ingest_secret,
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// A route handler for recording an expense submitted by the SMS bridge.
///
/// Requires an authenticity tag and rejects every request when no bridge user
/// is configured.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn bridge_ingest_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Json(payload): Json<ExpensePayload>,
) -> Result<(StatusCode, Json<Expense>), Error> {
    let Some(user_id) = state.bridge_user_id else {
        tracing::warn!("rejecting bridge expense: no bridge user is configured");
        return Err(Error::Unauthorized);
    };

    let connection = state.db_connection.lock().unwrap();

    let expense = ingest_expense(
        user_id,
        payload,
        true,
        state.ingest_mode,
        &state.ingest_secret,
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(expense)))
}
