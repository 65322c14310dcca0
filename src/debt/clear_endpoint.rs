//! Defines the endpoint for settling outstanding debt.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    debt::{SettlementReport, core::settle_debt},
    user::UserID,
};

/// The state needed to settle debt.
#[derive(Debug, Clone)]
pub struct ClearDebtState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ClearDebtState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for clearing the calling user's outstanding platform debt.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn clear_debt_endpoint(
    State(state): State<ClearDebtState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<SettlementReport>, Error> {
    let mut connection = state.db_connection.lock().unwrap();

    let report = settle_debt(user_id, &mut connection)?;

    Ok(Json(report))
}
