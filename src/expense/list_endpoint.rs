//! Defines the endpoint for listing a user's expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    expense::{Expense, core::list_expenses},
    user::UserID,
};

/// The state needed to list expenses.
#[derive(Debug, Clone)]
pub struct ListExpensesState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the calling user's expenses, newest first.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn list_expenses_endpoint(
    State(state): State<ListExpensesState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Expense>>, Error> {
    let connection = state.db_connection.lock().unwrap();

    Ok(Json(list_expenses(user_id, &connection)?))
}
