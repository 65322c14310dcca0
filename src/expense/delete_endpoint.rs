//! Defines the endpoint for deleting an expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, database_id::DatabaseId, expense::core::delete_expense, user::UserID,
};

/// The state needed to delete an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an expense.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<DatabaseId>,
) -> Result<StatusCode, Error> {
    let connection = state.db_connection.lock().unwrap();

    delete_expense(expense_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        expense::{
            Category,
            core::{create_expense, list_expenses},
            delete_endpoint::{DeleteExpenseState, delete_expense_endpoint},
        },
        password::PasswordHash,
        user::{UserID, create_user},
    };

    fn get_test_state() -> (DeleteExpenseState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            "driver@example.com",
            PasswordHash::new_unchecked("hunter22"),
            &conn,
        )
        .unwrap();

        (
            DeleteExpenseState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let (state, user_id) = get_test_state();
        let id = {
            let connection = state.db_connection.lock().unwrap();
            create_expense(
                user_id,
                20.0,
                Category::Fuel,
                "",
                datetime!(2026-08-30 08:00:00 UTC),
                &connection,
            )
            .unwrap()
            .id
        };

        let status = delete_expense_endpoint(State(state.clone()), Extension(user_id), Path(id))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        let connection = state.db_connection.lock().unwrap();
        assert!(list_expenses(user_id, &connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_expense_is_not_found() {
        let (state, user_id) = get_test_state();

        let result = delete_expense_endpoint(State(state), Extension(user_id), Path(999)).await;

        assert!(matches!(result, Err(Error::NotFound)));
    }
}
