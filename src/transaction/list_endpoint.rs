//! Defines the endpoint for listing a user's transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    transaction::{Transaction, core::list_transactions},
    user::UserID,
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the calling user's transactions, newest first.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state.db_connection.lock().unwrap();

    Ok(Json(list_transactions(user_id, &connection)?))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        db::initialize,
        password::PasswordHash,
        transaction::{
            NewTransaction, Platform,
            core::create_transaction,
            list_endpoint::{ListTransactionsState, list_transactions_endpoint},
        },
        user::{UserID, create_user},
    };

    fn get_test_state() -> (ListTransactionsState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            "driver@example.com",
            PasswordHash::new_unchecked("hunter22"),
            &conn,
        )
        .unwrap();

        (
            ListTransactionsState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let (state, user_id) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            for (tx_ref, created_at) in [
                ("MP1", datetime!(2026-08-29 10:00:00 UTC)),
                ("MP2", datetime!(2026-08-30 10:00:00 UTC)),
            ] {
                create_transaction(
                    NewTransaction {
                        tx_ref: Some(tx_ref.to_owned()),
                        ..NewTransaction::empty(user_id, Platform::Yango, created_at)
                    },
                    &connection,
                )
                .unwrap();
            }
        }

        let transactions = list_transactions_endpoint(State(state), Extension(user_id))
            .await
            .unwrap()
            .0;

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].tx_ref.as_deref(), Some("MP2"));
        assert_eq!(transactions[1].tx_ref.as_deref(), Some("MP1"));
    }
}
