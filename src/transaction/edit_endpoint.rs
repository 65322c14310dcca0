//! Defines the endpoints for replacing and deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    transaction::{
        NewTransaction, Platform, Transaction,
        core::{delete_transaction, update_transaction},
    },
    user::UserID,
};

/// The state needed to update or delete a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for a full transaction replace.
///
/// Unlike ingestion there is no split calculation or dedup here; the caller
/// supplies every stored field. The department is still re-derived from the
/// platform.
#[derive(Debug, Deserialize)]
pub struct ReplaceTransactionPayload {
    /// The external transaction reference.
    #[serde(default)]
    pub tx_ref: Option<String>,
    /// The amount paid out.
    pub amount_received: f64,
    /// The fare of the trip before bonuses and fees.
    #[serde(default)]
    pub trip_price: Option<f64>,
    /// Bonuses paid on top of the trip price.
    #[serde(default)]
    pub bonuses: f64,
    /// Fees charged by the platform.
    #[serde(default)]
    pub system_fees: Option<f64>,
    /// Trip price plus bonuses.
    #[serde(default)]
    pub gross_total: Option<f64>,
    /// What the driver keeps.
    pub rider_profit: f64,
    /// What the driver owes the platform.
    #[serde(default)]
    pub platform_debt: f64,
    /// The platform the trip was dispatched through.
    pub platform: Platform,
    /// Whether the payment was a tip.
    #[serde(default)]
    pub is_tip: bool,
    /// The tip portion of the payment.
    #[serde(default)]
    pub tip_amount: f64,
    /// When the payment was received.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A route handler for replacing every field of a transaction.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn update_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseId>,
    Json(payload): Json<ReplaceTransactionPayload>,
) -> Result<Json<Transaction>, Error> {
    let connection = state.db_connection.lock().unwrap();

    let updated = update_transaction(
        transaction_id,
        NewTransaction {
            user_id,
            tx_ref: payload.tx_ref,
            amount_received: payload.amount_received,
            trip_price: payload.trip_price,
            bonuses: payload.bonuses,
            system_fees: payload.system_fees,
            gross_total: payload.gross_total,
            rider_profit: payload.rider_profit,
            platform_debt: payload.platform_debt,
            platform: payload.platform,
            is_tip: payload.is_tip,
            tip_amount: payload.tip_amount,
            created_at: payload.created_at,
        },
        &connection,
    )?;

    Ok(Json(updated))
}

/// A route handler for deleting a transaction.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn delete_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseId>,
) -> Result<StatusCode, Error> {
    let connection = state.db_connection.lock().unwrap();

    delete_transaction(transaction_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
