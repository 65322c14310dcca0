//! Defines the unauthenticated ingestion route used by the local SMS bridge.
//!
//! The bridge parses mobile-money SMS on the driver's phone and forwards the
//! figures without a session. Records are bound to the explicitly configured
//! bridge user and every request must carry an authenticity tag; there is no
//! fallback owner for orphaned records.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    authenticity::IngestMode,
    transaction::{
        Transaction,
        create_endpoint::{Ingested, TransactionPayload, ingest_transaction},
    },
    user::UserID,
};

/// The state needed to ingest records from the bridge.
#[derive(Debug, Clone)]
pub struct BridgeIngestState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The shared secret authenticity tags are computed with.
    pub ingest_secret: Vec<u8>,
    /// Whether mismatched authenticity tags reject the request.
    pub ingest_mode: IngestMode,
    /// The user bridge records are bound to, if one is configured.
    pub bridge_user_id: Option<UserID>,
}

impl FromRef<AppState> for BridgeIngestState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            ingest_secret: state.ingest_secret.clone(),
            ingest_mode: state.ingest_mode,
            bridge_user_id: state.bridge_user_id,
        }
    }
}

/// A route handler for ingesting a transaction from the SMS bridge.
///
/// Responds like the authenticated ingestion route (201 created, 200
/// existing) but requires an authenticity tag and rejects every request when
/// no bridge user is configured.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn bridge_ingest_transaction_endpoint(
    State(state): State<BridgeIngestState>,
    Json(payload): Json<TransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let Some(user_id) = state.bridge_user_id else {
        tracing::warn!("rejecting bridge ingestion: no bridge user is configured");
        return Err(Error::Unauthorized);
    };

    let connection = state.db_connection.lock().unwrap();

    let ingested = ingest_transaction(
        user_id,
        payload,
        true,
        state.ingest_mode,
        &state.ingest_secret,
        &connection,
    )?;

    Ok(match ingested {
        Ingested::Created(transaction) => (StatusCode::CREATED, Json(transaction)),
        Ingested::Existing(transaction) => (StatusCode::OK, Json(transaction)),
    })
}
