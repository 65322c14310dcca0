//! Defines the endpoint for ingesting a new transaction.
//!
//! Control flow: authenticity check, then the dedup gate, then the split
//! calculator (when a trip price is present), then the insert. A lost
//! uniqueness race on the insert is recovered by re-fetching the winning row.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    authenticity::{self, IngestMode},
    transaction::{
        NewTransaction, Platform, Transaction, TripSplit,
        core::{create_transaction, get_transaction_by_reference},
    },
    user::UserID,
};

/// The state needed to ingest a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The shared secret authenticity tags are computed with.
    pub ingest_secret: Vec<u8>,
    /// Whether mismatched authenticity tags reject the request.
    pub ingest_mode: IngestMode,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            ingest_secret: state.ingest_secret.clone(),
            ingest_mode: state.ingest_mode,
        }
    }
}

/// The request body for ingesting a transaction.
///
/// Either `trip_price` (the split calculator path) or `amount_received` (the
/// manual entry path, with profit and debt taken as given) must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPayload {
    /// The external transaction reference from the payment SMS.
    #[serde(default)]
    pub tx_ref: Option<String>,
    /// The amount paid out; ignored when `trip_price` is present.
    #[serde(default)]
    pub amount_received: Option<f64>,
    /// The fare of the trip before bonuses and fees.
    #[serde(default)]
    pub trip_price: Option<f64>,
    /// Bonuses paid on top of the trip price.
    #[serde(default)]
    pub bonuses: f64,
    /// Fees charged by the platform, typically negative.
    #[serde(default)]
    pub system_fees: Option<f64>,
    /// What the driver keeps; only used on the manual entry path.
    #[serde(default)]
    pub rider_profit: Option<f64>,
    /// What the driver owes the platform; only used on the manual entry path.
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
    /// When the payment was received; defaults to now.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    /// The authenticity tag over the canonical request fields.
    #[serde(default)]
    pub auth_tag: Option<String>,
}

/// The outcome of pushing a payload through the ingestion pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    /// A new row was inserted.
    Created(Transaction),
    /// The reference was already known; the existing row is returned
    /// unchanged.
    Existing(Transaction),
}

/// Run the full ingestion pipeline for one transaction payload.
///
/// `tag_required` is true for the unauthenticated bridge path and false for
/// authenticated callers entering data by hand.
pub(crate) fn ingest_transaction(
    user_id: UserID,
    payload: TransactionPayload,
    tag_required: bool,
    ingest_mode: IngestMode,
    ingest_secret: &[u8],
    connection: &Connection,
) -> Result<Ingested, Error> {
    if payload.trip_price.is_some_and(|trip_price| trip_price < 0.0) {
        return Err(Error::Validation("trip_price must not be negative".to_owned()));
    }

    let split = payload
        .trip_price
        .map(|trip_price| {
            TripSplit::from_trip(trip_price, payload.bonuses, payload.system_fees.unwrap_or(0.0))
        });

    let amount_received = split
        .map(|split| split.amount_received)
        .or(payload.amount_received)
        .ok_or_else(|| {
            Error::Validation("either trip_price or amount_received is required".to_owned())
        })?;

    if tag_required || payload.auth_tag.is_some() {
        let tx_ref = payload.tx_ref.as_deref().ok_or_else(|| {
            Error::Validation("tx_ref is required for tagged ingestion".to_owned())
        })?;
        let canonical =
            authenticity::transaction_canonical(tx_ref, amount_received, payload.platform);

        authenticity::check_tag(
            ingest_mode,
            ingest_secret,
            &canonical,
            payload.auth_tag.as_deref(),
            tag_required,
        )?;
    }

    if let Some(tx_ref) = payload.tx_ref.as_deref()
        && let Some(existing) = get_transaction_by_reference(tx_ref, connection)?
    {
        return Ok(Ingested::Existing(existing));
    }

    let new_transaction = NewTransaction {
        user_id,
        tx_ref: payload.tx_ref.clone(),
        amount_received,
        trip_price: payload.trip_price,
        bonuses: payload.bonuses,
        system_fees: payload.system_fees,
        gross_total: split.map(|split| split.gross_total),
        rider_profit: split
            .map(|split| split.rider_profit)
            .or(payload.rider_profit)
            .unwrap_or(amount_received),
        platform_debt: split
            .map(|split| split.platform_debt)
            .unwrap_or(payload.platform_debt),
        platform: payload.platform,
        is_tip: payload.is_tip,
        tip_amount: payload.tip_amount,
        created_at: payload.created_at.unwrap_or_else(OffsetDateTime::now_utc),
    };

    match create_transaction(new_transaction, connection) {
        Ok(transaction) => Ok(Ingested::Created(transaction)),
        // The dedup gate's read-then-write is not atomic; losing the race
        // against another writer is recovered here, not surfaced.
        Err(Error::DuplicateReference) => {
            let tx_ref = payload.tx_ref.as_deref().unwrap_or_default();
            tracing::warn!("lost ingestion race for reference {:?}, re-fetching", tx_ref);

            match get_transaction_by_reference(tx_ref, connection)? {
                Some(existing) => Ok(Ingested::Existing(existing)),
                None => Err(Error::DuplicateReference),
            }
        }
        Err(error) => Err(error),
    }
}

/// A route handler for ingesting a transaction from an authenticated caller.
///
/// Responds with 201 and the new record, or 200 and the existing record when
/// the reference was already ingested.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(payload): Json<TransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let connection = state.db_connection.lock().unwrap();

    let ingested = ingest_transaction(
        user_id,
        payload,
        false,
        state.ingest_mode,
        &state.ingest_secret,
        &connection,
    )?;

    Ok(match ingested {
        Ingested::Created(transaction) => (StatusCode::CREATED, Json(transaction)),
        Ingested::Existing(transaction) => (StatusCode::OK, Json(transaction)),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum::Json;
    use rusqlite::Connection;

    use crate::{
        Error,
        authenticity::{self, IngestMode},
        db::initialize,
        password::PasswordHash,
        transaction::{
            Platform,
            core::Department,
            create_endpoint::{
                CreateTransactionState, TransactionPayload, create_transaction_endpoint,
            },
        },
        user::{UserID, create_user},
    };

    fn get_test_state() -> (CreateTransactionState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            "driver@example.com",
            PasswordHash::new_unchecked("hunter22"),
            &conn,
        )
        .unwrap();

        (
            CreateTransactionState {
                db_connection: Arc::new(Mutex::new(conn)),
                ingest_secret: b"test-ingest-secret".to_vec(),
                ingest_mode: IngestMode::Strict,
            },
            user.id,
        )
    }

    fn trip_payload(tx_ref: &str) -> TransactionPayload {
        TransactionPayload {
            tx_ref: Some(tx_ref.to_owned()),
            amount_received: None,
            trip_price: Some(100.0),
            bonuses: 10.0,
            system_fees: Some(-8.0),
            rider_profit: None,
            platform_debt: 0.0,
            platform: Platform::Bolt,
            is_tip: false,
            tip_amount: 0.0,
            created_at: None,
            auth_tag: None,
        }
    }

    #[tokio::test]
    async fn create_computes_split() {
        let (state, user_id) = get_test_state();

        let (status, Json(transaction)) = create_transaction_endpoint(
            State(state),
            Extension(user_id),
            Json(trip_payload("MP1234")),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(transaction.gross_total, Some(110.0));
        assert_eq!(transaction.amount_received, 110.0);
        assert_eq!(transaction.rider_profit, 102.0);
        assert_eq!(transaction.platform_debt, 8.0);
        assert_eq!(transaction.department, Department::Revenue);
    }

    #[tokio::test]
    async fn second_ingest_of_same_reference_returns_existing_row() {
        let (state, user_id) = get_test_state();

        let (first_status, Json(first)) = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Json(trip_payload("MP1234")),
        )
        .await
        .unwrap();
        let (second_status, Json(second)) = create_transaction_endpoint(
            State(state),
            Extension(user_id),
            Json(TransactionPayload {
                // Different figures must not overwrite the stored row.
                trip_price: Some(500.0),
                ..trip_payload("MP1234")
            }),
        )
        .await
        .unwrap();

        assert_eq!(first_status, StatusCode::CREATED);
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn manual_entry_takes_figures_as_given() {
        let (state, user_id) = get_test_state();

        let (status, Json(transaction)) = create_transaction_endpoint(
            State(state),
            Extension(user_id),
            Json(TransactionPayload {
                tx_ref: None,
                trip_price: None,
                amount_received: Some(45.0),
                rider_profit: Some(40.0),
                platform_debt: 5.0,
                ..trip_payload("")
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(transaction.amount_received, 45.0);
        assert_eq!(transaction.rider_profit, 40.0);
        assert_eq!(transaction.platform_debt, 5.0);
        assert_eq!(transaction.gross_total, None);
    }

    #[tokio::test]
    async fn missing_amount_and_trip_price_is_rejected() {
        let (state, user_id) = get_test_state();

        let result = create_transaction_endpoint(
            State(state),
            Extension(user_id),
            Json(TransactionPayload {
                trip_price: None,
                amount_received: None,
                ..trip_payload("MP1234")
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn valid_tag_is_accepted() {
        let (state, user_id) = get_test_state();
        let canonical = authenticity::transaction_canonical("MP1234", 110.0, Platform::Bolt);
        let tag = authenticity::compute_tag(&state.ingest_secret, &canonical).unwrap();

        let (status, _) = create_transaction_endpoint(
            State(state),
            Extension(user_id),
            Json(TransactionPayload {
                auth_tag: Some(tag),
                ..trip_payload("MP1234")
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn tampered_tag_is_rejected_and_nothing_is_stored() {
        let (state, user_id) = get_test_state();
        let canonical = authenticity::transaction_canonical("MP1234", 900.0, Platform::Bolt);
        let tag = authenticity::compute_tag(&state.ingest_secret, &canonical).unwrap();

        let result = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Json(TransactionPayload {
                auth_tag: Some(tag),
                ..trip_payload("MP1234")
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::AuthenticityMismatch)));
        let connection = state.db_connection.lock().unwrap();
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn negative_trip_price_is_rejected() {
        let (state, user_id) = get_test_state();

        let result = create_transaction_endpoint(
            State(state),
            Extension(user_id),
            Json(TransactionPayload {
                trip_price: Some(-1.0),
                ..trip_payload("MP1234")
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
