//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, authenticity::IngestMode, db::initialize, user::UserID};

/// How long a bearer token stays valid after log in.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(1);

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The key used to sign and verify bearer tokens.
    pub token_key: Vec<u8>,

    /// The duration for which issued bearer tokens are valid.
    pub token_duration: Duration,

    /// The shared secret the ingestion bridge computes authenticity tags with.
    pub ingest_secret: Vec<u8>,

    /// Whether mismatched authenticity tags reject the request or are only
    /// logged.
    pub ingest_mode: IngestMode,

    /// The user that records ingested through the unauthenticated bridge
    /// routes are bound to.
    ///
    /// Must be configured explicitly; when `None` the bridge routes reject
    /// every request. There is deliberately no fallback to an arbitrary
    /// existing user.
    pub bridge_user_id: Option<UserID>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        token_secret: &str,
        ingest_secret: &str,
        ingest_mode: IngestMode,
        bridge_user_id: Option<UserID>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            token_key: create_signing_key(token_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            ingest_secret: ingest_secret.as_bytes().to_vec(),
            ingest_mode,
            bridge_user_id,
        })
    }
}

/// Derive a fixed-length signing key from a secret string.
pub fn create_signing_key(secret: &str) -> Vec<u8> {
    Sha512::digest(secret).to_vec()
}
