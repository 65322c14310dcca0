//! Defines the endpoint for logging in and issuing bearer tokens.

use std::sync::{Arc, Mutex};

use axum::{Json, extract::{FromRef, State}};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{AppState, Error, auth::AuthToken, user::get_user_by_email};

/// The state needed to log in a user.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The key used to sign bearer tokens.
    pub token_key: Vec<u8>,
    /// The duration for which issued bearer tokens are valid.
    pub token_duration: Duration,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            token_key: state.token_key.clone(),
            token_duration: state.token_duration,
        }
    }
}

/// The credentials for a log-in request.
#[derive(Debug, Deserialize)]
pub struct LogInForm {
    /// The user's email address.
    pub email: String,
    /// The user's plain-text password.
    pub password: String,
}

/// The bearer token issued to a successfully logged-in user.
#[derive(Debug, Serialize)]
pub struct LogInResponse {
    /// The signed bearer token to present in the `Authorization` header.
    pub token: String,
    /// When the token stops being valid.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// A route handler for logging in a user with their email and password.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn log_in_endpoint(
    State(state): State<LogInState>,
    Json(form): Json<LogInForm>,
) -> Result<Json<LogInResponse>, Error> {
    let user = {
        let connection = state.db_connection.lock().unwrap();

        get_user_by_email(&form.email, &connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            other => other,
        })?
    };

    let password_matches = user
        .password_hash
        .verify(&form.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !password_matches {
        return Err(Error::InvalidCredentials);
    }

    let token = AuthToken::new(user.id, state.token_duration);

    Ok(Json(LogInResponse {
        token: token.sign(&state.token_key)?,
        expires_at: token.expires_at,
    }))
}
