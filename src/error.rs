//! Defines the app level error type and its conversion to JSON HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request is missing a valid bearer token.
    #[error("missing or invalid bearer token")]
    Unauthorized,

    /// A required field was missing or malformed.
    ///
    /// The message should name the offending field so the client can fix the
    /// request.
    #[error("{0}")]
    Validation(String),

    /// The authenticity tag did not match the submitted fields.
    ///
    /// Only raised in strict ingest mode; permissive mode logs the mismatch
    /// and admits the record.
    #[error("the authenticity tag does not match the submitted fields")]
    AuthenticityMismatch,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The email address is already registered.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The external transaction reference already exists in the database.
    ///
    /// Callers performing ingestion should treat this as a race lost against
    /// another writer and re-fetch the existing row instead of surfacing the
    /// error.
    #[error("a transaction with this reference already exists")]
    DuplicateReference,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("transaction.tx_ref") =>
            {
                Error::DuplicateReference
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match self {
            Error::Validation(_) | Error::TooWeak(_) | Error::DuplicateEmail => {
                StatusCode::BAD_REQUEST
            }
            Error::InvalidCredentials | Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::AuthenticityMismatch => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateReference => StatusCode::CONFLICT,
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            ref error => {
                tracing::error!("An unexpected error occurred: {}", error);

                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response();
            }
        };

        (status_code, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
