//! Defines the endpoint for registering a new driver account.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    password::PasswordHash,
    user::create_user,
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegisterState {
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegisterState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for registering a driver.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    /// The email address to register.
    pub email: String,
    /// The desired password.
    pub password: String,
    /// The password typed a second time, to catch typos.
    pub password2: String,
}

/// The details of a freshly registered driver.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// The new user's ID.
    pub id: DatabaseId,
    /// The registered email address.
    pub email: String,
}

/// A route handler for registering a new driver account.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn register_endpoint(
    State(state): State<RegisterState>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<RegisterResponse>), Error> {
    if form.email.is_empty() || !form.email.contains('@') {
        return Err(Error::Validation("a valid email address is required".to_owned()));
    }

    if form.password != form.password2 {
        return Err(Error::Validation("passwords do not match".to_owned()));
    }

    let password_hash = PasswordHash::from_raw_password(&form.password, PasswordHash::DEFAULT_COST)?;

    let connection = state.db_connection.lock().unwrap();
    let user = create_user(&form.email, password_hash, &connection)?;

    tracing::info!("registered driver {}", user.email);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id.as_i64(),
            email: user.email,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, extract::State};
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::register::{RegisterForm, RegisterState, register_endpoint},
        db::initialize,
    };

    fn get_test_state() -> RegisterState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        RegisterState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn form(email: &str, password: &str, password2: &str) -> RegisterForm {
        RegisterForm {
            email: email.to_owned(),
            password: password.to_owned(),
            password2: password2.to_owned(),
        }
    }

    #[tokio::test]
    async fn register_creates_user() {
        let state = get_test_state();

        let (status, response) = register_endpoint(
            State(state),
            Json(form("driver@example.com", "hunter22hunter22", "hunter22hunter22")),
        )
        .await
        .unwrap();

        assert_eq!(status, axum::http::StatusCode::CREATED);
        assert_eq!(response.email, "driver@example.com");
        assert!(response.id > 0);
    }

    #[tokio::test]
    async fn register_rejects_mismatched_passwords() {
        let state = get_test_state();

        let result = register_endpoint(
            State(state),
            Json(form("driver@example.com", "hunter22hunter22", "something else")),
        )
        .await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let state = get_test_state();

        let result = register_endpoint(
            State(state),
            Json(form("driver@example.com", "short", "short")),
        )
        .await;

        assert!(matches!(result, Err(Error::TooWeak(_))));
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() {
        let state = get_test_state();

        let result = register_endpoint(
            State(state),
            Json(form("not an email", "hunter22hunter22", "hunter22hunter22")),
        )
        .await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let state = get_test_state();
        register_endpoint(
            State(state.clone()),
            Json(form("driver@example.com", "hunter22hunter22", "hunter22hunter22")),
        )
        .await
        .unwrap();

        let result = register_endpoint(
            State(state),
            Json(form("driver@example.com", "hunter22hunter22", "hunter22hunter22")),
        )
        .await;

        assert!(matches!(result, Err(Error::DuplicateEmail)));
    }
}
