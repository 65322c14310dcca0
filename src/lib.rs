//! Fareledger is a REST API for ride-hailing drivers to track income across
//! platforms.
//!
//! It ingests payment records from a local SMS bridge or directly from an
//! authenticated client, splits each trip into rider profit and platform
//! debt, aggregates daily and period summaries, and settles outstanding debt
//! with offset records.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod authenticity;
mod database_id;
mod db;
mod debt;
mod endpoints;
mod error;
mod expense;
mod password;
mod routing;
mod summary;
mod transaction;
mod user;

pub use app_state::{AppState, DEFAULT_TOKEN_DURATION};
pub use authenticity::IngestMode;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
