use std::{
    env::{self},
    fs::OpenOptions,
    net::SocketAddr,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use fareledger::{AppState, IngestMode, UserID, build_router, graceful_shutdown};

/// The REST API server for fareledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// The ID of the user that records from the SMS bridge are bound to.
    ///
    /// When unset, the bridge ingestion routes reject every request.
    #[arg(long)]
    bridge_user_id: Option<i64>,

    /// Log mismatched authenticity tags instead of rejecting the request.
    #[arg(long)]
    permissive_ingest: bool,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let token_secret =
        env::var("SECRET").expect("The environment variable 'SECRET' must be set");
    let ingest_secret = env::var("INGEST_SECRET")
        .expect("The environment variable 'INGEST_SECRET' must be set");

    let ingest_mode = if args.permissive_ingest {
        IngestMode::Permissive
    } else {
        IngestMode::Strict
    };

    let conn = Connection::open(&args.db_path).unwrap();
    let state = AppState::new(
        conn,
        &token_secret,
        &ingest_secret,
        ingest_mode,
        args.bridge_user_id.map(UserID::new),
    )
    .expect("Could not initialize the application database.");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
