//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    auth::{auth_guard, log_in_endpoint, register_endpoint},
    debt::clear_debt_endpoint,
    endpoints,
    expense::{
        bridge_ingest_expense_endpoint, create_expense_endpoint, delete_expense_endpoint,
        list_expenses_endpoint,
    },
    summary::{daily_summary_endpoint, period_summary_endpoint},
    transaction::{
        bridge_ingest_transaction_endpoint, create_transaction_endpoint,
        delete_transaction_endpoint, list_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::REGISTER, post(register_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint))
        .route(
            endpoints::INGEST_TRANSACTIONS,
            post(bridge_ingest_transaction_endpoint),
        )
        .route(
            endpoints::INGEST_EXPENSES,
            post(bridge_ingest_expense_endpoint),
        );

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            post(create_transaction_endpoint).get(list_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::EXPENSES,
            post(create_expense_endpoint).get(list_expenses_endpoint),
        )
        .route(endpoints::EXPENSE, delete(delete_expense_endpoint))
        .route(endpoints::DAILY_SUMMARY, get(daily_summary_endpoint))
        .route(endpoints::PERIOD_SUMMARY, get(period_summary_endpoint))
        .route(endpoints::CLEAR_DEBT, post(clear_debt_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Report that the server is up.
async fn get_health() -> Json<serde_json::Value> {
    Json(json!({"status": "healthy"}))
}

/// The JSON body served for unknown routes.
async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "not found"})),
    )
        .into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState, authenticity::IngestMode, build_router, endpoints, password::PasswordHash,
        user::create_user,
    };

    fn get_test_server(bridge_user: bool) -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(
            conn,
            "token secret",
            "ingest secret",
            IngestMode::Strict,
            None,
        )
        .unwrap();
        let state = if bridge_user {
            let user = {
                let connection = state.db_connection.lock().unwrap();
                create_user(
                    "driver@example.com",
                    PasswordHash::new_unchecked("hunter22"),
                    &connection,
                )
                .unwrap()
            };
            AppState {
                bridge_user_id: Some(user.id),
                ..state
            }
        } else {
            state
        };

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn health_route_is_unprotected() {
        let server = get_test_server(false);

        let response = server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthorized() {
        let server = get_test_server(false);

        let response = server.get(endpoints::TRANSACTIONS).await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn unknown_route_gets_json_not_found() {
        let server = get_test_server(false);

        let response = server.get("/api/unknown/").await;

        response.assert_status_not_found();
        response.assert_json(&json!({"error": "not found"}));
    }

    #[tokio::test]
    async fn register_log_in_and_list_transactions() {
        let server = get_test_server(false);

        server
            .post(endpoints::REGISTER)
            .json(&json!({
                "email": "driver@example.com",
                "password": "hunter22",
                "password2": "hunter22",
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let log_in_response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "driver@example.com",
                "password": "hunter22",
            }))
            .await;
        log_in_response.assert_status_ok();
        let token = log_in_response.json::<serde_json::Value>()["token"]
            .as_str()
            .unwrap()
            .to_owned();

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!([]));
    }

    #[tokio::test]
    async fn bridge_ingest_route_is_reachable_without_token() {
        let server = get_test_server(true);

        let response = server
            .post(endpoints::INGEST_TRANSACTIONS)
            .json(&json!({
                "tx_ref": "MP1234",
                "amount_received": 110.0,
                "rider_profit": 110.0,
                "platform": "YANGO",
            }))
            .await;

        // No tag, so the request is rejected on authenticity rather than auth.
        response.assert_status_forbidden();
    }
}
