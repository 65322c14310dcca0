//! Authentication middleware that validates bearer tokens on protected routes.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use time::OffsetDateTime;

use crate::{AppState, Error, auth::AuthToken};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key used to sign and verify bearer tokens.
    pub token_key: Vec<u8>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_key: state.token_key.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// The user ID is placed into the request and the request executed normally
/// if the token is valid, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &())
        .await
    {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(_) => {
            tracing::debug!("rejecting request with no bearer token");
            return Error::Unauthorized.into_response();
        }
    };

    match AuthToken::verify(bearer.token(), &state.token_key, OffsetDateTime::now_utc()) {
        Ok(token) => {
            let mut request = Request::from_parts(parts, body);
            request.extensions_mut().insert(token.user_id);
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}
