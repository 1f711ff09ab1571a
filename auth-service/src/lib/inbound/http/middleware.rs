use axum::extract::Request;
use axum::extract::State;
use axum::http;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;

use super::handlers::ApiError;
use super::handlers::ErrorDetails;
use crate::domain::user::models::User;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

/// Extension type to store the resolved caller in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Middleware that resolves the bearer token to a user and adds it to request extensions
pub async fn authenticate<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    // Non-ASCII header values are treated like a missing header
    let header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let user = state
        .auth_service
        .authenticate(header.as_deref())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, uri = %req.uri(), "Bearer authentication failed");
            ApiError::from(e).into_response()
        })?;

    req.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(req).await)
}

/// In development, replace error bodies with their verbose form carrying
/// `error` and `stack`.
pub async fn expose_error_details<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;

    if !state.dev_mode {
        return response;
    }

    match response.extensions_mut().remove::<ErrorDetails>() {
        Some(ErrorDetails(body)) => (response.status(), Json(body)).into_response(),
        None => response,
    }
}
