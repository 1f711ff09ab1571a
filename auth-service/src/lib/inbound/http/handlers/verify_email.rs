use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn verify_email<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Path(token): Path<String>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    state
        .auth_service
        .verify_email(&token)
        .await
        .map_err(ApiError::from)
        .map(|session| {
            ApiSuccess::new(
                StatusCode::OK,
                "Email verified successfully! You can now log in.",
                session.into(),
            )
        })
}

/// Route without a token segment.
pub async fn missing_token() -> ApiError {
    ApiError::BadRequest(
        "you should provide the token in the url of the request: /api/auth/verify-email/{token}"
            .to_string(),
    )
}
