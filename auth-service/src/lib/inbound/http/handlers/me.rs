use axum::http::StatusCode;
use axum::Extension;

use super::ApiSuccess;
use super::UserResponseData;
use crate::inbound::http::middleware::AuthenticatedUser;

/// Profile of the caller, as resolved by the bearer middleware.
pub async fn me(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> ApiSuccess<UserResponseData> {
    ApiSuccess::new(
        StatusCode::OK,
        "User profile provided successfully",
        (&user).into(),
    )
}
