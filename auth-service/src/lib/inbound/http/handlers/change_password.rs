use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::ports::AuthServicePort;
use crate::domain::validation::FieldSource;
use crate::domain::validation::FieldValidator;
use crate::domain::validation::FieldValue;
use crate::domain::validation::Rule;
use crate::domain::validation::ValidationErrors;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn change_password<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<ApiSuccess<()>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::malformed_body("change password", e))?;

    state
        .auth_service
        .change_password(&user.id, body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|_| ApiSuccess::message(StatusCode::OK, "Password changed successfully"))
}

/// HTTP request body for a password change (raw JSON)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
    confirm_new_password: String,
}

impl ChangePasswordRequest {
    fn try_into_command(self) -> Result<ChangePasswordCommand, ValidationErrors> {
        FieldValidator::new()
            .field("currentPassword", [Rule::Required])
            .field("newPassword", [Rule::Required, Rule::Password])
            .field(
                "confirmNewPassword",
                [Rule::Required, Rule::EqualsField("newPassword")],
            )
            .validate(&self)?;

        Ok(ChangePasswordCommand {
            current_password: self.current_password,
            new_password: self.new_password,
        })
    }
}

impl FieldSource for ChangePasswordRequest {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "currentPassword" => Some(FieldValue::Text(&self.current_password)),
            "newPassword" => Some(FieldValue::Text(&self.new_password)),
            "confirmNewPassword" => Some(FieldValue::Text(&self.confirm_new_password)),
            _ => None,
        }
    }
}
