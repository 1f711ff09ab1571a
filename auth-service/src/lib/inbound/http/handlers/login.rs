use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::domain::user::models::AuthenticatedSession;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::ports::AuthServicePort;
use crate::domain::validation::sanitize_lowercase;
use crate::domain::validation::FieldSource;
use crate::domain::validation::FieldValidator;
use crate::domain::validation::FieldValue;
use crate::domain::validation::Rule;
use crate::domain::validation::ValidationErrors;
use crate::inbound::http::router::AppState;

pub async fn login<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::malformed_body("login", e))?;

    state
        .auth_service
        .login(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|session| {
            ApiSuccess::new(StatusCode::OK, "User logged in successfully", session.into())
        })
}

/// HTTP request body for login (raw JSON)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    email: String,
    password: String,
}

impl LoginRequest {
    fn try_into_command(self) -> Result<LoginCommand, ValidationErrors> {
        let body = LoginRequest {
            email: sanitize_lowercase(&self.email),
            password: self.password,
        };

        FieldValidator::new()
            .field("email", [Rule::Required, Rule::Email])
            .field("password", [Rule::Required, Rule::MinLen(8)])
            .validate(&body)?;

        let email = EmailAddress::new(&body.email).map_err(|_| {
            let mut errors = ValidationErrors::new();
            errors.insert("email", "Please provide a valid email address");
            errors
        })?;

        Ok(LoginCommand {
            email,
            password: body.password,
        })
    }
}

impl FieldSource for LoginRequest {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "email" => Some(FieldValue::Text(&self.email)),
            "password" => Some(FieldValue::Text(&self.password)),
            _ => None,
        }
    }
}

impl From<AuthenticatedSession> for SessionResponseData {
    fn from(session: AuthenticatedSession) -> Self {
        Self {
            user: (&session.user).into(),
            access_token: session.access_token,
            refresh_token: session.refresh_token,
        }
    }
}
