use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::validation::ValidationErrors;
use crate::user::errors::AuthError;

pub mod change_password;
pub mod login;
pub mod me;
pub mod signup;
pub mod update_profile;
pub mod verify_email;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(message, Some(data))))
    }
}

impl ApiSuccess<()> {
    /// Success carrying only a message.
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(message, None)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Validation(ValidationErrors),
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    /// Real cause and debug rendering; clients only ever see a generic message.
    Internal { error: String, stack: String },
}

impl ApiError {
    /// Body that could not be read as JSON for `operation`.
    pub fn malformed_body(operation: &str, rejection: JsonRejection) -> Self {
        tracing::debug!(operation, error = %rejection, "Malformed request body");
        ApiError::BadRequest(format!("Error while parsing {} request body", operation))
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal {
            error: e.to_string(),
            stack: format!("{:?}", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (body, error, stack) = match self {
            ApiError::Validation(errors) => {
                let body = ApiResponseBody::new_error("Validation Error", Some(errors));
                let error = body.message.clone();
                (body, error, None)
            }
            ApiError::BadRequest(message)
            | ApiError::Unauthorized(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => {
                (ApiResponseBody::new_error(message.clone(), None), message, None)
            }
            ApiError::Internal { error, stack } => (
                ApiResponseBody::new_error("Internal Server Error", None),
                error,
                Some(stack),
            ),
        };

        tracing::debug!(status = status.as_u16(), message = %body.message, "Request failed");

        let verbose = ErrorDetails(body.clone().with_details(error, stack));
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(verbose);
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => ApiError::Validation(errors),
            AuthError::Rejected(message) => ApiError::BadRequest(message),
            AuthError::InvalidVerificationToken => ApiError::BadRequest(err.to_string()),
            AuthError::EmailAlreadyExists(_) => ApiError::Conflict(err.to_string()),
            AuthError::UnknownReference(_) | AuthError::NotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::EmailNotVerified
            | AuthError::Unauthenticated(_)
            | AuthError::WrongPassword => ApiError::Unauthorized(err.to_string()),
            AuthError::Timeout(_)
            | AuthError::DatabaseError(_)
            | AuthError::Password(_)
            | AuthError::Signing(_)
            | AuthError::Entropy(_)
            | AuthError::Unknown(_) => {
                tracing::error!(error = %err, "Internal error");
                ApiError::Internal {
                    error: err.to_string(),
                    stack: format!("{:?}", err),
                }
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            errors: None,
            error: None,
            stack: None,
        }
    }
}

impl ApiResponseBody<()> {
    pub fn new_error(message: impl Into<String>, errors: Option<ValidationErrors>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: errors.map(|e| e.as_map().clone()),
            error: None,
            stack: None,
        }
    }

    fn with_details(mut self, error: String, stack: Option<String>) -> Self {
        self.error = Some(error);
        self.stack = stack;
        self
    }
}

/// Error envelope with `error` and `stack` filled in, attached to every
/// error response and rendered only in development mode.
#[derive(Debug, Clone)]
pub struct ErrorDetails(pub ApiResponseBody<()>);

/// Public profile projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub phone: String,
    pub city: String,
    pub is_email_verified: bool,
    pub is_active: bool,
    pub is_profile_complete: bool,
    pub profile_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub role_profile: Option<RoleProfileData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RoleProfileData {
    Student(StudentData),
    Company(CompanyData),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentData {
    #[serde(rename = "linkedInUrl")]
    pub linkedin_url: String,
    pub university: String,
    pub major: String,
    pub graduation_year: String,
    pub interests: Vec<String>,
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyData {
    pub company_name: String,
    pub company_email: String,
    pub company_location: String,
    pub industry: String,
    pub description: String,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        let role_profile = match &user.role {
            Role::Student(student) => Some(RoleProfileData::Student(StudentData {
                linkedin_url: student.linkedin_url.clone().unwrap_or_default(),
                university: student.university.clone(),
                major: student.major.clone(),
                graduation_year: student.graduation_year.clone().unwrap_or_default(),
                interests: student.interests.clone(),
                bio: user.profile.bio.clone().unwrap_or_default(),
            })),
            Role::Company(company) => Some(RoleProfileData::Company(CompanyData {
                company_name: company.company_name.clone(),
                company_email: company.company_email.clone(),
                company_location: company.company_location.clone(),
                industry: company.industry.clone(),
                description: company.description.clone().unwrap_or_default(),
            })),
            Role::Admin => None,
        };

        Self {
            id: user.id.to_string(),
            full_name: user.profile.full_name.clone(),
            email: user.email.to_string(),
            role: user.role.kind().to_string(),
            phone: user.profile.phone.clone(),
            city: user.profile.city.clone(),
            is_email_verified: user.is_email_verified,
            is_active: user.is_active,
            is_profile_complete: user.is_profile_complete,
            profile_image: user.profile.profile_image.clone().unwrap_or_default(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            role_profile,
        }
    }
}

/// `{user}` payload of the profile endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponseData {
    pub user: UserData,
}

impl From<&User> for UserResponseData {
    fn from(user: &User) -> Self {
        Self { user: user.into() }
    }
}

/// `{user, accessToken, refreshToken?}` payload of login and verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponseData {
    pub user: UserData,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}
