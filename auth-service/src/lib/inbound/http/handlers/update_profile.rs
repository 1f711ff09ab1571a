use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::signup::non_empty;
use super::ApiError;
use super::ApiSuccess;
use super::UserResponseData;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::ports::AuthServicePort;
use crate::domain::validation::sanitize;
use crate::domain::validation::FieldSource;
use crate::domain::validation::FieldValidator;
use crate::domain::validation::FieldValue;
use crate::domain::validation::Rule;
use crate::domain::validation::ValidationErrors;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn update_profile<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<ApiSuccess<UserResponseData>, ApiError> {
    let Json(body) =
        body.map_err(|e| ApiError::malformed_body("update user's profile", e))?;

    state
        .auth_service
        .update_profile(&user.id, body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, "Profile updated successfully", user.into()))
}

/// HTTP request body for a partial profile update (raw JSON)
///
/// Empty strings mean "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileRequest {
    full_name: String,
    country_code: String,
    phone: String,
    city: String,
    profile_image: String,
    #[serde(rename = "linkedInUrl")]
    linkedin_url: String,
    university: String,
    major: String,
    graduation_year: String,
    interests: Vec<String>,
    bio: String,
    company_name: String,
    company_location: String,
    industry: String,
    description: String,
}

impl UpdateProfileRequest {
    fn sanitized(self) -> Self {
        Self {
            full_name: sanitize(&self.full_name),
            country_code: self.country_code.trim().to_uppercase(),
            phone: sanitize(&self.phone),
            city: sanitize(&self.city),
            profile_image: self.profile_image.trim().to_string(),
            linkedin_url: self.linkedin_url.trim().to_string(),
            university: sanitize(&self.university),
            major: sanitize(&self.major),
            graduation_year: sanitize(&self.graduation_year),
            interests: self.interests.iter().map(|i| sanitize(i)).collect(),
            bio: sanitize(&self.bio),
            company_name: sanitize(&self.company_name),
            company_location: sanitize(&self.company_location),
            industry: sanitize(&self.industry),
            description: sanitize(&self.description),
        }
    }

    fn try_into_command(self) -> Result<UpdateProfileCommand, ValidationErrors> {
        let body = self.sanitized();

        FieldValidator::new()
            .field("fullName", [Rule::MinLen(2), Rule::MaxLen(100)])
            .field("phone", [Rule::Numeric])
            .field("city", [Rule::MinLen(2), Rule::MaxLen(50)])
            .field("profileImage", [Rule::Url])
            .field("linkedInUrl", [Rule::Url])
            .field("university", [Rule::MinLen(2), Rule::MaxLen(100)])
            .field("major", [Rule::MinLen(2), Rule::MaxLen(50)])
            .field("bio", [Rule::MinLen(30), Rule::MaxLen(500)])
            .field("description", [Rule::MaxLen(1000)])
            .validate(&body)?;

        Ok(UpdateProfileCommand {
            full_name: non_empty(body.full_name),
            country_code: non_empty(body.country_code),
            phone: non_empty(body.phone),
            city: non_empty(body.city),
            profile_image: non_empty(body.profile_image),
            linkedin_url: non_empty(body.linkedin_url),
            university: non_empty(body.university),
            major: non_empty(body.major),
            graduation_year: non_empty(body.graduation_year),
            interests: Some(body.interests).filter(|i| !i.is_empty()),
            bio: non_empty(body.bio),
            company_name: non_empty(body.company_name),
            company_location: non_empty(body.company_location),
            industry: non_empty(body.industry),
            description: non_empty(body.description),
        })
    }
}

impl FieldSource for UpdateProfileRequest {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let text = match name {
            "fullName" => &self.full_name,
            "countryCode" => &self.country_code,
            "phone" => &self.phone,
            "city" => &self.city,
            "profileImage" => &self.profile_image,
            "linkedInUrl" => &self.linkedin_url,
            "university" => &self.university,
            "major" => &self.major,
            "graduationYear" => &self.graduation_year,
            "interests" => return Some(FieldValue::List(&self.interests)),
            "bio" => &self.bio,
            "companyName" => &self.company_name,
            "companyLocation" => &self.company_location,
            "industry" => &self.industry,
            "description" => &self.description,
            _ => return None,
        };
        Some(FieldValue::Text(text))
    }
}
