use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::models::CompanyFields;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::RoleKind;
use crate::domain::user::models::SignupCommand;
use crate::domain::user::models::User;
use crate::domain::user::ports::AuthServicePort;
use crate::domain::validation::sanitize;
use crate::domain::validation::sanitize_lowercase;
use crate::domain::validation::FieldSource;
use crate::domain::validation::FieldValidator;
use crate::domain::validation::FieldValue;
use crate::domain::validation::Rule;
use crate::domain::validation::ValidationErrors;
use crate::inbound::http::router::AppState;

pub async fn signup<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<ApiSuccess<SignupResponseData>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::malformed_body("signup", e))?;

    state
        .auth_service
        .signup(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref user| {
            ApiSuccess::new(
                StatusCode::CREATED,
                "User registered successfully. Please check your email to verify your account.",
                user.into(),
            )
        })
}

/// HTTP request body for signup (raw JSON)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    full_name: String,
    email: String,
    password: String,
    confirm_password: String,
    role: String,
    country_code: String,
    phone: String,
    city: String,
    university: String,
    #[serde(rename = "linkedInUrl")]
    linkedin_url: String,
    major: String,
    graduation_year: String,
    interests: Vec<String>,
    company_name: String,
    company_email: String,
    company_location: String,
    industry: String,
    description: String,
}

impl SignupRequest {
    /// Passwords are compared as typed and never rewritten.
    fn sanitized(self) -> Self {
        let role = self.role.trim().to_lowercase();
        Self {
            full_name: sanitize(&self.full_name),
            email: sanitize_lowercase(&self.email),
            role: if role.is_empty() {
                RoleKind::default().to_string()
            } else {
                role
            },
            country_code: self.country_code.trim().to_uppercase(),
            phone: sanitize(&self.phone),
            city: sanitize(&self.city),
            university: sanitize(&self.university),
            linkedin_url: self.linkedin_url.trim().to_string(),
            major: sanitize(&self.major),
            graduation_year: sanitize(&self.graduation_year),
            interests: self.interests.iter().map(|i| sanitize(i)).collect(),
            company_name: sanitize(&self.company_name),
            company_email: sanitize_lowercase(&self.company_email),
            company_location: sanitize(&self.company_location),
            industry: sanitize(&self.industry),
            description: sanitize(&self.description),
            ..self
        }
    }

    fn validator(&self) -> FieldValidator {
        // University and major only mean something for students.
        let academic_required = self.role == RoleKind::Student.as_str();
        let academic = |min: usize, max: usize| {
            let mut rules = vec![Rule::MinLen(min), Rule::MaxLen(max)];
            if academic_required {
                rules.insert(0, Rule::Required);
            }
            rules
        };

        FieldValidator::new()
            .field("fullName", [Rule::Required, Rule::MinLen(2), Rule::MaxLen(100)])
            .field("email", [Rule::Required, Rule::Email])
            .field("password", [Rule::Required, Rule::MinLen(8)])
            .field(
                "confirmPassword",
                [Rule::Required, Rule::EqualsField("password")],
            )
            .field("role", [Rule::Role])
            .field("countryCode", [Rule::Required])
            .field("phone", [Rule::Required, Rule::Numeric])
            .field("city", [Rule::Required, Rule::MinLen(2), Rule::MaxLen(50)])
            .field("university", academic(2, 100))
            .field("linkedInUrl", [Rule::Url])
            .field("major", academic(2, 50))
            .field("companyEmail", [Rule::Email])
            .field("description", [Rule::MaxLen(1000)])
    }

    fn try_into_command(self) -> Result<SignupCommand, ValidationErrors> {
        let body = self.sanitized();
        body.validator().validate(&body)?;

        let mut errors = ValidationErrors::new();
        let email = EmailAddress::new(&body.email)
            .map_err(|_| errors.insert("email", "Please provide a valid email address"))
            .ok();
        let role = body
            .role
            .parse::<RoleKind>()
            .map_err(|_| errors.insert("role", "Invalid role specified"))
            .ok();

        let (Some(email), Some(role)) = (email, role) else {
            return Err(errors);
        };

        Ok(SignupCommand {
            full_name: body.full_name,
            email,
            password: body.password,
            confirm_password: body.confirm_password,
            role,
            country_code: body.country_code,
            phone: body.phone,
            city: body.city,
            university: body.university,
            major: body.major,
            linkedin_url: non_empty(body.linkedin_url),
            graduation_year: non_empty(body.graduation_year),
            interests: body.interests,
            company: CompanyFields {
                company_name: body.company_name,
                company_email: body.company_email,
                company_location: body.company_location,
                industry: body.industry,
                description: non_empty(body.description),
            },
        })
    }
}

impl FieldSource for SignupRequest {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let text = match name {
            "fullName" => &self.full_name,
            "email" => &self.email,
            "password" => &self.password,
            "confirmPassword" => &self.confirm_password,
            "role" => &self.role,
            "countryCode" => &self.country_code,
            "phone" => &self.phone,
            "city" => &self.city,
            "university" => &self.university,
            "linkedInUrl" => &self.linkedin_url,
            "major" => &self.major,
            "graduationYear" => &self.graduation_year,
            "interests" => return Some(FieldValue::List(&self.interests)),
            "companyName" => &self.company_name,
            "companyEmail" => &self.company_email,
            "companyLocation" => &self.company_location,
            "industry" => &self.industry,
            "description" => &self.description,
            _ => return None,
        };
        Some(FieldValue::Text(text))
    }
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Non-sensitive view returned right after signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupUserData {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub is_email_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupResponseData {
    pub user: SignupUserData,
}

impl From<&User> for SignupResponseData {
    fn from(user: &User) -> Self {
        Self {
            user: SignupUserData {
                id: user.id.to_string(),
                full_name: user.profile.full_name.clone(),
                email: user.email.to_string(),
                role: user.role.kind().to_string(),
                is_email_verified: user.is_email_verified,
            },
        }
    }
}
