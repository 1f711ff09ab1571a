use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::user::errors::EmailError;
use crate::user::errors::RoleError;
use crate::user::errors::UserIdError;

/// User aggregate entity.
///
/// Mutated only through the signup, login, verification and profile flows.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub profile: Profile,
    pub role: Role,
    pub is_email_verified: bool,
    /// Present only while the address is unverified.
    pub email_verification: Option<VerificationToken>,
    pub refresh_session: Option<RefreshSession>,
    pub is_active: bool,
    pub is_profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether every field the role makes mandatory is filled in.
    pub fn profile_is_complete(&self) -> bool {
        let base = !self.profile.full_name.is_empty()
            && !self.profile.phone.is_empty()
            && !self.profile.city.is_empty()
            && filled(&self.profile.profile_image);

        base && match &self.role {
            Role::Student(student) => student.is_complete() && filled(&self.profile.bio),
            Role::Company(company) => company.is_complete(),
            Role::Admin => true,
        }
    }

    /// Recompute the derived completeness flag after a mutation.
    pub fn refresh_profile_completeness(&mut self) {
        self.is_profile_complete = self.profile_is_complete();
    }
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Contact and presentation fields shared by every role.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
    pub full_name: String,
    pub phone: String,
    pub city: String,
    pub profile_image: Option<String>,
    pub bio: Option<String>,
}

/// Role with the fields that only make sense for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Student(StudentProfile),
    Company(CompanyProfile),
    Admin,
}

impl Role {
    pub fn kind(&self) -> RoleKind {
        match self {
            Role::Student(_) => RoleKind::Student,
            Role::Company(_) => RoleKind::Company,
            Role::Admin => RoleKind::Admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudentProfile {
    pub university: String,
    pub major: String,
    pub graduation_year: Option<String>,
    pub interests: Vec<String>,
    pub linkedin_url: Option<String>,
}

impl StudentProfile {
    fn is_complete(&self) -> bool {
        !self.university.is_empty()
            && !self.major.is_empty()
            && filled(&self.graduation_year)
            && !self.interests.is_empty()
            && filled(&self.linkedin_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompanyProfile {
    pub company_name: String,
    pub company_email: String,
    pub company_location: String,
    pub industry: String,
    pub description: Option<String>,
}

impl CompanyProfile {
    fn is_complete(&self) -> bool {
        !self.company_name.is_empty()
            && !self.company_email.is_empty()
            && !self.company_location.is_empty()
            && !self.industry.is_empty()
            && filled(&self.description)
    }
}

/// Role discriminant without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    Student,
    Company,
    Admin,
}

impl RoleKind {
    pub const ALL: [RoleKind; 3] = [RoleKind::Student, RoleKind::Company, RoleKind::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Student => "student",
            RoleKind::Company => "company",
            RoleKind::Admin => "admin",
        }
    }
}

impl Default for RoleKind {
    fn default() -> Self {
        RoleKind::Student
    }
}

impl FromStr for RoleKind {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RoleError::Unknown(s.to_string()))
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pending email verification secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationToken {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Stored half of a refresh token. Never holds the plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSession {
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Case-folded to lowercase on construction, so equality is
/// case-insensitive. Format checked with an RFC 5322 parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: &str) -> Result<Self, EmailError> {
        let email = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validated signup input.
#[derive(Debug, Clone)]
pub struct SignupCommand {
    pub full_name: String,
    pub email: EmailAddress,
    pub password: String,
    pub confirm_password: String,
    pub role: RoleKind,
    pub country_code: String,
    pub phone: String,
    pub city: String,
    pub university: String,
    pub major: String,
    pub linkedin_url: Option<String>,
    pub graduation_year: Option<String>,
    pub interests: Vec<String>,
    pub company: CompanyFields,
}

/// Company fields as submitted; required only for the company role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFields {
    pub company_name: String,
    pub company_email: String,
    pub company_location: String,
    pub industry: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub email: EmailAddress,
    pub password: String,
}

/// Partial profile update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileCommand {
    pub full_name: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub profile_image: Option<String>,
    pub linkedin_url: Option<String>,
    pub university: Option<String>,
    pub major: Option<String>,
    pub graduation_year: Option<String>,
    pub interests: Option<Vec<String>>,
    pub bio: Option<String>,
    pub company_name: Option<String>,
    pub company_location: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: String,
}

/// Outcome of a successful login or email verification.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub user: User,
    pub access_token: String,
    /// Present only when the refresh token was rotated.
    pub refresh_token: Option<String>,
}

/// Message handed to the email sender after signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationEmail {
    pub to: EmailAddress,
    pub full_name: String,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            email: EmailAddress::new("student@example.com").unwrap(),
            password_hash: "$argon2id$stub".to_string(),
            profile: Profile {
                full_name: "Sara Haddad".to_string(),
                phone: "+12015550123".to_string(),
                city: "Ramallah".to_string(),
                profile_image: Some("https://cdn.example.com/sara.png".to_string()),
                bio: Some("Final-year student who enjoys distributed systems.".to_string()),
            },
            role: Role::Student(StudentProfile {
                university: "Birzeit University".to_string(),
                major: "Computer Science".to_string(),
                graduation_year: Some("2026".to_string()),
                interests: vec!["ai".to_string()],
                linkedin_url: Some("https://linkedin.com/in/sara".to_string()),
            }),
            is_email_verified: true,
            email_verification: None,
            refresh_session: None,
            is_active: true,
            is_profile_complete: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_email_is_case_folded() {
        let upper = EmailAddress::new("  Alice@Example.COM ").unwrap();
        let lower = EmailAddress::new("alice@example.com").unwrap();

        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), "alice@example.com");
    }

    #[test]
    fn test_email_rejects_garbage() {
        assert!(EmailAddress::new("not-an-email").is_err());
    }

    #[test]
    fn test_role_kind_round_trip() {
        for kind in RoleKind::ALL {
            assert_eq!(kind.as_str().parse::<RoleKind>().unwrap(), kind);
        }
        assert!("superuser".parse::<RoleKind>().is_err());
    }

    #[test]
    fn test_student_profile_completeness() {
        let mut user = student();
        user.refresh_profile_completeness();
        assert!(user.is_profile_complete);

        if let Role::Student(ref mut profile) = user.role {
            profile.interests.clear();
        }
        user.refresh_profile_completeness();
        assert!(!user.is_profile_complete);
    }

    #[test]
    fn test_company_profile_completeness_requires_description() {
        let mut user = student();
        user.role = Role::Company(CompanyProfile {
            company_name: "Acme".to_string(),
            company_email: "hr@acme.io".to_string(),
            company_location: "Nablus".to_string(),
            industry: "Software".to_string(),
            description: None,
        });
        assert!(!user.profile_is_complete());

        if let Role::Company(ref mut company) = user.role {
            company.description = Some("We build things.".to_string());
        }
        assert!(user.profile_is_complete());
    }

    #[test]
    fn test_admin_needs_only_base_fields() {
        let mut user = student();
        user.role = Role::Admin;
        assert!(user.profile_is_complete());

        user.profile.profile_image = None;
        assert!(!user.profile_is_complete());
    }

    #[test]
    fn test_verification_token_liveness() {
        let now = Utc::now();
        let token = VerificationToken {
            token: "abc".to_string(),
            expires_at: now,
        };
        assert!(!token.is_live(now));
        assert!(token.is_live(now - chrono::Duration::seconds(1)));
    }
}
