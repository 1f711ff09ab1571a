use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::CompanyProfile;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Profile;
use crate::domain::user::models::RefreshSession;
use crate::domain::user::models::Role;
use crate::domain::user::models::RoleKind;
use crate::domain::user::models::StudentProfile;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::VerificationToken;
use crate::domain::user::ports::CredentialStore;
use crate::user::errors::AuthError;

const USER_COLUMNS: &str = r#"
    id, email, password_hash, full_name, phone, city, profile_image, bio, role,
    university, major, graduation_year, interests, linkedin_url,
    company_name, company_email, company_location, industry, description,
    is_email_verified, email_verification_token, email_verification_expires_at,
    refresh_token_hash, refresh_token_expires_at,
    is_active, is_profile_complete, created_at, updated_at
"#;

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One row of `users`, role-specific columns flattened.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    full_name: String,
    phone: String,
    city: String,
    profile_image: Option<String>,
    bio: Option<String>,
    role: String,
    university: Option<String>,
    major: Option<String>,
    graduation_year: Option<String>,
    interests: Vec<String>,
    linkedin_url: Option<String>,
    company_name: Option<String>,
    company_email: Option<String>,
    company_location: Option<String>,
    industry: Option<String>,
    description: Option<String>,
    is_email_verified: bool,
    email_verification_token: Option<String>,
    email_verification_expires_at: Option<DateTime<Utc>>,
    refresh_token_hash: Option<String>,
    refresh_token_expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    is_profile_complete: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = move |e: &dyn std::fmt::Display| {
            AuthError::DatabaseError(format!("corrupt user row {}: {}", id, e))
        };

        let kind: RoleKind = row.role.parse().map_err(|e| corrupt(&e))?;

        let role = match kind {
            RoleKind::Student => Role::Student(StudentProfile {
                university: row.university.unwrap_or_default(),
                major: row.major.unwrap_or_default(),
                graduation_year: row.graduation_year,
                interests: row.interests,
                linkedin_url: row.linkedin_url,
            }),
            RoleKind::Company => Role::Company(CompanyProfile {
                company_name: row.company_name.unwrap_or_default(),
                company_email: row.company_email.unwrap_or_default(),
                company_location: row.company_location.unwrap_or_default(),
                industry: row.industry.unwrap_or_default(),
                description: row.description,
            }),
            RoleKind::Admin => Role::Admin,
        };

        let email_verification = match (
            row.email_verification_token,
            row.email_verification_expires_at,
        ) {
            (Some(token), Some(expires_at)) => Some(VerificationToken { token, expires_at }),
            _ => None,
        };
        let refresh_session = match (row.refresh_token_hash, row.refresh_token_expires_at) {
            (Some(token_hash), Some(expires_at)) => Some(RefreshSession {
                token_hash,
                expires_at,
            }),
            _ => None,
        };

        Ok(User {
            id: UserId(row.id),
            email: EmailAddress::new(&row.email).map_err(|e| corrupt(&e))?,
            password_hash: row.password_hash,
            profile: Profile {
                full_name: row.full_name,
                phone: row.phone,
                city: row.city,
                profile_image: row.profile_image,
                bio: row.bio,
            },
            role,
            is_email_verified: row.is_email_verified,
            email_verification,
            refresh_session,
            is_active: row.is_active,
            is_profile_complete: row.is_profile_complete,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn database_error(e: sqlx::Error) -> AuthError {
    AuthError::DatabaseError(e.to_string())
}

fn student(user: &User) -> Option<&StudentProfile> {
    match &user.role {
        Role::Student(student) => Some(student),
        _ => None,
    }
}

fn company(user: &User) -> Option<&CompanyProfile> {
    match &user.role {
        Role::Company(company) => Some(company),
        _ => None,
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn insert(&self, user: User) -> Result<User, AuthError> {
        let student = student(&user);
        let company = company(&user);

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, password_hash, full_name, phone, city, profile_image, bio, role,
                university, major, graduation_year, interests, linkedin_url,
                company_name, company_email, company_location, industry, description,
                is_email_verified, email_verification_token, email_verification_expires_at,
                refresh_token_hash, refresh_token_expires_at,
                is_active, is_profile_complete, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9,
                $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19,
                $20, $21, $22,
                $23, $24,
                $25, $26, $27, $28
            )
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(&user.profile.full_name)
        .bind(&user.profile.phone)
        .bind(&user.profile.city)
        .bind(&user.profile.profile_image)
        .bind(&user.profile.bio)
        .bind(user.role.kind().as_str())
        .bind(student.map(|s| s.university.as_str()))
        .bind(student.map(|s| s.major.as_str()))
        .bind(student.and_then(|s| s.graduation_year.as_deref()))
        .bind(student.map(|s| s.interests.clone()).unwrap_or_default())
        .bind(student.and_then(|s| s.linkedin_url.as_deref()))
        .bind(company.map(|c| c.company_name.as_str()))
        .bind(company.map(|c| c.company_email.as_str()))
        .bind(company.map(|c| c.company_location.as_str()))
        .bind(company.map(|c| c.industry.as_str()))
        .bind(company.and_then(|c| c.description.as_deref()))
        .bind(user.is_email_verified)
        .bind(user.email_verification.as_ref().map(|v| v.token.as_str()))
        .bind(user.email_verification.as_ref().map(|v| v.expires_at))
        .bind(user.refresh_session.as_ref().map(|r| r.token_hash.as_str()))
        .bind(user.refresh_session.as_ref().map(|r| r.expires_at))
        .bind(user.is_active)
        .bind(user.is_profile_complete)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
                    return AuthError::EmailAlreadyExists(user.email.as_str().to_string());
                }
            }
            database_error(e)
        })?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, UserRow>(&query)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError> {
        let query = format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&query)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AuthError> {
        // Match and clear in one statement so a token is redeemed at most once.
        let query = format!(
            r#"
            UPDATE users
            SET is_email_verified = TRUE,
                email_verification_token = NULL,
                email_verification_expires_at = NULL,
                updated_at = $2
            WHERE email_verification_token = $1
              AND email_verification_expires_at > $2
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&query)
            .bind(token)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn swap_refresh_session(
        &self,
        id: &UserId,
        expected: Option<RefreshSession>,
        next: RefreshSession,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $2,
                refresh_token_expires_at = $3,
                updated_at = now()
            WHERE id = $1
              AND refresh_token_hash IS NOT DISTINCT FROM $4::text
            "#,
        )
        .bind(id.0)
        .bind(&next.token_hash)
        .bind(next.expires_at)
        .bind(expected.map(|session| session.token_hash))
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_profile(&self, user: User) -> Result<User, AuthError> {
        let student = student(&user);
        let company = company(&user);

        let result = sqlx::query(
            r#"
            UPDATE users
            SET full_name = $2,
                phone = $3,
                city = $4,
                profile_image = $5,
                bio = $6,
                university = $7,
                major = $8,
                graduation_year = $9,
                interests = $10,
                linkedin_url = $11,
                company_name = $12,
                company_location = $13,
                industry = $14,
                description = $15,
                is_profile_complete = $16,
                updated_at = $17
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(&user.profile.full_name)
        .bind(&user.profile.phone)
        .bind(&user.profile.city)
        .bind(&user.profile.profile_image)
        .bind(&user.profile.bio)
        .bind(student.map(|s| s.university.as_str()))
        .bind(student.map(|s| s.major.as_str()))
        .bind(student.and_then(|s| s.graduation_year.as_deref()))
        .bind(student.map(|s| s.interests.clone()).unwrap_or_default())
        .bind(student.and_then(|s| s.linkedin_url.as_deref()))
        .bind(company.map(|c| c.company_name.as_str()))
        .bind(company.map(|c| c.company_location.as_str()))
        .bind(company.map(|c| c.industry.as_str()))
        .bind(company.and_then(|c| c.description.as_deref()))
        .bind(user.is_profile_complete)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
