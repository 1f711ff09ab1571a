use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenIssuer;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::deadline::StoreDeadline;
use crate::domain::user::models::AuthenticatedSession;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::CompanyProfile;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::Profile;
use crate::domain::user::models::Role;
use crate::domain::user::models::RoleKind;
use crate::domain::user::models::SignupCommand;
use crate::domain::user::models::StudentProfile;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::VerificationEmail;
use crate::domain::user::rotation::RefreshRotationPolicy;
use crate::domain::user::rotation::Rotation;
use crate::domain::user::session::SessionAuthenticator;
use crate::domain::user::verification::EmailVerificationFlow;
use crate::domain::validation::checks;
use crate::user::errors::AuthError;
use crate::user::ports::AuthServicePort;
use crate::user::ports::CredentialStore;
use crate::user::ports::EmailSender;
use crate::user::ports::ReferenceCatalog;
use crate::user::ports::ReferenceKind;

/// Tunables for [`AuthService`].
#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    pub refresh_ttl: chrono::Duration,
    pub store_deadline: std::time::Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            refresh_ttl: chrono::Duration::days(30),
            store_deadline: std::time::Duration::from_secs(10),
        }
    }
}

/// Domain service implementation for authentication flows.
///
/// Concrete implementation of AuthServicePort with dependency injection.
pub struct AuthService<CS, RC, ES>
where
    CS: CredentialStore,
    RC: ReferenceCatalog,
    ES: EmailSender,
{
    store: Arc<CS>,
    catalog: Arc<RC>,
    tokens: Arc<TokenIssuer>,
    password_hasher: PasswordHasher,
    rotation: RefreshRotationPolicy,
    verification: EmailVerificationFlow<CS, ES>,
    sessions: SessionAuthenticator<CS>,
    deadline: StoreDeadline,
}

impl<CS, RC, ES> AuthService<CS, RC, ES>
where
    CS: CredentialStore,
    RC: ReferenceCatalog,
    ES: EmailSender,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential persistence implementation
    /// * `catalog` - Reference collection lookups
    /// * `sender` - Verification email delivery
    /// * `tokens` - Access and refresh token issuer
    /// * `settings` - Refresh lifetime and store deadline
    pub fn new(
        store: Arc<CS>,
        catalog: Arc<RC>,
        sender: Arc<ES>,
        tokens: Arc<TokenIssuer>,
        settings: AuthSettings,
    ) -> Self {
        let deadline = StoreDeadline::new(settings.store_deadline);
        Self {
            verification: EmailVerificationFlow::new(Arc::clone(&store), sender, deadline),
            sessions: SessionAuthenticator::new(Arc::clone(&store), Arc::clone(&tokens), deadline),
            store,
            catalog,
            tokens,
            password_hasher: PasswordHasher::new(),
            rotation: RefreshRotationPolicy::new(settings.refresh_ttl),
            deadline,
        }
    }

    /// Replace the default-cost password hasher.
    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self
    }

    async fn load_user(&self, id: &UserId) -> Result<User, AuthError> {
        self.deadline
            .run(self.store.find_by_id(id))
            .await?
            .ok_or_else(|| AuthError::NotFound(id.to_string()))
    }

    async fn ensure_email_is_free(&self, email: &EmailAddress) -> Result<(), AuthError> {
        match self.deadline.run(self.store.find_by_email(email)).await? {
            Some(_) => Err(AuthError::EmailAlreadyExists(email.to_string())),
            None => Ok(()),
        }
    }

    async fn require_reference(&self, kind: ReferenceKind, name: &str) -> Result<(), AuthError> {
        if self.deadline.run(self.catalog.exists(kind, name)).await? {
            Ok(())
        } else {
            tracing::debug!(kind = %kind, name = %name, "Unknown reference value");
            Err(AuthError::UnknownReference(name.to_string()))
        }
    }

    async fn signup_role(&self, command: &SignupCommand) -> Result<Role, AuthError> {
        match command.role {
            RoleKind::Student => {
                self.require_reference(ReferenceKind::University, &command.university)
                    .await?;
                self.require_reference(ReferenceKind::Major, &command.major)
                    .await?;

                if let Some(year) = &command.graduation_year {
                    checks::check_year(year).map_err(AuthError::Rejected)?;
                }

                let interests = checks::dedupe_interests(command.interests.clone());
                checks::check_interests(&interests).map_err(AuthError::Rejected)?;

                Ok(Role::Student(StudentProfile {
                    university: command.university.clone(),
                    major: command.major.clone(),
                    graduation_year: command.graduation_year.clone(),
                    interests,
                    linkedin_url: command.linkedin_url.clone(),
                }))
            }
            RoleKind::Company => {
                let company = &command.company;
                if company.company_name.is_empty()
                    || company.company_email.is_empty()
                    || company.company_location.is_empty()
                    || company.industry.is_empty()
                {
                    return Err(AuthError::Rejected(
                        "Please provide all required company fields".to_string(),
                    ));
                }

                self.require_reference(ReferenceKind::Industry, &company.industry)
                    .await?;
                check_company_name(&company.company_name)?;
                check_company_location(&company.company_location)?;

                Ok(Role::Company(CompanyProfile {
                    company_name: company.company_name.clone(),
                    company_email: company.company_email.clone(),
                    company_location: company.company_location.clone(),
                    industry: company.industry.clone(),
                    description: company.description.clone(),
                }))
            }
            RoleKind::Admin => Ok(Role::Admin),
        }
    }

    /// Run the rotation policy and sign a fresh access token.
    async fn open_session(
        &self,
        mut user: User,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedSession, AuthError> {
        let refresh_token = match self.rotation.evaluate(user.refresh_session.as_ref(), now)? {
            Rotation::Keep { .. } => None,
            Rotation::Rotate { plaintext, session } => {
                let swapped = self
                    .deadline
                    .run(self.store.swap_refresh_session(
                        &user.id,
                        user.refresh_session.clone(),
                        session.clone(),
                    ))
                    .await?;

                if swapped {
                    user.refresh_session = Some(session);
                    Some(plaintext)
                } else {
                    tracing::warn!(
                        user_id = %user.id,
                        "Refresh session replaced concurrently, keeping the stored one"
                    );
                    None
                }
            }
        };

        let access_token = self.tokens.issue_access_token(
            &user.id.to_string(),
            user.email.as_str(),
            user.role.kind().as_str(),
        )?;

        Ok(AuthenticatedSession {
            user,
            access_token,
            refresh_token,
        })
    }
}

fn check_company_name(name: &str) -> Result<(), AuthError> {
    if checks::has_length(name, 2, 50) {
        Ok(())
    } else {
        Err(AuthError::Rejected(
            "Company name must be between 2 & 50 characters".to_string(),
        ))
    }
}

fn check_company_location(location: &str) -> Result<(), AuthError> {
    if checks::has_length(location, 2, 100) {
        Ok(())
    } else {
        Err(AuthError::Rejected(
            "Company location must be between 2 & 100 characters".to_string(),
        ))
    }
}

#[async_trait]
impl<CS, RC, ES> AuthServicePort for AuthService<CS, RC, ES>
where
    CS: CredentialStore,
    RC: ReferenceCatalog,
    ES: EmailSender,
{
    async fn signup(&self, command: SignupCommand) -> Result<User, AuthError> {
        self.ensure_email_is_free(&command.email).await?;

        checks::check_password_complexity(&command.password).map_err(AuthError::Rejected)?;
        if command.password != command.confirm_password {
            return Err(AuthError::Rejected("Passwords do not match".to_string()));
        }
        checks::check_phone(&command.phone, &command.country_code)
            .map_err(AuthError::Rejected)?;

        self.require_reference(ReferenceKind::City, &command.city)
            .await?;
        let role = self.signup_role(&command).await?;

        let password_hash = self.password_hasher.hash(&command.password)?;
        let now = Utc::now();
        let verification = self.verification.issue(now)?;

        let mut user = User {
            id: UserId::new(),
            email: command.email,
            password_hash,
            profile: Profile {
                full_name: command.full_name,
                phone: command.phone,
                city: command.city,
                profile_image: None,
                bio: None,
            },
            role,
            is_email_verified: false,
            email_verification: Some(verification.clone()),
            refresh_session: None,
            is_active: true,
            is_profile_complete: false,
            created_at: now,
            updated_at: now,
        };
        user.refresh_profile_completeness();

        let created = self.deadline.run(self.store.insert(user)).await?;
        tracing::info!(
            user_id = %created.id,
            role = %created.role.kind(),
            "User registered"
        );

        self.verification.dispatch_and_forget(VerificationEmail {
            to: created.email.clone(),
            full_name: created.profile.full_name.clone(),
            token: verification.token,
        });

        Ok(created)
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, AuthError> {
        let user = self
            .deadline
            .run(self.store.find_by_email(&command.email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self
            .password_hasher
            .verify(&command.password, &user.password_hash)?
        {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }
        if !user.is_email_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let session = self.open_session(user, Utc::now()).await?;
        tracing::info!(
            user_id = %session.user.id,
            refresh_rotated = session.refresh_token.is_some(),
            "User logged in"
        );
        Ok(session)
    }

    async fn verify_email(&self, token: &str) -> Result<AuthenticatedSession, AuthError> {
        let now = Utc::now();
        let user = self.verification.redeem(token, now).await?;
        tracing::info!(user_id = %user.id, "Email verified");

        self.open_session(user, now).await
    }

    async fn authenticate(&self, authorization: Option<&str>) -> Result<User, AuthError> {
        self.sessions.resolve(authorization).await
    }

    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<User, AuthError> {
        let mut user = self.load_user(id).await?;
        let mut changed = false;

        if let Some(full_name) = command.full_name {
            user.profile.full_name = full_name;
            changed = true;
        }
        if let Some(profile_image) = command.profile_image {
            user.profile.profile_image = Some(profile_image);
            changed = true;
        }
        if let (Some(phone), Some(country_code)) = (command.phone, command.country_code) {
            checks::check_phone(&phone, &country_code).map_err(AuthError::Rejected)?;
            user.profile.phone = phone;
            changed = true;
        }
        if let Some(city) = command.city {
            self.require_reference(ReferenceKind::City, &city).await?;
            user.profile.city = city;
            changed = true;
        }

        match &mut user.role {
            Role::Student(student) => {
                if let Some(university) = command.university {
                    self.require_reference(ReferenceKind::University, &university)
                        .await?;
                    student.university = university;
                    changed = true;
                }
                if let Some(major) = command.major {
                    self.require_reference(ReferenceKind::Major, &major).await?;
                    student.major = major;
                    changed = true;
                }
                if let Some(year) = command.graduation_year {
                    checks::check_year(&year).map_err(AuthError::Rejected)?;
                    student.graduation_year = Some(year);
                    changed = true;
                }
                if let Some(interests) = command.interests.filter(|i| !i.is_empty()) {
                    let interests = checks::dedupe_interests(interests);
                    checks::check_interests(&interests).map_err(AuthError::Rejected)?;
                    student.interests = interests;
                    changed = true;
                }
                if let Some(linkedin_url) = command.linkedin_url {
                    student.linkedin_url = Some(linkedin_url);
                    changed = true;
                }
                if let Some(bio) = command.bio {
                    user.profile.bio = Some(bio);
                    changed = true;
                }
            }
            Role::Company(company) => {
                if let Some(industry) = command.industry {
                    self.require_reference(ReferenceKind::Industry, &industry)
                        .await?;
                    company.industry = industry;
                    changed = true;
                }
                if let Some(name) = command.company_name {
                    check_company_name(&name)?;
                    company.company_name = name;
                    changed = true;
                }
                if let Some(location) = command.company_location {
                    check_company_location(&location)?;
                    company.company_location = location;
                    changed = true;
                }
                if let Some(description) = command.description {
                    company.description = Some(description);
                    changed = true;
                }
            }
            Role::Admin => {}
        }

        if !changed {
            return Err(AuthError::Rejected(
                "No fields provided to update".to_string(),
            ));
        }

        user.updated_at = Utc::now();
        user.refresh_profile_completeness();

        let updated = self.deadline.run(self.store.update_profile(user)).await?;
        tracing::info!(
            user_id = %updated.id,
            profile_complete = updated.is_profile_complete,
            "Profile updated"
        );
        Ok(updated)
    }

    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), AuthError> {
        let user = self.load_user(id).await?;

        if !self
            .password_hasher
            .verify(&command.current_password, &user.password_hash)?
        {
            return Err(AuthError::WrongPassword);
        }
        checks::check_password_complexity(&command.new_password).map_err(AuthError::Rejected)?;

        let password_hash = self.password_hasher.hash(&command.new_password)?;
        self.deadline
            .run(self.store.update_password(&user.id, &password_hash))
            .await?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }
}
