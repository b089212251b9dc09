//! Authentication service.
//!
//! Accounts live in the backend's auth provider; each account has a profile
//! document at `users/{uid}` holding the display name and role.

mod error;

pub use error::AuthError;

use tracing::{info, instrument, warn};

use marketplace_core::{Email, UserId, UserRole};

use crate::backend::{AuthProvider, Backend, BackendError};
use crate::db::UserRepository;
use crate::models::{CurrentUser, User};

/// Minimum password length accepted by the auth provider.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication service.
pub struct AuthService<'a> {
    auth: &'a dyn AuthProvider,
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(backend: &'a Backend) -> Self {
        Self {
            auth: backend.auth.as_ref(),
            users: UserRepository::new(backend.documents.as_ref()),
        }
    }

    /// Register a new account and create its profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        role: UserRole,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AuthError::MissingDisplayName);
        }

        let account = self.auth.sign_up(email.as_str(), password).await?;
        let user = self
            .users
            .create(&UserId::new(account.uid), &email, display_name, role)
            .await?;

        info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// Log in with email and password.
    ///
    /// Accounts created outside this service may lack a profile document; one
    /// is created on first login.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        let account = self.auth.sign_in(email.as_str(), password).await?;
        let id = UserId::new(account.uid);

        let user = match self.users.get(&id).await? {
            Some(user) => {
                if account.email_verified && !user.email_verified {
                    self.users.set_email_verified(&id, true).await?;
                }
                user
            }
            None => {
                warn!(user_id = %id, "account has no profile, creating one");
                let name = email.as_str().split('@').next().unwrap_or_default().to_owned();
                self.users.create(&id, &email, &name, UserRole::Buyer).await?
            }
        };

        Ok(CurrentUser {
            id: user.id,
            email: user.email,
            role: user.role,
        })
    }

    /// Send a password-reset email.
    ///
    /// Unknown emails succeed silently so the endpoint cannot be used to probe
    /// for registered addresses.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::Provider` if the auth provider fails.
    #[instrument(skip(self))]
    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        match self.auth.send_password_reset(email.as_str()).await {
            Ok(()) | Err(BackendError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
