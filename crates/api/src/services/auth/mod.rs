//! Account and token authentication service.
//!
//! Accounts log in with email and password once to obtain an API token;
//! every other request presents that token.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use tracing::instrument;

use bodegon_core::Email;

use crate::db::{RepositoryError, Store};
use crate::models::{NewUser, User, UserPatch};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 5;

/// Random bytes per token; hex-encoded to 40 characters.
const TOKEN_BYTES: usize = 20;

/// Profile fields a user may change on themselves.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub id_type: Option<String>,
    pub id_number: Option<String>,
}

/// Authentication service.
///
/// Handles registration, password login and token lookup.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a regular user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        self.create_account(email, password, name, false).await
    }

    /// Register a staff user.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        self.create_account(email, password, name, true).await
    }

    #[instrument(skip(self, email, password, name))]
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
        is_staff: bool,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create_user(NewUser {
                email,
                password_hash,
                name: name.trim().to_owned(),
                is_staff,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, is_staff, "User registered");
        Ok(user)
    }

    /// Exchange email and password for the user's API token.
    ///
    /// The first successful login creates the token; later logins return
    /// the same one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong
    /// or the account is inactive.
    #[instrument(skip(self, email, password))]
    pub async fn issue_token(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .store
            .get_user_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, &password_hash)?;
        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(key) = self.store.get_token(user.id).await? {
            return Ok(key);
        }

        let key = generate_token();
        match self.store.create_token(user.id, &key).await {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "API token issued");
                Ok(key)
            }
            // Lost a race with a concurrent login; use the winner's token.
            Err(RepositoryError::Conflict(_)) => self
                .store
                .get_token(user.id)
                .await?
                .ok_or(AuthError::InvalidCredentials),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a token key to its active user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for an unknown key and
    /// `AuthError::InactiveUser` for a deactivated account.
    pub async fn authenticate(&self, key: &str) -> Result<User, AuthError> {
        let user = self
            .store
            .get_user_by_token(key)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if !user.is_active {
            return Err(AuthError::InactiveUser);
        }
        Ok(user)
    }

    /// Update the acting user's own profile. A new password is re-hashed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if a new password is too short.
    #[instrument(skip(self, user, update), fields(user_id = %user.id))]
    pub async fn update_profile(&self, user: &User, update: ProfileUpdate) -> Result<User, AuthError> {
        let password_hash = match update.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let patch = UserPatch {
            name: update.name,
            password_hash,
            address: update.address,
            city: update.city,
            state: update.state,
            zip: update.zip,
            phone: update.phone,
            id_type: update.id_type,
            id_number: update.id_number,
        };
        Ok(self.store.update_user(user.id, patch).await?)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Fresh random token key, lowercase hex.
fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}
