//! Login and registration orchestration.
//!
//! Ties the record store, the password hasher, and the token service
//! together. Credential failures are deliberately indistinguishable:
//! unknown email and wrong password produce the same error, and store
//! connectivity problems stay a separate variant so they surface as 5xx
//! rather than 401.

use std::sync::Arc;
use thiserror::Error;
use tokio::task;

use crate::auth::password;
use crate::auth::rbac::Role;
use crate::auth::token::{IssuedToken, TokenService};
use crate::config::SecurityConfig;
use crate::db::{AccountRecord, NewAccount, Store, StoreError};

#[derive(Debug, Error)]
pub enum AuthError {
    /// Uniform for unknown email and wrong password; must not leak which.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email or username already registered")]
    Conflict,

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict,
            StoreError::NotFound => Self::Internal("record vanished mid-operation".to_string()),
            StoreError::Db(e) => Self::Database(e.to_string()),
        }
    }
}

/// Successful login: a signed token plus the response metadata.
#[derive(Debug, Clone)]
pub struct Login {
    pub token: IssuedToken,
    pub user_id: i32,
    pub role: String,
}

/// Registration input. No role field: signup can never grant privileges.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Clone)]
pub struct AuthFlow {
    store: Store,
    tokens: Arc<TokenService>,
    security: SecurityConfig,
}

impl AuthFlow {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenService>, security: SecurityConfig) -> Self {
        Self {
            store,
            tokens,
            security,
        }
    }

    /// Verify credentials and issue a session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<Login, AuthError> {
        let Some(account) = self.store.find_account_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let password_hash = account.password_hash.clone();

        // Argon2 verification is CPU-bound; keep it off the async runtime.
        let is_valid = task::spawn_blocking(move || {
            password::verify_password(&password, &password_hash)
        })
        .await
        .map_err(|e| AuthError::Internal(format!("password verification task panicked: {e}")))?
        .map_err(|e| AuthError::Internal(e.to_string()))?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(account.id, &account.email, &account.role)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(Login {
            token,
            user_id: account.id,
            role: account.role,
        })
    }

    /// Create an account with the role forced to USER, regardless of
    /// anything the caller supplied.
    pub async fn register(&self, registration: Registration) -> Result<AccountRecord, AuthError> {
        let password = registration.password;
        let security = self.security.clone();

        let password_hash =
            task::spawn_blocking(move || password::hash_password(&password, Some(&security)))
                .await
                .map_err(|e| AuthError::Internal(format!("password hashing task panicked: {e}")))?
                .map_err(|e| AuthError::Internal(e.to_string()))?;

        let record = self
            .store
            .create_account(NewAccount {
                email: registration.email,
                username: registration.username,
                password_hash,
                role: Role::User.as_str().to_string(),
                first_name: registration.first_name,
                last_name: registration.last_name,
            })
            .await?;

        Ok(record)
    }

    /// Hash a password for the update paths, using the configured costs.
    pub async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let security = self.security.clone();

        task::spawn_blocking(move || password::hash_password(&password, Some(&security)))
            .await
            .map_err(|e| AuthError::Internal(format!("password hashing task panicked: {e}")))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}
