//! Account registration, login and session lookup

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::account::{Account, LoginRequest, NewAccount, RegisterRequest},
    repository::Repository,
    services::sessions::SessionStore,
};

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
    sessions: SessionStore,
}

/// Trimmed value of a parameter, `None` if absent or blank
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn email_taken() -> AppError {
    AppError::service(ErrorCode::EmailExists, "Email already registered")
}

/// Password exactly as sent, `None` if absent or blank
fn raw_password(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl AccountsService {
    pub fn new(repository: Repository, sessions: SessionStore) -> Self {
        Self {
            repository,
            sessions,
        }
    }

    /// Create a new account
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<Account> {
        let (Some(email), Some(password)) =
            (non_blank(&request.email), raw_password(&request.password))
        else {
            return Err(AppError::bad_request("Invalid parameter"));
        };
        request.validate()?;

        if self.repository.accounts.email_exists(email).await? {
            return Err(email_taken());
        }

        let account = NewAccount {
            email: email.to_string(),
            name: non_blank(&request.name).map(str::to_string),
            hash_password: hash_password(password)?,
        };

        // a concurrent registration can still win the unique index
        let created = match self.repository.accounts.create(&account).await {
            Ok(created) => created,
            Err(AppError::Database(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                return Err(email_taken());
            }
            Err(e) => return Err(e),
        };
        tracing::info!(account_id = created.id, "Registered account");
        Ok(created)
    }

    /// Check credentials and open a session, returning its token
    pub async fn login(&self, request: &LoginRequest) -> AppResult<String> {
        let (Some(email), Some(password)) =
            (non_blank(&request.email), raw_password(&request.password))
        else {
            return Err(AppError::bad_request("Invalid parameter"));
        };

        let account = self
            .repository
            .accounts
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not exist"))?;

        if !verify_password(&account, password)? {
            return Err(AppError::unauthorized("Password wrong"));
        }

        tracing::info!(account_id = account.id, "Account logged in");
        Ok(self.sessions.open(account))
    }

    pub fn logout(&self, token: &str) {
        if !self.sessions.close(token) {
            tracing::warn!("Logout of an already closed token: {}", token);
        }
    }

    /// Account owning a live session
    pub fn login_user(&self, token: &str) -> AppResult<Account> {
        self.sessions
            .get(token)
            .ok_or_else(|| AppError::unauthorized("User doesn't login"))
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(account: &Account, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&account.hash_password)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
