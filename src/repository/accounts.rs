//! Accounts repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::account::{Account, NewAccount},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountsRepository: Send + Sync {
    /// Find an account by email (case-insensitive)
    async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>>;

    /// Check if email already exists
    async fn email_exists(&self, email: &str) -> AppResult<bool>;

    /// Insert a new account and return it with its id
    async fn create(&self, account: &NewAccount) -> AppResult<Account>;
}

#[derive(Clone)]
pub struct PgAccountsRepository {
    pool: Pool<Postgres>,
}

impl PgAccountsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountsRepository for PgAccountsRepository {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, name, hash_password FROM accounts WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, account: &NewAccount) -> AppResult<Account> {
        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (email, name, hash_password)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, hash_password
            "#,
        )
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.hash_password)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
