//! Repository layer for database operations

pub mod accounts;
pub mod books;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use accounts::{AccountsRepository, PgAccountsRepository};
pub use books::{BooksRepository, PgBooksRepository, StatusTransition};

/// Main repository struct holding the table repositories
#[derive(Clone)]
pub struct Repository {
    pub accounts: Arc<dyn AccountsRepository>,
    pub books: Arc<dyn BooksRepository>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            accounts: Arc::new(PgAccountsRepository::new(pool.clone())),
            books: Arc::new(PgBooksRepository::new(pool)),
        }
    }

    /// Assemble a repository from arbitrary implementations
    pub fn from_parts(
        accounts: Arc<dyn AccountsRepository>,
        books: Arc<dyn BooksRepository>,
    ) -> Self {
        Self { accounts, books }
    }
}
