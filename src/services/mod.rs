//! Business logic services

pub mod accounts;
pub mod borrows;
pub mod catalog;
pub mod sessions;

use crate::{config::SessionConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub accounts: accounts::AccountsService,
    pub catalog: catalog::CatalogService,
    pub borrows: borrows::BorrowService,
    pub sessions: sessions::SessionStore,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, session_config: &SessionConfig) -> Self {
        let sessions = sessions::SessionStore::new(session_config);

        Self {
            accounts: accounts::AccountsService::new(repository.clone(), sessions.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            borrows: borrows::BorrowService::new(repository),
            sessions,
        }
    }
}
