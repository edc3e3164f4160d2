//! Login sessions held in a bounded, idle-expiring in-memory cache

use std::time::Duration;

use moka::{policy::EvictionPolicy, sync::Cache};
use uuid::Uuid;

use crate::{config::SessionConfig, models::account::Account};

#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<String, Account>,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_limits(
            Duration::from_secs(config.login_timeout_secs),
            config.max_entries,
        )
    }

    /// Sessions idle for `timeout` are dropped; past `max_entries` the least
    /// recently used session goes first.
    pub fn with_limits(timeout: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_idle(timeout)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self { cache }
    }

    /// Start a session for `account` and return its token
    pub fn open(&self, account: Account) -> String {
        let token = Uuid::new_v4().simple().to_string();
        tracing::debug!(account_id = account.id, "Opening session");
        self.cache.insert(token.clone(), account);
        // apply pending evictions now so the bound holds after every login
        self.cache.run_pending_tasks();
        token
    }

    /// Look up the account behind `token`, refreshing its idle timer
    pub fn get(&self, token: &str) -> Option<Account> {
        self.cache.get(token)
    }

    /// End a session; false if the token was unknown or already expired
    pub fn close(&self, token: &str) -> bool {
        self.cache.remove(token).is_some()
    }

    /// Number of live sessions
    pub fn active(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}
