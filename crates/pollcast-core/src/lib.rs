pub mod error;
pub mod locks;
pub mod polls;
pub mod vote;

use locks::PollLocks;
use pollcast_db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    /// Serialises vote application per poll id.
    pub poll_locks: PollLocks,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig) -> Self {
        Self {
            db,
            config,
            poll_locks: PollLocks::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Origin allowed to make cross-origin requests (the web client).
    pub client_origin: String,
    /// Load/validate/write cycles a vote may take before reporting contention.
    pub vote_write_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_origin: "http://localhost:5173".to_string(),
            vote_write_attempts: polls::DEFAULT_WRITE_ATTEMPTS,
        }
    }
}
