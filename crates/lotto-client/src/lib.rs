//! Draw history sync client.
//!
//! Keeps a local SQLite copy of the draw history in step with a resolver
//! service: bootstrap snapshot on first run, chunked range fetches after
//! that, retried with backoff on network failures.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod retry;
pub mod service;

use std::time::Duration;

pub use api::{HttpResolverApi, ResolverApi};
pub use db::Datastore;
pub use error::{Retry, SyncError};
pub use models::SyncState;
pub use retry::RetryPolicy;
pub use service::{SyncMode, SyncOrchestrator, SyncReport};

const DEFAULT_RESOLVER_URL: &str = "http://127.0.0.1:8787";
const DEFAULT_DATABASE_URL: &str = "data/lotto.db";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Loads `.env` and installs the logger. `RUST_LOG` wins over `level`.
pub fn setup(level: Option<log::LevelFilter>) {
    if let Err(e) = dotenvy::dotenv() {
        log::trace!("No .env loaded: {e}");
    }

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.unwrap_or(log::LevelFilter::Info));
    builder.parse_default_env();
    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Where the client syncs from and to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub resolver_url: String,
    pub database_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            resolver_url: DEFAULT_RESOLVER_URL.to_owned(),
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Reads `LOTTO_RESOLVER_URL` and `DATABASE_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            resolver_url: lookup("LOTTO_RESOLVER_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.resolver_url),
            database_url: lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.database_url),
            timeout: defaults.timeout,
        }
    }

    /// Opens the store and wires an orchestrator against the HTTP resolver.
    pub fn orchestrator(&self) -> anyhow::Result<SyncOrchestrator<HttpResolverApi>> {
        let store = Datastore::open(&self.database_url)?;
        let api = HttpResolverApi::new(&self.resolver_url, self.timeout)?;
        Ok(SyncOrchestrator::new(api, store))
    }
}
