//! Draw resolution service.
//!
//! Answers per-draw, range, latest and bootstrap queries by trying a bulk
//! listing, JSON mirrors and the public result page in that order, with
//! every answer cached in memory.

pub mod bootstrap;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod range;
pub mod request;
pub mod resolver;
pub mod server;

use std::sync::Arc;

pub use bootstrap::{BootstrapLoader, SeedReport, validate_seed};
pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ResolverConfig;
pub use error::{LatestResolutionError, RangeValidationError, SourceError};
pub use range::{RangeRequest, RangeResult, fetch_range};
pub use resolver::DrawResolver;
pub use server::{HttpServer, ResolverState};

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

/// Builds the shared service state from configuration.
pub fn build_state(config: &ResolverConfig, clock: Arc<dyn Clock>) -> anyhow::Result<ResolverState> {
    let resolver = DrawResolver::from_config(&config.upstream, &config.cache, Arc::clone(&clock))?;
    let bootstrap = BootstrapLoader::new(
        config.seed_path.clone(),
        TtlCache::new(config.cache.bootstrap_ttl(), Arc::clone(&clock)),
    );
    Ok(ResolverState::new(resolver, bootstrap, clock))
}
