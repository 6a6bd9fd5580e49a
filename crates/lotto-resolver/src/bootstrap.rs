use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use lotto_draw::Draw;
use serde::Deserialize;

use crate::cache::TtlCache;

pub mod seed;

pub use seed::{SeedReport, validate_seed};

/// Accepted seed layouts: a bare array or `{ "draws": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SeedFile {
    List(Vec<serde_json::Value>),
    Wrapped { draws: Vec<serde_json::Value> },
}

impl SeedFile {
    pub(crate) fn into_records(self) -> Vec<serde_json::Value> {
        match self {
            Self::List(records) | Self::Wrapped { draws: records } => records,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("cannot read seed: {0}")]
    Io(#[from] std::io::Error),
    #[error("seed is not a draw list: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses a seed snapshot, dropping invalid records. Result is ascending
/// and holds one entry per draw number.
pub fn parse_seed(text: &str) -> Result<Vec<Draw>, SeedError> {
    let file: SeedFile = serde_json::from_str(text)?;

    let mut draws = file
        .into_records()
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Draw>(record) {
            Ok(draw) => Some(draw),
            Err(e) => {
                log::debug!("Dropping seed record draws[{index}]: {e}");
                None
            }
        })
        .collect::<Vec<_>>();
    draws.sort_by_key(Draw::draw_no);
    draws.dedup_by_key(|draw| draw.draw_no());
    Ok(draws)
}

/// Bundled history snapshot, cached for a short TTL.
pub struct BootstrapLoader {
    path: PathBuf,
    cache: TtlCache<(), Arc<Vec<Draw>>>,
    missing_logged: AtomicBool,
}

impl BootstrapLoader {
    pub fn new(path: impl Into<PathBuf>, cache: TtlCache<(), Arc<Vec<Draw>>>) -> Self {
        Self {
            path: path.into(),
            cache,
            missing_logged: AtomicBool::new(false),
        }
    }

    /// Snapshot draws; empty when the file is missing or unreadable.
    pub async fn load(&self, force: bool) -> Arc<Vec<Draw>> {
        if !force {
            if let Some(draws) = self.cache.get_fresh(&()).await {
                return draws;
            }
        }

        let draws = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => match parse_seed(&text) {
                Ok(draws) => {
                    log::info!(
                        "Bootstrap snapshot {} loaded count={}",
                        self.path.display(),
                        draws.len()
                    );
                    draws
                }
                Err(e) => {
                    log::error!("Bootstrap snapshot {} is invalid: {e}", self.path.display());
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if !self.missing_logged.swap(true, Ordering::Relaxed) {
                    log::warn!("Bootstrap snapshot {} not found", self.path.display());
                }
                Vec::new()
            }
            Err(e) => {
                log::error!("Cannot read bootstrap snapshot {}: {e}", self.path.display());
                Vec::new()
            }
        };

        let draws = Arc::new(draws);
        self.cache.insert((), Arc::clone(&draws)).await;
        draws
    }
}
