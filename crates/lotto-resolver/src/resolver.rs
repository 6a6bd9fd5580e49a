use std::sync::Arc;

use lotto_draw::{Draw, estimate_latest};

use crate::{
    cache::TtlCache,
    clock::Clock,
    config::{CacheConfig, UpstreamConfig},
    error::{LatestResolutionError, SourceError},
    request::{
        BulkSource, DrawSource, MirrorSource, PageSource, Upstream, UpstreamKind, build_client,
    },
};

/// How far below the cadence estimate the latest probe goes.
pub const LATEST_PROBE_DEPTH: u32 = 20;

/// Deep per-draw strategy, tried in configuration order.
#[derive(Debug, Clone)]
pub enum FallbackSource {
    Mirror(MirrorSource),
    Page(PageSource),
}

impl DrawSource for FallbackSource {
    fn kind(&self) -> UpstreamKind {
        match self {
            Self::Mirror(source) => source.kind(),
            Self::Page(source) => source.kind(),
        }
    }

    fn label(&self) -> &str {
        match self {
            Self::Mirror(source) => source.label(),
            Self::Page(source) => source.label(),
        }
    }

    async fn fetch_draw(&self, draw_no: u32) -> Result<Draw, SourceError> {
        match self {
            Self::Mirror(source) => source.fetch_draw(draw_no).await,
            Self::Page(source) => source.fetch_draw(draw_no).await,
        }
    }
}

/// Resolves single draws and the newest draw number against the upstreams.
pub struct DrawResolver {
    draws: TtlCache<u32, Draw>,
    bulk: BulkSource,
    fallbacks: Vec<FallbackSource>,
    clock: Arc<dyn Clock>,
}

impl DrawResolver {
    pub fn new(
        bulk: BulkSource,
        fallbacks: Vec<FallbackSource>,
        draws: TtlCache<u32, Draw>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            draws,
            bulk,
            fallbacks,
            clock,
        }
    }

    /// Wires bulk, mirror and page sources from configuration. Each upstream
    /// host gets its own rate limit.
    pub fn from_config(
        upstream: &UpstreamConfig,
        cache: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SourceError> {
        let client = build_client(upstream.timeout())?;

        let bulk = BulkSource::new(
            Upstream::new(client.clone(), UpstreamKind::Bulk, upstream.qps),
            upstream.bulk_url.clone(),
            TtlCache::new(cache.bulk_ttl(), Arc::clone(&clock)),
        );

        let mut fallbacks = upstream
            .mirror_urls
            .iter()
            .map(|url| {
                let mirror = Upstream::new(client.clone(), UpstreamKind::Mirror, upstream.qps);
                FallbackSource::Mirror(MirrorSource::new(mirror, url.clone()))
            })
            .collect::<Vec<_>>();
        fallbacks.push(FallbackSource::Page(PageSource::new(
            Upstream::new(client, UpstreamKind::Page, upstream.qps),
            upstream.page_url.clone(),
        )));

        let draws = TtlCache::new(cache.draw_ttl(), Arc::clone(&clock));
        Ok(Self::new(bulk, fallbacks, draws, clock))
    }

    /// Resolves one draw. `None` means every allowed strategy came up empty.
    pub async fn resolve(&self, draw_no: u32, allow_deep_fallback: bool) -> Option<Draw> {
        if let Some(draw) = self.draws.get_fresh(&draw_no).await {
            return Some(draw);
        }

        if let Some(draw) = self.bulk.snapshot().await.get(&draw_no).cloned() {
            self.draws.insert(draw_no, draw.clone()).await;
            return Some(draw);
        }

        if !allow_deep_fallback {
            return None;
        }

        for source in &self.fallbacks {
            match source.fetch_draw(draw_no).await {
                Ok(draw) => {
                    log::debug!("Draw {draw_no} resolved by {} {}", source.kind(), source.label());
                    self.draws.insert(draw_no, draw.clone()).await;
                    return Some(draw);
                }
                Err(e) => {
                    log::debug!("Draw {draw_no}: {} {} failed: {e}", source.kind(), source.label());
                }
            }
        }
        None
    }

    /// Newest published draw number.
    ///
    /// A forced bulk refresh answers directly. Otherwise draws are probed
    /// downward from the cadence estimate with every fallback enabled.
    pub async fn resolve_latest(&self) -> Result<u32, LatestResolutionError> {
        match self.bulk.latest_draw_no().await {
            Ok(Some(latest)) => return Ok(latest),
            Ok(None) => log::warn!("Bulk listing is empty, probing for the latest draw"),
            Err(e) => log::warn!("Bulk listing unavailable ({e}), probing for the latest draw"),
        }

        let estimate = estimate_latest(self.clock.now());
        let floor = estimate.saturating_sub(LATEST_PROBE_DEPTH).max(1);
        for draw_no in (floor..=estimate).rev() {
            if self.resolve(draw_no, true).await.is_some() {
                log::info!("Latest draw resolved by probing: {draw_no}");
                return Ok(draw_no);
            }
        }

        log::error!("Unable to resolve latest draw, probed {estimate} down to {floor}");
        Err(LatestResolutionError {
            from: estimate,
            to: floor,
        })
    }
}
