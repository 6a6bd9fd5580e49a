use std::{collections::BTreeMap, fmt};

use chrono::Utc;
use lotto_draw::Draw;
use tokio_util::sync::CancellationToken;

use super::chunk::chunk_ranges;
use crate::{api::ResolverApi, db::Datastore, error::SyncError, retry::RetryPolicy};

/// Draws fetched when a full initial sync fails.
pub const INITIAL_SYNC_FALLBACK_RANGE: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Nothing stored yet: bootstrap snapshot plus tail, or a full sync.
    Initial,
    /// Only draws newer than the highest stored one.
    Incremental,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initial => "initial",
            Self::Incremental => "incremental",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: SyncMode,
    /// Draws fetched and upserted by this run.
    pub count: usize,
    /// Highest stored draw after the run.
    pub local_latest: u32,
}

/// Brings the local store up to date with the resolver.
pub struct SyncOrchestrator<A> {
    api: A,
    store: Datastore,
    retry: RetryPolicy,
}

impl<A: ResolverApi> SyncOrchestrator<A> {
    pub fn new(api: A, store: Datastore) -> Self {
        Self {
            api,
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &Datastore {
        &self.store
    }

    /// Runs one sync. Initial when the store is empty, incremental
    /// otherwise. Cancelling `cancel` aborts at the next suspension point.
    pub async fn sync(&self, cancel: &CancellationToken) -> Result<SyncReport, SyncError> {
        let local = self
            .store
            .local_latest_draw_no()
            .map_err(|e| SyncError::storage(&e))?;
        let mode = if local == 0 {
            SyncMode::Initial
        } else {
            SyncMode::Incremental
        };
        log::info!("Sync start localLatest={local} mode={mode}");

        let attempt = self.retry.run(move |attempt| {
            log::debug!("Sync fetch attempt #{attempt}");
            self.fetch(mode, local)
        });
        let draws = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                log::warn!("Sync cancelled localLatest={local}");
                return Err(SyncError::Cancelled);
            }
            result = attempt => result.inspect_err(|e| {
                log::error!("Sync failed after retries localLatest={local}: {e}");
            })?,
        };

        let count = self
            .store
            .merge_draws(&draws, Utc::now().timestamp_millis())
            .map_err(|e| SyncError::storage(&e))?;
        if count == 0 {
            log::info!("Sync found no new draws (already up to date)");
        } else {
            log::info!("Sync persisted count={count}");
        }

        let local_latest = self
            .store
            .local_latest_draw_no()
            .map_err(|e| SyncError::storage(&e))?;
        Ok(SyncReport {
            mode,
            count,
            local_latest,
        })
    }

    async fn fetch(&self, mode: SyncMode, local: u32) -> Result<Vec<Draw>, SyncError> {
        match mode {
            SyncMode::Initial => self.fetch_all().await,
            SyncMode::Incremental => self.fetch_after(local).await,
        }
    }

    /// Bootstrap snapshot plus tail, or a live full sync when there is no
    /// snapshot.
    async fn fetch_all(&self) -> Result<Vec<Draw>, SyncError> {
        match self.api.bootstrap_draws().await {
            Ok(bootstrap) if !bootstrap.is_empty() => return self.extend_bootstrap(bootstrap).await,
            Ok(_) => log::info!("Bootstrap empty; switching to live sync"),
            Err(SyncError::Cancelled) => return Err(SyncError::Cancelled),
            Err(e) => log::warn!("Bootstrap failed; switching to live sync: {e}"),
        }

        let latest = self.api.latest_draw_no().await?;
        log::info!("Full sync latestAvailable={latest}");
        match self.fetch_chunked(1, latest).await {
            Ok(draws) => Ok(draws),
            Err(SyncError::Cancelled) => Err(SyncError::Cancelled),
            Err(e) => {
                let start = latest
                    .saturating_sub(INITIAL_SYNC_FALLBACK_RANGE - 1)
                    .max(1);
                log::warn!("Full sync failed ({e}); falling back to range={start}..={latest}");
                self.fetch_chunked(start, latest).await
            }
        }
    }

    async fn extend_bootstrap(&self, bootstrap: Vec<Draw>) -> Result<Vec<Draw>, SyncError> {
        let bootstrap_latest = bootstrap.iter().map(Draw::draw_no).max().unwrap_or(0);
        log::info!(
            "Bootstrap success count={} latest={bootstrap_latest}",
            bootstrap.len()
        );

        let latest = match self.api.latest_draw_no().await {
            Ok(latest) if latest > bootstrap_latest => latest,
            Ok(_) => return Ok(bootstrap),
            Err(SyncError::Cancelled) => return Err(SyncError::Cancelled),
            Err(e) => {
                log::warn!("Latest unresolvable ({e}); keeping bootstrap only");
                return Ok(bootstrap);
            }
        };

        log::info!("Bootstrap gap detected; fetching tail={}..={latest}", bootstrap_latest + 1);
        match self.fetch_chunked(bootstrap_latest + 1, latest).await {
            Ok(tail) => {
                let merged = merge_by_draw_no(bootstrap, tail);
                log::info!("Merged bootstrap and tail count={}", merged.len());
                Ok(merged)
            }
            Err(SyncError::Cancelled) => Err(SyncError::Cancelled),
            Err(e) => {
                log::warn!("Tail sync failed; keeping bootstrap only: {e}");
                Ok(bootstrap)
            }
        }
    }

    async fn fetch_after(&self, local: u32) -> Result<Vec<Draw>, SyncError> {
        let latest = self.api.latest_draw_no().await?;
        if local >= latest {
            log::info!("No update required local={local} latest={latest}");
            return Ok(Vec::new());
        }
        self.fetch_chunked(local + 1, latest).await
    }

    /// Fetches `start..=end` chunk by chunk; the first failure aborts.
    async fn fetch_chunked(&self, start: u32, end: u32) -> Result<Vec<Draw>, SyncError> {
        let mut draws = Vec::new();
        for chunk in chunk_ranges(start, end) {
            log::info!("range={}..={}", chunk.start(), chunk.end());
            draws.extend(self.api.fetch_draws(*chunk.start(), *chunk.end()).await?);
        }
        Ok(merge_by_draw_no(Vec::new(), draws))
    }
}

/// Union keyed by draw number, ascending. `newer` wins on overlap.
pub fn merge_by_draw_no(older: Vec<Draw>, newer: Vec<Draw>) -> Vec<Draw> {
    let mut merged = BTreeMap::new();
    for draw in older.into_iter().chain(newer) {
        merged.insert(draw.draw_no(), draw);
    }
    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use chrono::NaiveDate;
    use tokio::time::Instant;

    use super::*;

    fn draw(draw_no: u32) -> Draw {
        let date = lotto_draw::scheduled_date(draw_no).unwrap_or(NaiveDate::MIN);
        Draw::new(draw_no, date, [1, 2, 3, 4, 5, 6], 45, 1_000).expect("valid draw")
    }

    fn draws(range: std::ops::RangeInclusive<u32>) -> Vec<Draw> {
        range.map(draw).collect()
    }

    enum RangeFailure {
        Never,
        Network,
        Rejected,
        StartBelow(u32),
    }

    /// In-memory resolver serving draws `1..=latest`.
    struct FakeApi {
        bootstrap: Vec<Draw>,
        latest: Option<u32>,
        failure: RangeFailure,
        delay: Duration,
        latest_calls: AtomicU32,
        ranges: Mutex<Vec<(u32, u32)>>,
    }

    impl FakeApi {
        fn new(latest: u32) -> Self {
            Self {
                bootstrap: Vec::new(),
                latest: Some(latest),
                failure: RangeFailure::Never,
                delay: Duration::ZERO,
                latest_calls: AtomicU32::new(0),
                ranges: Mutex::new(Vec::new()),
            }
        }

        fn ranges(&self) -> Vec<(u32, u32)> {
            self.ranges.lock().expect("ranges lock").clone()
        }
    }

    impl ResolverApi for FakeApi {
        async fn latest_draw_no(&self) -> Result<u32, SyncError> {
            self.latest_calls.fetch_add(1, Ordering::SeqCst);
            self.latest
                .ok_or_else(|| SyncError::Network("resolver unreachable".to_owned()))
        }

        async fn bootstrap_draws(&self) -> Result<Vec<Draw>, SyncError> {
            Ok(self.bootstrap.clone())
        }

        async fn fetch_draws(&self, start: u32, end: u32) -> Result<Vec<Draw>, SyncError> {
            self.ranges.lock().expect("ranges lock").push((start, end));
            tokio::time::sleep(self.delay).await;
            match self.failure {
                RangeFailure::Network => return Err(SyncError::Network("reset".to_owned())),
                RangeFailure::Rejected => {
                    return Err(SyncError::api_response(Some(400), "range too large"));
                }
                RangeFailure::StartBelow(limit) if start < limit => {
                    return Err(SyncError::Network("timeout".to_owned()));
                }
                _ => {}
            }
            let latest = self.latest.unwrap_or(0);
            Ok((start..=end.min(latest)).map(draw).collect())
        }
    }

    fn orchestrator(api: FakeApi) -> (tempfile::TempDir, SyncOrchestrator<FakeApi>) {
        let dir = tempfile::tempdir().expect("temp dir");
        let url = dir.path().join("lotto.db");
        let store = Datastore::open(&url.display().to_string()).expect("open store");
        (dir, SyncOrchestrator::new(api, store))
    }

    #[tokio::test(start_paused = true)]
    async fn full_sync_walks_the_range_in_chunks() -> anyhow::Result<()> {
        let (_dir, sync) = orchestrator(FakeApi::new(950));

        let report = sync.sync(&CancellationToken::new()).await?;

        assert_eq!(report.mode, SyncMode::Initial);
        assert_eq!(report.count, 950);
        assert_eq!(report.local_latest, 950);
        assert_eq!(
            sync.api.ranges(),
            [(1, 301), (302, 602), (603, 903), (904, 950)]
        );
        assert_eq!(sync.store().draw_count()?, 950);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_is_extended_with_the_tail() -> anyhow::Result<()> {
        let mut api = FakeApi::new(950);
        api.bootstrap = draws(1..=900);
        let (_dir, sync) = orchestrator(api);

        let report = sync.sync(&CancellationToken::new()).await?;

        assert_eq!(report.count, 950);
        assert_eq!(sync.api.ranges(), [(901, 950)]);
        let stored: Vec<u32> = sync.store().all_draws()?.iter().map(Draw::draw_no).collect();
        assert_eq!(stored, (1..=950).collect::<Vec<_>>());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tail_keeps_the_bootstrap() -> anyhow::Result<()> {
        let mut api = FakeApi::new(950);
        api.bootstrap = draws(1..=900);
        api.failure = RangeFailure::Network;
        let (_dir, sync) = orchestrator(api);

        let report = sync.sync(&CancellationToken::new()).await?;

        assert_eq!(report.count, 900);
        assert_eq!(report.local_latest, 900);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn current_bootstrap_needs_no_tail() -> anyhow::Result<()> {
        let mut api = FakeApi::new(900);
        api.bootstrap = draws(1..=900);
        let (_dir, sync) = orchestrator(api);

        let report = sync.sync(&CancellationToken::new()).await?;

        assert_eq!(report.count, 900);
        assert!(sync.api.ranges().is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn failed_full_sync_falls_back_to_recent_draws() -> anyhow::Result<()> {
        let mut api = FakeApi::new(1000);
        api.failure = RangeFailure::StartBelow(801);
        let (_dir, sync) = orchestrator(api);

        let report = sync.sync(&CancellationToken::new()).await?;

        assert_eq!(report.count, 200);
        assert_eq!(sync.api.ranges(), [(1, 301), (801, 1000)]);
        let oldest = sync.store().all_draws()?.first().map(Draw::draw_no);
        assert_eq!(oldest, Some(801));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn network_failures_are_retried_then_reported() {
        let mut api = FakeApi::new(0);
        api.latest = None;
        let (_dir, sync) = orchestrator(api);
        let started = Instant::now();

        let result = sync.sync(&CancellationToken::new()).await;

        assert!(matches!(result, Err(SyncError::Network(_))));
        assert_eq!(sync.api.latest_calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_retry_policy_sets_attempts_and_backoff() {
        let mut api = FakeApi::new(0);
        api.latest = None;
        let (_dir, sync) = orchestrator(api);
        let sync = sync.with_retry_policy(
            RetryPolicy::default()
                .max_attempts(4)
                .base_delay(Duration::from_millis(100))
                .backoff_multiplier(3.0),
        );
        let started = Instant::now();

        let result = sync.sync(&CancellationToken::new()).await;

        assert!(matches!(result, Err(SyncError::Network(_))));
        assert_eq!(sync.api.latest_calls.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed(), Duration::from_millis(100 + 300 + 900));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_requests_fail_without_waiting() -> anyhow::Result<()> {
        let mut api = FakeApi::new(20);
        api.failure = RangeFailure::Rejected;
        let (_dir, sync) = orchestrator(api);
        sync.store().merge_draws(&draws(1..=10), 1)?;
        let started = Instant::now();

        let result = sync.sync(&CancellationToken::new()).await;

        assert!(matches!(result, Err(SyncError::ApiResponse { status: Some(400), .. })));
        assert_eq!(sync.api.ranges(), [(11, 20)]);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(sync.store().local_latest_draw_no()?, 10);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn up_to_date_store_is_left_alone() -> anyhow::Result<()> {
        let (_dir, sync) = orchestrator(FakeApi::new(5));
        sync.store().merge_draws(&draws(1..=5), 1)?;

        let report = sync.sync(&CancellationToken::new()).await?;

        assert_eq!(report.mode, SyncMode::Incremental);
        assert_eq!(report.count, 0);
        assert!(sync.api.ranges().is_empty());
        assert_eq!(sync.store().sync_state()?.last_sync_at, Some(1));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn incremental_sync_fetches_only_new_draws() -> anyhow::Result<()> {
        let (_dir, sync) = orchestrator(FakeApi::new(12));
        sync.store().merge_draws(&draws(1..=10), 1)?;

        let report = sync.sync(&CancellationToken::new()).await?;

        assert_eq!(report.count, 2);
        assert_eq!(report.local_latest, 12);
        assert_eq!(sync.api.ranges(), [(11, 12)]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_an_in_flight_sync() {
        let mut api = FakeApi::new(950);
        api.delay = Duration::from_secs(10);
        let (_dir, sync) = orchestrator(api);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = sync.sync(&cancel).await;

        assert!(matches!(result, Err(SyncError::Cancelled)));
        assert_eq!(sync.api.ranges(), [(1, 301)]);
        assert_eq!(sync.store().draw_count().ok(), Some(0));
    }

    #[test]
    fn newer_draw_wins_on_merge() {
        let older = vec![draw(1), draw(2)];
        let replacement = Draw::new(2, draw(2).draw_date(), [7, 8, 9, 10, 11, 12], 1, 5)
            .expect("valid draw");
        let merged = merge_by_draw_no(older, vec![replacement.clone(), draw(3)]);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1], replacement);
    }
}
