use std::{sync::Arc, time::Duration};

use lotto_draw::Draw;
use strum_macros::Display;
use tokio::{
    sync::{Mutex, Semaphore},
    time::Instant,
};

use crate::error::SourceError;

/// Kinds of upstream the resolver talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UpstreamKind {
    #[strum(to_string = "bulk")]
    Bulk,
    #[strum(to_string = "mirror")]
    Mirror,
    #[strum(to_string = "page")]
    Page,
}

/// A per-draw fallback strategy.
#[expect(async_fn_in_trait)]
pub trait DrawSource: Send + Sync {
    fn kind(&self) -> UpstreamKind;

    /// Human readable identifier used in logs.
    fn label(&self) -> &str;

    async fn fetch_draw(&self, draw_no: u32) -> Result<Draw, SourceError>;
}

/// QPS-limited executor shared by every request sent to one upstream host.
#[derive(Debug)]
pub struct QpsLimitedExecutor {
    kind: UpstreamKind,
    qps: u32,
    semaphore: Arc<Semaphore>,
    last_request_time: Arc<Mutex<Option<Instant>>>,
}

impl QpsLimitedExecutor {
    /// `qps == 0` disables the pacing.
    pub fn new(kind: UpstreamKind, qps: u32) -> Self {
        Self {
            kind,
            qps,
            semaphore: Arc::new(Semaphore::new(qps.max(1) as usize)),
            last_request_time: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn execute<F, T>(&self, request: F) -> Result<T, SourceError>
    where
        F: Future<Output = Result<T, SourceError>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| SourceError::parse(format!("executor closed: {e}")))?;

        // The slot is claimed under the lock so concurrent callers queue up.
        {
            let mut last_time = self.last_request_time.lock().await;
            let delay = self.calculate_delay(*last_time);
            if delay > Duration::ZERO {
                log::debug!("Upstream {} QPS limiting: waiting {:?}", self.kind, delay);
                tokio::time::sleep(delay).await;
            }
            *last_time = Some(Instant::now());
        }

        request.await
    }

    fn calculate_delay(&self, last_time: Option<Instant>) -> Duration {
        if self.qps == 0 {
            return Duration::ZERO;
        }
        let Some(last_time) = last_time else {
            return Duration::ZERO;
        };

        let elapsed = last_time.elapsed();
        let min_interval = Duration::from_secs_f64(1.0 / f64::from(self.qps));
        min_interval.saturating_sub(elapsed)
    }
}
