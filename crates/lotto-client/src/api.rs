use std::time::Duration;

use lotto_draw::Draw;
use reqwest::StatusCode;
use serde::{Deserialize, de::DeserializeOwned};

use crate::error::SyncError;

/// Queries the client needs from the resolver service.
#[expect(async_fn_in_trait)]
pub trait ResolverApi {
    /// Newest draw number the resolver can vouch for.
    async fn latest_draw_no(&self) -> Result<u32, SyncError>;

    /// Bundled history snapshot; empty when the resolver has none.
    async fn bootstrap_draws(&self) -> Result<Vec<Draw>, SyncError>;

    /// Draws in `start..=end`. Unresolvable draws are simply absent.
    async fn fetch_draws(&self, start: u32, end: u32) -> Result<Vec<Draw>, SyncError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBody {
    latest_draw_no: u32,
}

#[derive(Debug, Deserialize)]
struct DrawsBody {
    draws: Vec<Draw>,
    #[serde(default)]
    missing: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`ResolverApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpResolverApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpResolverApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client,
        })
    }

    /// GETs `path` and decodes the JSON body. `Ok(None)` means 404.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SyncError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("resolver request failed: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::Network(format!("resolver body unreadable: {e}")))?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status.is_client_error() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(SyncError::api_response(
                Some(status.as_u16()),
                format!("{url}: {message}"),
            ));
        }
        if !status.is_success() {
            return Err(SyncError::Network(format!("{url} answered {status}")));
        }

        serde_json::from_slice(&body).map(Some).map_err(|e| {
            SyncError::api_response(Some(status.as_u16()), format!("{url}: malformed body: {e}"))
        })
    }

    async fn get_required<T: DeserializeOwned>(&self, path: &str) -> Result<T, SyncError> {
        self.get_json(path)
            .await?
            .ok_or_else(|| SyncError::api_response(Some(404), format!("{path}: not found")))
    }
}

impl ResolverApi for HttpResolverApi {
    async fn latest_draw_no(&self) -> Result<u32, SyncError> {
        let body: LatestBody = self.get_required("/api/lotto/latest").await?;
        Ok(body.latest_draw_no)
    }

    async fn bootstrap_draws(&self) -> Result<Vec<Draw>, SyncError> {
        match self.get_json::<DrawsBody>("/api/lotto/bootstrap").await? {
            Some(body) => Ok(body.draws),
            None => {
                log::warn!("Resolver bootstrap unavailable: 404");
                Ok(Vec::new())
            }
        }
    }

    async fn fetch_draws(&self, start: u32, end: u32) -> Result<Vec<Draw>, SyncError> {
        let body: DrawsBody = self
            .get_required(&format!("/api/lotto/draws?start={start}&end={end}"))
            .await?;
        if !body.missing.is_empty() {
            log::warn!(
                "range={start}..={end} resolver could not resolve {} draws: {:?}",
                body.missing.len(),
                body.missing
            );
        }
        Ok(body.draws)
    }
}
