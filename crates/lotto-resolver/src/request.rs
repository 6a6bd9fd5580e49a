use std::{sync::Arc, time::Duration};

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT,
};

use crate::error::SourceError;

pub mod bulk;
pub mod lenient;
pub mod mirror;
pub mod page;
pub mod provider;

pub use bulk::{BulkSource, parse_bulk_payload};
pub use mirror::{MirrorSource, parse_mirror_envelope};
pub use page::{PageSource, parse_result_page};
pub use provider::{DrawSource, QpsLimitedExecutor, UpstreamKind};

/// Placeholder substituted with the draw number in upstream URL templates.
pub const DRAW_NO_PLACEHOLDER: &str = "{drawNo}";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const BROWSER_REFERER: &str = "https://www.dhlottery.co.kr/gameResult.do?method=byWin";
const BROWSER_ORIGIN: &str = "https://www.dhlottery.co.kr";

/// HTTP access to one upstream host, paced by its own executor.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: reqwest::Client,
    executor: Arc<QpsLimitedExecutor>,
}

impl Upstream {
    pub fn new(client: reqwest::Client, kind: UpstreamKind, qps: u32) -> Self {
        Self {
            client,
            executor: Arc::new(QpsLimitedExecutor::new(kind, qps)),
        }
    }

    /// GETs `url` and returns the body as text. Non-2xx answers are errors.
    pub async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        self.executor
            .execute(async {
                let response = self.client.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::Status {
                        url: url.to_owned(),
                        status: status.as_u16(),
                    });
                }
                Ok(response.text().await?)
            })
            .await
    }
}

/// Builds the shared client. Upstreams reject requests that do not look
/// like they come from a browser on the result page.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(REFERER, HeaderValue::from_static(BROWSER_REFERER));
    headers.insert(ORIGIN, HeaderValue::from_static(BROWSER_ORIGIN));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/html;q=0.9, */*;q=0.8"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()?)
}

pub(crate) fn draw_url(template: &str, draw_no: u32) -> String {
    template.replace(DRAW_NO_PLACEHOLDER, &draw_no.to_string())
}
