use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_ENV: &str = "LOTTO_RESOLVER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "resolver.toml";

/// Resolver service settings: TOML file first, then environment overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Bootstrap snapshot served by `/api/lotto/bootstrap`.
    pub seed_path: PathBuf,
    pub http: HttpServerConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            seed_path: PathBuf::from("data/lotto_seed.json"),
            http: HttpServerConfig::default(),
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8787,
        }
    }
}

impl HttpServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip = IpAddr::from_str(&self.host)
            .with_context(|| format!("invalid http host {:?}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Where draws come from. URL templates use `{drawNo}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub bulk_url: String,
    pub mirror_urls: Vec<String>,
    pub page_url: String,
    pub timeout_ms: u64,
    /// Requests per second per upstream host, 0 for unlimited.
    pub qps: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            bulk_url: "https://www.dhlottery.co.kr/lt645/selectPstLt645Info.do?srchLtEpsd=all"
                .to_owned(),
            mirror_urls: vec![
                "https://www.dhlottery.co.kr/common.do?method=getLottoNumber&drwNo={drawNo}"
                    .to_owned(),
                "https://www.nlotto.co.kr/common.do?method=getLottoNumber&drwNo={drawNo}"
                    .to_owned(),
            ],
            page_url: "https://www.dhlottery.co.kr/gameResult.do?method=byWin&drwNo={drawNo}"
                .to_owned(),
            timeout_ms: 10_000,
            qps: 5,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub draw_ttl_secs: u64,
    pub bulk_ttl_secs: u64,
    pub bootstrap_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            draw_ttl_secs: 24 * 60 * 60,
            bulk_ttl_secs: 30,
            bootstrap_ttl_secs: 60,
        }
    }
}

impl CacheConfig {
    pub fn draw_ttl(&self) -> Duration {
        Duration::from_secs(self.draw_ttl_secs)
    }

    pub fn bulk_ttl(&self) -> Duration {
        Duration::from_secs(self.bulk_ttl_secs)
    }

    pub fn bootstrap_ttl(&self) -> Duration {
        Duration::from_secs(self.bootstrap_ttl_secs)
    }
}

impl ResolverConfig {
    /// Reads the file named by `LOTTO_RESOLVER_CONFIG` (or `resolver.toml`)
    /// when it exists, then applies the environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        let path = Path::new(&path);

        let mut config = if path.exists() {
            Self::from_toml_file(path)?
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(host) = lookup("LOTTO_HTTP_HOST") {
            self.http.host = host;
        }
        if let Some(port) = lookup("LOTTO_HTTP_PORT") {
            self.http.port = port
                .parse()
                .with_context(|| format!("invalid LOTTO_HTTP_PORT {port:?}"))?;
        }
        if let Some(path) = lookup("LOTTO_SEED_PATH") {
            self.seed_path = PathBuf::from(path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ResolverConfig::from_toml_str(
            r#"
            [http]
            port = 9000

            [upstream]
            qps = 0
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.upstream.qps, 0);
        assert_eq!(config.upstream.mirror_urls.len(), 2);
        assert_eq!(config.cache.bulk_ttl(), Duration::from_secs(30));
        assert_eq!(config.upstream.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env = HashMap::from([
            ("LOTTO_HTTP_HOST", "0.0.0.0"),
            ("LOTTO_HTTP_PORT", "8080"),
            ("LOTTO_SEED_PATH", "/srv/seed.json"),
        ]);
        let mut config = ResolverConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| (*v).to_owned()))
            .expect("valid overrides");

        assert_eq!(
            config.http.socket_addr().expect("valid address"),
            SocketAddr::from(([0, 0, 0, 0], 8080))
        );
        assert_eq!(config.seed_path, PathBuf::from("/srv/seed.json"));

        let bad = HashMap::from([("LOTTO_HTTP_PORT", "eighty")]);
        assert!(
            ResolverConfig::default()
                .apply_env_overrides(|key| bad.get(key).map(|v| (*v).to_owned()))
                .is_err()
        );
    }

    #[test]
    fn config_survives_a_toml_round_trip() {
        let config = ResolverConfig::default();
        let text = config.to_toml_string().expect("serializable");
        assert_eq!(ResolverConfig::from_toml_str(&text).expect("valid toml"), config);
    }
}
