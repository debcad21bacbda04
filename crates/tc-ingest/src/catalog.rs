//! Pair catalog: which pairs to collect for an exchange.
//!
//! Two sources are provided:
//!
//! - [`RestPairSource`] queries the pair catalog service
//!   (`GET {url}/exchangepairs/{exchange}`)
//! - [`StaticPairFile`] reads `<dir>/<exchange>.json` in the
//!   `{"Coins": [...]}` layout
//!
//! [`PairCatalog`] falls back from the primary to the static source only when
//! the primary is unreachable. A malformed answer is returned as-is.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tc_core::{CollectorError, ExchangePair};
use tracing::{info, warn};

#[async_trait]
pub trait PairSource: Send + Sync {
    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;

    async fn pairs(&self, exchange: &str) -> Result<Vec<ExchangePair>, CollectorError>;
}

// ---------------------------------------------------------------------------
// REST source
// ---------------------------------------------------------------------------

pub struct RestPairSource {
    base_url: String,
    http: reqwest::Client,
}

impl RestPairSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CollectorError> {
        let base_url = base_url.into();
        url::Url::parse(&base_url).map_err(|e| CollectorError::Config(format!("catalog url {base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollectorError::Config(format!("catalog http client: {e}")))?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    fn endpoint(&self, exchange: &str) -> String {
        format!("{}/exchangepairs/{exchange}", self.base_url)
    }
}

#[async_trait]
impl PairSource for RestPairSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn pairs(&self, exchange: &str) -> Result<Vec<ExchangePair>, CollectorError> {
        let url = self.endpoint(exchange);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CollectorError::CatalogUnavailable(format!("GET {url}: {e}")))?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(CollectorError::CatalogUnavailable(format!("GET {url}: HTTP {status}")));
        }
        if !status.is_success() {
            return Err(CollectorError::Config(format!("GET {url}: HTTP {status}")));
        }

        let body = resp.text().await.map_err(|e| CollectorError::CatalogUnavailable(format!("GET {url}: {e}")))?;
        let pairs: Vec<ExchangePair> =
            serde_json::from_str(&body).map_err(|e| CollectorError::Parse(format!("GET {url}: {e}")))?;
        Ok(stamp_exchange(pairs, exchange))
    }
}

// ---------------------------------------------------------------------------
// Static file source
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PairFile {
    #[serde(rename = "Coins", default)]
    coins: Vec<ExchangePair>,
}

pub struct StaticPairFile {
    dir: PathBuf,
}

impl StaticPairFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, exchange: &str) -> PathBuf {
        self.dir.join(format!("{exchange}.json"))
    }
}

#[async_trait]
impl PairSource for StaticPairFile {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    async fn pairs(&self, exchange: &str) -> Result<Vec<ExchangePair>, CollectorError> {
        let path = self.path_for(exchange);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CollectorError::Config(format!("pair file {}: {e}", path.display())))?;
        let file: PairFile = serde_json::from_str(&content)
            .map_err(|e| CollectorError::Parse(format!("pair file {}: {e}", path.display())))?;
        Ok(stamp_exchange(file.coins, exchange))
    }
}

fn stamp_exchange(mut pairs: Vec<ExchangePair>, exchange: &str) -> Vec<ExchangePair> {
    for p in &mut pairs {
        if p.exchange.is_empty() {
            p.exchange = exchange.to_string();
        }
    }
    pairs
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub struct PairCatalog {
    primary: Arc<dyn PairSource>,
    fallback: Option<Arc<dyn PairSource>>,
}

impl PairCatalog {
    pub fn new(primary: Arc<dyn PairSource>, fallback: Option<Arc<dyn PairSource>>) -> Self {
        Self { primary, fallback }
    }

    /// Pairs to collect for `exchange`. An empty list is a valid answer.
    pub async fn resolve_pairs(&self, exchange: &str) -> Result<Vec<ExchangePair>, CollectorError> {
        let err = match self.primary.pairs(exchange).await {
            Ok(pairs) => {
                info!("[{exchange}] {} pair(s) from {}", pairs.len(), self.primary.describe());
                return Ok(pairs);
            }
            Err(e) => e,
        };

        match &self.fallback {
            Some(fallback) if err.is_catalog_unavailable() => {
                warn!("[{exchange}] {err}; falling back to {}", fallback.describe());
                let pairs = fallback.pairs(exchange).await?;
                info!("[{exchange}] {} pair(s) from {}", pairs.len(), fallback.describe());
                Ok(pairs)
            }
            _ => Err(err),
        }
    }
}
