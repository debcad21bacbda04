//! Configuration parsing for the trade collector.
//!
//! A collector process reads one JSON config file. Besides sink and catalog
//! endpoints it carries the two venue tables (primary and duplicates) that
//! replace process-wide exchange registries, plus the optional mirror table.
//!
//! # Example config
//!
//! ```json
//! {
//!   "venues": [
//!     { "name": "Binance", "centralized": true, "watchdog_delay_sec": 300,
//!       "feed": { "url": "wss://gateway.local/binance",
//!                 "subscribe": "{\"op\":\"subscribe\",\"pair\":\"{foreign_name}\"}" } }
//!   ],
//!   "duplicates": [
//!     { "name": "UniswapV3Celo", "centralized": false, "watchdog_delay_sec": 900 }
//!   ],
//!   "bus": { "redis_url": "redis://127.0.0.1:6379/" },
//!   "store": { "path": "/var/lib/collector/trades.jsonl" },
//!   "catalog": { "url": "http://catalog.local", "pairs_dir": "config" },
//!   "probe": { "listen": "0.0.0.0:2345" }
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use ahash::AHashMap;
use serde::Deserialize;

use crate::error::CollectorError;
use crate::mirror::{DEFAULT_MIRROR_VENUES, TradeMirror};
use crate::types::{RunMode, VenueClass};

/// Top-level application config, deserialized from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Primary venue table.
    pub venues: Vec<VenueEntry>,

    /// Duplicate venue table, consulted when the primary has no entry or no
    /// watchdog delay.
    #[serde(default)]
    pub duplicates: Vec<VenueEntry>,

    /// Venues whose trades are mirrored. `None` keeps the built-in table.
    #[serde(default)]
    pub mirror_venues: Option<Vec<String>>,

    #[serde(default)]
    pub topics: TopicTable,

    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub probe: ProbeConfig,
}

impl AppConfig {
    pub fn registry(&self) -> VenueRegistry {
        VenueRegistry::new(self.venues.clone(), self.duplicates.clone())
    }

    pub fn mirror(&self) -> TradeMirror {
        match &self.mirror_venues {
            Some(venues) => TradeMirror::new(venues.iter().cloned()),
            None => TradeMirror::new(DEFAULT_MIRROR_VENUES.iter().copied()),
        }
    }
}

/// One row of a venue table.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueEntry {
    /// Exchange identifier as passed on the command line (e.g. `"Binance"`).
    pub name: String,

    /// Whether pair subscriptions are driven by the caller.
    #[serde(default)]
    pub centralized: bool,

    /// Watchdog grace window in seconds. `0` or absent means "not configured".
    #[serde(default)]
    pub watchdog_delay_sec: Option<u64>,

    /// Gateway feed the producer subscribes to.
    #[serde(default)]
    pub feed: Option<FeedConfig>,
}

/// WebSocket gateway delivering trades in the standard trade-message format.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub url: String,

    /// Subscription template. Placeholders: `{symbol}`, `{foreign_name}`
    /// (first pair of the call) and `{foreign_names}` (JSON array of all).
    pub subscribe: String,

    /// Ping interval in seconds (default: 20).
    #[serde(default)]
    pub ping_interval_sec: Option<u64>,

    /// Text frame sent as keep-alive (e.g. `{"op":"ping"}`). Without it a
    /// protocol-level ping frame is used.
    #[serde(default)]
    pub ping_message: Option<String>,

    /// Consecutive failed reconnects after which a connection gives up.
    #[serde(default)]
    pub max_reconnects: Option<u32>,

    /// Extra HTTP headers for the WebSocket handshake (e.g. API key).
    #[serde(default)]
    pub extra_headers: HashMap<String, String>,
}

impl FeedConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_sec.unwrap_or(20))
    }
}

/// Bus topic names per mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TopicTable {
    pub trades: String,
    pub trades_replica: String,
    pub trades_estimation: String,
    pub trades_historical: String,
}

impl TopicTable {
    /// Primary topic for `mode`, `None` for modes that never publish.
    pub fn primary(&self, mode: RunMode) -> Option<&str> {
        match mode {
            RunMode::Current => Some(&self.trades),
            RunMode::Historical => Some(&self.trades_historical),
            RunMode::Estimation => Some(&self.trades_estimation),
            RunMode::StoreTrades | RunMode::AssetMap => None,
        }
    }

    pub fn replica(&self) -> &str {
        &self.trades_replica
    }
}

impl Default for TopicTable {
    fn default() -> Self {
        Self {
            trades: "trades".into(),
            trades_replica: "trades-replica".into(),
            trades_estimation: "trades-estimation".into(),
            trades_historical: "trades-historical".into(),
        }
    }
}

/// Message bus connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub redis_url: String,
    /// Approximate `MAXLEN` applied on every `XADD`; `None` keeps streams unbounded.
    pub max_stream_len: Option<u64>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { redis_url: "redis://127.0.0.1:6379/".into(), max_stream_len: None }
    }
}

/// Durable store location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: "trades.jsonl".into() }
    }
}

/// Pair catalog endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the pair catalog service. `None` disables the primary source.
    pub url: Option<String>,
    /// Directory holding `<exchange>.json` static pair files.
    pub pairs_dir: Option<String>,
    /// Request timeout in seconds.
    pub timeout_sec: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { url: None, pairs_dir: Some("config".into()), timeout_sec: 10 }
    }
}

/// Health probe listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub listen: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { listen: "0.0.0.0:2345".into() }
    }
}

// ---------------------------------------------------------------------------
// Venue registry
// ---------------------------------------------------------------------------

/// Everything the collector needs to know about the venue it runs for.
#[derive(Debug, Clone)]
pub struct VenueProfile {
    pub name: String,
    pub class: VenueClass,
    /// `None` when neither table configures a delay; the watchdog is then off.
    pub watchdog_delay: Option<Duration>,
    pub feed: Option<FeedConfig>,
}

/// Lookup over the primary and duplicate venue tables.
#[derive(Debug, Clone, Default)]
pub struct VenueRegistry {
    primary: AHashMap<String, VenueEntry>,
    duplicates: AHashMap<String, VenueEntry>,
}

impl VenueRegistry {
    pub fn new(primary: Vec<VenueEntry>, duplicates: Vec<VenueEntry>) -> Self {
        Self {
            primary: primary.into_iter().map(|e| (e.name.clone(), e)).collect(),
            duplicates: duplicates.into_iter().map(|e| (e.name.clone(), e)).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.primary.contains_key(name) || self.duplicates.contains_key(name)
    }

    /// All known venue names, sorted.
    pub fn known_venues(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.primary.keys().chain(self.duplicates.keys()).map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Resolve a venue from both tables.
    ///
    /// The venue is centralized if either table says so. The watchdog delay
    /// and feed come from the primary entry, falling back to the duplicate.
    pub fn resolve(&self, name: &str) -> Result<VenueProfile, CollectorError> {
        let primary = self.primary.get(name);
        let duplicate = self.duplicates.get(name);
        if primary.is_none() && duplicate.is_none() {
            return Err(CollectorError::UnknownExchange(name.to_string()));
        }

        let centralized = primary.is_some_and(|e| e.centralized) || duplicate.is_some_and(|e| e.centralized);
        let delay_of = |e: Option<&VenueEntry>| e.and_then(|e| e.watchdog_delay_sec).filter(|&s| s > 0);
        let watchdog_delay = delay_of(primary).or_else(|| delay_of(duplicate)).map(Duration::from_secs);
        let feed = primary.and_then(|e| e.feed.clone()).or_else(|| duplicate.and_then(|e| e.feed.clone()));

        Ok(VenueProfile { name: name.to_string(), class: VenueClass::from_centralized(centralized), watchdog_delay, feed })
    }
}

/// Load and parse a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
