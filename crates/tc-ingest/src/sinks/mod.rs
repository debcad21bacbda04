//! Output sinks: the message bus publisher and the durable trade store.
//!
//! Both are traits so the router can be exercised against in-memory fakes.
//! Production implementations:
//!
//! - [`RedisStreamPublisher`] appends to Redis streams, one stream per topic
//! - [`JsonlTradeStore`] appends one JSON line per trade to a local file

pub mod jsonl;
pub mod redis_stream;

use std::sync::Arc;

use async_trait::async_trait;
use tc_core::{CollectorError, Trade};
use tracing::warn;

pub use self::jsonl::JsonlTradeStore;
pub use self::redis_stream::RedisStreamPublisher;

#[async_trait]
pub trait TradePublisher: Send + Sync {
    async fn publish(&self, topic: &str, trade: &Trade) -> Result<(), CollectorError>;

    async fn close(&self) -> Result<(), CollectorError> {
        Ok(())
    }
}

#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn save(&self, trade: &Trade) -> Result<(), CollectorError>;

    /// Make every saved trade durable.
    async fn flush(&self) -> Result<(), CollectorError>;
}

/// The sinks a collector process was started with. Which ones must be
/// present depends on the run mode.
#[derive(Clone, Default)]
pub struct Sinks {
    pub bus: Option<Arc<dyn TradePublisher>>,
    pub store: Option<Arc<dyn TradeStore>>,
}

impl Sinks {
    pub fn with_bus(bus: Arc<dyn TradePublisher>) -> Self {
        Self { bus: Some(bus), store: None }
    }

    pub fn with_store(store: Arc<dyn TradeStore>) -> Self {
        Self { bus: None, store: Some(store) }
    }

    /// Best-effort close: failures are logged, never returned.
    pub async fn close(&self, label: &str) {
        if let Some(bus) = &self.bus
            && let Err(e) = bus.close().await
        {
            warn!("[{label}] closing bus failed: {e}");
        }
        if let Some(store) = &self.store
            && let Err(e) = store.flush().await
        {
            warn!("[{label}] final store flush failed: {e}");
        }
    }
}
