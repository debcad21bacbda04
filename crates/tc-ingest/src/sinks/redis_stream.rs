//! Redis stream publisher.
//!
//! Every publish is one `XADD`:
//!
//! ```text
//! XADD <topic> [MAXLEN ~ <n>] * source <venue> pair <symbol> trade <json>
//! ```
//!
//! The multiplexed connection is cloned per call, so concurrent publishes
//! share one socket.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tc_core::config::BusConfig;
use tc_core::{CollectorError, Trade};
use tracing::info;

use super::TradePublisher;

pub struct RedisStreamPublisher {
    conn: MultiplexedConnection,
    max_stream_len: Option<u64>,
}

impl RedisStreamPublisher {
    /// Connect to the bus. Failure here is fatal for the process.
    pub async fn connect(config: &BusConfig) -> Result<Self, CollectorError> {
        let client = redis::Client::open(config.redis_url.as_str())
            .map_err(|e| CollectorError::Config(format!("redis url {}: {e}", config.redis_url)))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CollectorError::Publish(format!("connect {}: {e}", config.redis_url)))?;
        info!("[bus] connected to {}", config.redis_url);
        Ok(Self { conn, max_stream_len: config.max_stream_len })
    }
}

/// Field/value pairs of one stream entry.
pub fn stream_fields(trade: &Trade) -> Result<[(&'static str, String); 3], CollectorError> {
    let json = serde_json::to_string(trade).map_err(|e| CollectorError::Parse(e.to_string()))?;
    Ok([("source", trade.source.clone()), ("pair", trade.pair.symbol.clone()), ("trade", json)])
}

fn xadd_cmd(topic: &str, max_len: Option<u64>, fields: &[(&'static str, String)]) -> redis::Cmd {
    let mut cmd = redis::cmd("XADD");
    cmd.arg(topic);
    if let Some(n) = max_len {
        cmd.arg("MAXLEN").arg("~").arg(n);
    }
    cmd.arg("*");
    for (k, v) in fields {
        cmd.arg(*k).arg(v);
    }
    cmd
}

#[async_trait]
impl TradePublisher for RedisStreamPublisher {
    async fn publish(&self, topic: &str, trade: &Trade) -> Result<(), CollectorError> {
        let fields = stream_fields(trade)?;
        let mut conn = self.conn.clone();
        xadd_cmd(topic, self.max_stream_len, &fields)
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| CollectorError::Publish(format!("XADD {topic}: {e}")))?;
        Ok(())
    }
}
