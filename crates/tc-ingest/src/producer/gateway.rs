//! WebSocket gateway producer.
//!
//! Each attach opens one [`WsConnection`] against the venue's gateway feed.
//! Centralized venues get one connection per pair; decentralized venues get a
//! single connection subscribed to every pair at once. All connections push
//! into the same bounded channel, which is the producer's trade stream. A
//! connection holds its activation guard until its task ends, so a
//! connection that gives up is no longer counted as running.

use std::sync::Arc;

use async_trait::async_trait;
use tc_core::config::FeedConfig;
use tc_core::ws::client::validate_ws_url;
use tc_core::ws::{FrameParser, PingPayload, WsConnConfig, WsConnection};
use tc_core::{CollectorError, ExchangePair, Trade};
use tokio::sync::mpsc;
use tracing::info;

use super::frame::{parse_frame, render_subscribe};
use super::{ActivationGuard, TRADE_CHANNEL_CAPACITY, TradeProducer, TradeStream};

pub struct GatewayProducer {
    venue: String,
    feed: FeedConfig,
    tx: Option<mpsc::Sender<Trade>>,
    rx: Option<TradeStream>,
    connections: Vec<WsConnection>,
}

impl GatewayProducer {
    pub fn new(venue: impl Into<String>, feed: FeedConfig) -> Self {
        let (tx, rx) = mpsc::channel(TRADE_CHANNEL_CAPACITY);
        Self { venue: venue.into(), feed, tx: Some(tx), rx: Some(rx), connections: Vec::new() }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn conn_config(&self, pairs: &[ExchangePair], label: String) -> WsConnConfig {
        WsConnConfig {
            url: self.feed.url.clone(),
            subscribe_msg: Some(render_subscribe(&self.feed.subscribe, pairs)),
            extra_headers: self.feed.extra_headers.clone(),
            ping_interval: Some(self.feed.ping_interval()),
            ping_payload: Some(PingPayload::from_message(self.feed.ping_message.as_deref())),
            max_reconnects: self.feed.max_reconnects,
            label,
        }
    }

    fn open(&mut self, pairs: &[ExchangePair], label: String, unit: ActivationGuard) -> Result<(), CollectorError> {
        let Some(tx) = self.tx.clone() else {
            return Err(CollectorError::Attach(format!("[{label}] producer already sealed")));
        };
        validate_ws_url(&self.feed.url).map_err(|e| CollectorError::Attach(format!("[{label}] {e}")))?;

        let venue = self.venue.clone();
        let parser: FrameParser<Trade> = Arc::new(move |text| parse_frame(&venue, text));

        let mut conn = WsConnection::new(self.conn_config(pairs, label));
        conn.start(parser, tx, move || unit.finish());
        self.connections.push(conn);
        Ok(())
    }
}

#[async_trait]
impl TradeProducer for GatewayProducer {
    fn name(&self) -> &str {
        &self.venue
    }

    async fn attach_pair(&mut self, pair: &ExchangePair, unit: ActivationGuard) -> Result<(), CollectorError> {
        let label = format!("{}:{}", self.venue, pair.foreign_name);
        self.open(std::slice::from_ref(pair), label, unit)
    }

    async fn attach_all(&mut self, pairs: &[ExchangePair], unit: ActivationGuard) -> Result<(), CollectorError> {
        let label = format!("{}:all", self.venue);
        self.open(pairs, label, unit)
    }

    fn take_stream(&mut self) -> Option<TradeStream> {
        self.rx.take()
    }

    fn seal(&mut self) {
        self.tx = None;
    }

    async fn shutdown(&mut self) {
        self.tx = None;
        info!("[{}] stopping {} connection(s)", self.venue, self.connections.len());
        for conn in &mut self.connections {
            conn.stop().await;
        }
        self.connections.clear();
    }
}
