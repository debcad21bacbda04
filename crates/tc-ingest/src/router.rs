//! Mode-dependent trade routing.
//!
//! | Mode          | Bus topic(s)                              | Store        |
//! |---------------|-------------------------------------------|--------------|
//! | `current`     | primary (+ replica when enabled), mirrored | –            |
//! | `historical`  | historical (+ replica when enabled), mirrored | –         |
//! | `estimation`  | estimation, mirrored                       | –            |
//! | `storeTrades` | –                                          | save + flush |
//! | `assetmap`    | –                                          | –            |
//!
//! A failing sink never stops routing: every attempt is logged on its own and
//! the next attempt proceeds. In particular the mirrored publish is attempted
//! even when the primary publish to the same topic failed; a failed primary
//! write does not suppress its reversed twin.

use tc_core::config::TopicTable;
use tc_core::mirror::TradeMirror;
use tc_core::{CollectorError, RunMode, Trade};
use tracing::{error, info, warn};

use crate::sinks::Sinks;

/// Counts from routing one trade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteReport {
    pub published: usize,
    pub publish_failures: usize,
    pub stored: bool,
}

pub struct ModeRouter {
    mode: RunMode,
    topics: TopicTable,
    sinks: Sinks,
    mirror: TradeMirror,
    replica: bool,
}

impl ModeRouter {
    /// Build a router, checking that the sinks `mode` needs are present.
    pub fn new(
        mode: RunMode,
        topics: TopicTable,
        sinks: Sinks,
        mirror: TradeMirror,
        replica: bool,
    ) -> Result<Self, CollectorError> {
        if mode.publishes() && sinks.bus.is_none() {
            return Err(CollectorError::Config(format!("mode {mode} needs a message bus")));
        }
        if mode.stores() && sinks.store.is_none() {
            return Err(CollectorError::Config(format!("mode {mode} needs a trade store")));
        }
        Ok(Self { mode, topics, sinks, mirror, replica })
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn sinks(&self) -> &Sinks {
        &self.sinks
    }

    /// Replica publishing applies to the live and backfill topics only.
    fn replica_active(&self) -> bool {
        self.replica && matches!(self.mode, RunMode::Current | RunMode::Historical)
    }

    pub async fn route(&self, trade: &Trade) -> RouteReport {
        let mut report = RouteReport::default();

        match self.mode {
            RunMode::Current | RunMode::Historical | RunMode::Estimation => {
                if let Some(topic) = self.topics.primary(self.mode) {
                    self.publish_with_mirror(topic, trade, &mut report).await;
                }
                if self.replica_active() {
                    self.publish_with_mirror(self.topics.replica(), trade, &mut report).await;
                }
            }
            RunMode::StoreTrades => {
                if let Some(store) = &self.sinks.store {
                    match store.save(trade).await {
                        Ok(()) => report.stored = true,
                        Err(e) => error!("[{}] store {} failed: {e}", trade.source, trade.pair_label()),
                    }
                    if let Err(e) = store.flush().await {
                        error!("[{}] store flush failed: {e}", trade.source);
                    }
                }
            }
            RunMode::AssetMap => {
                info!(
                    "[{}] asset map: {} base={:?} quote={:?}",
                    trade.source,
                    trade.pair_label(),
                    trade.base_token.as_ref().map(|a| (&a.address, &a.blockchain)),
                    trade.quote_token.as_ref().map(|a| (&a.address, &a.blockchain)),
                );
            }
        }

        report
    }

    /// Publish `trade` to `topic`, then its reversed form when the venue is
    /// in the mirror table. The two attempts are independent.
    async fn publish_with_mirror(&self, topic: &str, trade: &Trade, report: &mut RouteReport) {
        let Some(bus) = &self.sinks.bus else {
            return;
        };

        match bus.publish(topic, trade).await {
            Ok(()) => report.published += 1,
            Err(e) => {
                report.publish_failures += 1;
                error!("[{}] publish {} to {topic} failed: {e}", trade.source, trade.pair_label());
            }
        }

        if !self.mirror.should_mirror(&trade.source) {
            return;
        }
        let swapped = match self.mirror.mirror(trade) {
            Ok(t) => t,
            Err(e) => {
                warn!("[{}] {e}", trade.source);
                return;
            }
        };
        match bus.publish(topic, &swapped).await {
            Ok(()) => report.published += 1,
            Err(e) => {
                report.publish_failures += 1;
                error!("[{}] publish mirrored {} to {topic} failed: {e}", trade.source, swapped.pair_label());
            }
        }
    }
}
