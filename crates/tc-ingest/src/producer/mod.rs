//! Trade producers and their activation.
//!
//! A [`TradeProducer`] wraps whatever actually scrapes a venue. The collector
//! only sees one shared stream of [`Trade`]s and a count of how many producer
//! units are still running.
//!
//! ```text
//! pairs ──► activate() ──► attach_pair() × N   (centralized)
//!                     └──► attach_all()  × 1   (decentralized)
//!                                   │
//!            producer units ──► mpsc::Sender<Trade> ──► take_stream()
//!                   │
//!                   └─ own an ActivationGuard, dropped when the unit ends
//! ```

pub mod activation;
pub mod frame;
pub mod gateway;

use async_trait::async_trait;
use tc_core::{CollectorError, ExchangePair, Trade, VenueClass};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub use self::activation::{ActivationGuard, ActivationTracker};
pub use self::gateway::GatewayProducer;

/// Capacity of the shared trade sequence. Producers wait when it is full.
pub const TRADE_CHANNEL_CAPACITY: usize = 8192;

/// Receiving end of the shared trade sequence.
pub type TradeStream = mpsc::Receiver<Trade>;

/// Trait implemented by every venue scraper.
///
/// Only `Send` is required (not `Sync`) because the orchestrator drives the
/// producer sequentially during bootstrap.
#[async_trait]
pub trait TradeProducer: Send {
    /// Venue name, used in logs.
    fn name(&self) -> &str;

    /// Subscribe to a single pair (centralized venues). The started unit
    /// keeps `unit` until it ends; on error it is simply dropped.
    async fn attach_pair(&mut self, pair: &ExchangePair, unit: ActivationGuard) -> Result<(), CollectorError>;

    /// Start self-managed subscriptions for all pairs (decentralized venues),
    /// as one unit owning `unit`.
    async fn attach_all(&mut self, pairs: &[ExchangePair], unit: ActivationGuard) -> Result<(), CollectorError>;

    /// Hand out the shared trade sequence. Returns `None` after the first call.
    fn take_stream(&mut self) -> Option<TradeStream>;

    /// No further attach calls will be made. After this the stream closes
    /// once every running unit has ended.
    fn seal(&mut self) {}

    /// Stop every running unit.
    async fn shutdown(&mut self) {}
}

/// Outcome of [`activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivationResult {
    /// Attach calls made.
    pub attempted: usize,
    /// Attach calls that succeeded.
    pub activated: usize,
}

impl ActivationResult {
    pub fn failed(&self) -> usize {
        self.attempted - self.activated
    }
}

/// Activate `producer` for `pairs` according to the venue class.
///
/// Every attach is registered with `tracker` up front; a failed attach drops
/// its guard again. Attach failures are logged and skipped; they never abort
/// the remaining attaches.
pub async fn activate<P>(
    producer: &mut P,
    pairs: &[ExchangePair],
    class: VenueClass,
    tracker: &ActivationTracker,
) -> ActivationResult
where
    P: TradeProducer + ?Sized,
{
    let mut result = ActivationResult::default();

    match class {
        VenueClass::Centralized => {
            for pair in pairs {
                info!("[{}] adding pair {} ({})", producer.name(), pair.symbol, pair.foreign_name);
                result.attempted += 1;
                match producer.attach_pair(pair, tracker.register()).await {
                    Ok(()) => result.activated += 1,
                    Err(e) => warn!("[{}] attach {} failed: {e}", producer.name(), pair.foreign_name),
                }
            }
        }
        VenueClass::Decentralized => {
            info!("[{}] starting managed subscriptions for {} pair(s)", producer.name(), pairs.len());
            result.attempted = 1;
            match producer.attach_all(pairs, tracker.register()).await {
                Ok(()) => result.activated = 1,
                Err(e) => error!("[{}] managed subscription failed: {e}", producer.name()),
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::ScriptedProducer;

    fn pairs(names: &[&str]) -> Vec<ExchangePair> {
        names.iter().map(|n| ExchangePair::new(n.split('-').next().unwrap_or(n), *n)).collect()
    }

    #[tokio::test]
    async fn centralized_attaches_each_pair() {
        let mut p = ScriptedProducer::new("Binance");
        let tracker = ActivationTracker::new();
        let res = activate(&mut p, &pairs(&["BTC-USDT", "ETH-USDT", "SOL-USDT"]), VenueClass::Centralized, &tracker).await;

        assert_eq!(res, ActivationResult { attempted: 3, activated: 3 });
        assert_eq!(tracker.outstanding(), 3);
        assert_eq!(p.attached_pairs(), vec!["BTC-USDT", "ETH-USDT", "SOL-USDT"]);
        assert_eq!(p.attach_all_calls(), 0);
    }

    #[tokio::test]
    async fn centralized_failure_is_skipped() {
        let mut p = ScriptedProducer::new("Binance").failing_on("BTC-USDT");
        let tracker = ActivationTracker::new();
        let res = activate(&mut p, &pairs(&["BTC-USDT", "ETH-USDT"]), VenueClass::Centralized, &tracker).await;

        assert_eq!(res.attempted, 2);
        assert_eq!(res.activated, 1);
        assert_eq!(res.failed(), 1);
        assert_eq!(tracker.outstanding(), 1);
    }

    #[tokio::test]
    async fn ended_unit_leaves_the_others_outstanding() {
        let mut p = ScriptedProducer::new("Binance");
        let handle = p.handle();
        let tracker = ActivationTracker::new();
        activate(&mut p, &pairs(&["BTC-USDT", "ETH-USDT"]), VenueClass::Centralized, &tracker).await;
        assert_eq!(tracker.outstanding(), 2);

        assert!(handle.end_unit("BTC-USDT"));
        assert_eq!(tracker.outstanding(), 1);
        assert!(!handle.end_unit("BTC-USDT"));
        assert_eq!(tracker.outstanding(), 1);
    }

    #[tokio::test]
    async fn decentralized_activates_once() {
        let mut p = ScriptedProducer::new("UniswapV3Celo");
        let tracker = ActivationTracker::new();
        let res = activate(&mut p, &pairs(&["CELO-cUSD", "WETH-CELO"]), VenueClass::Decentralized, &tracker).await;

        assert_eq!(res, ActivationResult { attempted: 1, activated: 1 });
        assert_eq!(tracker.outstanding(), 1);
        assert_eq!(p.attach_all_calls(), 1);
        assert!(p.attached_pairs().is_empty());
    }

    #[tokio::test]
    async fn decentralized_failure_registers_nothing() {
        let mut p = ScriptedProducer::new("Anyswap").failing_attach_all();
        let tracker = ActivationTracker::new();
        let res = activate(&mut p, &pairs(&["USDC-ETH"]), VenueClass::Decentralized, &tracker).await;
        assert_eq!(res, ActivationResult { attempted: 1, activated: 0 });
        assert_eq!(tracker.outstanding(), 0);
    }

    #[tokio::test]
    async fn decentralized_with_no_pairs_still_activates() {
        let mut p = ScriptedProducer::new("Anyswap");
        let tracker = ActivationTracker::new();
        let res = activate(&mut p, &[], VenueClass::Decentralized, &tracker).await;
        assert_eq!(res.activated, 1);
    }

    #[tokio::test]
    async fn centralized_with_no_pairs_activates_nothing() {
        let mut p = ScriptedProducer::new("Kraken");
        let tracker = ActivationTracker::new();
        let res = activate(&mut p, &[], VenueClass::Centralized, &tracker).await;
        assert_eq!(res, ActivationResult::default());
        assert_eq!(tracker.outstanding(), 0);
    }
}
