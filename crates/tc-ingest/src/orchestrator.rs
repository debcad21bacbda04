//! Collector bootstrap and the consume loop.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator.start()
//!   ├─ PairCatalog.resolve_pairs()
//!   ├─ producer.take_stream()
//!   ├─ activate()            ──► ActivationTracker
//!   ├─ producer.seal()
//!   ├─ HealthState.set_ready()
//!   └─ spawn ConsumeLoop     ──► select! { trade ──► Watchdog.observe + ModeRouter.route,
//!                                          tick  ──► Watchdog.check }
//! ```
//!
//! The loop ends in one of two ways, reported as [`ConsumeOutcome`]: the
//! shared stream closes, or the watchdog trips. What to do about either is
//! the runner's decision.

use std::sync::Arc;
use std::time::Duration;

use tc_core::CollectorError;
use tc_core::config::VenueProfile;
use tc_core::time_util::{Clock, SystemClock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, interval_at};
use tracing::{error, info, warn};

use crate::catalog::PairCatalog;
use crate::health::HealthState;
use crate::producer::{ActivationResult, ActivationTracker, TradeProducer, TradeStream, activate};
use crate::router::ModeRouter;
use crate::sinks::Sinks;
use crate::watchdog::{Watchdog, WatchdogStatus};

/// How the consume loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Every producer unit ended. `trades` counts routed trades.
    StreamClosed { trades: u64 },
    /// No trade for longer than the grace window.
    WatchdogTripped { silence: Duration },
}

pub struct Orchestrator {
    profile: VenueProfile,
    catalog: PairCatalog,
    router: ModeRouter,
    health: Arc<HealthState>,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    pub fn new(profile: VenueProfile, catalog: PairCatalog, router: ModeRouter, health: Arc<HealthState>) -> Self {
        Self { profile, catalog, router, health, clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bootstrap the collector and spawn the consume loop.
    ///
    /// Fails only before any attach was made (catalog or stream errors).
    /// Individual attach failures are logged and reflected in
    /// [`Running::activation`].
    pub async fn start(self, mut producer: Box<dyn TradeProducer>) -> Result<Running, CollectorError> {
        let Self { profile, catalog, router, health, clock } = self;
        let label = profile.name.clone();

        let pairs = catalog.resolve_pairs(&label).await?;
        let stream = producer
            .take_stream()
            .ok_or_else(|| CollectorError::Config(format!("[{label}] producer stream already taken")))?;

        let tracker = ActivationTracker::new();
        let activation = activate(producer.as_mut(), &pairs, profile.class, &tracker).await;
        producer.seal();

        if activation.activated == 0 {
            warn!("[{label}] no producer unit activated ({} attempted)", activation.attempted);
        }
        info!(
            "[{label}] {} venue, mode {}: {}/{} activation(s), {} pair(s)",
            profile.class,
            router.mode(),
            activation.activated,
            activation.attempted,
            pairs.len()
        );
        health.set_ready();

        match profile.watchdog_delay {
            Some(d) => info!("[{label}] watchdog grace window {d:?}"),
            None => warn!("[{label}] no watchdog delay configured, liveness watchdog disabled"),
        }

        let sinks = router.sinks().clone();
        let consume_loop = ConsumeLoop {
            label,
            stream,
            router,
            grace: profile.watchdog_delay,
            tracker: tracker.clone(),
            clock,
        };
        let consume = tokio::spawn(consume_loop.run());

        Ok(Running { producer, tracker, activation, sinks, consume })
    }
}

/// A bootstrapped collector.
pub struct Running {
    pub producer: Box<dyn TradeProducer>,
    pub tracker: ActivationTracker,
    pub activation: ActivationResult,
    pub sinks: Sinks,
    pub consume: JoinHandle<ConsumeOutcome>,
}

impl Running {
    /// Stop every producer unit and wait (bounded) for the consume loop to
    /// drain and close the sinks.
    pub async fn shutdown(mut self, grace: Duration) -> Option<ConsumeOutcome> {
        let label = self.producer.name().to_string();
        self.producer.shutdown().await;
        match tokio::time::timeout(grace, &mut self.consume).await {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(e)) => {
                error!("[{label}] consume loop failed: {e}");
                None
            }
            Err(_) => {
                warn!("[{label}] consume loop still busy after {grace:?}, aborting");
                self.consume.abort();
                self.sinks.close(&label).await;
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Consume loop
// ---------------------------------------------------------------------------

struct ConsumeLoop {
    label: String,
    stream: TradeStream,
    router: ModeRouter,
    grace: Option<Duration>,
    tracker: ActivationTracker,
    clock: Arc<dyn Clock>,
}

impl ConsumeLoop {
    async fn run(mut self) -> ConsumeOutcome {
        let label = self.label.as_str();
        let mut watchdog = self.grace.map(|g| Watchdog::new(g, self.clock.now_ms()));
        let mut tick = self.grace.map(|g| interval_at(Instant::now() + g, g));
        let mut trades: u64 = 0;

        loop {
            tokio::select! {
                next = self.stream.recv() => {
                    let Some(trade) = next else {
                        info!("[{label}] trade stream closed after {trades} trade(s)");
                        self.tracker.retire_all();
                        self.router.sinks().close(label).await;
                        return ConsumeOutcome::StreamClosed { trades };
                    };

                    if let Some(w) = watchdog.as_mut() {
                        w.observe(&trade);
                    }
                    if !trade.is_well_formed() {
                        warn!("[{label}] dropping trade {} without source or pair", trade.foreign_trade_id);
                        continue;
                    }
                    self.router.route(&trade).await;
                    trades += 1;
                }

                _ = next_tick(&mut tick) => {
                    if let Some(w) = watchdog.as_mut()
                        && let WatchdogStatus::Tripped { silence } = w.check(self.clock.now_ms())
                    {
                        error!("[{label}] no trade for {silence:?} (grace {:?})", w.grace());
                        return ConsumeOutcome::WatchdogTripped { silence };
                    }
                }
            }
        }
    }
}

/// Resolves on the next watchdog tick, or never when the watchdog is off.
async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(i) => {
            i.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
