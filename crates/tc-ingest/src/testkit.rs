//! In-memory fakes for the collaborator traits, shared by the unit tests.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tc_core::time_util::Clock;
use tc_core::{Asset, CollectorError, ExchangePair, Trade};
use tokio::sync::mpsc;

use crate::catalog::PairSource;
use crate::producer::{ActivationGuard, TradeProducer, TradeStream};
use crate::sinks::{TradePublisher, TradeStore};

// ---------------------------------------------------------------------------
// Producer
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ScriptLog {
    attached: Vec<String>,
    attach_all_calls: usize,
    shutdowns: usize,
    /// Running units by pair name (`*` for an attach-all unit).
    units: Vec<(String, ActivationGuard)>,
}

/// Producer whose units are the test itself: trades are pushed through
/// [`ScriptedProducer::sender`].
pub struct ScriptedProducer {
    name: String,
    failing: HashSet<String>,
    fail_attach_all: bool,
    tx: Option<mpsc::Sender<Trade>>,
    rx: Option<TradeStream>,
    log: Arc<Mutex<ScriptLog>>,
}

impl ScriptedProducer {
    pub fn new(name: &str) -> Self {
        let (tx, rx) = mpsc::channel(64);
        Self {
            name: name.into(),
            failing: HashSet::new(),
            fail_attach_all: false,
            tx: Some(tx),
            rx: Some(rx),
            log: Arc::default(),
        }
    }

    pub fn failing_on(mut self, foreign_name: &str) -> Self {
        self.failing.insert(foreign_name.into());
        self
    }

    pub fn failing_attach_all(mut self) -> Self {
        self.fail_attach_all = true;
        self
    }

    /// A unit handle. The stream closes once every handle is dropped and the
    /// producer is sealed.
    pub fn sender(&self) -> mpsc::Sender<Trade> {
        self.tx.clone().expect("sender requested after seal")
    }

    pub fn handle(&self) -> ScriptHandle {
        ScriptHandle(self.log.clone())
    }

    pub fn attached_pairs(&self) -> Vec<String> {
        self.handle().attached_pairs()
    }

    pub fn attach_all_calls(&self) -> usize {
        self.handle().attach_all_calls()
    }
}

/// Access to a [`ScriptedProducer`]'s call log and running units after it
/// has been moved.
#[derive(Clone)]
pub struct ScriptHandle(Arc<Mutex<ScriptLog>>);

impl ScriptHandle {
    /// End the first running unit for `name`, as if its connection gave up.
    pub fn end_unit(&self, name: &str) -> bool {
        let mut log = self.0.lock().unwrap();
        match log.units.iter().position(|(n, _)| n == name) {
            Some(i) => {
                log.units.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn attached_pairs(&self) -> Vec<String> {
        self.0.lock().unwrap().attached.clone()
    }

    pub fn attach_all_calls(&self) -> usize {
        self.0.lock().unwrap().attach_all_calls
    }

    pub fn shutdowns(&self) -> usize {
        self.0.lock().unwrap().shutdowns
    }
}

#[async_trait]
impl TradeProducer for ScriptedProducer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attach_pair(&mut self, pair: &ExchangePair, unit: ActivationGuard) -> Result<(), CollectorError> {
        if self.failing.contains(&pair.foreign_name) {
            return Err(CollectorError::Attach(format!("scripted failure for {}", pair.foreign_name)));
        }
        let mut log = self.log.lock().unwrap();
        log.attached.push(pair.foreign_name.clone());
        log.units.push((pair.foreign_name.clone(), unit));
        Ok(())
    }

    async fn attach_all(&mut self, _pairs: &[ExchangePair], unit: ActivationGuard) -> Result<(), CollectorError> {
        let mut log = self.log.lock().unwrap();
        log.attach_all_calls += 1;
        if self.fail_attach_all {
            return Err(CollectorError::Attach("scripted attach_all failure".into()));
        }
        log.units.push(("*".into(), unit));
        Ok(())
    }

    fn take_stream(&mut self) -> Option<TradeStream> {
        self.rx.take()
    }

    fn seal(&mut self) {
        self.tx = None;
    }

    async fn shutdown(&mut self) {
        self.tx = None;
        let mut log = self.log.lock().unwrap();
        log.shutdowns += 1;
        log.units.clear();
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Bus that records every publish. Publishes to `failing_topic` fail.
#[derive(Default)]
pub struct RecordingBus {
    published: Mutex<Vec<(String, Trade)>>,
    failing_topic: Option<String>,
    closed: Mutex<bool>,
}

impl RecordingBus {
    pub fn failing_on(topic: &str) -> Self {
        Self { failing_topic: Some(topic.into()), ..Default::default() }
    }

    pub fn published(&self) -> Vec<(String, Trade)> {
        self.published.lock().unwrap().clone()
    }

    pub fn topics(&self) -> Vec<String> {
        self.published().into_iter().map(|(t, _)| t).collect()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl TradePublisher for RecordingBus {
    async fn publish(&self, topic: &str, trade: &Trade) -> Result<(), CollectorError> {
        if self.failing_topic.as_deref() == Some(topic) {
            return Err(CollectorError::Publish(format!("scripted failure on {topic}")));
        }
        self.published.lock().unwrap().push((topic.to_string(), trade.clone()));
        Ok(())
    }

    async fn close(&self) -> Result<(), CollectorError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingStore {
    saved: Mutex<Vec<Trade>>,
    flushes: Mutex<usize>,
    fail_flush: bool,
}

impl RecordingStore {
    pub fn failing_flush() -> Self {
        Self { fail_flush: true, ..Default::default() }
    }

    pub fn saved(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn flushes(&self) -> usize {
        *self.flushes.lock().unwrap()
    }
}

#[async_trait]
impl TradeStore for RecordingStore {
    async fn save(&self, trade: &Trade) -> Result<(), CollectorError> {
        self.saved.lock().unwrap().push(trade.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<(), CollectorError> {
        *self.flushes.lock().unwrap() += 1;
        if self.fail_flush {
            return Err(CollectorError::Store("scripted flush failure".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pair sources
// ---------------------------------------------------------------------------

/// Pair source returning a fixed answer and counting calls.
pub struct FixedPairSource {
    answer: Result<Vec<ExchangePair>, fn(String) -> CollectorError>,
    calls: Mutex<usize>,
}

impl FixedPairSource {
    pub fn with_pairs(pairs: Vec<ExchangePair>) -> Self {
        Self { answer: Ok(pairs), calls: Mutex::new(0) }
    }

    pub fn unavailable() -> Self {
        Self { answer: Err(CollectorError::CatalogUnavailable as fn(String) -> CollectorError), calls: Mutex::new(0) }
    }

    pub fn malformed() -> Self {
        Self { answer: Err(CollectorError::Parse as fn(String) -> CollectorError), calls: Mutex::new(0) }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl PairSource for FixedPairSource {
    fn describe(&self) -> String {
        "fixed".into()
    }

    async fn pairs(&self, exchange: &str) -> Result<Vec<ExchangePair>, CollectorError> {
        *self.calls.lock().unwrap() += 1;
        match &self.answer {
            Ok(p) => Ok(p.clone()),
            Err(make) => Err(make(format!("scripted for {exchange}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Clock and fixtures
// ---------------------------------------------------------------------------

/// Epoch clock that advances with tokio's (pausable) clock.
pub struct TokioClock {
    epoch_ms: u64,
    start: tokio::time::Instant,
}

impl TokioClock {
    pub fn starting_at(epoch_ms: u64) -> Self {
        Self { epoch_ms, start: tokio::time::Instant::now() }
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        self.epoch_ms + self.start.elapsed().as_millis() as u64
    }
}

pub fn cex_trade(source: &str, symbol: &str, time_ms: u64) -> Trade {
    Trade {
        source: source.into(),
        pair: ExchangePair::new(symbol, format!("{symbol}-USDT")),
        time_ms,
        price: 100.0,
        volume: 1.0,
        foreign_trade_id: format!("{time_ms}"),
        base_token: Some(Asset::new(symbol, "", "")),
        quote_token: Some(Asset::new("USDT", "", "")),
        estimated_usd_price: None,
    }
}

pub fn pool_trade(source: &str, time_ms: u64) -> Trade {
    Trade {
        source: source.into(),
        pair: ExchangePair::new("CELO", "CELO-cUSD"),
        time_ms,
        price: 0.5,
        volume: 10.0,
        foreign_trade_id: format!("0x{time_ms:x}"),
        base_token: Some(Asset::new("CELO", "0x471ece3750da237f93b8e339c536989b8978a438", "Celo")),
        quote_token: Some(Asset::new("cUSD", "0x765de816845861e75a25fca122bb6898b8b1282a", "Celo")),
        estimated_usd_price: None,
    }
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    let dir = std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
