//! # tc-runner
//!
//! Entry point of a per-exchange trade collector process.
//!
//! Loads the JSON configuration, resolves the venue, wires the pair catalog,
//! the producer, the sinks for the selected mode and the health probes, then
//! runs until the trade stream closes, the watchdog trips, or Ctrl+C.
//!
//! # Usage
//!
//! ```bash
//! tc-runner --exchange Binance --mode current --config collector.json
//! REPLICA_TOPIC=true tc-runner --exchange UniswapV3Celo --pairs-file
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tc_core::RunMode;
use tc_core::config::AppConfig;
use tc_ingest::catalog::{PairCatalog, PairSource, RestPairSource, StaticPairFile};
use tc_ingest::health::{HealthState, spawn_probe_server};
use tc_ingest::router::ModeRouter;
use tc_ingest::sinks::{JsonlTradeStore, RedisStreamPublisher, Sinks, TradePublisher, TradeStore};
use tc_ingest::{ConsumeOutcome, Orchestrator};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PairSourceKind {
    /// Pair catalog service, static file as fallback.
    Database,
    /// Static pair file only.
    File,
}

/// Per-exchange trade collector.
#[derive(Parser)]
#[command(name = "tc-runner", about = "Per-exchange trade collector")]
struct Cli {
    /// Exchange to collect (must be listed in the config's venue tables).
    #[arg(long, env = "EXCHANGE")]
    exchange: String,

    /// Run mode: current, storeTrades, estimation, historical, assetmap.
    #[arg(long, env = "MODE", default_value = "current")]
    mode: RunMode,

    /// Where the pair list comes from.
    #[arg(long, value_enum, default_value = "database")]
    pair_source: PairSourceKind,

    /// Shorthand for `--pair-source file`.
    #[arg(long)]
    pairs_file: bool,

    /// Configuration file path (JSON).
    #[arg(long, env = "COLLECTOR_CONFIG", default_value = "collector.json")]
    config: PathBuf,

    /// Also publish to the replica topic.
    #[arg(long, env = "REPLICA_TOPIC")]
    replica_topic: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,
}

impl Cli {
    fn pair_source(&self) -> PairSourceKind {
        if self.pairs_file { PairSourceKind::File } else { self.pair_source }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    tc_core::logging::init_logging(&cli.log_level, cli.log_dir.as_deref(), &format!("collector-{}", cli.exchange))?;
    let label = cli.exchange.as_str();
    info!("[{label}] tc-runner starting, mode={}, config={}", cli.mode, cli.config.display());

    // 2. Load configuration and resolve the venue
    let config = tc_core::config::load_config(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    let registry = config.registry();
    let profile = match registry.resolve(label) {
        Ok(p) => p,
        Err(e) => {
            error!("[{label}] {e}; known venues: {}", registry.known_venues().join(", "));
            return Err(e.into());
        }
    };
    info!("[{label}] {} venue", profile.class);

    // 3. Pair catalog
    let catalog = build_catalog(&config, cli.pair_source())?;

    // 4. Sinks and router
    let sinks = build_sinks(&config, cli.mode).await?;
    let mirror = config.mirror();
    info!("[{label}] mirroring {} venue(s), replica={}", mirror.len(), cli.replica_topic);
    let router = ModeRouter::new(cli.mode, config.topics.clone(), sinks, mirror, cli.replica_topic)?;

    // 5. Health probes
    let health = HealthState::new();
    let probe_addr: SocketAddr =
        config.probe.listen.parse().with_context(|| format!("probe listen address {}", config.probe.listen))?;
    let (_, _probe_task) = spawn_probe_server(health.clone(), probe_addr)?;

    // 6. Bootstrap
    let producer = tc_ingest::registry::create_producer(&profile)?;
    let orchestrator = Orchestrator::new(profile, catalog, router, health);
    let mut running = orchestrator.start(producer).await?;
    info!("[{label}] collecting, press Ctrl+C to stop");

    // 7. Run until the stream ends, the watchdog trips, or Ctrl+C
    tokio::select! {
        joined = &mut running.consume => {
            match joined.context("consume loop panicked")? {
                ConsumeOutcome::WatchdogTripped { silence } => {
                    error!("[{label}] watchdog tripped after {silence:?} without trades, exiting");
                    std::process::exit(1);
                }
                ConsumeOutcome::StreamClosed { trades } => {
                    running.tracker.wait().await;
                    bail!("[{label}] every producer unit ended after {trades} trade(s)");
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("[{label}] shutdown signal received");
            match running.shutdown(Duration::from_secs(5)).await {
                Some(ConsumeOutcome::StreamClosed { trades }) => info!("[{label}] stopped after {trades} trade(s)"),
                Some(other) => warn!("[{label}] stopped with {other:?}"),
                None => warn!("[{label}] stopped without draining"),
            }
        }
    }

    info!("[{label}] goodbye");
    Ok(())
}

fn build_catalog(config: &AppConfig, kind: PairSourceKind) -> Result<PairCatalog> {
    let pairs_dir = config.catalog.pairs_dir.clone().unwrap_or_else(|| "config".into());
    let file: Arc<dyn PairSource> = Arc::new(StaticPairFile::new(pairs_dir));

    let catalog = match (kind, &config.catalog.url) {
        (PairSourceKind::File, _) => PairCatalog::new(file, None),
        (PairSourceKind::Database, Some(url)) => {
            let rest = RestPairSource::new(url.clone(), Duration::from_secs(config.catalog.timeout_sec))?;
            let fallback = config.catalog.pairs_dir.is_some().then_some(file);
            PairCatalog::new(Arc::new(rest), fallback)
        }
        (PairSourceKind::Database, None) => bail!("pair source 'database' needs catalog.url in the config"),
    };
    Ok(catalog)
}

async fn build_sinks(config: &AppConfig, mode: RunMode) -> Result<Sinks> {
    let mut sinks = Sinks::default();
    if mode.publishes() {
        let bus: Arc<dyn TradePublisher> = Arc::new(RedisStreamPublisher::connect(&config.bus).await?);
        sinks.bus = Some(bus);
    }
    if mode.stores() {
        let store: Arc<dyn TradeStore> = Arc::new(JsonlTradeStore::open(&config.store.path).await?);
        info!("trade store at {}", config.store.path);
        sinks.store = Some(store);
    }
    Ok(sinks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["tc-runner", "--exchange", "Binance"]).unwrap();
        assert_eq!(cli.mode, RunMode::Current);
        assert_eq!(cli.pair_source(), PairSourceKind::Database);
        assert_eq!(cli.config, PathBuf::from("collector.json"));
    }

    #[test]
    fn cli_modes_and_shorthand() {
        let cli = Cli::try_parse_from(["tc-runner", "--exchange", "Curvefi", "--mode", "storeTrades", "--pairs-file"])
            .unwrap();
        assert_eq!(cli.mode, RunMode::StoreTrades);
        assert_eq!(cli.pair_source(), PairSourceKind::File);

        assert!(Cli::try_parse_from(["tc-runner", "--exchange", "X", "--mode", "live"]).is_err());
        assert!(Cli::try_parse_from(["tc-runner"]).is_err());
    }

    #[test]
    fn database_source_needs_url() {
        let config: AppConfig = serde_json::from_str(r#"{"venues": []}"#).unwrap();
        assert!(build_catalog(&config, PairSourceKind::Database).is_err());
        assert!(build_catalog(&config, PairSourceKind::File).is_ok());
    }
}
