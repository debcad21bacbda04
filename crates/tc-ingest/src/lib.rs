//! # tc-ingest
//!
//! Runtime core of a per-exchange trade collector:
//!
//! - **Catalog** (`catalog`): pair list from the catalog service, static file fallback
//! - **Producers** (`producer`): venue scrapers feeding one bounded trade stream
//! - **Watchdog** (`watchdog`): trips when a venue goes silent
//! - **Router** (`router`): per-mode fan-out to bus topics or the store, with mirroring
//! - **Sinks** (`sinks`): Redis stream publisher and JSON-lines store
//! - **Orchestrator** (`orchestrator`): bootstrap and the consume loop
//! - **Health** (`health`): `/live` and `/ready` probes
//! - **Registry** (`registry`): producer factory per venue

pub mod catalog;
pub mod health;
pub mod orchestrator;
pub mod producer;
pub mod registry;
pub mod router;
pub mod sinks;
pub mod watchdog;

#[cfg(test)]
pub(crate) mod testkit;

pub use orchestrator::{ConsumeOutcome, Orchestrator, Running};
pub use producer::TradeProducer;
