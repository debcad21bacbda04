//! # tc-core
//!
//! Core crate for the trade collector, providing:
//!
//! - **Types** (`types`): exchange pairs, assets, trades, run modes, venue classes
//! - **Configuration** (`config`): JSON config deserialization and the venue registry
//! - **Error types** (`error`): domain-specific `CollectorError` via thiserror
//! - **Mirroring** (`mirror`): reversed-trade synthesis for swap-style venues
//! - **WebSocket** (`ws`): WS client with auto-reconnect feeding a bounded channel
//! - **Time utilities** (`time_util`): epoch timestamps and the injectable `Clock`
//! - **Logging** (`logging`): tracing-based structured logging

pub mod config;
pub mod error;
pub mod logging;
pub mod mirror;
pub mod time_util;
pub mod types;
pub mod ws;

// Re-export types at crate root for convenience.
pub use error::CollectorError;
pub use types::*;
