//! Typed error definitions for the trade collector.
//!
//! Provides [`CollectorError`] for domain-specific errors that are more
//! informative than plain `anyhow::Error` strings. All variants implement
//! `std::error::Error` via `thiserror`, so they integrate with `anyhow::Result`
//! at the binary boundary.

use thiserror::Error;

/// Domain-specific errors for the trade collector.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The requested exchange is in neither venue table.
    #[error("unknown exchange: {0}")]
    UnknownExchange(String),

    /// The pair catalog could not be reached (connection, timeout, 5xx).
    #[error("pair catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// A trade cannot be reversed (missing leg or degenerate price).
    #[error("unsupported swap: {0}")]
    UnsupportedSwap(String),

    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Producer subscription failed for one pair or venue.
    #[error("attach error: {0}")]
    Attach(String),

    /// Message bus publish failed.
    #[error("publish error: {0}")]
    Publish(String),

    /// Durable store write or flush failed.
    #[error("store error: {0}")]
    Store(String),

    /// WebSocket connection, handshake, or communication error.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// Payload decoding error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl CollectorError {
    /// Whether this error should trigger the static pair-file fallback.
    pub fn is_catalog_unavailable(&self) -> bool {
        matches!(self, Self::CatalogUnavailable(_))
    }
}
