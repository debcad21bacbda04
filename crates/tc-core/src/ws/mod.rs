//! WebSocket client with auto-reconnect, delivering parsed frames into a
//! bounded channel.

pub mod client;

pub use client::{FrameParser, PingPayload, WsConnConfig, WsConnection};
