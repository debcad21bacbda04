//! Core data types: pairs, assets, trades, and the run-time enums that govern
//! routing.
//!
//! Pairs and trades use PascalCase field names on the wire, matching the
//! standard trade-message format shared with the catalog and downstream
//! consumers.

pub mod enums;
pub mod pair;
pub mod trade;

pub use enums::*;
pub use pair::*;
pub use trade::*;
