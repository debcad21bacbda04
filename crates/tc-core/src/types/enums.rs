//! Enumerations governing how a collector process runs.
//!
//! Both enums are selected once at startup and never change for the process
//! lifetime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CollectorError;

// ---------------------------------------------------------------------------
// Run mode
// ---------------------------------------------------------------------------

/// Operating mode; decides which sinks every trade is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RunMode {
    /// Publish to the primary topic (plus replica when enabled).
    #[default]
    #[serde(rename = "current")]
    Current,
    /// Write to the durable store only.
    #[serde(rename = "storeTrades")]
    StoreTrades,
    /// Publish to the estimation topic; USD price filled downstream.
    #[serde(rename = "estimation")]
    Estimation,
    /// Publish to the historical (backfill) topic.
    #[serde(rename = "historical")]
    Historical,
    /// Observe and log only, for bridge asset-mapping discovery.
    #[serde(rename = "assetmap")]
    AssetMap,
}

impl RunMode {
    pub const ALL: [RunMode; 5] =
        [RunMode::Current, RunMode::StoreTrades, RunMode::Estimation, RunMode::Historical, RunMode::AssetMap];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::StoreTrades => "storeTrades",
            Self::Estimation => "estimation",
            Self::Historical => "historical",
            Self::AssetMap => "assetmap",
        }
    }

    /// Whether trades are published to the message bus in this mode.
    pub fn publishes(&self) -> bool {
        matches!(self, Self::Current | Self::Historical | Self::Estimation)
    }

    /// Whether trades are written to the durable store in this mode.
    pub fn stores(&self) -> bool {
        matches!(self, Self::StoreTrades)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CollectorError::Config(format!("unknown mode '{s}', expected one of {:?}", Self::ALL.map(|m| m.as_str()))))
    }
}

// ---------------------------------------------------------------------------
// Venue class
// ---------------------------------------------------------------------------

/// Who drives subscriptions for a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueClass {
    /// Caller attaches one pair at a time.
    Centralized,
    /// Producer manages pool/event subscriptions itself.
    Decentralized,
}

impl VenueClass {
    pub fn from_centralized(centralized: bool) -> Self {
        if centralized { Self::Centralized } else { Self::Decentralized }
    }
}

impl fmt::Display for VenueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Centralized => write!(f, "centralized"),
            Self::Decentralized => write!(f, "decentralized"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse_round_trip() {
        for mode in RunMode::ALL {
            assert_eq!(mode.as_str().parse::<RunMode>().unwrap(), mode);
        }
        assert!("store".parse::<RunMode>().is_err());
        assert!("Current".parse::<RunMode>().is_err());
    }

    #[test]
    fn mode_sink_flags() {
        assert!(RunMode::Current.publishes());
        assert!(RunMode::Estimation.publishes());
        assert!(!RunMode::StoreTrades.publishes());
        assert!(RunMode::StoreTrades.stores());
        assert!(!RunMode::AssetMap.publishes() && !RunMode::AssetMap.stores());
    }

    #[test]
    fn default_mode_is_current() {
        assert_eq!(RunMode::default(), RunMode::Current);
    }
}
