//! The trade record flowing from producers to sinks.

use serde::{Deserialize, Serialize};

use super::pair::{Asset, ExchangePair};

/// A single executed trade as reported by a producer.
///
/// Immutable after creation except for `estimated_usd_price`, which a
/// downstream service fills in estimation mode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Trade {
    /// Venue the trade was observed on.
    #[serde(default)]
    pub source: String,
    pub pair: ExchangePair,
    /// Trade time in ms since epoch, as reported by the venue.
    #[serde(rename = "Time")]
    pub time_ms: u64,
    pub price: f64,
    /// Signed volume of the base asset (negative for sells).
    pub volume: f64,
    #[serde(default)]
    pub foreign_trade_id: String,
    /// Asset being priced.
    #[serde(default)]
    pub base_token: Option<Asset>,
    /// Asset the price is denominated in.
    #[serde(default)]
    pub quote_token: Option<Asset>,
    #[serde(default, rename = "EstimatedUSDPrice")]
    pub estimated_usd_price: Option<f64>,
}

impl Trade {
    /// `BASE-QUOTE` label built from the legs, falling back to the pair's
    /// foreign name when a leg is missing.
    pub fn pair_label(&self) -> String {
        match (&self.base_token, &self.quote_token) {
            (Some(base), Some(quote)) => format!("{}-{}", base.symbol, quote.symbol),
            _ => self.pair.foreign_name.clone(),
        }
    }

    /// A routable trade names both its venue and its pair.
    pub fn is_well_formed(&self) -> bool {
        !self.source.is_empty() && !self.pair.symbol.is_empty()
    }
}
