//! Exchange pairs and assets.

use serde::{Deserialize, Serialize};

/// A tradable pair on one exchange, as listed by the pair catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExchangePair {
    /// Symbol of the priced asset (e.g. `"BTC"`).
    pub symbol: String,
    /// Exchange-native pair name (e.g. `"BTC-USDT"`, a pool address).
    pub foreign_name: String,
    /// Exchange the pair is listed on.
    #[serde(default)]
    pub exchange: String,
}

impl ExchangePair {
    pub fn new(symbol: impl Into<String>, foreign_name: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), foreign_name: foreign_name.into(), exchange: String::new() }
    }
}

/// One leg of a trade.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Asset {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub blockchain: String,
}

impl Asset {
    pub fn new(symbol: impl Into<String>, address: impl Into<String>, blockchain: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), name: String::new(), address: address.into(), blockchain: blockchain.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_wire_format() {
        let json = r#"{"Symbol":"BTC","ForeignName":"BTC-USDT"}"#;
        let pair: ExchangePair = serde_json::from_str(json).unwrap();
        assert_eq!(pair, ExchangePair::new("BTC", "BTC-USDT"));

        let out = serde_json::to_value(&pair).unwrap();
        assert_eq!(out["ForeignName"], "BTC-USDT");
    }
}
