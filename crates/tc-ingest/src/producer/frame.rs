//! Gateway frame handling.
//!
//! The trade gateway speaks the collector's own trade format: a text frame is
//! either a single trade object or an array of them. Anything else
//! (subscription acks, `"pong"`, heartbeats) is ignored.

use tc_core::{ExchangePair, Trade};
use tracing::debug;

/// Parse a gateway text frame into trades tagged with `venue`.
///
/// Trades that arrive without a source get `venue` filled in. Trades without
/// a pair symbol are passed through so the consumer can account for them.
pub fn parse_frame(venue: &str, text: &str) -> Vec<Trade> {
    let text = text.trim();
    if !(text.starts_with('{') || text.starts_with('[')) {
        return Vec::new();
    }

    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            debug!("[{venue}] unparseable frame: {e}");
            return Vec::new();
        }
    };

    let mut trades = match value {
        serde_json::Value::Array(items) => items.into_iter().filter_map(|v| decode_trade(venue, v)).collect(),
        v @ serde_json::Value::Object(_) => decode_trade(venue, v).into_iter().collect(),
        _ => Vec::new(),
    };

    for t in &mut trades {
        if t.source.is_empty() {
            t.source = venue.to_string();
        }
    }
    trades
}

fn decode_trade(venue: &str, value: serde_json::Value) -> Option<Trade> {
    // Control frames carry no price.
    if value.get("Price").is_none() {
        return None;
    }
    match serde_json::from_value::<Trade>(value) {
        Ok(t) => Some(t),
        Err(e) => {
            debug!("[{venue}] dropping malformed trade object: {e}");
            None
        }
    }
}

/// Fill a subscription template for `pairs`.
///
/// `{symbol}` and `{foreign_name}` take the first pair, `{foreign_names}` a
/// JSON array of every foreign name.
pub fn render_subscribe(template: &str, pairs: &[ExchangePair]) -> String {
    let first = pairs.first();
    let names: Vec<&str> = pairs.iter().map(|p| p.foreign_name.as_str()).collect();
    let names_json = serde_json::to_string(&names).unwrap_or_else(|_| "[]".into());

    template
        .replace("{foreign_names}", &names_json)
        .replace("{foreign_name}", first.map_or("", |p| p.foreign_name.as_str()))
        .replace("{symbol}", first.map_or("", |p| p.symbol.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: &str = r#"{"Source":"Binance","Pair":{"Symbol":"BTC","ForeignName":"BTCUSDT"},
        "Time":1700000000000,"Price":35000.5,"Volume":-0.1,"ForeignTradeID":"9"}"#;

    #[test]
    fn single_object() {
        let trades = parse_frame("Binance", ONE);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].pair.foreign_name, "BTCUSDT");
        assert_eq!(trades[0].time_ms, 1_700_000_000_000);
        assert_eq!(trades[0].volume, -0.1);
    }

    #[test]
    fn array_and_source_fill() {
        let text = r#"[
            {"Pair":{"Symbol":"ETH","ForeignName":"ETHUSDT"},"Time":1,"Price":2000.0,"Volume":1.0},
            {"Source":"Other","Pair":{"Symbol":"SOL","ForeignName":"SOLUSDT"},"Time":2,"Price":50.0,"Volume":3.0}
        ]"#;
        let trades = parse_frame("Binance", text);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].source, "Binance");
        assert_eq!(trades[1].source, "Other");
    }

    #[test]
    fn control_frames_ignored() {
        assert!(parse_frame("Binance", "pong").is_empty());
        assert!(parse_frame("Binance", r#"{"event":"subscribed","channel":"trades"}"#).is_empty());
        assert!(parse_frame("Binance", "{not json").is_empty());
        assert!(parse_frame("Binance", "42").is_empty());
    }

    #[test]
    fn bad_element_does_not_drop_batch() {
        let text = r#"[{"Price":"x"},{"Pair":{"Symbol":"A","ForeignName":"A-B"},"Time":1,"Price":1.0,"Volume":1.0}]"#;
        assert_eq!(parse_frame("Kraken", text).len(), 1);
    }

    #[test]
    fn subscribe_placeholders() {
        let pairs = vec![ExchangePair::new("BTC", "BTCUSDT"), ExchangePair::new("ETH", "ETHUSDT")];
        assert_eq!(
            render_subscribe(r#"{"op":"sub","pair":"{foreign_name}","base":"{symbol}"}"#, &pairs[..1]),
            r#"{"op":"sub","pair":"BTCUSDT","base":"BTC"}"#
        );
        assert_eq!(
            render_subscribe(r#"{"op":"sub","pairs":{foreign_names}}"#, &pairs),
            r#"{"op":"sub","pairs":["BTCUSDT","ETHUSDT"]}"#
        );
        assert_eq!(render_subscribe("{foreign_names}", &[]), "[]");
    }
}
