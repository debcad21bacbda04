//! Reversed-trade synthesis for swap-style venues.
//!
//! On liquidity-pool and bridge venues a single pool event implies two
//! economically equivalent trades: `A` bought with `B` and `B` sold for `A`.
//! [`TradeMirror`] produces the second one for venues listed in its table.
//!
//! The venue table is explicit configuration. There is no general rule that
//! derives it from venue metadata.

use ahash::AHashSet;

use crate::error::CollectorError;
use crate::types::Trade;

/// Venues whose trades are republished in reversed form unless the config
/// overrides the table.
pub const DEFAULT_MIRROR_VENUES: &[&str] = &[
    "Anyswap",
    "Curvefi",
    "CurvefiFantom",
    "CurvefiMoonbeam",
    "CurvefiPolygon",
    "CurvefiArbitrum",
    "Diffusion",
    "Hermes",
    "Huckleberry",
    "Maverick",
    "Netswap",
    "OmniDex",
    "TraderJoeV2.1Avalanche",
    "Wanswap",
    "Velodrome",
    "VelodromeSlipstream",
    "Zenlinkswap",
    "ZenlinkswapBifrostPolkadot",
    "PanCakeSwapV3",
    "Velar",
    "Bifrost",
    "Hydration",
    "UniswapV3Celo",
    "UniswapV4",
    "VelodromeSwellchain",
    "ShadowV2",
    "ShadowV3",
];

/// Allow-list driven trade mirror.
#[derive(Debug, Clone)]
pub struct TradeMirror {
    venues: AHashSet<String>,
}

impl TradeMirror {
    pub fn new<I, S>(venues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { venues: venues.into_iter().map(Into::into).collect() }
    }

    pub fn with_default_venues() -> Self {
        Self::new(DEFAULT_MIRROR_VENUES.iter().copied())
    }

    /// True iff `venue` is in the mirror table. Names are matched exactly.
    #[inline]
    pub fn should_mirror(&self, venue: &str) -> bool {
        self.venues.contains(venue)
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    /// Build the reversed trade: legs swapped, `price' = 1 / price`,
    /// `volume' = -price * volume`. The pair is renamed for the new direction
    /// and the USD price, when known, is restated for the new base asset.
    ///
    /// Applying this twice gives back the original trade (up to float
    /// rounding) for `BASE-QUOTE` pair names. Fails with
    /// [`CollectorError::UnsupportedSwap`] when a leg is missing or the price
    /// cannot be inverted.
    pub fn mirror(&self, trade: &Trade) -> Result<Trade, CollectorError> {
        let (Some(base), Some(quote)) = (&trade.base_token, &trade.quote_token) else {
            return Err(CollectorError::UnsupportedSwap(format!(
                "{} trade {} on {} is missing a leg",
                trade.source, trade.foreign_trade_id, trade.pair.foreign_name
            )));
        };
        if trade.price == 0.0 || !trade.price.is_finite() || !trade.volume.is_finite() {
            return Err(CollectorError::UnsupportedSwap(format!(
                "{} trade {} has price {} and volume {}",
                trade.source, trade.foreign_trade_id, trade.price, trade.volume
            )));
        }

        let mut swapped = trade.clone();
        swapped.base_token = Some(quote.clone());
        swapped.quote_token = Some(base.clone());
        swapped.pair.symbol = quote.symbol.clone();
        swapped.pair.foreign_name = reversed_name(&trade.pair.foreign_name, &base.symbol, &quote.symbol);
        swapped.volume = -trade.price * trade.volume;
        swapped.price = 1.0 / trade.price;
        swapped.estimated_usd_price = trade.estimated_usd_price.map(|usd| usd / trade.price);
        Ok(swapped)
    }
}

/// `A-B` becomes `B-A`. Names without exactly one separator (pool addresses)
/// are rebuilt from the legs as `QUOTE-BASE`.
fn reversed_name(name: &str, base: &str, quote: &str) -> String {
    match name.split_once('-') {
        Some((a, b)) if !a.is_empty() && !b.is_empty() && !b.contains('-') => format!("{b}-{a}"),
        _ => format!("{quote}-{base}"),
    }
}

impl Default for TradeMirror {
    fn default() -> Self {
        Self::with_default_venues()
    }
}
