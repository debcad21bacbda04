//! Producer registry: factory for the producer serving a venue.

use tc_core::CollectorError;
use tc_core::config::VenueProfile;

use crate::producer::{GatewayProducer, TradeProducer};

/// Create the producer for `profile`.
///
/// Every venue is served through its gateway feed; a venue without one
/// cannot be collected.
pub fn create_producer(profile: &VenueProfile) -> Result<Box<dyn TradeProducer>, CollectorError> {
    let Some(feed) = profile.feed.clone() else {
        return Err(CollectorError::Config(format!("venue {} has no feed configured", profile.name)));
    };
    Ok(Box::new(GatewayProducer::new(profile.name.clone(), feed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tc_core::VenueClass;
    use tc_core::config::FeedConfig;

    fn profile(feed: Option<FeedConfig>) -> VenueProfile {
        VenueProfile { name: "Kraken".into(), class: VenueClass::Centralized, watchdog_delay: None, feed }
    }

    #[test]
    fn needs_feed() {
        assert!(matches!(create_producer(&profile(None)), Err(CollectorError::Config(_))));
    }

    #[tokio::test]
    async fn builds_gateway_producer() {
        let feed = FeedConfig {
            url: "wss://gw.local/kraken".into(),
            subscribe: "{foreign_name}".into(),
            ping_interval_sec: None,
            ping_message: None,
            max_reconnects: None,
            extra_headers: HashMap::new(),
        };
        let p = create_producer(&profile(Some(feed))).unwrap();
        assert_eq!(p.name(), "Kraken");
    }
}
