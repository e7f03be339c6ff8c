//! Raw per-channel counts from journey events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::journey::Journey;
use crate::types::{Channel, EventType, TimeWindow};

/// Impressions, clicks and spend for one channel in one window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelTotals {
    pub impressions: u64,
    pub clicks: u64,
    pub cost: f64,
}

/// Count impressions and clicks and sum cost per channel.
///
/// Includes converted and unconverted journeys alike; only events whose
/// timestamp falls in `window` are counted.
pub fn tally<'a>(
    journeys: impl IntoIterator<Item = &'a Journey>,
    window: &TimeWindow,
) -> BTreeMap<Channel, ChannelTotals> {
    let mut totals: BTreeMap<Channel, ChannelTotals> = BTreeMap::new();

    for event in journeys.into_iter().flat_map(|j| j.events()) {
        if !window.contains(event.timestamp) {
            continue;
        }
        let entry = totals.entry(event.channel.clone()).or_default();
        match event.event_type {
            EventType::Impression => entry.impressions += 1,
            EventType::Click => entry.clicks += 1,
            EventType::Conversion => {}
        }
        entry.cost += event.cost;
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Event;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_tally_counts_by_channel_and_window() {
        let converted = Journey::new(
            "a",
            vec![
                Event::impression("i1", "a", "Facebook", t0(), 0.08),
                Event::click("c1", "a", "Facebook", t0() + Duration::minutes(1)),
                Event::conversion("v1", "a", "Facebook", t0() + Duration::hours(1), 50.0),
            ],
        )
        .unwrap();
        let open = Journey::new(
            "b",
            vec![
                Event::impression("i2", "b", "TikTok", t0(), 0.06),
                Event::impression("i3", "b", "TikTok", t0() + Duration::days(40), 0.06),
            ],
        )
        .unwrap();
        let window = TimeWindow::new(t0(), t0() + Duration::days(30));

        let totals = tally([&converted, &open], &window);

        let facebook = &totals[&Channel::from("Facebook")];
        assert_eq!(facebook.impressions, 1);
        assert_eq!(facebook.clicks, 1);
        assert!((facebook.cost - 0.08).abs() < 1e-12);

        let tiktok = &totals[&Channel::from("TikTok")];
        assert_eq!(tiktok.impressions, 1);
        assert_eq!(tiktok.clicks, 0);
    }
}
