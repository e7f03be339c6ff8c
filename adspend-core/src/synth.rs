//! Seeded synthetic event generator
//!
//! Produces impressions across campus ad channels, clicks that follow
//! them within minutes, and conversions that follow clicks within a week.
//! The same seed and configuration always yield the same events.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Uniform, WeightedIndex};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AdspendError, Result};
use crate::types::Event;

/// Traffic and response characteristics of one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfile {
    pub name: String,
    /// Relative share of impressions
    pub traffic_share: f64,
    pub ctr: f64,
    /// Mean cost of one impression; each impression varies by ±20%
    pub cost_per_impression: f64,
    /// Conversions per click
    pub conversion_rate: f64,
}

impl ChannelProfile {
    fn new(name: &str, traffic_share: f64, ctr: f64, cost: f64, conversion_rate: f64) -> Self {
        Self {
            name: name.to_string(),
            traffic_share,
            ctr,
            cost_per_impression: cost,
            conversion_rate,
        }
    }

    /// The eight campus advertising channels
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Google Search", 0.25, 0.03, 0.15, 0.08),
            Self::new("Facebook", 0.20, 0.02, 0.08, 0.04),
            Self::new("Instagram", 0.15, 0.025, 0.09, 0.035),
            Self::new("TikTok", 0.12, 0.035, 0.06, 0.03),
            Self::new("YouTube", 0.10, 0.015, 0.12, 0.05),
            Self::new("Display Network", 0.08, 0.008, 0.04, 0.015),
            Self::new("Campus Radio", 0.05, 0.01, 0.05, 0.02),
            Self::new("Campus TV", 0.05, 0.012, 0.18, 0.055),
        ]
    }
}

/// Configuration for synthetic data generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// RNG seed (default: 42)
    pub seed: u64,
    /// Impressions to generate (default: 100000)
    pub impressions: usize,
    /// Distinct users impressions are spread over (default: 5000)
    pub users: u32,
    /// First hour impressions may land in (default: 2024-01-01)
    pub start: DateTime<Utc>,
    /// End of the impression range, exclusive (default: 2024-12-31)
    pub end: DateTime<Utc>,
    pub channels: Vec<ChannelProfile>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            impressions: 100_000,
            users: 5_000,
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default(),
            end: Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).single().unwrap_or_default(),
            channels: ChannelProfile::defaults(),
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.users == 0 {
            return Err(AdspendError::InvalidConfig("users must be positive".into()));
        }
        if (self.end - self.start).num_hours() < 1 {
            return Err(AdspendError::InvalidConfig(
                "date range must span at least one hour".into(),
            ));
        }
        if self.channels.is_empty() {
            return Err(AdspendError::InvalidConfig("no channel profiles".into()));
        }
        for profile in &self.channels {
            let rates = [profile.ctr, profile.conversion_rate];
            if rates.iter().any(|r| !(0.0..=1.0).contains(r)) {
                return Err(AdspendError::InvalidConfig(format!(
                    "rates for {} must lie in [0, 1]",
                    profile.name
                )));
            }
            if !profile.cost_per_impression.is_finite() || profile.cost_per_impression < 0.0 {
                return Err(AdspendError::InvalidConfig(format!(
                    "cost per impression for {} must be non-negative",
                    profile.name
                )));
            }
        }
        Ok(())
    }
}

/// Generate events for `config`, ordered by timestamp
pub fn generate(config: &SynthConfig) -> Result<Vec<Event>> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let channel_dist = WeightedIndex::new(config.channels.iter().map(|c| c.traffic_share))
        .map_err(|e| AdspendError::InvalidConfig(format!("traffic shares: {e}")))?;
    let hour_dist = Uniform::new(0, (config.end - config.start).num_hours());
    let user_dist = Uniform::new_inclusive(1, config.users);
    let jitter = Uniform::new(0.8, 1.2);
    let click_delay = Uniform::new(1, 300);
    let revenue = Uniform::new(20.0, 500.0);

    let mut events = Vec::with_capacity(config.impressions + config.impressions / 20);
    let mut clicks = 0usize;
    let mut conversions = 0usize;

    for i in 0..config.impressions {
        let profile = &config.channels[channel_dist.sample(&mut rng)];
        let user = format!("user_{:06}", user_dist.sample(&mut rng));
        let shown_at = config.start + Duration::hours(hour_dist.sample(&mut rng));
        let cost = profile.cost_per_impression * jitter.sample(&mut rng);

        events.push(Event::impression(
            format!("imp_{i:08}"),
            &user,
            profile.name.as_str(),
            shown_at,
            cost,
        ));

        if rng.r#gen::<f64>() >= profile.ctr {
            continue;
        }
        let clicked_at = shown_at + Duration::seconds(click_delay.sample(&mut rng));
        events.push(Event::click(
            format!("click_{clicks:08}"),
            &user,
            profile.name.as_str(),
            clicked_at,
        ));
        clicks += 1;

        if rng.r#gen::<f64>() >= profile.conversion_rate {
            continue;
        }
        let delay = Duration::days(rng.gen_range(0..7))
            + Duration::hours(rng.gen_range(0..24))
            + Duration::minutes(rng.gen_range(1..60));
        events.push(Event::conversion(
            format!("conv_{conversions:08}"),
            &user,
            profile.name.as_str(),
            clicked_at + delay,
            revenue.sample(&mut rng),
        ));
        conversions += 1;
    }

    events.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

    info!(
        seed = config.seed,
        impressions = config.impressions,
        clicks,
        conversions,
        "Generated synthetic events"
    );

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventType;

    fn small() -> SynthConfig {
        SynthConfig {
            impressions: 5_000,
            users: 500,
            ..Default::default()
        }
    }

    #[test]
    fn test_same_seed_same_events() {
        let a = generate(&small()).unwrap();
        let b = generate(&small()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_differs() {
        let a = generate(&small()).unwrap();
        let b = generate(&SynthConfig { seed: 7, ..small() }).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_counts_and_ids() {
        let events = generate(&small()).unwrap();
        let impressions: Vec<_> = events
            .iter()
            .filter(|e| e.event_type == EventType::Impression)
            .collect();
        let clicks = events
            .iter()
            .filter(|e| e.event_type == EventType::Click)
            .count();

        assert_eq!(impressions.len(), 5_000);
        // Blended CTR is about 2.3%
        assert!(clicks > 40 && clicks < 250, "clicks = {clicks}");
        assert!(impressions.iter().all(|e| e.event_id.starts_with("imp_")));
    }

    #[test]
    fn test_amounts_in_range() {
        let events = generate(&small()).unwrap();
        for event in &events {
            match event.event_type {
                EventType::Impression => {
                    assert!(event.cost >= 0.04 * 0.8 && event.cost <= 0.18 * 1.2);
                    assert!(event.timestamp >= small().start && event.timestamp < small().end);
                }
                EventType::Conversion => {
                    assert!(event.revenue >= 20.0 && event.revenue < 500.0);
                }
                EventType::Click => assert_eq!(event.cost, 0.0),
            }
        }
    }

    #[test]
    fn test_events_sorted() {
        let events = generate(&small()).unwrap();
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_invalid_config() {
        assert!(generate(&SynthConfig { users: 0, ..small() }).is_err());
        let mut config = small();
        config.channels[0].ctr = 1.5;
        assert!(generate(&config).is_err());
        let mut config = small();
        config.end = config.start;
        assert!(generate(&config).is_err());
    }
}
