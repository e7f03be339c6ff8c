//! Credit assignment for converted journeys.

use std::collections::BTreeMap;

use crate::error::ModelError;
use crate::journey::Journey;
use crate::types::Event;

use super::model::AttributionModel;
use super::types::AttributionResult;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Share of credit for the first and last touchpoint under position-based
const POSITION_ENDPOINT_SHARE: f64 = 0.4;

/// Credit one journey's conversion revenue to its channels.
///
/// Touchpoints sharing a channel have their credit summed. Credits sum to
/// the conversion revenue; an unconverted journey yields an empty result.
pub fn attribute(
    journey: &Journey,
    model: &AttributionModel,
) -> Result<AttributionResult, ModelError> {
    model.validate()?;

    let mut result = AttributionResult {
        user_id: journey.user_id().to_string(),
        conversion_id: None,
        converted_at: None,
        model: *model,
        revenue: 0.0,
        shares: BTreeMap::new(),
        credits: BTreeMap::new(),
    };

    let Some(conversion) = journey.conversion() else {
        return Ok(result);
    };
    result.conversion_id = Some(conversion.event_id.clone());
    result.converted_at = Some(conversion.timestamp);
    result.revenue = conversion.revenue;

    let touchpoints = journey.touchpoints();
    let weights = match model {
        AttributionModel::LastTouch => last_touch_weights(touchpoints.len()),
        AttributionModel::FirstTouch => first_touch_weights(touchpoints.len()),
        AttributionModel::Linear => linear_weights(touchpoints.len()),
        AttributionModel::PositionBased => position_weights(touchpoints.len()),
        AttributionModel::TimeDecay { half_life_days } => {
            time_decay_weights(touchpoints, conversion, *half_life_days)
        }
    };

    for (touchpoint, weight) in touchpoints.iter().zip(weights) {
        *result
            .shares
            .entry(touchpoint.channel.clone())
            .or_insert(0.0) += weight;
        *result
            .credits
            .entry(touchpoint.channel.clone())
            .or_insert(0.0) += weight * conversion.revenue;
    }

    Ok(result)
}

/// Attribute every converted journey in `journeys` under one model
pub fn attribute_all<'a>(
    journeys: impl IntoIterator<Item = &'a Journey>,
    model: &AttributionModel,
) -> Result<Vec<AttributionResult>, ModelError> {
    journeys
        .into_iter()
        .filter(|j| j.is_converted())
        .map(|j| attribute(j, model))
        .collect()
}

fn last_touch_weights(n: usize) -> Vec<f64> {
    let mut weights = vec![0.0; n];
    if let Some(last) = weights.last_mut() {
        *last = 1.0;
    }
    weights
}

fn first_touch_weights(n: usize) -> Vec<f64> {
    let mut weights = vec![0.0; n];
    if let Some(first) = weights.first_mut() {
        *first = 1.0;
    }
    weights
}

fn linear_weights(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}

fn position_weights(n: usize) -> Vec<f64> {
    if n <= 2 {
        return linear_weights(n);
    }
    let middle = (1.0 - 2.0 * POSITION_ENDPOINT_SHARE) / (n - 2) as f64;
    let mut weights = vec![middle; n];
    weights[0] = POSITION_ENDPOINT_SHARE;
    weights[n - 1] = POSITION_ENDPOINT_SHARE;
    weights
}

/// Weight = 2^(-Δt / half_life), normalized to sum to 1.
///
/// Exponents are taken relative to the most recent touchpoint so the
/// largest raw weight is 1 and long journeys cannot underflow to zero.
fn time_decay_weights(touchpoints: &[Event], conversion: &Event, half_life_days: f64) -> Vec<f64> {
    let half_life = half_life_days * SECONDS_PER_DAY;
    let ages: Vec<f64> = touchpoints
        .iter()
        .map(|t| (conversion.timestamp - t.timestamp).num_milliseconds() as f64 / 1000.0)
        .collect();
    let Some(youngest) = ages.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };

    let raw: Vec<f64> = ages
        .iter()
        .map(|age| (-(age - youngest) / half_life).exp2())
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Channel;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    /// Journey with one impression per channel, a day apart, then a conversion
    fn journey(channels: &[&str], revenue: f64) -> Journey {
        let mut events: Vec<Event> = channels
            .iter()
            .enumerate()
            .map(|(i, ch)| {
                Event::impression(
                    format!("i{i}"),
                    "u",
                    *ch,
                    t0() + Duration::days(i as i64),
                    0.1,
                )
            })
            .collect();
        events.push(Event::conversion(
            "v",
            "u",
            *channels.last().unwrap_or(&"Direct"),
            t0() + Duration::days(channels.len() as i64),
            revenue,
        ));
        Journey::new("u", events).unwrap()
    }

    fn credit(result: &AttributionResult, channel: &str) -> f64 {
        result.credit(&Channel::from(channel))
    }

    #[test]
    fn test_last_touch_credits_final_touchpoint() {
        let j = journey(&["Facebook", "TikTok", "YouTube"], 90.0);
        let result = attribute(&j, &AttributionModel::LastTouch).unwrap();
        assert_eq!(credit(&result, "YouTube"), 90.0);
        assert_eq!(credit(&result, "Facebook"), 0.0);
    }

    #[test]
    fn test_first_touch_credits_first_touchpoint() {
        let j = journey(&["Facebook", "TikTok", "YouTube"], 90.0);
        let result = attribute(&j, &AttributionModel::FirstTouch).unwrap();
        assert_eq!(credit(&result, "Facebook"), 90.0);
    }

    #[test]
    fn test_linear_equal_split() {
        let j = journey(&["Facebook", "TikTok", "YouTube"], 90.0);
        let result = attribute(&j, &AttributionModel::Linear).unwrap();
        for ch in ["Facebook", "TikTok", "YouTube"] {
            assert!((credit(&result, ch) - 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_same_channel_credits_sum() {
        let j = journey(&["Facebook", "TikTok", "Facebook", "Facebook"], 100.0);
        let result = attribute(&j, &AttributionModel::Linear).unwrap();
        assert!((credit(&result, "Facebook") - 75.0).abs() < 1e-9);
        assert!((result.share(&Channel::from("Facebook")) - 0.75).abs() < 1e-12);
        assert_eq!(result.credits.len(), 2);
    }

    #[test]
    fn test_position_based_two_touchpoints() {
        let j = journey(&["Facebook", "TikTok"], 100.0);
        let result = attribute(&j, &AttributionModel::PositionBased).unwrap();
        assert!((credit(&result, "Facebook") - 50.0).abs() < 1e-9);
        assert!((credit(&result, "TikTok") - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_based_five_touchpoints() {
        let weights = position_weights(5);
        let expected = [0.4, 0.2 / 3.0, 0.2 / 3.0, 0.2 / 3.0, 0.4];
        for (w, e) in weights.iter().zip(expected) {
            assert!((w - e).abs() < 1e-12);
        }

        let j = journey(&["A", "B", "C", "D", "E"], 100.0);
        let result = attribute(&j, &AttributionModel::PositionBased).unwrap();
        assert!((credit(&result, "A") - 40.0).abs() < 1e-9);
        assert!((credit(&result, "C") - 20.0 / 3.0).abs() < 1e-9);
        assert!((credit(&result, "E") - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_based_single_touchpoint() {
        let j = journey(&["Facebook"], 100.0);
        let result = attribute(&j, &AttributionModel::PositionBased).unwrap();
        assert!((credit(&result, "Facebook") - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_decay_half_life_ratio() {
        // Touchpoints 14 and 7 days before conversion with a 7-day half-life
        let events = vec![
            Event::impression("i0", "u", "A", t0(), 0.1),
            Event::impression("i1", "u", "B", t0() + Duration::days(7), 0.1),
            Event::conversion("v", "u", "B", t0() + Duration::days(14), 30.0),
        ];
        let j = Journey::new("u", events).unwrap();
        let result = attribute(&j, &AttributionModel::time_decay()).unwrap();
        assert!((credit(&result, "A") - 10.0).abs() < 1e-9);
        assert!((credit(&result, "B") - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_decay_monotonic_in_recency() {
        let j = journey(&["A", "B", "C", "D"], 100.0);
        let result = attribute(&j, &AttributionModel::time_decay()).unwrap();
        let credits: Vec<f64> = ["A", "B", "C", "D"]
            .iter()
            .map(|c| credit(&result, c))
            .collect();
        assert!(credits.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_time_decay_survives_tiny_half_life() {
        let j = journey(&["A", "B"], 100.0);
        let model = AttributionModel::TimeDecay {
            half_life_days: 1e-6,
        };
        let result = attribute(&j, &model).unwrap();
        assert!(result.is_conserved(1e-6));
        assert!((credit(&result, "B") - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_all_models_conserve_revenue() {
        let j = journey(&["Facebook", "TikTok", "Facebook", "YouTube", "TikTok"], 123.45);
        for model in AttributionModel::all(7.0) {
            let result = attribute(&j, &model).unwrap();
            assert!(result.is_conserved(1e-6), "{model} did not conserve");
        }
    }

    #[test]
    fn test_orphan_conversion_credited_to_itself() {
        let j = Journey::new(
            "u",
            vec![Event::conversion("v", "u", "YouTube", t0(), 80.0)],
        )
        .unwrap();
        for model in AttributionModel::all(7.0) {
            let result = attribute(&j, &model).unwrap();
            assert!((credit(&result, "YouTube") - 80.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unconverted_journey_is_empty() {
        let j = Journey::new("u", vec![Event::impression("i", "u", "A", t0(), 0.1)]).unwrap();
        let result = attribute(&j, &AttributionModel::Linear).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.revenue, 0.0);
    }

    #[test]
    fn test_invalid_half_life_fails() {
        let j = journey(&["A"], 10.0);
        let err = attribute(
            &j,
            &AttributionModel::TimeDecay {
                half_life_days: -1.0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidHalfLife(_)));
    }

    #[test]
    fn test_attribute_all_skips_unconverted() {
        let converted = journey(&["A", "B"], 10.0);
        let open = Journey::new("u2", vec![Event::impression("x", "u2", "A", t0(), 0.1)]).unwrap();
        let results = attribute_all([&converted, &open], &AttributionModel::Linear).unwrap();
        assert_eq!(results.len(), 1);
    }
}
