//! Channel efficiency metrics
//!
//! Rolls raw counts and credited revenue into per-channel ratios and a
//! composite efficiency score used to rank channels.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attribution::{AttributionModel, AttributionResult};
use crate::error::ModelError;
use crate::types::{Channel, TimeWindow};

use super::tally::ChannelTotals;

/// Score given to every channel when a metric has no spread across channels
const FLAT_RANGE_SCORE: f64 = 0.5;

/// Weights of the composite efficiency score.
///
/// The score is `Σ wᵢ · normᵢ / Σ wᵢ`, where each `normᵢ` is the metric
/// min-max normalized to [0, 1] across the channels of one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EfficiencyWeights {
    /// Weight for return on ad spend (default: 0.4)
    pub roas: f64,
    /// Weight for conversions per click (default: 0.3)
    pub conversion_rate: f64,
    /// Weight for clicks per impression (default: 0.3)
    pub ctr: f64,
    /// Weight for conversions per unit cost (default: 0.0)
    pub cost_efficiency: f64,
}

impl Default for EfficiencyWeights {
    fn default() -> Self {
        Self {
            roas: 0.4,
            conversion_rate: 0.3,
            ctr: 0.3,
            cost_efficiency: 0.0,
        }
    }
}

impl EfficiencyWeights {
    fn as_array(&self) -> [f64; 4] {
        [self.roas, self.conversion_rate, self.ctr, self.cost_efficiency]
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let weights = self.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ModelError::InvalidWeights(format!(
                "weights must be finite and non-negative: {weights:?}"
            )));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(ModelError::InvalidWeights("weights sum to zero".into()));
        }
        Ok(())
    }
}

/// Configuration for metrics aggregation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub weights: EfficiencyWeights,
    /// Reporting window; defaults to the span of the input events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,
}

/// Identifies a derived table: window, model and configuration version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableKey {
    pub window: TimeWindow,
    pub model: AttributionModel,
    /// SHA-256 of the configuration that produced the table
    pub config_fingerprint: String,
}

/// Efficiency metrics for one channel in one window under one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    pub channel: Channel,
    pub window: TimeWindow,
    pub impressions: u64,
    pub clicks: u64,
    /// Credited (fractional) conversions
    pub conversions: f64,
    pub cost: f64,
    pub credited_revenue: f64,
    pub profit: f64,
    pub ctr: f64,
    pub conversion_rate: f64,
    /// Absent when the channel had no spend
    pub roas: Option<f64>,
    /// Absent when the channel had no clicks
    pub cpc: Option<f64>,
    /// Absent when the channel had no credited conversions
    pub cost_per_conversion: Option<f64>,
    pub efficiency_score: f64,
}

/// Totals across every channel in a table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: f64,
    pub cost: f64,
    pub credited_revenue: f64,
    pub profit: f64,
    pub ctr: f64,
    pub conversion_rate: f64,
    pub roas: Option<f64>,
}

/// Per-channel metrics for one (window, model, configuration)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsTable {
    pub key: TableKey,
    /// Sorted by channel
    pub rows: Vec<ChannelMetrics>,
    pub summary: MetricsSummary,
}

impl MetricsTable {
    pub fn get(&self, channel: &Channel) -> Option<&ChannelMetrics> {
        self.rows.iter().find(|r| &r.channel == channel)
    }

    /// Rows ordered by efficiency score, best first
    pub fn ranked(&self) -> Vec<&ChannelMetrics> {
        let mut rows: Vec<&ChannelMetrics> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            b.efficiency_score
                .total_cmp(&a.efficiency_score)
                .then_with(|| a.channel.cmp(&b.channel))
        });
        rows
    }
}

/// Builds [`MetricsTable`]s from tallies and attribution results
pub struct MetricsAggregator {
    weights: EfficiencyWeights,
}

impl MetricsAggregator {
    /// Create with default weights
    pub fn new() -> Self {
        Self {
            weights: EfficiencyWeights::default(),
        }
    }

    /// Create with custom weights, rejecting invalid ones
    pub fn with_weights(weights: EfficiencyWeights) -> Result<Self, ModelError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &EfficiencyWeights {
        &self.weights
    }

    /// Compute the metrics table for `key`.
    ///
    /// `totals` supplies impressions, clicks and cost; `results` supplies
    /// credited revenue and conversions for those conversions that fall in
    /// the key's window.
    pub fn aggregate(
        &self,
        totals: &BTreeMap<Channel, ChannelTotals>,
        results: &[AttributionResult],
        key: TableKey,
    ) -> MetricsTable {
        let window = key.window;
        let mut credited: BTreeMap<Channel, (f64, f64)> = BTreeMap::new();
        for result in results {
            let in_window = result.converted_at.is_some_and(|ts| window.contains(ts));
            if !in_window {
                continue;
            }
            for (channel, credit) in &result.credits {
                let entry = credited.entry(channel.clone()).or_default();
                entry.0 += credit;
                entry.1 += result.share(channel);
            }
        }

        let channels: BTreeSet<&Channel> = totals.keys().chain(credited.keys()).collect();
        let mut rows: Vec<ChannelMetrics> = channels
            .into_iter()
            .map(|channel| {
                let raw = totals.get(channel).cloned().unwrap_or_default();
                let (revenue, conversions) = credited.get(channel).copied().unwrap_or_default();
                channel_metrics(channel.clone(), window, &raw, revenue, conversions)
            })
            .collect();

        self.score(&mut rows);

        debug!(model = %key.model, channels = rows.len(), "Aggregated channel metrics");

        let summary = summarize(&rows);
        MetricsTable { key, rows, summary }
    }

    /// Fill in `efficiency_score` for every row
    fn score(&self, rows: &mut [ChannelMetrics]) {
        let components: [Vec<Option<f64>>; 4] = [
            rows.iter().map(|r| r.roas).collect(),
            rows.iter().map(|r| Some(r.conversion_rate)).collect(),
            rows.iter().map(|r| Some(r.ctr)).collect(),
            rows.iter()
                .map(|r| r.cost_per_conversion.filter(|c| *c > 0.0).map(|c| 1.0 / c))
                .collect(),
        ];
        let normalized: Vec<Vec<f64>> = components.iter().map(|c| min_max(c)).collect();
        let weights = self.weights.as_array();
        let weight_sum: f64 = weights.iter().sum();

        for (idx, row) in rows.iter_mut().enumerate() {
            let weighted: f64 = weights
                .iter()
                .zip(&normalized)
                .map(|(w, norm)| w * norm[idx])
                .sum();
            row.efficiency_score = weighted / weight_sum;
        }
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn channel_metrics(
    channel: Channel,
    window: TimeWindow,
    raw: &ChannelTotals,
    credited_revenue: f64,
    conversions: f64,
) -> ChannelMetrics {
    let clicks = raw.clicks as f64;
    ChannelMetrics {
        channel,
        window,
        impressions: raw.impressions,
        clicks: raw.clicks,
        conversions,
        cost: raw.cost,
        credited_revenue,
        profit: credited_revenue - raw.cost,
        ctr: ratio(clicks, raw.impressions as f64).unwrap_or(0.0),
        conversion_rate: ratio(conversions, clicks).unwrap_or(0.0),
        roas: ratio(credited_revenue, raw.cost),
        cpc: ratio(raw.cost, clicks),
        cost_per_conversion: ratio(raw.cost, conversions),
        efficiency_score: 0.0,
    }
}

fn summarize(rows: &[ChannelMetrics]) -> MetricsSummary {
    let mut summary = MetricsSummary::default();
    for row in rows {
        summary.impressions += row.impressions;
        summary.clicks += row.clicks;
        summary.conversions += row.conversions;
        summary.cost += row.cost;
        summary.credited_revenue += row.credited_revenue;
    }
    summary.profit = summary.credited_revenue - summary.cost;
    summary.ctr = ratio(summary.clicks as f64, summary.impressions as f64).unwrap_or(0.0);
    summary.conversion_rate = ratio(summary.conversions, summary.clicks as f64).unwrap_or(0.0);
    summary.roas = ratio(summary.credited_revenue, summary.cost);
    summary
}

/// `num / den`, or `None` when the denominator is zero
fn ratio(num: f64, den: f64) -> Option<f64> {
    (den > 0.0).then(|| num / den)
}

/// Min-max normalize present values to [0, 1]; absent values score 0
fn min_max(values: &[Option<f64>]) -> Vec<f64> {
    let present = values.iter().flatten().copied();
    let (lo, hi) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let range = hi - lo;

    values
        .iter()
        .map(|v| match v {
            None => 0.0,
            Some(_) if range <= f64::EPSILON * hi.abs().max(1.0) => FLAT_RANGE_SCORE,
            Some(v) => (v - lo) / range,
        })
        .collect()
}
