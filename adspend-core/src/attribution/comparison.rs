//! Side-by-side comparison of attribution models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Channel;

use super::model::AttributionModel;
use super::types::AttributionResult;

/// Credited revenue for one channel under each compared model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub channel: Channel,
    /// Credited revenue per model, in the order of [`ModelComparison::models`]
    pub credited: Vec<f64>,
    pub mean: f64,
    /// Sample variance across models (n - 1 denominator)
    pub variance: f64,
}

/// Pearson correlation of two models' per-channel credited revenue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCorrelation {
    pub first: AttributionModel,
    pub second: AttributionModel,
    /// Absent with fewer than two channels or when either model credits
    /// every channel equally
    pub pearson: Option<f64>,
}

/// How much each channel's credit depends on the model chosen.
///
/// Channels with high variance are the ones whose value is most
/// sensitive to the attribution rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelComparison {
    pub models: Vec<AttributionModel>,
    pub rows: Vec<ComparisonRow>,
    /// One entry per model pair, in model order
    pub correlations: Vec<ModelCorrelation>,
}

impl ModelComparison {
    /// Tabulate per-channel credited revenue from each model's results.
    ///
    /// `results` pairs each model with every attribution it produced.
    pub fn from_results(results: &[(AttributionModel, Vec<AttributionResult>)]) -> Self {
        let models: Vec<AttributionModel> = results.iter().map(|(m, _)| *m).collect();
        let mut table: BTreeMap<Channel, Vec<f64>> = BTreeMap::new();

        for (idx, (_, model_results)) in results.iter().enumerate() {
            for result in model_results {
                for (channel, credit) in &result.credits {
                    table
                        .entry(channel.clone())
                        .or_insert_with(|| vec![0.0; models.len()])[idx] += credit;
                }
            }
        }

        let rows: Vec<ComparisonRow> = table
            .into_iter()
            .map(|(channel, credited)| {
                let (mean, variance) = mean_and_variance(&credited);
                ComparisonRow {
                    channel,
                    credited,
                    mean,
                    variance,
                }
            })
            .collect();

        let mut correlations = Vec::new();
        for i in 0..models.len() {
            for j in i + 1..models.len() {
                let xs: Vec<f64> = rows.iter().map(|r| r.credited[i]).collect();
                let ys: Vec<f64> = rows.iter().map(|r| r.credited[j]).collect();
                correlations.push(ModelCorrelation {
                    first: models[i],
                    second: models[j],
                    pearson: pearson(&xs, &ys),
                });
            }
        }

        Self {
            models,
            rows,
            correlations,
        }
    }

    /// Correlation between two compared models, if both are present
    pub fn correlation(&self, a: &AttributionModel, b: &AttributionModel) -> Option<f64> {
        self.correlations
            .iter()
            .find(|c| (&c.first, &c.second) == (a, b) || (&c.first, &c.second) == (b, a))
            .and_then(|c| c.pearson)
    }

    /// Channels ordered by variance across models, highest first
    pub fn most_sensitive(&self) -> Vec<&ComparisonRow> {
        let mut rows: Vec<&ComparisonRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| b.variance.total_cmp(&a.variance));
        rows
    }

    /// Total credited revenue under the model at `idx`
    pub fn model_total(&self, idx: usize) -> f64 {
        self.rows.iter().filter_map(|r| r.credited.get(idx)).sum()
    }
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, sum_sq / (n - 1.0))
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let (mean_x, _) = mean_and_variance(xs);
    let (mean_y, _) = mean_and_variance(ys);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    let denom = (var_x * var_y).sqrt();
    (denom > 0.0).then(|| (cov / denom).clamp(-1.0, 1.0))
}
