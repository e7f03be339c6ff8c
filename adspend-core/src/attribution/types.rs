//! Attribution output records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Channel;

use super::model::AttributionModel;

/// Per-channel credit for one converted journey under one model.
///
/// `shares` sum to 1 and `credits` sum to `revenue`, both within
/// floating-point tolerance. Unconverted journeys produce an empty result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    pub user_id: String,
    pub conversion_id: Option<String>,
    pub converted_at: Option<DateTime<Utc>>,
    pub model: AttributionModel,
    pub revenue: f64,
    /// Fraction of the conversion credited to each channel
    pub shares: BTreeMap<Channel, f64>,
    /// Revenue credited to each channel
    pub credits: BTreeMap<Channel, f64>,
}

impl AttributionResult {
    /// Sum of credited revenue across channels
    pub fn total_credited(&self) -> f64 {
        self.credits.values().sum()
    }

    pub fn credit(&self, channel: &Channel) -> f64 {
        self.credits.get(channel).copied().unwrap_or(0.0)
    }

    pub fn share(&self, channel: &Channel) -> f64 {
        self.shares.get(channel).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
    }

    /// Whether credits sum to the conversion revenue within `rel_tol`
    pub fn is_conserved(&self, rel_tol: f64) -> bool {
        let diff = (self.total_credited() - self.revenue).abs();
        diff <= rel_tol * self.revenue.abs().max(1.0)
    }
}
