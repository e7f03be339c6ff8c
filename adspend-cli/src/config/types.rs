use adspend_core::TimeWindow;
use serde::Deserialize;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAdspendConfig {
    #[serde(default)]
    pub journey: RawJourneyConfig,

    #[serde(default)]
    pub attribution: RawAttributionConfig,

    #[serde(default)]
    pub metrics: RawMetricsConfig,

    #[serde(default)]
    pub optimizer: RawOptimizerConfig,

    #[serde(default)]
    pub abtest: RawAbTestConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawJourneyConfig {
    /// Lookback window in days
    pub lookback_days: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAttributionConfig {
    /// Models to compute, by name
    pub models: Option<Vec<String>>,

    /// Model whose metrics drive the budget plan
    pub primary: Option<String>,

    /// Time-decay half-life in days
    pub half_life_days: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawMetricsConfig {
    #[serde(default)]
    pub weights: RawWeights,

    /// Reporting window; unset means the span of the input
    pub window: Option<TimeWindow>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawWeights {
    pub roas: Option<f64>,
    pub conversion_rate: Option<f64>,
    pub ctr: Option<f64>,
    pub cost_efficiency: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawOptimizerConfig {
    pub low_efficiency_threshold: Option<f64>,
    pub opportunity_threshold: Option<f64>,
    pub max_shift_pct: Option<f64>,
    pub recommendation_band_pct: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAbTestConfig {
    pub significance_level: Option<f64>,
    pub power: Option<f64>,
    pub minimum_detectable_effect: Option<f64>,
}
