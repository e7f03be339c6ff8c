//! A/B significance testing for proportion metrics
//!
//! Compares a control and a treatment arm with a pooled two-proportion
//! z-test and checks that both arms reached the sample size needed to
//! detect the configured effect.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::error::AbTestError;
use crate::metrics::ChannelMetrics;

/// Configuration for significance testing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbTestConfig {
    /// Two-sided significance level α (default: 0.05)
    pub significance_level: f64,
    /// Probability of detecting a true effect (default: 0.80)
    pub power: f64,
    /// Smallest effect worth detecting, relative to control (default: 0.25)
    pub minimum_detectable_effect: f64,
}

impl Default for AbTestConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            power: 0.80,
            minimum_detectable_effect: 0.25,
        }
    }
}

impl AbTestConfig {
    pub fn validate(&self) -> Result<(), AbTestError> {
        let open_unit = |v: f64| v.is_finite() && v > 0.0 && v < 1.0;
        if !open_unit(self.significance_level) {
            return Err(AbTestError::InvalidConfig(format!(
                "significance level must lie in (0, 1): {}",
                self.significance_level
            )));
        }
        if !open_unit(self.power) {
            return Err(AbTestError::InvalidConfig(format!(
                "power must lie in (0, 1): {}",
                self.power
            )));
        }
        if !self.minimum_detectable_effect.is_finite() || self.minimum_detectable_effect <= 0.0 {
            return Err(AbTestError::InvalidConfig(format!(
                "minimum detectable effect must be positive: {}",
                self.minimum_detectable_effect
            )));
        }
        Ok(())
    }
}

/// Which channel ratio an arm is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMetric {
    /// Conversions per click.
    ///
    /// Credited conversions can exceed clicks when impression-only
    /// journeys credit a channel, so the arm's rate is capped at 1.
    ConversionRate,
    /// Clicks per impression
    Ctr,
}

/// Observed proportion and sample size for one arm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmSample {
    pub metric: f64,
    pub sample_size: u64,
}

impl ArmSample {
    pub fn new(metric: f64, sample_size: u64) -> Self {
        Self {
            metric,
            sample_size,
        }
    }

    /// Take an arm from channel metrics: conversion rate over clicks or
    /// CTR over impressions.
    pub fn from_metrics(metrics: &ChannelMetrics, target: TargetMetric) -> Self {
        match target {
            TargetMetric::ConversionRate => {
                Self::new(metrics.conversion_rate.min(1.0), metrics.clicks)
            }
            TargetMetric::Ctr => Self::new(metrics.ctr, metrics.impressions),
        }
    }

    fn validate(&self, arm: &'static str) -> Result<(), AbTestError> {
        if !self.metric.is_finite() || !(0.0..=1.0).contains(&self.metric) {
            return Err(AbTestError::InvalidProportion {
                arm,
                value: self.metric,
            });
        }
        if self.sample_size == 0 {
            return Err(AbTestError::EmptySample(arm));
        }
        Ok(())
    }
}

/// Outcome of comparing two arms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ABTestResult {
    pub control_metric: f64,
    pub treatment_metric: f64,
    pub control_sample_size: u64,
    pub treatment_sample_size: u64,
    /// Treatment minus control
    pub difference: f64,
    /// (1 − α) confidence interval for the difference, unpooled standard error
    pub difference_ci: (f64, f64),
    /// Treatment over control minus one; absent when control is zero
    pub relative_lift: Option<f64>,
    /// Cohen's h: 2·asin(√p₂) − 2·asin(√p₁)
    pub effect_size: f64,
    /// Per-arm sample size needed to detect the configured effect
    pub required_sample_size: u64,
    pub z_score: f64,
    pub p_value: f64,
    pub significance_level: f64,
    /// p-value below α and both arms at or above the required size
    pub significant: bool,
}

impl ABTestResult {
    /// Smaller of the two arm sizes
    pub fn sample_size(&self) -> u64 {
        self.control_sample_size.min(self.treatment_sample_size)
    }

    pub fn is_adequately_powered(&self) -> bool {
        self.sample_size() >= self.required_sample_size
    }
}

/// Evaluates A/B tests on proportion metrics
pub struct AbTestEvaluator {
    config: AbTestConfig,
    normal: Normal,
}

impl AbTestEvaluator {
    /// Create with default configuration
    pub fn new() -> Result<Self, AbTestError> {
        Self::with_config(AbTestConfig::default())
    }

    /// Create with custom configuration, rejecting invalid values
    pub fn with_config(config: AbTestConfig) -> Result<Self, AbTestError> {
        config.validate()?;
        let normal =
            Normal::new(0.0, 1.0).map_err(|e| AbTestError::InvalidConfig(e.to_string()))?;
        Ok(Self { config, normal })
    }

    pub fn config(&self) -> &AbTestConfig {
        &self.config
    }

    /// Per-arm sample size needed to detect the minimum effect from a
    /// `baseline` proportion at the configured α and power.
    ///
    /// The effect is relative to the baseline and capped at 1. A baseline
    /// of 0 uses the effect as an absolute rate, and a baseline of 1
    /// looks for a drop instead of a rise.
    pub fn required_sample_size(&self, baseline: f64) -> Result<u64, AbTestError> {
        if !baseline.is_finite() || !(0.0..=1.0).contains(&baseline) {
            return Err(AbTestError::InvalidProportion {
                arm: "control",
                value: baseline,
            });
        }
        let mde = self.config.minimum_detectable_effect;
        let p1 = baseline;
        let p2 = if p1 == 0.0 {
            mde.min(1.0)
        } else if p1 == 1.0 {
            (p1 * (1.0 - mde)).max(0.0)
        } else {
            (p1 * (1.0 + mde)).min(1.0)
        };
        let delta = p2 - p1;

        let z_alpha = self.z_alpha();
        let z_power = self.normal.inverse_cdf(self.config.power);
        let p_bar = (p1 + p2) / 2.0;

        let numerator = z_alpha * (2.0 * p_bar * (1.0 - p_bar)).sqrt()
            + z_power * (p1 * (1.0 - p1) + p2 * (1.0 - p2)).sqrt();
        let n = numerator.powi(2) / delta.powi(2);

        Ok(n.ceil() as u64)
    }

    /// Two-sided critical value for the configured α
    fn z_alpha(&self) -> f64 {
        self.normal.inverse_cdf(1.0 - self.config.significance_level / 2.0)
    }

    /// Two-sided pooled z-test of treatment against control
    pub fn evaluate(
        &self,
        control: &ArmSample,
        treatment: &ArmSample,
    ) -> Result<ABTestResult, AbTestError> {
        control.validate("control")?;
        treatment.validate("treatment")?;

        let required_sample_size = self.required_sample_size(control.metric)?;

        let n1 = control.sample_size as f64;
        let n2 = treatment.sample_size as f64;
        let pooled = (control.metric * n1 + treatment.metric * n2) / (n1 + n2);
        let se = (pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2)).sqrt();

        let difference = treatment.metric - control.metric;
        let (z_score, p_value) = if se > 0.0 {
            let z = difference / se;
            (z, 2.0 * (1.0 - self.normal.cdf(z.abs())))
        } else {
            (0.0, 1.0)
        };

        let unpooled = (control.metric * (1.0 - control.metric) / n1
            + treatment.metric * (1.0 - treatment.metric) / n2)
            .sqrt();
        let margin = self.z_alpha() * unpooled;
        let effect_size =
            2.0 * treatment.metric.sqrt().asin() - 2.0 * control.metric.sqrt().asin();

        let alpha = self.config.significance_level;
        let powered = control.sample_size.min(treatment.sample_size) >= required_sample_size;
        let significant = p_value < alpha && powered;

        debug!(
            z_score,
            p_value, required_sample_size, significant, "Evaluated A/B test"
        );

        Ok(ABTestResult {
            control_metric: control.metric,
            treatment_metric: treatment.metric,
            control_sample_size: control.sample_size,
            treatment_sample_size: treatment.sample_size,
            difference,
            difference_ci: (difference - margin, difference + margin),
            relative_lift: (control.metric > 0.0)
                .then(|| treatment.metric / control.metric - 1.0),
            effect_size,
            required_sample_size,
            z_score,
            p_value,
            significance_level: alpha,
            significant,
        })
    }
}
