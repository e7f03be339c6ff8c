//! Attribution model selection and configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Default half-life for time-decay attribution, in days
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 7.0;

/// Credit-assignment rule applied to a converted journey.
///
/// A closed set: adding a model means adding a variant here and an arm in
/// [`super::attribute`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributionModel {
    /// All credit to the final touchpoint before conversion
    LastTouch,
    /// All credit to the first touchpoint
    FirstTouch,
    /// Equal credit to every touchpoint
    Linear,
    /// 40% first, 40% last, 20% shared by the middle
    PositionBased,
    /// Credit proportional to 2^(-Δt / half_life)
    TimeDecay { half_life_days: f64 },
}

impl AttributionModel {
    /// Time-decay with the default 7-day half-life
    pub fn time_decay() -> Self {
        Self::TimeDecay {
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
        }
    }

    /// Every model, with time-decay at the given half-life
    pub fn all(half_life_days: f64) -> Vec<Self> {
        vec![
            Self::LastTouch,
            Self::FirstTouch,
            Self::Linear,
            Self::PositionBased,
            Self::TimeDecay { half_life_days },
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LastTouch => "last_touch",
            Self::FirstTouch => "first_touch",
            Self::Linear => "linear",
            Self::PositionBased => "position_based",
            Self::TimeDecay { .. } => "time_decay",
        }
    }

    /// Parse a model name, giving time-decay the supplied half-life.
    ///
    /// Accepts snake_case or kebab-case names.
    pub fn parse_with_half_life(name: &str, half_life_days: f64) -> Result<Self, ModelError> {
        let model = match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "last_touch" => Self::LastTouch,
            "first_touch" => Self::FirstTouch,
            "linear" => Self::Linear,
            "position_based" => Self::PositionBased,
            "time_decay" => Self::TimeDecay { half_life_days },
            _ => return Err(ModelError::UnknownModel(name.to_string())),
        };
        model.validate()?;
        Ok(model)
    }

    /// Check model parameters
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::TimeDecay { half_life_days }
                if !half_life_days.is_finite() || *half_life_days <= 0.0 =>
            {
                Err(ModelError::InvalidHalfLife(*half_life_days))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for AttributionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttributionModel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_half_life(s, DEFAULT_HALF_LIFE_DAYS)
    }
}

/// Configuration for which models a run computes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    /// Models to compute, by name
    pub models: Vec<String>,
    /// Model whose metrics drive budget optimization (default: "linear")
    pub primary: String,
    /// Half-life for time-decay in days (default: 7.0)
    pub half_life_days: f64,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            models: ["last_touch", "first_touch", "linear", "position_based", "time_decay"]
                .into_iter()
                .map(String::from)
                .collect(),
            primary: "linear".to_string(),
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
        }
    }
}

impl AttributionConfig {
    /// Resolve configured model names, failing on any unknown name
    pub fn models(&self) -> Result<Vec<AttributionModel>, ModelError> {
        let mut models = Vec::with_capacity(self.models.len());
        for name in &self.models {
            let model = AttributionModel::parse_with_half_life(name, self.half_life_days)?;
            if !models.contains(&model) {
                models.push(model);
            }
        }
        Ok(models)
    }

    pub fn primary(&self) -> Result<AttributionModel, ModelError> {
        AttributionModel::parse_with_half_life(&self.primary, self.half_life_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_models() {
        assert_eq!(
            "last_touch".parse::<AttributionModel>().unwrap(),
            AttributionModel::LastTouch
        );
        assert_eq!(
            "Position-Based".parse::<AttributionModel>().unwrap(),
            AttributionModel::PositionBased
        );
        assert_eq!(
            "time_decay".parse::<AttributionModel>().unwrap(),
            AttributionModel::time_decay()
        );
    }

    #[test]
    fn test_unknown_model_is_model_error() {
        let err = "u_shaped".parse::<AttributionModel>().unwrap_err();
        assert_eq!(err, ModelError::UnknownModel("u_shaped".into()));
    }

    #[test]
    fn test_invalid_half_life_rejected() {
        let err = AttributionModel::parse_with_half_life("time_decay", 0.0).unwrap_err();
        assert!(matches!(err, ModelError::InvalidHalfLife(_)));
        assert!(
            AttributionModel::TimeDecay {
                half_life_days: f64::NAN
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_model_serialization_is_tagged() {
        let json = serde_json::to_string(&AttributionModel::time_decay()).unwrap();
        assert_eq!(json, r#"{"kind":"time_decay","half_life_days":7.0}"#);
        let parsed: AttributionModel = serde_json::from_str(r#"{"kind":"linear"}"#).unwrap();
        assert_eq!(parsed, AttributionModel::Linear);
    }

    #[test]
    fn test_config_resolves_and_dedupes() {
        let config = AttributionConfig {
            models: vec!["linear".into(), "linear".into(), "time_decay".into()],
            primary: "linear".into(),
            half_life_days: 3.0,
        };
        let models = config.models().unwrap();
        assert_eq!(
            models,
            vec![
                AttributionModel::Linear,
                AttributionModel::TimeDecay {
                    half_life_days: 3.0
                }
            ]
        );
    }

    #[test]
    fn test_config_unknown_model_fails() {
        let config = AttributionConfig {
            models: vec!["markov_chain".into()],
            ..Default::default()
        };
        assert!(config.models().is_err());
    }
}
