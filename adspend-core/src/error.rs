//! Error types for adspend-core

use thiserror::Error;

use crate::types::Channel;

/// Structural problem with the events of one journey.
///
/// A `DataError` rejects the journey it was found in; the rest of the
/// batch is still processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// A required identifier was empty
    #[error("Event {event_id:?} has an empty {field}")]
    MissingField {
        event_id: String,
        field: &'static str,
    },

    /// Cost or revenue was negative or not a finite number
    #[error("Event {event_id} has invalid {field}: {value}")]
    InvalidAmount {
        event_id: String,
        field: &'static str,
        value: f64,
    },

    /// Timestamp lies before the Unix epoch
    #[error("Event {event_id} is timestamped before the Unix epoch")]
    BeforeEpoch { event_id: String },

    /// Events within a journey are not in ascending time order
    #[error("Event {event_id} is out of order within journey for user {user_id}")]
    NonMonotonic { user_id: String, event_id: String },

    /// More than one conversion, or a conversion that is not the final event
    #[error("Journey for user {user_id} has a misplaced conversion {event_id}")]
    MisplacedConversion { user_id: String, event_id: String },

    /// Conversion with no touchpoint before it; credited to itself
    #[error("Conversion {event_id} for user {user_id} has no prior touchpoints")]
    OrphanConversion { user_id: String, event_id: String },
}

/// Caller misconfiguration of an attribution model or metric weights.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Model name did not match any known variant
    #[error("Unknown attribution model: {0}")]
    UnknownModel(String),

    /// Time-decay half-life must be positive and finite
    #[error("Invalid time-decay half-life: {0} days")]
    InvalidHalfLife(f64),

    /// Efficiency weights must be finite, non-negative and not all zero
    #[error("Invalid efficiency weights: {0}")]
    InvalidWeights(String),

    /// Configuration value outside its allowed range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Structurally invalid input to the optimization recommender.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    /// Budget was negative or not a finite number
    #[error("Invalid budget for channel {channel}: {value}")]
    InvalidBudget { channel: Channel, value: f64 },

    /// Threshold or cap outside its allowed range
    #[error("Invalid optimizer configuration: {0}")]
    InvalidConfig(String),
}

/// Invalid input to the A/B significance evaluator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AbTestError {
    /// Observed proportion outside [0, 1]
    #[error("Proportion out of range for {arm}: {value}")]
    InvalidProportion { arm: &'static str, value: f64 },

    /// An arm has no observations
    #[error("Sample size for {0} must be positive")]
    EmptySample(&'static str),

    /// Significance level, power or effect size outside range
    #[error("Invalid A/B configuration: {0}")]
    InvalidConfig(String),

    /// Channel named as an arm has no metrics
    #[error("No metrics for {0} arm channel {1}")]
    MissingArm(&'static str, String),
}

/// Top-level error for adspend operations
#[derive(Debug, Error)]
pub enum AdspendError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Optimization error: {0}")]
    Optimize(#[from] OptimizeError),

    #[error("A/B test error: {0}")]
    AbTest(#[from] AbTestError),

    /// Configuration rejected before any work ran
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AdspendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for AdspendError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for AdspendError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for adspend operations
pub type Result<T> = std::result::Result<T, AdspendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::UnknownModel("u_shaped".into());
        assert_eq!(err.to_string(), "Unknown attribution model: u_shaped");
    }

    #[test]
    fn test_error_from_model() {
        let err: AdspendError = ModelError::InvalidHalfLife(0.0).into();
        assert!(matches!(err, AdspendError::Model(_)));
        assert!(err.to_string().contains("half-life"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AdspendError = io_err.into();
        assert!(matches!(err, AdspendError::Io(_)));
    }

    #[test]
    fn test_data_error_names_event() {
        let err = DataError::InvalidAmount {
            event_id: "imp_1".into(),
            field: "cost",
            value: -1.0,
        };
        assert!(err.to_string().contains("imp_1"));
        assert!(err.to_string().contains("cost"));
    }
}
