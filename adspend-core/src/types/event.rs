//! Touchpoint events as recorded by ingestion.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of an advertising channel (e.g. "Google Search")
///
/// Channels order by name so that every per-channel table is emitted
/// in the same order on every run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(pub String);

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Channel {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Channel {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of interaction an event records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Impression,
    Click,
    Conversion,
}

/// A single recorded ad interaction. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub channel: Channel,
    pub event_type: EventType,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub revenue: f64,
}

impl Event {
    pub fn impression(
        event_id: impl Into<String>,
        user_id: impl Into<String>,
        channel: impl Into<Channel>,
        timestamp: DateTime<Utc>,
        cost: f64,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            user_id: user_id.into(),
            timestamp,
            channel: channel.into(),
            event_type: EventType::Impression,
            cost,
            revenue: 0.0,
        }
    }

    pub fn click(
        event_id: impl Into<String>,
        user_id: impl Into<String>,
        channel: impl Into<Channel>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            user_id: user_id.into(),
            timestamp,
            channel: channel.into(),
            event_type: EventType::Click,
            cost: 0.0,
            revenue: 0.0,
        }
    }

    pub fn conversion(
        event_id: impl Into<String>,
        user_id: impl Into<String>,
        channel: impl Into<Channel>,
        timestamp: DateTime<Utc>,
        revenue: f64,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            user_id: user_id.into(),
            timestamp,
            channel: channel.into(),
            event_type: EventType::Conversion,
            cost: 0.0,
            revenue,
        }
    }

    pub fn is_conversion(&self) -> bool {
        self.event_type == EventType::Conversion
    }

    /// Sort key used when ordering a user's events: time first, then
    /// impressions before clicks before conversions, then id.
    pub(crate) fn order_key(&self) -> (DateTime<Utc>, EventType, &str) {
        (self.timestamp, self.event_type, self.event_id.as_str())
    }
}
