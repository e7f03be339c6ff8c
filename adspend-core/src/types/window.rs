//! Reporting windows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Event;

/// A reporting window with start and end timestamps.
///
/// Uses a half-open interval `[start, end)` - start is inclusive, end is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    /// Smallest window containing every event, or `None` for no events
    pub fn covering<'a>(events: impl IntoIterator<Item = &'a Event>) -> Option<Self> {
        let mut bounds: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
        for event in events {
            bounds = Some(match bounds {
                None => (event.timestamp, event.timestamp),
                Some((lo, hi)) => (lo.min(event.timestamp), hi.max(event.timestamp)),
            });
        }
        bounds.map(|(lo, hi)| Self::new(lo, hi + Duration::nanoseconds(1)))
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
