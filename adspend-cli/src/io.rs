//! Event and budget files.
//!
//! Events are JSON Lines, one [`Event`] per line. Budgets are a JSON object
//! mapping channel name to amount.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use adspend_core::{Channel, Event};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Read events from a JSON Lines file, skipping blank lines
pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open events file {}", path.display()))?;

    let mut events = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid event", path.display(), idx + 1))?;
        events.push(event);
    }

    debug!(count = events.len(), path = %path.display(), "Read events");
    Ok(events)
}

/// Write events as JSON Lines, creating parent directories
pub fn write_events(path: &Path, events: &[Event]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for event in events {
        serde_json::to_writer(&mut writer, event)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read `{"Channel": amount, ...}` budgets
pub fn read_budgets(path: &Path) -> Result<BTreeMap<Channel, f64>> {
    read_json(path).with_context(|| format!("Invalid budgets file {}", path.display()))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_events_roundtrip_through_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("events.jsonl");
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let events = vec![
            Event::impression("imp_1", "user_1", "Facebook", ts, 0.08),
            Event::conversion("conv_1", "user_1", "Facebook", ts, 120.0),
        ];

        write_events(&path, &events).unwrap();
        let read = read_events(&path).unwrap();

        assert_eq!(read, events);
    }

    #[test]
    fn test_read_events_skips_blank_lines_and_defaults_amounts() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        std::fs::write(
            &path,
            "\n{\"event_id\":\"c1\",\"user_id\":\"u\",\"timestamp\":\"2024-01-01T00:00:00Z\",\"channel\":\"TikTok\",\"event_type\":\"click\"}\n\n",
        )
        .unwrap();

        let events = read_events(&path).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].cost, 0.0);
        assert_eq!(events[0].channel, Channel::from("TikTok"));
    }

    #[test]
    fn test_read_events_reports_line_number() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        std::fs::write(&path, "{}\n").unwrap();

        let err = read_events(&path).unwrap_err();
        assert!(format!("{err:#}").contains(":1:"));
    }

    #[test]
    fn test_read_budgets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("budgets.json");
        std::fs::write(&path, r#"{"Google Search": 25000, "Campus TV": 5000.5}"#).unwrap();

        let budgets = read_budgets(&path).unwrap();

        assert_eq!(budgets[&Channel::from("Google Search")], 25_000.0);
        assert_eq!(budgets[&Channel::from("Campus TV")], 5_000.5);
    }
}
