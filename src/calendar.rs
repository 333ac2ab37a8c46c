//! # Calendar Export Adapter
//!
//! Reads a JSON export of upcoming events, either the `events.list` response
//! shape (`{ "items": [...] }`) or a bare array of the same items:
//!
//! ```json
//! {
//!   "items": [
//!     { "summary": "Dentist",
//!       "start": { "dateTime": "2025-03-14T09:30:00+01:00" },
//!       "end":   { "dateTime": "2025-03-14T10:00:00+01:00" } },
//!     { "summary": "School trip",
//!       "start": { "date": "2025-03-15" },
//!       "end":   { "date": "2025-03-16" } }
//!   ]
//! }
//! ```
//!
//! Timed events keep the wall-clock time of their own offset. Items that
//! cannot be understood are skipped with a warning rather than failing the
//! whole export.

use crate::layout::UNTITLED_LABEL;
use crate::{CalendarEvent, EventTime};
use chrono::{DateTime, Duration, NaiveDate};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("calendar export IO: {0}")]
    Io(#[from] io::Error),

    #[error("calendar export is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Export {
    Bare(Vec<Value>),
    Listing { items: Vec<Value> },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    summary: Option<String>,
    start: Option<RawTime>,
    end: Option<RawTime>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTime {
    date_time: Option<String>,
    date: Option<String>,
}

/// Why a single item was skipped.
#[derive(Error, Debug)]
enum EntryError {
    #[error("malformed item: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("missing start")]
    MissingStart,
    #[error("unparseable time '{0}'")]
    BadTime(String),
}

impl RawTime {
    fn parse(&self) -> Result<EventTime, EntryError> {
        if let Some(stamp) = &self.date_time {
            return DateTime::parse_from_rfc3339(stamp)
                .map(|t| EventTime::At(t.naive_local()))
                .map_err(|_| EntryError::BadTime(stamp.clone()));
        }
        if let Some(day) = &self.date {
            return NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map(EventTime::AllDay)
                .map_err(|_| EntryError::BadTime(day.clone()));
        }
        Err(EntryError::MissingStart)
    }
}

fn convert(item: Value) -> Result<CalendarEvent, EntryError> {
    let raw: RawEvent = serde_json::from_value(item)?;
    let start = raw.start.as_ref().ok_or(EntryError::MissingStart)?.parse()?;
    let end = match &raw.end {
        Some(end) => end.parse().unwrap_or(start),
        None => start,
    };
    let summary = raw
        .summary
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNTITLED_LABEL.to_string());
    Ok(CalendarEvent::new(start, end, summary))
}

/// Parse an export, skipping items that cannot be converted.
pub fn parse_events(bytes: &[u8]) -> Result<Vec<CalendarEvent>, CalendarError> {
    let items = match serde_json::from_slice::<Export>(bytes)? {
        Export::Bare(items) => items,
        Export::Listing { items } => items,
    };

    let total = items.len();
    let mut events: Vec<CalendarEvent> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match convert(item) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping calendar item {}: {}", index, e);
                None
            }
        })
        .collect();
    events.sort_by_key(|e| e.start.sort_key());

    debug!("Parsed {} of {} calendar items", events.len(), total);
    Ok(events)
}

/// Load and parse the export at `path`.
pub fn load_events<P: AsRef<Path>>(path: P) -> Result<Vec<CalendarEvent>, CalendarError> {
    let data = fs::read(path.as_ref())?;
    parse_events(&data)
}

/// Keep events overlapping `today` and the following `days - 1` days.
///
/// Events already in progress are kept and listed under `today`.
pub fn retain_upcoming(events: Vec<CalendarEvent>, today: NaiveDate, days: u32) -> Vec<CalendarEvent> {
    let end = today + Duration::days(days as i64);
    events
        .into_iter()
        .filter(|e| e.last_day() >= today && e.start.date() < end)
        .map(|mut e| {
            if e.date < today {
                debug!("Listing ongoing event '{}' under {}", e.summary, today);
                e.date = today;
            }
            e
        })
        .collect()
}
