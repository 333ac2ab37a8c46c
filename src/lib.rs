//! # Kitchen E-Paper Board Core Library
//!
//! This library renders the kitchen status board: a fixed 800×480 image with the
//! next few days of calendar events on the left and a two-day weather table on the
//! right, then re-encodes it for whoever asked for it (a browser wants PNG, the
//! panel controller wants raw palette indices).
//!
//! ## Design Philosophy
//!
//! ### Deterministic layout
//! - **Fixed canvas**: Every element is placed against a per-region layout cursor
//!   bounded by `height - margin`; content that does not fit is dropped, never squeezed
//! - **Monospace fonts**: Text width is an exact function of character count, so
//!   truncation and alignment are reproducible across machines
//! - **Pure render**: One call owns its canvas from start to finish; icons and fonts
//!   are loaded once and shared read-only
//!
//! ### Color reduction
//! The 7-color panel can only show black, white, green, blue, red, yellow and
//! orange. Raw output is nearest-color quantized and packed two pixels per byte;
//! PNG previews can be dithered so photos of icons still look reasonable.
//!
//! ### Data Flow
//! 1. **Adapters**: [`calendar`] and [`weather`] turn upstream JSON into typed inputs
//! 2. **Layout**: [`layout`] draws events and weather rows onto a [`canvas::Canvas`]
//! 3. **Dispatch**: [`output`] emits PNG/JPEG directly, or routes through
//!    [`palette`] and [`pack`] for the raw frame
//!
//! ## Core Types
//! - [`CalendarEvent`]: One agenda entry, grouped by day on the board
//! - [`WeatherPeriod`]: One forecast row (2-hour step)
//! - [`RenderRequest`]: The caller's output preference, resolved before rendering

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub mod assets;
pub mod calendar;
pub mod canvas;
pub mod config;
pub mod layout;
pub mod output;
pub mod pack;
pub mod palette;
pub mod render;
pub mod weather;

/// Start or end of a calendar event.
///
/// All-day events carry only a date; timed events carry the wall-clock time
/// in the event's own offset, which is what the board shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTime {
    /// Date-only boundary of an all-day event
    AllDay(NaiveDate),
    /// Wall-clock timestamp
    At(NaiveDateTime),
}

impl EventTime {
    /// Calendar day this boundary falls on.
    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::AllDay(date) => *date,
            EventTime::At(timestamp) => timestamp.date(),
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::AllDay(_))
    }

    /// Ordering key within a day. All-day events sort to midnight.
    pub fn sort_key(&self) -> NaiveDateTime {
        match self {
            EventTime::AllDay(date) => date.and_time(NaiveTime::MIN),
            EventTime::At(timestamp) => *timestamp,
        }
    }
}

/// A single agenda entry.
///
/// `date` is the day the event is listed under on the board, normally the
/// start's calendar day.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use kitchen_epaper_lib::{CalendarEvent, EventTime};
///
/// let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
/// let start = EventTime::At(day.and_hms_opt(9, 30, 0).unwrap());
/// let end = EventTime::At(day.and_hms_opt(10, 0, 0).unwrap());
/// let event = CalendarEvent::new(start, end, "Dentist");
///
/// assert_eq!(event.date, day);
/// assert!(!event.is_all_day());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Day the event is grouped under
    pub date: NaiveDate,
    pub start: EventTime,
    pub end: EventTime,
    /// Display text
    pub summary: String,
}

impl CalendarEvent {
    /// Build an event listed under its start day.
    pub fn new(start: EventTime, end: EventTime, summary: impl Into<String>) -> Self {
        Self {
            date: start.date(),
            start,
            end,
            summary: summary.into(),
        }
    }

    /// True when either boundary is date-only.
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day() || self.end.is_all_day()
    }

    /// Last calendar day the event occupies.
    ///
    /// A date-only end is exclusive, a timed end inclusive unless it falls
    /// exactly on midnight. Ends at or before the start count as the start day.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use kitchen_epaper_lib::{CalendarEvent, EventTime};
    ///
    /// let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
    /// let holiday = CalendarEvent::new(EventTime::AllDay(day(13)), EventTime::AllDay(day(16)), "Holiday");
    /// assert_eq!(holiday.last_day(), day(15));
    /// ```
    pub fn last_day(&self) -> NaiveDate {
        let start_day = self.start.date();
        let last = match self.end {
            EventTime::AllDay(end) => end.pred_opt().unwrap_or(end),
            EventTime::At(end) if end.time() == NaiveTime::MIN && end > self.start.sort_key() => {
                end.date().pred_opt().unwrap_or(end.date())
            }
            EventTime::At(end) => end.date(),
        };
        last.max(start_day)
    }
}

/// One forecast row.
///
/// Values are stored unrounded; the layout formats temperature as an integer
/// and wind/precipitation with one decimal.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use kitchen_epaper_lib::WeatherPeriod;
///
/// let period = WeatherPeriod {
///     date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
///     hour: 14,
///     temperature: 7.6,
///     wind_speed: 3.24,
///     precipitation: 0.0,
///     icon_key: "partly_cloudy".to_string(),
/// };
///
/// assert_eq!(period.hour % 2, 0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherPeriod {
    pub date: NaiveDate,
    /// Local hour of day, 0..=23
    pub hour: u8,
    /// Air temperature in °C
    pub temperature: f32,
    /// Wind speed in m/s
    pub wind_speed: f32,
    /// Precipitation in mm
    pub precipitation: f32,
    /// Key into the icon set
    pub icon_key: String,
}

/// Output preference of whoever asked for the image.
///
/// The boundary layer fills this in (query string, CLI flag, config default)
/// before the renderer runs; the renderer never looks at the transport.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// `png`, `jpeg`/`jpg` or `raw`; anything else renders PNG
    pub format_hint: Option<String>,
}

impl RenderRequest {
    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format_hint: Some(format.into()),
        }
    }
}
