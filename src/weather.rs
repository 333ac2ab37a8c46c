//! # Weather Forecast Adapter
//!
//! Fetches the met.no `locationforecast/2.0/compact` feed and turns it into
//! the board's [`WeatherPeriod`] rows.
//!
//! ## Data Source
//! - **URL**: `https://api.met.no/weatherapi/locationforecast/2.0/compact`
//! - **Query**: `lat`/`lon` rounded to 4 decimals
//! - **Identification**: met.no refuses requests without a descriptive
//!   User-Agent, which comes from `[weather] user_agent`
//!
//! ## Caching Strategy
//! Same cache-first approach as any slow upstream: the forecast JSON is
//! written to `cache_path` together with the coordinates it was fetched for,
//! and reused while the file is younger than `cache_ttl_minutes` and the
//! configured location is unchanged. Cache write failures are ignored.
//!
//! ## Period Selection
//! Only entries from the start of the current local hour onward, on even
//! local hours, on today's or tomorrow's date. The symbol code of the next
//! hour (or the next six hours) is mapped onto an icon key by an ordered
//! rule table; see [`SYMBOL_RULES`].

use crate::assets::IconSet;
use crate::config::{IconKeyMode, WeatherConfig};
use crate::WeatherPeriod;
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;
use std::{fs, io};
use thiserror::Error;

pub const FORECAST_URL: &str = "https://api.met.no/weatherapi/locationforecast/2.0/compact";

/// Icon used when no rule matches a symbol code.
pub const DEFAULT_ICON: &str = "cloudy";

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("forecast request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("forecast is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("forecast IO: {0}")]
    Io(#[from] io::Error),

    /// Neither coordinates nor an offline forecast file are configured
    #[error("no latitude/longitude configured")]
    NoLocation,
}

// -- met.no compact schema (only the fields the board uses) --

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Forecast {
    pub properties: Properties,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Properties {
    #[serde(default)]
    pub timeseries: Vec<TimeStep>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TimeStep {
    pub time: DateTime<Utc>,
    pub data: StepData,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct StepData {
    #[serde(default)]
    pub instant: Instant,
    pub next_1_hours: Option<Outlook>,
    pub next_6_hours: Option<Outlook>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Instant {
    #[serde(default)]
    pub details: InstantDetails,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InstantDetails {
    /// °C
    pub air_temperature: Option<f32>,
    /// m/s
    pub wind_speed: Option<f32>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Outlook {
    pub summary: Option<OutlookSummary>,
    pub details: Option<OutlookDetails>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutlookSummary {
    pub symbol_code: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct OutlookDetails {
    /// mm
    pub precipitation_amount: Option<f32>,
}

impl Outlook {
    fn symbol(&self) -> Option<&str> {
        self.summary.as_ref().map(|s| s.symbol_code.as_str())
    }

    fn precipitation(&self) -> Option<f32> {
        self.details.as_ref().and_then(|d| d.precipitation_amount)
    }
}

impl StepData {
    /// Symbol of the nearest outlook that has one.
    pub fn symbol(&self) -> Option<&str> {
        self.next_1_hours
            .as_ref()
            .and_then(Outlook::symbol)
            .or_else(|| self.next_6_hours.as_ref().and_then(Outlook::symbol))
    }

    pub fn precipitation(&self) -> f32 {
        self.next_1_hours
            .as_ref()
            .and_then(Outlook::precipitation)
            .or_else(|| self.next_6_hours.as_ref().and_then(Outlook::precipitation))
            .unwrap_or(0.0)
    }
}

// -- Symbol → icon rules --

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Matcher {
    Prefix,
    Contains,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolRule {
    pub matcher: Matcher,
    pub pattern: &'static str,
    pub icon: &'static str,
}

impl SymbolRule {
    const fn new(matcher: Matcher, pattern: &'static str, icon: &'static str) -> Self {
        Self {
            matcher,
            pattern,
            icon,
        }
    }

    pub fn matches(&self, symbol: &str) -> bool {
        match self.matcher {
            Matcher::Prefix => symbol.starts_with(self.pattern),
            Matcher::Contains => symbol.contains(self.pattern),
        }
    }
}

/// Evaluated in order, first match wins.
///
/// Thunder and the night variants come before the plain sky states so that
/// `rainandthunder` and `clearsky_night` are not caught by broader rules.
pub const SYMBOL_RULES: &[SymbolRule] = &[
    SymbolRule::new(Matcher::Contains, "thunder", "thunder"),
    SymbolRule::new(Matcher::Prefix, "clearsky_night", "clear_night"),
    SymbolRule::new(Matcher::Prefix, "fair_night", "clear_night"),
    SymbolRule::new(Matcher::Prefix, "clearsky", "sunny"),
    SymbolRule::new(Matcher::Prefix, "fair", "partly_cloudy"),
    SymbolRule::new(Matcher::Prefix, "partlycloudy", "partly_cloudy"),
    SymbolRule::new(Matcher::Prefix, "cloudy", "cloudy"),
    SymbolRule::new(Matcher::Contains, "sleet", "sleet"),
    SymbolRule::new(Matcher::Contains, "snow", "snow"),
    SymbolRule::new(Matcher::Contains, "rainshowers", "showers"),
    SymbolRule::new(Matcher::Contains, "rain", "rain"),
    SymbolRule::new(Matcher::Prefix, "fog", "fog"),
];

/// Standard icon key for a met.no symbol code.
///
/// ```
/// use kitchen_epaper_lib::weather::icon_for_symbol;
///
/// assert_eq!(icon_for_symbol("clearsky_night"), "clear_night");
/// assert_eq!(icon_for_symbol("lightrainshowers_day"), "showers");
/// assert_eq!(icon_for_symbol("heavyrainandthunder"), "thunder");
/// assert_eq!(icon_for_symbol("something_new"), "cloudy");
/// ```
pub fn icon_for_symbol(symbol: &str) -> &'static str {
    SYMBOL_RULES
        .iter()
        .find(|rule| rule.matches(symbol))
        .map_or(DEFAULT_ICON, |rule| rule.icon)
}

/// Icon key for `symbol` under the configured key mode.
///
/// In [`IconKeyMode::Symbol`] the raw symbol code is used when the icon set
/// has a glyph under that exact key; otherwise the rule table decides.
pub fn resolve_icon_key(symbol: &str, mode: IconKeyMode, icons: &IconSet) -> String {
    match mode {
        IconKeyMode::Symbol if icons.contains(symbol) => symbol.to_string(),
        _ => icon_for_symbol(symbol).to_string(),
    }
}

/// Select the board's rows from a forecast.
///
/// `now` fixes both the local timezone and which entries count as today and
/// tomorrow. Entries without an air temperature are skipped.
pub fn periods_from_forecast<Tz, F>(
    forecast: &Forecast,
    now: &DateTime<Tz>,
    icon_key: F,
) -> Vec<WeatherPeriod>
where
    Tz: TimeZone,
    F: Fn(&str) -> String,
{
    let tz = now.timezone();
    let local_now = now.naive_local();
    let hour_start = local_now
        .date()
        .and_hms_opt(local_now.hour(), 0, 0)
        .unwrap_or(local_now);
    let today = local_now.date();
    let tomorrow = today + Duration::days(1);

    let mut periods = Vec::new();
    for step in &forecast.properties.timeseries {
        let local = step.time.with_timezone(&tz).naive_local();
        if local < hour_start || local.hour() % 2 != 0 {
            continue;
        }
        let date = local.date();
        if date != today && date != tomorrow {
            continue;
        }

        let details = &step.data.instant.details;
        let Some(temperature) = details.air_temperature else {
            debug!("Skipping forecast step {} without temperature", step.time);
            continue;
        };
        let symbol = step.data.symbol().unwrap_or(DEFAULT_ICON);

        periods.push(WeatherPeriod {
            date,
            hour: local.hour() as u8,
            temperature,
            wind_speed: details.wind_speed.unwrap_or(f32::NAN),
            precipitation: step.data.precipitation(),
            icon_key: icon_key(symbol),
        });
    }

    periods.sort_by_key(|p| (p.date, p.hour));
    periods.dedup_by_key(|p| (p.date, p.hour));
    periods
}

/// Parse a forecast document.
pub fn parse_forecast(bytes: &[u8]) -> Result<Forecast, WeatherError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read an offline forecast file.
pub fn load_forecast_file<P: AsRef<Path>>(path: P) -> Result<Forecast, WeatherError> {
    let data = fs::read(path.as_ref())?;
    parse_forecast(&data)
}

/// Forecast from the configured source: the offline file when set,
/// otherwise [`fetch`].
pub async fn load_or_fetch(config: &WeatherConfig) -> Result<Forecast, WeatherError> {
    match &config.forecast_path {
        Some(path) => {
            info!("Reading forecast from {}", path.display());
            load_forecast_file(path)
        }
        None => fetch(config).await,
    }
}

/// Fetch the forecast from met.no or the cache.
pub async fn fetch(config: &WeatherConfig) -> Result<Forecast, WeatherError> {
    let (Some(latitude), Some(longitude)) = (config.latitude, config.longitude) else {
        return Err(WeatherError::NoLocation);
    };
    let location = location_key(latitude, longitude);

    let ttl_secs = config.cache_ttl_minutes * 60;
    if let Ok(forecast) = load_cache(&config.cache_path, &location, ttl_secs) {
        debug!("Using cached forecast from {}", config.cache_path.display());
        return Ok(forecast);
    }

    info!("Fetching forecast for {}", location);
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()?;
    let forecast = client
        .get(FORECAST_URL)
        .query(&[
            ("lat", format!("{:.4}", latitude)),
            ("lon", format!("{:.4}", longitude)),
        ])
        .send()
        .await?
        .error_for_status()?
        .json::<Forecast>()
        .await?;

    // Cache failures only cost a refetch next time
    let _ = save_cache(&config.cache_path, &location, &forecast);

    Ok(forecast)
}

/// Coordinates as sent to met.no, used to tie a cache file to its location.
fn location_key(latitude: f64, longitude: f64) -> String {
    format!("{:.4},{:.4}", latitude, longitude)
}

#[derive(Deserialize, Serialize)]
struct CachedForecast {
    location: String,
    forecast: Forecast,
}

/// Cached forecast, if the file exists, is younger than `ttl_secs` and was
/// fetched for `location`.
fn load_cache(path: &Path, location: &str, ttl_secs: u64) -> Result<Forecast, io::Error> {
    let meta = fs::metadata(path)?;
    let age = SystemTime::now()
        .duration_since(meta.modified()?)
        .map_err(|_| io::Error::other("time error"))?
        .as_secs();

    if age > ttl_secs {
        return Err(io::Error::other("stale"));
    }

    let data = fs::read(path)?;
    let cached: CachedForecast = serde_json::from_slice(&data)?;
    if cached.location != location {
        debug!("Cached forecast is for {}, not {}", cached.location, location);
        return Err(io::Error::other("location changed"));
    }
    Ok(cached.forecast)
}

fn save_cache(path: &Path, location: &str, forecast: &Forecast) -> Result<(), io::Error> {
    let cached = CachedForecast {
        location: location.to_string(),
        forecast: forecast.clone(),
    };
    let data = serde_json::to_vec(&cached)?;
    fs::write(path, data)
}
