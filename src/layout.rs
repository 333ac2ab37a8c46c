//! # Board Layout
//!
//! Places everything on the 800×480 canvas:
//!
//! ```text
//! +--------------------------------+------------------------+
//! | Agenda                         | Today Fri 14 Mar       |
//! | Friday 14 March                | [icon] 14:00 7°C ...   |
//! | [09:30-10:00  Dentist       ]  | [icon] 16:00 6°C ...   |
//! | [All day      School trip   ]  | ...                    |
//! | Saturday 15 March              | Tomorrow Sat 15 Mar    |
//! | ...                            | ...                    |
//! |                                |   Updated 14 Mar 13:05 |
//! +--------------------------------+------------------------+
//! ```
//!
//! Both regions grow downward from a [`Cursor`] bounded by `height - MARGIN`.
//! Anything that would cross that line is dropped (pagination cutoff): the
//! remaining days of the calendar, the remaining events of a day, the weather
//! rows past the row limit, or the whole "tomorrow" section.
//!
//! Fonts are monospace, so measuring a string is exact and the summary
//! truncation loop always terminates.

use crate::assets::{Assets, Fonts};
use crate::canvas::{Canvas, Cursor};
use crate::palette::PanelColor;
use crate::{CalendarEvent, EventTime, WeatherPeriod};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::renderer::TextRenderer;
use embedded_graphics::text::{Baseline, Text};
use log::{debug, warn};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Outer margin; also the distance of each region's cutoff from the bottom edge.
pub const MARGIN: u32 = 24;
/// Gap below region titles and day headers
pub const HEADER_SPACING: u32 = 4;
pub const EVENT_BOX_HEIGHT: u32 = 28;
pub const EVENT_SPACING: u32 = 4;
/// Extra gap after the last event of a day
pub const DAY_SPACING: u32 = 8;
/// Horizontal padding inside event boxes
pub const TEXT_PADDING: u32 = 6;
/// Summary column inside an event box, after the time label
pub const SUMMARY_OFFSET: u32 = 102;

pub const MAX_WEATHER_ROWS: u32 = 8;
/// Vertical gap kept between an icon and the next row
pub const ICON_MARGIN: u32 = 4;
pub const MAX_ICON_SIZE: u32 = 40;
/// Weather columns, relative to the region's left edge
pub const TIME_COLUMN: u32 = 48;
pub const TEMPERATURE_COLUMN: u32 = 96;
pub const PRECIPITATION_COLUMN: u32 = 152;
pub const WIND_COLUMN: u32 = 208;

/// Truncation never keeps fewer characters than this.
pub const MIN_TRUNCATED_CHARS: usize = 3;
pub const ELLIPSIS: &str = "...";
pub const ALL_DAY_LABEL: &str = "All day";
pub const UNTITLED_LABEL: &str = "(No title)";
/// Shown for values that are not finite numbers
pub const MISSING_VALUE: &str = "--";

const AGENDA_TITLE: &str = "Agenda";
const FOOTER_INSET: u32 = 4;

/// What a placed element is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Title,
    DayHeader,
    EventBox,
    EventText,
    WeatherHeader,
    Icon,
    WeatherText,
    Footer,
}

/// Bounding box of one drawn element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub kind: ElementKind,
    pub bounds: Rectangle,
}

/// Summary of one layout pass.
#[derive(Clone, Debug, Default)]
pub struct LayoutReport {
    pub placements: Vec<Placement>,
    pub events_drawn: usize,
    /// Events cut off by pagination
    pub events_dropped: usize,
    /// `(date, hour)` of each weather row, in drawing order
    pub weather_rows: Vec<(NaiveDate, u8)>,
    pub tomorrow_shown: bool,
}

impl LayoutReport {
    fn place(&mut self, kind: ElementKind, bounds: Rectangle) {
        self.placements.push(Placement { kind, bounds });
    }

    pub fn count(&self, kind: ElementKind) -> usize {
        self.placements.iter().filter(|p| p.kind == kind).count()
    }
}

/// Horizontal extent and vertical limits of one board region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub max_y: i32,
}

impl Region {
    /// Left 60% of the canvas.
    pub fn calendar(size: Size) -> Self {
        let split = (size.width * 3 / 5) as i32;
        Self {
            left: MARGIN as i32,
            right: split - (MARGIN / 2) as i32,
            top: MARGIN as i32,
            max_y: size.height as i32 - MARGIN as i32,
        }
    }

    /// Right 40% of the canvas.
    pub fn weather(size: Size) -> Self {
        let split = (size.width * 3 / 5) as i32;
        Self {
            left: split + (MARGIN / 2) as i32,
            right: size.width as i32 - MARGIN as i32,
            top: MARGIN as i32,
            max_y: size.height as i32 - MARGIN as i32,
        }
    }

    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    fn cursor(&self) -> Cursor {
        Cursor::new(self.top, self.max_y)
    }
}

/// Row height and icon size for the weather table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowMetrics {
    pub row_height: u32,
    pub icon_size: u32,
}

impl RowMetrics {
    /// Split `available` rows evenly across [`MAX_WEATHER_ROWS`].
    pub fn for_space(available: u32) -> Self {
        let row_height = available / MAX_WEATHER_ROWS;
        Self {
            row_height,
            icon_size: row_height.saturating_sub(ICON_MARGIN).min(MAX_ICON_SIZE),
        }
    }
}

/// Width of `text` in pixels when drawn with `style`.
pub fn text_width(text: &str, style: &MonoTextStyle<'_, Rgb888>) -> u32 {
    style
        .measure_string(text, Point::zero(), Baseline::Top)
        .bounding_box
        .size
        .width
}

/// Shorten `text` until it fits `max_width`, ending it with [`ELLIPSIS`].
///
/// Drops one character per step and stops at [`MIN_TRUNCATED_CHARS`] kept
/// characters even if the result is still too wide.
///
/// ```
/// use embedded_graphics::mono_font::{iso_8859_1::FONT_8X13, MonoTextStyle};
/// use embedded_graphics::pixelcolor::Rgb888;
/// use embedded_graphics::prelude::*;
/// use kitchen_epaper_lib::layout::fit_text;
///
/// let style = MonoTextStyle::new(&FONT_8X13, Rgb888::BLACK);
/// assert_eq!(fit_text("Parents evening", 80, &style), "Parents...");
/// assert_eq!(fit_text("Gym", 80, &style), "Gym");
/// ```
pub fn fit_text<'a>(text: &'a str, max_width: u32, style: &MonoTextStyle<'_, Rgb888>) -> Cow<'a, str> {
    if text_width(text, style) <= max_width {
        return Cow::Borrowed(text);
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= MIN_TRUNCATED_CHARS {
        return Cow::Borrowed(text);
    }

    let mut keep = chars.len();
    loop {
        keep -= 1;
        let mut candidate: String = chars[..keep].iter().collect();
        candidate.push_str(ELLIPSIS);
        let width = text_width(&candidate, style);
        if width <= max_width {
            return Cow::Owned(candidate);
        }
        if keep <= MIN_TRUNCATED_CHARS {
            // Floor reached; never return something wider than the input
            return if width < text_width(text, style) {
                Cow::Owned(candidate)
            } else {
                Cow::Borrowed(text)
            };
        }
    }
}

/// Group events by day, days ascending, events within a day by start.
pub fn group_by_date(events: &[CalendarEvent]) -> Vec<(NaiveDate, Vec<&CalendarEvent>)> {
    let mut days: BTreeMap<NaiveDate, Vec<&CalendarEvent>> = BTreeMap::new();
    for event in events {
        days.entry(event.date).or_default().push(event);
    }
    days.into_iter()
        .map(|(date, mut day_events)| {
            day_events.sort_by_key(|e| e.start.sort_key());
            (date, day_events)
        })
        .collect()
}

/// Split periods into today's and tomorrow's rows, each ordered by hour.
pub fn partition_periods(
    periods: &[WeatherPeriod],
    today: NaiveDate,
) -> (Vec<&WeatherPeriod>, Vec<&WeatherPeriod>) {
    let tomorrow = today + Duration::days(1);
    let mut today_rows: Vec<&WeatherPeriod> = periods.iter().filter(|p| p.date == today).collect();
    let mut tomorrow_rows: Vec<&WeatherPeriod> =
        periods.iter().filter(|p| p.date == tomorrow).collect();
    today_rows.sort_by_key(|p| p.hour);
    tomorrow_rows.sort_by_key(|p| p.hour);
    (today_rows, tomorrow_rows)
}

/// Time label for an event box. Uses the same all-day test as the box fill.
pub fn time_label(event: &CalendarEvent) -> String {
    if event.is_all_day() {
        return ALL_DAY_LABEL.to_string();
    }
    match (event.start, event.end) {
        (EventTime::At(start), EventTime::At(end)) if end > start => {
            format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
        }
        (start, _) => start.sort_key().format("%H:%M").to_string(),
    }
}

/// Summary with whitespace collapsed; blank summaries get a placeholder.
pub fn display_summary(summary: &str) -> Cow<'_, str> {
    let words: Vec<&str> = summary.split_whitespace().collect();
    if words.is_empty() {
        Cow::Borrowed(UNTITLED_LABEL)
    } else if words.join(" ") == summary {
        Cow::Borrowed(summary)
    } else {
        Cow::Owned(words.join(" "))
    }
}

fn format_number(value: f32, unit: &str) -> String {
    if value.is_finite() {
        format!("{:.1}{}", value, unit)
    } else {
        MISSING_VALUE.to_string()
    }
}

pub fn format_temperature(celsius: f32) -> String {
    if celsius.is_finite() {
        format!("{}°C", celsius.round() as i32)
    } else {
        MISSING_VALUE.to_string()
    }
}

pub fn format_precipitation(mm: f32) -> String {
    format_number(mm, "mm")
}

pub fn format_wind(metres_per_second: f32) -> String {
    format_number(metres_per_second, "m/s")
}

/// Draw `text` with its top-left corner at `top_left` and record where it went.
fn draw_text(
    canvas: &mut Canvas,
    report: &mut LayoutReport,
    kind: ElementKind,
    text: &str,
    top_left: Point,
    style: MonoTextStyle<'_, Rgb888>,
) {
    let text = Text::with_baseline(text, top_left, style, Baseline::Top);
    report.place(kind, text.bounding_box());
    text.draw(canvas).ok();
}

fn style(font: &'static MonoFont<'static>, color: PanelColor) -> MonoTextStyle<'static, Rgb888> {
    MonoTextStyle::new(font, color.rgb888())
}

/// Draw the whole board: calendar, weather, then the footer.
pub fn draw_board(
    canvas: &mut Canvas,
    assets: &Assets,
    events: &[CalendarEvent],
    periods: &[WeatherPeriod],
    now: NaiveDateTime,
) -> LayoutReport {
    let mut report = LayoutReport::default();

    draw_calendar(canvas, &assets.fonts, events, &mut report);
    draw_weather(canvas, assets, periods, now.date(), &mut report);
    draw_footer(canvas, &assets.fonts, now, &mut report);

    debug!(
        "Layout: {} events drawn, {} dropped, {} weather rows, {} elements",
        report.events_drawn,
        report.events_dropped,
        report.weather_rows.len(),
        report.placements.len()
    );
    report
}

fn draw_calendar(
    canvas: &mut Canvas,
    fonts: &Fonts,
    events: &[CalendarEvent],
    report: &mut LayoutReport,
) {
    let region = Region::calendar(canvas.size());
    let mut cursor = region.cursor();

    let title_height = fonts.header.character_size.height;
    if cursor.fits(title_height) {
        draw_text(
            canvas,
            report,
            ElementKind::Title,
            AGENDA_TITLE,
            Point::new(region.left, cursor.y()),
            style(fonts.header, PanelColor::Black),
        );
        cursor.advance(title_height + HEADER_SPACING);
    }

    let days = group_by_date(events);
    let header_style = style(fonts.day, PanelColor::Black);
    let header_height = fonts.day.character_size.height;

    for (day_index, (date, day_events)) in days.iter().enumerate() {
        if !cursor.fits(header_height) {
            let dropped: usize = days[day_index..].iter().map(|(_, e)| e.len()).sum();
            debug!("Calendar full at {}, dropping {} events", date, dropped);
            report.events_dropped += dropped;
            break;
        }

        let header = date.format("%A %-d %B").to_string();
        let header = fit_text(&header, region.width(), &header_style);
        draw_text(
            canvas,
            report,
            ElementKind::DayHeader,
            &header,
            Point::new(region.left, cursor.y()),
            header_style,
        );
        cursor.advance(header_height + HEADER_SPACING);

        for (event_index, event) in day_events.iter().enumerate() {
            if !cursor.fits(EVENT_BOX_HEIGHT) {
                report.events_dropped += day_events.len() - event_index;
                break;
            }
            draw_event(canvas, fonts, &region, cursor.y(), event, report);
            report.events_drawn += 1;
            cursor.advance(EVENT_BOX_HEIGHT + EVENT_SPACING);
        }

        cursor.advance(DAY_SPACING);
    }
}

fn draw_event(
    canvas: &mut Canvas,
    fonts: &Fonts,
    region: &Region,
    top: i32,
    event: &CalendarEvent,
    report: &mut LayoutReport,
) {
    let fill = if event.is_all_day() {
        PanelColor::Blue
    } else {
        PanelColor::Green
    };
    let bounds = Rectangle::new(
        Point::new(region.left, top),
        Size::new(region.width(), EVENT_BOX_HEIGHT),
    );
    bounds
        .into_styled(PrimitiveStyle::with_fill(fill.rgb888()))
        .draw(canvas)
        .ok();
    report.place(ElementKind::EventBox, bounds);

    let text_style = style(fonts.event, PanelColor::White);
    let text_top = top + (EVENT_BOX_HEIGHT.saturating_sub(fonts.event.character_size.height) / 2) as i32;

    draw_text(
        canvas,
        report,
        ElementKind::EventText,
        &time_label(event),
        Point::new(region.left + TEXT_PADDING as i32, text_top),
        text_style,
    );

    let usable = region.width().saturating_sub(SUMMARY_OFFSET + TEXT_PADDING);
    let summary = display_summary(&event.summary);
    let summary = fit_text(&summary, usable, &text_style);
    draw_text(
        canvas,
        report,
        ElementKind::EventText,
        &summary,
        Point::new(region.left + SUMMARY_OFFSET as i32, text_top),
        text_style,
    );
}

fn draw_weather(
    canvas: &mut Canvas,
    assets: &Assets,
    periods: &[WeatherPeriod],
    today: NaiveDate,
    report: &mut LayoutReport,
) {
    let fonts = &assets.fonts;
    let region = Region::weather(canvas.size());
    let mut cursor = region.cursor();
    let (today_rows, tomorrow_rows) = partition_periods(periods, today);

    let header_style = style(fonts.header, PanelColor::Black);
    let header_height = fonts.header.character_size.height;

    if !cursor.fits(header_height) {
        return;
    }
    let header = format!("Today {}", today.format("%a %-d %b"));
    draw_section_header(canvas, report, &region, &mut cursor, &header, header_style, header_height);

    let metrics = RowMetrics::for_space(cursor.remaining());
    draw_rows(canvas, assets, &region, &mut cursor, &today_rows, metrics, report);

    if !cursor.fits(header_height + HEADER_SPACING + metrics.row_height) {
        debug!("No room for tomorrow's weather, omitting section");
        return;
    }
    let tomorrow = today + Duration::days(1);
    let header = format!("Tomorrow {}", tomorrow.format("%a %-d %b"));
    draw_section_header(canvas, report, &region, &mut cursor, &header, header_style, header_height);
    report.tomorrow_shown = true;
    draw_rows(canvas, assets, &region, &mut cursor, &tomorrow_rows, metrics, report);
}

fn draw_section_header(
    canvas: &mut Canvas,
    report: &mut LayoutReport,
    region: &Region,
    cursor: &mut Cursor,
    text: &str,
    header_style: MonoTextStyle<'static, Rgb888>,
    header_height: u32,
) {
    let text = fit_text(text, region.width(), &header_style);
    draw_text(
        canvas,
        report,
        ElementKind::WeatherHeader,
        &text,
        Point::new(region.left, cursor.y()),
        header_style,
    );
    cursor.advance(header_height + HEADER_SPACING);
}

fn draw_rows(
    canvas: &mut Canvas,
    assets: &Assets,
    region: &Region,
    cursor: &mut Cursor,
    rows: &[&WeatherPeriod],
    metrics: RowMetrics,
    report: &mut LayoutReport,
) {
    if metrics.row_height == 0 {
        return;
    }

    let mut drawn = 0;
    for period in rows {
        if drawn == MAX_WEATHER_ROWS || !cursor.fits(metrics.row_height) {
            break;
        }
        if period.hour > 23 {
            warn!("Skipping weather period with hour {}", period.hour);
            continue;
        }
        draw_weather_row(canvas, assets, region, cursor.y(), period, metrics, report);
        report.weather_rows.push((period.date, period.hour));
        cursor.advance(metrics.row_height);
        drawn += 1;
    }
}

fn draw_weather_row(
    canvas: &mut Canvas,
    assets: &Assets,
    region: &Region,
    top: i32,
    period: &WeatherPeriod,
    metrics: RowMetrics,
    report: &mut LayoutReport,
) {
    let font = assets.fonts.weather;

    if metrics.icon_size > 0 {
        match assets.icons.scaled(&period.icon_key, metrics.icon_size) {
            Some(glyph) => {
                let top_left = Point::new(region.left, top);
                canvas.blit_rgba(&glyph, top_left);
                report.place(
                    ElementKind::Icon,
                    Rectangle::new(top_left, Size::new(metrics.icon_size, metrics.icon_size)),
                );
            }
            None => warn!("No icon loaded for key '{}'", period.icon_key),
        }
    }

    let text_height = font.character_size.height;
    let text_top = top + (metrics.icon_size.saturating_sub(text_height) / 2) as i32;
    let columns = [
        (TIME_COLUMN, format!("{:02}:00", period.hour), PanelColor::Black),
        (TEMPERATURE_COLUMN, format_temperature(period.temperature), PanelColor::Red),
        (PRECIPITATION_COLUMN, format_precipitation(period.precipitation), PanelColor::Blue),
        (WIND_COLUMN, format_wind(period.wind_speed), PanelColor::Black),
    ];

    for (offset, text, color) in columns {
        let text_style = style(font, color);
        let max_width = region.width().saturating_sub(offset);
        let text = fit_text(&text, max_width, &text_style);
        draw_text(
            canvas,
            report,
            ElementKind::WeatherText,
            &text,
            Point::new(region.left + offset as i32, text_top),
            text_style,
        );
    }
}

/// Generation timestamp, right/bottom aligned using its measured box.
fn draw_footer(canvas: &mut Canvas, fonts: &Fonts, now: NaiveDateTime, report: &mut LayoutReport) {
    let text = format!("Updated {}", now.format("%-d %b %H:%M"));
    let footer_style = style(fonts.footer, PanelColor::Black);
    let size = footer_style
        .measure_string(&text, Point::zero(), Baseline::Top)
        .bounding_box
        .size;

    let x = canvas.width().saturating_sub(FOOTER_INSET + size.width) as i32;
    let y = canvas.height().saturating_sub(FOOTER_INSET + size.height) as i32;
    draw_text(canvas, report, ElementKind::Footer, &text, Point::new(x, y), footer_style);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{IconSet, ICON_KEYS};
    use embedded_graphics::mono_font::iso_8859_1::FONT_8X13;
    use image::{Rgba, RgbaImage};
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn timed(d: u32, hour: u32, summary: &str) -> CalendarEvent {
        let start = day(d).and_hms_opt(hour, 0, 0).unwrap();
        CalendarEvent::new(
            EventTime::At(start),
            EventTime::At(start + Duration::minutes(45)),
            summary,
        )
    }

    fn assets() -> Assets {
        let icons = IconSet::from_images(ICON_KEYS.iter().map(|key| {
            (key.to_string(), RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255])))
        }))
        .unwrap();
        Assets::new(icons, Fonts::default())
    }

    fn period(d: u32, hour: u8) -> WeatherPeriod {
        WeatherPeriod {
            date: day(d),
            hour,
            temperature: 4.4,
            wind_speed: 2.25,
            precipitation: 0.0,
            icon_key: "rain".to_string(),
        }
    }

    #[test]
    fn fit_text_keeps_short_strings() {
        let style = style(&FONT_8X13, PanelColor::Black);
        assert!(matches!(fit_text("Swim", 100, &style), Cow::Borrowed("Swim")));
    }

    #[test]
    fn fit_text_never_keeps_fewer_than_three_characters() {
        let style = style(&FONT_8X13, PanelColor::Black);
        let fitted = fit_text("Orchestra rehearsal", 1, &style);
        assert_eq!(fitted, "Orc...");
    }

    #[test]
    fn fit_text_floor_never_widens() {
        let style = style(&FONT_8X13, PanelColor::Black);
        // "abc..." would be 48px against 32px for the input
        assert_eq!(fit_text("abcd", 30, &style), "abcd");
        assert_eq!(fit_text("abcdefg", 30, &style), "abc...");
    }

    #[test]
    fn mixed_boundaries_label_matches_fill() {
        let event = CalendarEvent::new(
            EventTime::At(day(14).and_hms_opt(18, 0, 0).unwrap()),
            EventTime::AllDay(day(15)),
            "Sleepover",
        );
        assert!(event.is_all_day());
        assert_eq!(time_label(&event), ALL_DAY_LABEL);

        let mut canvas = Canvas::new(Rgb888::WHITE);
        let report = draw_board(&mut canvas, &assets(), &[event], &[], day(14).and_hms_opt(6, 0, 0).unwrap());
        let event_box = report
            .placements
            .iter()
            .find(|p| p.kind == ElementKind::EventBox)
            .unwrap();
        let corner = event_box.bounds.top_left;
        assert_eq!(
            canvas.pixel(corner.x as u32, corner.y as u32),
            Some(PanelColor::Blue.rgb888())
        );
    }

    #[test]
    fn time_labels() {
        let event = timed(14, 9, "Dentist");
        assert_eq!(time_label(&event), "09:00-09:45");

        let all_day = CalendarEvent::new(
            EventTime::AllDay(day(14)),
            EventTime::AllDay(day(15)),
            "Trip",
        );
        assert_eq!(time_label(&all_day), ALL_DAY_LABEL);

        let instant = CalendarEvent::new(
            EventTime::At(day(14).and_hms_opt(7, 5, 0).unwrap()),
            EventTime::At(day(14).and_hms_opt(7, 5, 0).unwrap()),
            "Bins out",
        );
        assert_eq!(time_label(&instant), "07:05");
    }

    #[test]
    fn summary_placeholders() {
        assert_eq!(display_summary("   "), UNTITLED_LABEL);
        assert_eq!(display_summary("Piano\nlesson"), "Piano lesson");
        assert!(matches!(display_summary("Gym"), Cow::Borrowed("Gym")));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_temperature(7.6), "8°C");
        assert_eq!(format_temperature(-0.3), "0°C");
        assert_eq!(format_temperature(f32::NAN), MISSING_VALUE);
        assert_eq!(format_precipitation(1.26), "1.3mm");
        assert_eq!(format_wind(3.0), "3.0m/s");
        assert_eq!(format_wind(f32::INFINITY), MISSING_VALUE);
    }

    #[test]
    fn grouping_orders_days_and_start_times() {
        let events = vec![timed(15, 8, "b"), timed(14, 18, "c"), timed(14, 7, "a")];
        let days = group_by_date(&events);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].0, day(14));
        let summaries: Vec<&str> = days[0].1.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(summaries, vec!["a", "c"]);
    }

    #[test]
    fn row_metrics_cap_icon_size() {
        assert_eq!(
            RowMetrics::for_space(408),
            RowMetrics {
                row_height: 51,
                icon_size: 40
            }
        );
        assert_eq!(
            RowMetrics::for_space(160),
            RowMetrics {
                row_height: 20,
                icon_size: 16
            }
        );
    }

    #[test]
    fn twenty_events_on_one_day_stop_at_cutoff() {
        let events: Vec<_> = (0..20).map(|i| timed(14, 6 + i % 12, "Standup")).collect();
        let mut canvas = Canvas::new(Rgb888::WHITE);
        let report = draw_board(&mut canvas, &assets(), &events, &[], day(14).and_hms_opt(6, 0, 0).unwrap());

        // Title 24..44, day header 48..66, boxes from 70 every 32px
        assert_eq!(report.events_drawn, 12);
        assert_eq!(report.events_dropped, 8);
        for placement in report.placements.iter().filter(|p| p.kind == ElementKind::EventBox) {
            let bottom = placement.bounds.top_left.y + placement.bounds.size.height as i32;
            assert!(bottom <= 456, "event box ends at {}", bottom);
        }
    }

    #[test]
    fn days_past_the_cutoff_are_dropped_whole() {
        let mut events: Vec<_> = (0..11).map(|i| timed(14, 6 + i, "Busy")).collect();
        events.push(timed(15, 9, "Next day"));
        events.push(timed(16, 9, "Day after"));

        let mut canvas = Canvas::new(Rgb888::WHITE);
        let report = draw_board(&mut canvas, &assets(), &events, &[], day(14).and_hms_opt(6, 0, 0).unwrap());

        assert_eq!(report.events_drawn + report.events_dropped, events.len());
        assert_eq!(report.events_drawn, 11);
    }

    #[test]
    fn full_today_leaves_no_room_for_tomorrow() {
        let periods: Vec<_> = (0..8)
            .map(|i| period(14, 8 + 2 * i as u8))
            .chain((0..4).map(|i| period(15, 2 * i as u8)))
            .collect();
        let mut canvas = Canvas::new(Rgb888::WHITE);
        let report = draw_board(&mut canvas, &assets(), &[], &periods, day(14).and_hms_opt(7, 0, 0).unwrap());

        assert_eq!(report.weather_rows.len(), 8);
        assert!(!report.tomorrow_shown);
        assert_eq!(report.count(ElementKind::WeatherHeader), 1);
    }

    #[test]
    fn short_evening_shows_tomorrow() {
        let periods = vec![period(14, 20), period(14, 22), period(15, 0), period(15, 2)];
        let mut canvas = Canvas::new(Rgb888::WHITE);
        let report = draw_board(&mut canvas, &assets(), &[], &periods, day(14).and_hms_opt(19, 0, 0).unwrap());

        assert!(report.tomorrow_shown);
        assert_eq!(
            report.weather_rows,
            vec![(day(14), 20), (day(14), 22), (day(15), 0), (day(15), 2)]
        );
    }

    #[test]
    fn unknown_icon_key_draws_row_without_icon() {
        let mut odd = period(14, 10);
        odd.icon_key = "heavysnowshowersandthunder_polartwilight".to_string();
        let mut canvas = Canvas::new(Rgb888::WHITE);
        let report = draw_board(&mut canvas, &assets(), &[], &[odd], day(14).and_hms_opt(9, 0, 0).unwrap());

        assert_eq!(report.weather_rows.len(), 1);
        assert_eq!(report.count(ElementKind::Icon), 0);
    }

    #[test]
    fn invalid_hour_is_skipped() {
        let periods = vec![period(14, 10), period(14, 25)];
        let mut canvas = Canvas::new(Rgb888::WHITE);
        let report = draw_board(&mut canvas, &assets(), &[], &periods, day(14).and_hms_opt(9, 0, 0).unwrap());
        assert_eq!(report.weather_rows, vec![(day(14), 10)]);
    }

    #[test]
    fn footer_sits_in_bottom_right_corner() {
        let mut canvas = Canvas::new(Rgb888::WHITE);
        let report = draw_board(&mut canvas, &assets(), &[], &[], day(14).and_hms_opt(13, 5, 0).unwrap());

        let footer = report
            .placements
            .iter()
            .find(|p| p.kind == ElementKind::Footer)
            .unwrap();
        let bottom_right = footer.bounds.bottom_right().unwrap();
        assert_eq!(bottom_right, Point::new(800 - 4 - 1, 480 - 4 - 1));
    }

    proptest! {
        #[test]
        fn truncated_text_fits_and_ends_with_ellipsis(text in "[ -~]{0,120}") {
            let style = style(&FONT_8X13, PanelColor::White);
            let usable = Region::calendar(Size::new(800, 480)).width() - SUMMARY_OFFSET - TEXT_PADDING;
            let fitted = fit_text(&text, usable, &style);

            prop_assert!(text_width(&fitted, &style) <= usable);
            if fitted != text {
                prop_assert!(fitted.ends_with(ELLIPSIS));
                prop_assert!(fitted.chars().count() >= MIN_TRUNCATED_CHARS);
            }
        }

        #[test]
        fn weather_rows_ascend_within_each_day(
            hours in proptest::collection::vec((14u32..16, 0u8..24), 0..30)
        ) {
            let periods: Vec<_> = hours.iter().map(|&(d, h)| period(d, h)).collect();
            let (today, tomorrow) = partition_periods(&periods, day(14));
            prop_assert!(today.windows(2).all(|w| w[0].hour <= w[1].hour));
            prop_assert!(tomorrow.windows(2).all(|w| w[0].hour <= w[1].hour));
            prop_assert_eq!(today.len() + tomorrow.len(), periods.len());
        }
    }
}
