//! # Board Renderer
//!
//! Ties the layout engine to the format dispatcher. A [`Renderer`] borrows the
//! shared assets; every call draws on its own fresh canvas, so concurrent
//! renders never see each other's pixels.

use crate::assets::Assets;
use crate::canvas::Canvas;
use crate::layout::{draw_board, LayoutReport};
use crate::output::{encode, EncodeError, EncodeOptions, EncodedImage, OutputFormat};
use crate::palette::PanelColor;
use crate::{CalendarEvent, RenderRequest, WeatherPeriod};
use chrono::NaiveDateTime;
use log::info;

pub struct Renderer<'a> {
    assets: &'a Assets,
    options: EncodeOptions,
}

impl<'a> Renderer<'a> {
    pub fn new(assets: &'a Assets, options: EncodeOptions) -> Self {
        Self { assets, options }
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Lay out the board on a white canvas without encoding it.
    pub fn draw(
        &self,
        events: &[CalendarEvent],
        periods: &[WeatherPeriod],
        now: NaiveDateTime,
    ) -> (Canvas, LayoutReport) {
        let mut canvas = Canvas::new(PanelColor::White.rgb888());
        let report = draw_board(&mut canvas, self.assets, events, periods, now);
        (canvas, report)
    }

    /// Render the board and encode it the way `request` asks for.
    ///
    /// `now` is the generation time shown in the footer and decides which
    /// weather rows count as today and tomorrow.
    pub fn render(
        &self,
        events: &[CalendarEvent],
        periods: &[WeatherPeriod],
        request: &RenderRequest,
        now: NaiveDateTime,
    ) -> Result<EncodedImage, EncodeError> {
        let format = OutputFormat::from_hint(request.format_hint.as_deref());
        let (canvas, report) = self.draw(events, periods, now);
        let encoded = encode(canvas.image(), format, &self.options)?;

        info!(
            "Rendered {:?} board: {} events ({} dropped), {} weather rows, {} bytes",
            format,
            report.events_drawn,
            report.events_dropped,
            report.weather_rows.len(),
            encoded.bytes.len()
        );
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Fonts, IconSet};
    use crate::pack::packed_len;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn draws_on_white_panel_canvas() {
        let assets = Assets::new(IconSet::default(), Fonts::default());
        let renderer = Renderer::new(&assets, EncodeOptions::default());

        let (canvas, report) = renderer.draw(&[], &[], now());
        assert_eq!((canvas.width(), canvas.height()), (800, 480));
        assert_eq!(canvas.pixel(400, 300), Some(PanelColor::White.rgb888()));
        assert_eq!(report.events_drawn, 0);
    }

    #[test]
    fn raw_request_returns_full_frame() {
        let assets = Assets::new(IconSet::default(), Fonts::default());
        let renderer = Renderer::new(&assets, EncodeOptions::default());

        let out = renderer
            .render(&[], &[], &RenderRequest::with_format("raw"), now())
            .unwrap();
        assert_eq!(out.bytes.len(), packed_len(800, 480));
        assert_eq!(out.content_type, "application/octet-stream");
    }
}
