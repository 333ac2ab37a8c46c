//! # Board Canvas
//!
//! RGB drawing surface for one render. Implements `embedded-graphics`'
//! [`DrawTarget`] so text and primitives can be drawn onto it directly; every
//! write is clipped to the canvas so nothing can land out of bounds.
//!
//! The [`Cursor`] tracks the next free row of a layout region and never moves
//! past the region's bottom limit.

use core::convert::Infallible;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use image::{Rgb, RgbImage, RgbaImage};

/// Panel width in pixels.
pub const CANVAS_WIDTH: u32 = 800;
/// Panel height in pixels.
pub const CANVAS_HEIGHT: u32 = 480;

/// Owned pixel buffer for one render call.
pub struct Canvas {
    image: RgbImage,
    background: Rgb888,
}

fn to_rgb(color: Rgb888) -> Rgb<u8> {
    Rgb([color.r(), color.g(), color.b()])
}

impl Canvas {
    /// Panel-sized canvas filled with `background`.
    pub fn new(background: Rgb888) -> Self {
        Self::with_size(CANVAS_WIDTH, CANVAS_HEIGHT, background)
    }

    pub fn with_size(width: u32, height: u32, background: Rgb888) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, to_rgb(background)),
            background,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn background(&self) -> Rgb888 {
        self.background
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        self.image
            .get_pixel_checked(x, y)
            .map(|p| Rgb888::new(p[0], p[1], p[2]))
    }

    #[inline]
    fn set_pixel(&mut self, x: i32, y: i32, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height() {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Composite an RGBA glyph with its top-left corner at `top_left`.
    ///
    /// Alpha is blended against whatever is already on the canvas; the parts
    /// of the glyph outside the canvas are clipped.
    pub fn blit_rgba(&mut self, glyph: &RgbaImage, top_left: Point) {
        for (gx, gy, pixel) in glyph.enumerate_pixels() {
            let x = top_left.x + gx as i32;
            let y = top_left.y + gy as i32;
            if x < 0 || y < 0 || x as u32 >= self.width() || y as u32 >= self.height() {
                continue;
            }
            let [r, g, b, a] = pixel.0;
            if a == 0 {
                continue;
            }
            let under = self.image.get_pixel(x as u32, y as u32).0;
            let alpha = a as u32;
            let blend = |top: u8, bottom: u8| -> u8 {
                ((top as u32 * alpha + bottom as u32 * (255 - alpha) + 127) / 255) as u8
            };
            self.image.put_pixel(
                x as u32,
                y as u32,
                Rgb([blend(r, under[0]), blend(g, under[1]), blend(b, under[2])]),
            );
        }
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.set_pixel(coord.x, coord.y, to_rgb(color));
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.bounding_box());
        let Some(bottom_right) = clipped.bottom_right() else {
            return Ok(());
        };

        let color = to_rgb(color);
        for y in clipped.top_left.y..=bottom_right.y {
            for x in clipped.top_left.x..=bottom_right.x {
                self.image.put_pixel(x as u32, y as u32, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let color = to_rgb(color);
        self.image.pixels_mut().for_each(|p| *p = color);
        Ok(())
    }
}

/// Layout cursor for one region: the next unused row, bounded by `max_y`.
///
/// ```
/// use kitchen_epaper_lib::canvas::Cursor;
///
/// let mut cursor = Cursor::new(24, 456);
/// assert!(cursor.fits(28));
/// cursor.advance(1000);
/// assert_eq!(cursor.y(), 456);
/// assert!(!cursor.fits(1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    y: i32,
    max_y: i32,
}

impl Cursor {
    pub fn new(top: i32, max_y: i32) -> Self {
        Self {
            y: top.min(max_y),
            max_y,
        }
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    /// Rows left before `max_y`.
    pub fn remaining(&self) -> u32 {
        (self.max_y - self.y) as u32
    }

    /// Whether a block of `height` rows starting at the cursor stays within `max_y`.
    pub fn fits(&self, height: u32) -> bool {
        self.y as i64 + height as i64 <= self.max_y as i64
    }

    /// Move down by `rows`, stopping at `max_y`.
    pub fn advance(&mut self, rows: u32) {
        self.y = (self.y as i64 + rows as i64).min(self.max_y as i64) as i32;
    }
}
