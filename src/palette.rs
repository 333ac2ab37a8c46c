//! # Palette Quantization
//!
//! The 7-color panel shows exactly seven inks. Anything drawn in between
//! (anti-aliased icon edges, photo-like weather glyphs) has to be mapped onto
//! one of them before the frame can be packed.
//!
//! Two modes are provided:
//! - **Nearest**: each pixel independently takes the palette entry with the
//!   smallest squared RGB distance. Ties go to the lowest index. This is what
//!   the panel receives.
//! - **Dithered**: Floyd–Steinberg error diffusion (`image::imageops::dither`)
//!   for a smoother PNG preview.
//!
//! The two modes can pick different indices for the same pixel; see
//! `output::PreviewMode::Device` for a preview that matches the panel exactly.

use embedded_graphics::pixelcolor::Rgb888;
use image::imageops::{self, ColorMap};
use image::{Rgb, RgbImage};

/// Number of inks on the panel.
pub const PALETTE_SIZE: usize = 7;

/// Device color codes, in the order the controller numbers them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PanelColor {
    Black = 0,
    White = 1,
    Green = 2,
    Blue = 3,
    Red = 4,
    Yellow = 5,
    Orange = 6,
}

impl PanelColor {
    pub const ALL: [PanelColor; PALETTE_SIZE] = [
        PanelColor::Black,
        PanelColor::White,
        PanelColor::Green,
        PanelColor::Blue,
        PanelColor::Red,
        PanelColor::Yellow,
        PanelColor::Orange,
    ];

    /// Device color code (palette index).
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn rgb(self) -> Rgb<u8> {
        match self {
            PanelColor::Black => Rgb([0, 0, 0]),
            PanelColor::White => Rgb([255, 255, 255]),
            PanelColor::Green => Rgb([0, 255, 0]),
            PanelColor::Blue => Rgb([0, 0, 255]),
            PanelColor::Red => Rgb([255, 0, 0]),
            PanelColor::Yellow => Rgb([255, 255, 0]),
            PanelColor::Orange => Rgb([255, 128, 0]),
        }
    }

    /// Same color as an `embedded-graphics` drawing color.
    pub fn rgb888(self) -> Rgb888 {
        let Rgb([r, g, b]) = self.rgb();
        Rgb888::new(r, g, b)
    }
}

/// Ordered list of exactly seven RGB entries. Entry `i` is device code `i`.
///
/// # Example
/// ```
/// use image::Rgb;
/// use kitchen_epaper_lib::palette::Palette;
///
/// let palette = Palette::device();
/// // Dark grey is closest to black
/// assert_eq!(palette.nearest_index(&Rgb([40, 40, 40])), 0);
/// // Bright orange-ish maps to orange
/// assert_eq!(palette.nearest_index(&Rgb([250, 120, 10])), 6);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb<u8>; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        Self::device()
    }
}

impl Palette {
    pub const fn new(colors: [Rgb<u8>; PALETTE_SIZE]) -> Self {
        Self { colors }
    }

    /// Canonical panel palette: black, white, green, blue, red, yellow, orange.
    pub fn device() -> Self {
        Self::new(PanelColor::ALL.map(PanelColor::rgb))
    }

    pub fn colors(&self) -> &[Rgb<u8>] {
        &self.colors
    }

    pub fn color(&self, index: u8) -> Option<Rgb<u8>> {
        self.colors.get(index as usize).copied()
    }

    /// Index of the entry with minimum squared Euclidean distance.
    /// Ties resolve to the first (lowest) index.
    pub fn nearest_index(&self, pixel: &Rgb<u8>) -> u8 {
        let mut best = 0;
        let mut best_distance = u32::MAX;
        for (index, color) in self.colors.iter().enumerate() {
            let distance = distance_sq(color, pixel);
            if distance < best_distance {
                best = index;
                best_distance = distance;
            }
        }
        best as u8
    }
}

fn distance_sq(a: &Rgb<u8>, b: &Rgb<u8>) -> u32 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

impl ColorMap for Palette {
    type Color = Rgb<u8>;

    fn index_of(&self, color: &Rgb<u8>) -> usize {
        self.nearest_index(color) as usize
    }

    fn lookup(&self, index: usize) -> Option<Rgb<u8>> {
        self.colors.get(index).copied()
    }

    fn has_lookup(&self) -> bool {
        true
    }

    fn map_color(&self, color: &mut Rgb<u8>) {
        *color = self.colors[self.nearest_index(color) as usize];
    }
}

/// Row-major palette indices, one per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexBuffer {
    width: u32,
    height: u32,
    indices: Vec<u8>,
}

impl IndexBuffer {
    /// Wrap raw indices. Returns `None` when the length is not `width * height`.
    pub fn from_raw(width: u32, height: u32, indices: Vec<u8>) -> Option<Self> {
        (indices.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            indices,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.indices
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Expand back to RGB. Out-of-range indices render black.
    pub fn to_image(&self, palette: &Palette) -> RgbImage {
        let black = PanelColor::Black.rgb();
        RgbImage::from_fn(self.width, self.height, |x, y| {
            self.get(x, y)
                .and_then(|index| palette.color(index))
                .unwrap_or(black)
        })
    }
}

/// Quantizer mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantizeMode {
    /// Floyd–Steinberg error diffusion
    Dithered,
    /// Independent nearest-color match per pixel
    Nearest,
}

/// Device-mode quantization: nearest palette entry per pixel, no dithering.
pub fn quantize_nearest(image: &RgbImage, palette: &Palette) -> IndexBuffer {
    let indices = image.pixels().map(|p| palette.nearest_index(p)).collect();
    IndexBuffer {
        width: image.width(),
        height: image.height(),
        indices,
    }
}

/// Dither `image` in place so every pixel becomes a palette color.
pub fn dither_in_place(image: &mut RgbImage, palette: &Palette) {
    imageops::dither(image, palette);
}

/// Preview-mode quantization: dither a copy, then read off the indices.
pub fn quantize_dithered(image: &RgbImage, palette: &Palette) -> IndexBuffer {
    let mut dithered = image.clone();
    dither_in_place(&mut dithered, palette);
    quantize_nearest(&dithered, palette)
}

pub fn quantize(image: &RgbImage, palette: &Palette, mode: QuantizeMode) -> IndexBuffer {
    match mode {
        QuantizeMode::Dithered => quantize_dithered(image, palette),
        QuantizeMode::Nearest => quantize_nearest(image, palette),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn palette_colors_map_to_their_own_index() {
        let palette = Palette::device();
        for color in PanelColor::ALL {
            assert_eq!(
                palette.nearest_index(&color.rgb()),
                color.index(),
                "{:?} should map to itself",
                color
            );
        }
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        let mut colors = Palette::device().colors;
        colors[0] = Rgb([10, 0, 0]);
        colors[1] = Rgb([12, 0, 0]);
        let palette = Palette::new(colors);

        // Equidistant from entries 0 and 1
        assert_eq!(palette.nearest_index(&Rgb([11, 0, 0])), 0);
    }

    #[test]
    fn light_grey_prefers_white() {
        assert_eq!(Palette::device().nearest_index(&Rgb([200, 200, 200])), 1);
    }

    #[test]
    fn dithering_keeps_flat_palette_areas_unchanged() {
        let palette = Palette::device();
        let mut image = RgbImage::from_pixel(16, 8, PanelColor::Green.rgb());
        dither_in_place(&mut image, &palette);
        assert!(image.pixels().all(|p| *p == PanelColor::Green.rgb()));
    }

    #[test]
    fn dithered_output_only_uses_palette_entries() {
        let palette = Palette::device();
        let image = RgbImage::from_fn(24, 12, |x, y| Rgb([(x * 10) as u8, (y * 20) as u8, 90]));
        let indices = quantize(&image, &palette, QuantizeMode::Dithered);
        assert!(indices.indices().iter().all(|&i| (i as usize) < PALETTE_SIZE));
        assert_eq!(indices.indices().len(), 24 * 12);
    }

    #[test]
    fn index_buffer_rejects_wrong_length() {
        assert!(IndexBuffer::from_raw(4, 2, vec![0; 7]).is_none());
        assert!(IndexBuffer::from_raw(4, 2, vec![0; 8]).is_some());
    }

    fn arb_image() -> impl Strategy<Value = RgbImage> {
        (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
            proptest::collection::vec(any::<u8>(), (w * h * 3) as usize)
                .prop_map(move |raw| RgbImage::from_raw(w, h, raw).unwrap())
        })
    }

    proptest! {
        #[test]
        fn nearest_quantization_is_idempotent(image in arb_image()) {
            let palette = Palette::device();
            let first = quantize_nearest(&image, &palette);
            let second = quantize_nearest(&first.to_image(&palette), &palette);
            prop_assert_eq!(first, second);
        }
    }
}
