//! # Output Format Dispatch
//!
//! Turns a finished canvas into bytes plus a content type:
//!
//! | Token | Output | Content type |
//! |---|---|---|
//! | `png` (default) | PNG, optionally quantized for preview | `image/png` |
//! | `jpeg`, `jpg` | JPEG of the unquantized canvas | `image/jpeg` |
//! | `raw` | nearest-color indices, nibble packed | `application/octet-stream` |
//!
//! Unrecognized tokens render PNG. Encoders write into a fresh buffer that is
//! only returned on success, so a failure never yields a truncated image.

use crate::config::OutputConfig;
use crate::pack::{pack_nibbles, PackError};
use crate::palette::{dither_in_place, quantize_nearest, Palette};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use log::debug;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

pub const CONTENT_TYPE_PNG: &str = "image/png";
pub const CONTENT_TYPE_JPEG: &str = "image/jpeg";
pub const CONTENT_TYPE_RAW: &str = "application/octet-stream";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Raw,
}

impl OutputFormat {
    /// Resolve a format token. `None` and unknown tokens give PNG.
    ///
    /// ```
    /// use kitchen_epaper_lib::output::OutputFormat;
    ///
    /// assert_eq!(OutputFormat::from_hint(Some("JPG")), OutputFormat::Jpeg);
    /// assert_eq!(OutputFormat::from_hint(Some("raw")), OutputFormat::Raw);
    /// assert_eq!(OutputFormat::from_hint(Some("xyz")), OutputFormat::Png);
    /// assert_eq!(OutputFormat::from_hint(None), OutputFormat::Png);
    /// ```
    pub fn from_hint(hint: Option<&str>) -> Self {
        let Some(hint) = hint else {
            return OutputFormat::Png;
        };
        match hint.trim().to_ascii_lowercase().as_str() {
            "png" => OutputFormat::Png,
            "jpeg" | "jpg" => OutputFormat::Jpeg,
            "raw" => OutputFormat::Raw,
            other => {
                debug!("Unrecognized output format {:?}, using png", other);
                OutputFormat::Png
            }
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => CONTENT_TYPE_PNG,
            OutputFormat::Jpeg => CONTENT_TYPE_JPEG,
            OutputFormat::Raw => CONTENT_TYPE_RAW,
        }
    }
}

/// Quantization applied before PNG encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    /// Floyd–Steinberg against the panel palette
    #[default]
    Dithered,
    /// Nearest-color, identical colors to the raw frame
    Device,
    /// Encode the canvas as drawn
    Off,
}

/// Encoder settings shared by every render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeOptions {
    pub palette: Palette,
    pub preview: PreviewMode,
    pub jpeg_quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            palette: Palette::device(),
            preview: PreviewMode::Dithered,
            jpeg_quality: 85,
        }
    }
}

impl From<&OutputConfig> for EncodeOptions {
    fn from(config: &OutputConfig) -> Self {
        Self {
            palette: Palette::device(),
            preview: config.preview,
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
        }
    }
}

/// Encoded image ready to hand back to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("frame packing failed: {0}")]
    Pack(#[from] PackError),
}

/// Encode `image` in the requested format.
pub fn encode(
    image: &RgbImage,
    format: OutputFormat,
    options: &EncodeOptions,
) -> Result<EncodedImage, EncodeError> {
    let bytes = match format {
        OutputFormat::Png => encode_png(&preview_image(image, options))?,
        OutputFormat::Jpeg => encode_jpeg(image, options.jpeg_quality)?,
        OutputFormat::Raw => encode_raw(image, &options.palette)?,
    };

    debug!("Encoded {:?} frame: {} bytes", format, bytes.len());
    Ok(EncodedImage {
        bytes,
        content_type: format.content_type(),
    })
}

/// Apply the configured preview quantization.
pub fn preview_image<'a>(image: &'a RgbImage, options: &EncodeOptions) -> Cow<'a, RgbImage> {
    match options.preview {
        PreviewMode::Off => Cow::Borrowed(image),
        PreviewMode::Dithered => {
            let mut dithered = image.clone();
            dither_in_place(&mut dithered, &options.palette);
            Cow::Owned(dithered)
        }
        PreviewMode::Device => {
            Cow::Owned(quantize_nearest(image, &options.palette).to_image(&options.palette))
        }
    }
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

/// Device frame: nearest-color quantization, then nibble packing.
pub fn encode_raw(image: &RgbImage, palette: &Palette) -> Result<Vec<u8>, PackError> {
    pack_nibbles(&quantize_nearest(image, palette))
}
