//! # Icon and Font Assets
//!
//! Icons are loaded once at startup from `<icon_dir>/<key>.png` and then only
//! read. Every key gets its own bitmap: a key whose file is missing is a
//! startup error, never a silent fallback to some other key's glyph.
//!
//! Fonts are the `embedded-graphics` ISO-8859-1 monospace fonts, compiled in,
//! so the `°` sign renders and text width is exact.

use crate::config::AssetConfig;
use embedded_graphics::mono_font::iso_8859_1::{
    FONT_10X20, FONT_6X10, FONT_8X13, FONT_8X13_BOLD, FONT_9X18_BOLD,
};
use embedded_graphics::mono_font::MonoFont;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::{debug, info};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Icon keys the weather rules can produce. All must be present at startup.
pub const ICON_KEYS: [&str; 10] = [
    "cloudy",
    "partly_cloudy",
    "sunny",
    "clear_night",
    "rain",
    "showers",
    "snow",
    "fog",
    "sleet",
    "thunder",
];

#[derive(Error, Debug)]
pub enum AssetError {
    /// Icon file missing or not decodable
    #[error("icon '{key}' could not be loaded from {}: {source}", path.display())]
    MissingIcon {
        key: String,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("icon '{key}' is {width}x{height}, expected a square glyph")]
    NotSquare { key: String, width: u32, height: u32 },
}

/// Immutable key → glyph map.
#[derive(Clone, Debug, Default)]
pub struct IconSet {
    icons: HashMap<String, RgbaImage>,
}

impl IconSet {
    /// Load `<dir>/<key>.png` for every key. Fails on the first missing or
    /// non-square icon.
    pub fn load<P: AsRef<Path>, S: AsRef<str>>(dir: P, keys: &[S]) -> Result<Self, AssetError> {
        let dir = dir.as_ref();
        let mut icons = HashMap::with_capacity(keys.len());

        for key in keys {
            let key = key.as_ref();
            if icons.contains_key(key) {
                continue;
            }
            let path = dir.join(format!("{key}.png"));
            let glyph = image::open(&path)
                .map_err(|source| AssetError::MissingIcon {
                    key: key.to_string(),
                    path: path.clone(),
                    source,
                })?
                .into_rgba8();
            check_square(key, &glyph)?;
            debug!("Loaded icon '{}' ({}px) from {}", key, glyph.width(), path.display());
            icons.insert(key.to_string(), glyph);
        }

        info!("Loaded {} weather icons from {}", icons.len(), dir.display());
        Ok(Self { icons })
    }

    /// Build from glyphs already in memory.
    pub fn from_images<I>(glyphs: I) -> Result<Self, AssetError>
    where
        I: IntoIterator<Item = (String, RgbaImage)>,
    {
        let mut icons = HashMap::new();
        for (key, glyph) in glyphs {
            check_square(&key, &glyph)?;
            icons.insert(key, glyph);
        }
        Ok(Self { icons })
    }

    pub fn get(&self, key: &str) -> Option<&RgbaImage> {
        self.icons.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.icons.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.icons.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// The glyph for `key` resized to `size`×`size`.
    pub fn scaled(&self, key: &str, size: u32) -> Option<RgbaImage> {
        let glyph = self.get(key)?;
        if glyph.width() == size {
            return Some(glyph.clone());
        }
        Some(imageops::resize(glyph, size, size, FilterType::Triangle))
    }
}

fn check_square(key: &str, glyph: &RgbaImage) -> Result<(), AssetError> {
    if glyph.width() != glyph.height() || glyph.width() == 0 {
        return Err(AssetError::NotSquare {
            key: key.to_string(),
            width: glyph.width(),
            height: glyph.height(),
        });
    }
    Ok(())
}

/// Font roles on the board.
#[derive(Clone, Copy)]
pub struct Fonts {
    /// Region titles ("Agenda", "Today ...")
    pub header: &'static MonoFont<'static>,
    /// Calendar day headers
    pub day: &'static MonoFont<'static>,
    /// Text inside event boxes
    pub event: &'static MonoFont<'static>,
    /// Weather row columns
    pub weather: &'static MonoFont<'static>,
    /// Generation timestamp
    pub footer: &'static MonoFont<'static>,
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            header: &FONT_10X20,
            day: &FONT_9X18_BOLD,
            event: &FONT_8X13,
            weather: &FONT_8X13_BOLD,
            footer: &FONT_6X10,
        }
    }
}

impl fmt::Debug for Fonts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fonts")
            .field("header", &self.header.character_size)
            .field("day", &self.day.character_size)
            .field("event", &self.event.character_size)
            .field("weather", &self.weather.character_size)
            .field("footer", &self.footer.character_size)
            .finish()
    }
}

/// Everything a render needs besides its inputs. Built once, shared by reference.
#[derive(Clone, Debug)]
pub struct Assets {
    pub icons: IconSet,
    pub fonts: Fonts,
}

impl Assets {
    pub fn new(icons: IconSet, fonts: Fonts) -> Self {
        Self { icons, fonts }
    }

    /// Load the standard icon keys plus any configured extras.
    pub fn load(config: &AssetConfig) -> Result<Self, AssetError> {
        let keys: Vec<&str> = ICON_KEYS
            .iter()
            .copied()
            .chain(config.extra_icons.iter().map(String::as_str))
            .collect();
        let icons = IconSet::load(&config.icon_dir, keys.as_slice())?;
        Ok(Self::new(icons, Fonts::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    fn write_icon(dir: &Path, key: &str, size: (u32, u32), color: [u8; 4]) {
        RgbaImage::from_pixel(size.0, size.1, Rgba(color))
            .save(dir.join(format!("{key}.png")))
            .unwrap();
    }

    #[test]
    fn each_key_gets_its_own_bitmap() {
        let dir = TempDir::new().unwrap();
        write_icon(dir.path(), "sunny", (8, 8), [255, 255, 0, 255]);
        write_icon(dir.path(), "rain", (8, 8), [0, 0, 255, 255]);

        let icons = IconSet::load(dir.path(), &["sunny", "rain"]).unwrap();

        assert_eq!(icons.len(), 2);
        assert_eq!(icons.get("sunny").unwrap().get_pixel(0, 0).0, [255, 255, 0, 255]);
        assert_eq!(icons.get("rain").unwrap().get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert!(icons.get("cloudy").is_none());
    }

    #[test]
    fn missing_icon_fails_at_load() {
        let dir = TempDir::new().unwrap();
        write_icon(dir.path(), "sunny", (8, 8), [255, 255, 0, 255]);

        let err = IconSet::load(dir.path(), &["sunny", "fog"]).unwrap_err();
        match err {
            AssetError::MissingIcon { key, .. } => assert_eq!(key, "fog"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_square_icon_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_icon(dir.path(), "fog", (8, 6), [128, 128, 128, 255]);

        assert!(matches!(
            IconSet::load(dir.path(), &["fog"]),
            Err(AssetError::NotSquare { width: 8, height: 6, .. })
        ));
    }

    #[test]
    fn scaled_icon_has_requested_size() {
        let icons = IconSet::from_images([(
            "snow".to_string(),
            RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255])),
        )])
        .unwrap();

        let glyph = icons.scaled("snow", 40).unwrap();
        assert_eq!(glyph.dimensions(), (40, 40));
        assert!(icons.scaled("sleet", 40).is_none());
    }

    #[test]
    fn assets_load_requires_every_standard_key() {
        let dir = TempDir::new().unwrap();
        for key in ICON_KEYS.iter().skip(1) {
            write_icon(dir.path(), key, (4, 4), [0, 0, 0, 255]);
        }
        let config = AssetConfig {
            icon_dir: dir.path().to_path_buf(),
            extra_icons: Vec::new(),
        };
        assert!(Assets::load(&config).is_err());

        write_icon(dir.path(), ICON_KEYS[0], (4, 4), [0, 0, 0, 255]);
        let assets = Assets::load(&config).unwrap();
        assert_eq!(assets.icons.len(), ICON_KEYS.len());
    }
}
