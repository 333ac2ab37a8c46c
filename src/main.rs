//! # Kitchen E-Paper Entry Point
//!
//! Renders the board once and writes the encoded image to a file or stdout.
//! Upstream data problems never stop a render: an unreadable calendar export
//! or a failed forecast fetch is logged and the board is drawn without it.
//! Missing icons are fatal, since every weather key must have its own glyph.

#[cfg(test)]
mod tests;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use env_logger::Env;
use kitchen_epaper_lib::assets::Assets;
use kitchen_epaper_lib::config::{Config, CONFIG_FILE};
use kitchen_epaper_lib::output::EncodeOptions;
use kitchen_epaper_lib::render::Renderer;
use kitchen_epaper_lib::{calendar, weather, RenderRequest};
use log::{info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kitchen-epaper", version, about = "Render the kitchen e-paper status board")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Calendar export JSON (overrides `[calendar] events_path`)
    #[arg(long)]
    events: Option<PathBuf>,

    /// Offline forecast JSON (overrides `[weather] forecast_path`)
    #[arg(long)]
    forecast: Option<PathBuf>,

    /// Output format: png, jpeg/jpg or raw
    #[arg(short, long)]
    format: Option<String>,

    /// Output file, `-` for stdout
    #[arg(short, long, default_value = "board.png")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::load_from_path(&args.config);
    if let Some(path) = args.forecast {
        config.weather.forecast_path = Some(path);
    }
    let events_path = args.events.unwrap_or_else(|| config.calendar.events_path.clone());

    let assets = Assets::load(&config.assets).context("loading icon assets")?;
    let now = Local::now();

    let events = match calendar::load_events(&events_path) {
        Ok(events) => calendar::retain_upcoming(events, now.date_naive(), config.calendar.days),
        Err(e) => {
            warn!("Calendar unavailable ({}): {}", events_path.display(), e);
            Vec::new()
        }
    };

    // Create Tokio runtime for the forecast fetch
    let rt = tokio::runtime::Runtime::new()?;
    let periods = rt.block_on(async {
        match weather::load_or_fetch(&config.weather).await {
            Ok(forecast) => weather::periods_from_forecast(&forecast, &now, |symbol| {
                weather::resolve_icon_key(symbol, config.weather.icon_keys, &assets.icons)
            }),
            Err(e) => {
                warn!("Forecast unavailable: {}", e);
                Vec::new()
            }
        }
    });

    let request = RenderRequest {
        format_hint: args
            .format
            .or_else(|| Some(config.output.default_format.clone())),
    };
    let renderer = Renderer::new(&assets, EncodeOptions::from(&config.output));
    let image = renderer
        .render(&events, &periods, &request, now.naive_local())
        .context("rendering board")?;

    if args.out.as_os_str() == "-" {
        io::stdout().lock().write_all(&image.bytes)?;
    } else {
        fs::write(&args.out, &image.bytes)
            .with_context(|| format!("writing {}", args.out.display()))?;
        info!(
            "Wrote {} ({}, {} bytes)",
            args.out.display(),
            image.content_type,
            image.bytes.len()
        );
    }

    Ok(())
}
