//! Application entry point for the grove viewer.
//!
//! This binary parses the command line, loads settings and delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.

mod settings;
mod viewer;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use log::info;
use settings::Settings;
use viewer::Viewer;

#[derive(Parser, Debug)]
#[command(name = "grove", about = "Grow fractal trees under a day/night sky")]
struct Args {
    /// Settings file (defaults to <config dir>/grove/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for stars and terrain
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Starts the native eframe application.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion.
/// - `Err` if the settings are invalid or eframe fails to create the
///   native window or event loop.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    let seed = args.seed.or(settings.window.seed);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window.width, settings.window.height]),
        ..Default::default()
    };

    let viewer = Viewer::new(settings.scene, seed)?;
    info!("starting viewer (seed {seed:?})");

    eframe::run_native("Grove", options, Box::new(|_cc| Ok(Box::new(viewer))))
        .map_err(|e| anyhow!("eframe failed: {e}"))
}
