//! tftclock
//!
//! Digital clock for ST7789 SPI panels, with a hardware self-test mode.

mod config;
mod face;
mod render;
mod selftest;
mod text;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use config::Config;
use face::ClockFace;
use selftest::SelfTestTimings;
use tftclock_runtime::{logging, ShutdownSignals};

#[derive(Parser)]
#[command(name = "tftclock")]
#[command(about = "Digital clock for ST7789 SPI panels")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, Default)]
enum Mode {
    /// Show the clock until interrupted
    #[default]
    Run,
    /// Run the panel self-test
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, None)?;

    let loaded = tftclock_runtime::load_or_default::<Config>(cli.config.as_deref())?;
    loaded.source.log();
    let config = loaded.config;
    config.link.validate().context("Invalid link configuration")?;

    let mut panel = tftclock_hw::open_panel(&config.link).context("Failed to open display")?;
    info!("Opened {} link", config.link.mode);

    let token = CancellationToken::new();
    let mut signals = ShutdownSignals::install().context("Failed to install signal handlers")?;
    let signal_token = token.clone();
    tokio::spawn(async move {
        let name = signals.recv().await;
        info!("Received {}, shutting down", name);
        signal_token.cancel();
    });

    let mode = cli.command.unwrap_or_default();
    let worker = tokio::task::spawn_blocking(move || -> Result<()> {
        match mode {
            Mode::Run => {
                let palette = config.clock.palette()?;
                let face = ClockFace::new(
                    palette,
                    config.clock.time_scale,
                    config.clock.date_scale,
                );
                panel.init().context("Failed to initialize display")?;
                let frames = render::run_clock(
                    &mut panel,
                    &face,
                    &token,
                    config.clock.poll_interval(),
                    || Local::now().naive_local(),
                )?;
                info!("Clock stopped after {} frames", frames);
                if let Err(e) = panel.set_backlight(false) {
                    warn!("Failed to turn off backlight: {}", e);
                }
            }
            Mode::Test => {
                let report =
                    selftest::run_self_test(&mut panel, &token, &SelfTestTimings::default())?;
                if report.interrupted {
                    info!("Self-test stopped early");
                }
            }
        }
        Ok(())
    });

    worker.await.context("Display worker panicked")?
}
