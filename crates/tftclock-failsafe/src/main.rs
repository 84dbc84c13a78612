//! tftclock failsafe
//!
//! Runs the clock renderer as a child process, restarts it after crashes
//! with a panel reset in between, and shows an error screen when it keeps
//! crashing.

mod config;
mod ledger;
mod process;
mod recovery;
mod supervisor;

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, error, info};

use config::Config;
use process::ProcessLauncher;
use recovery::PanelRecovery;
use supervisor::{Outcome, Supervisor};
use tftclock_runtime::{logging, ShutdownSignals};

#[derive(Parser)]
#[command(name = "tftclock-failsafe")]
#[command(about = "Keeps the clock renderer running and recovers the panel")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Program to supervise
    #[arg(required = true)]
    program: OsString,

    /// Arguments passed to the program
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<OsString>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<Outcome> {
    let cli = Cli::parse();

    // The log file location lives in the config, so load it before logging.
    let loaded = tftclock_runtime::load_or_default::<Config>(cli.config.as_deref())?;
    let config = loaded.config;
    logging::init(cli.verbose, Some(&config.supervisor.log_file))?;
    info!("========== Failsafe monitor started ==========");
    loaded.source.log();

    config.link.validate().context("Invalid link configuration")?;
    let alarm = config.supervisor.alarm()?;

    if !tftclock_hw::link::device_present(&config.link) {
        bail!("Display link ({}) not available", config.link.mode);
    }

    let mut signals = ShutdownSignals::install().context("Failed to install signal handlers")?;

    let launcher = ProcessLauncher::new(cli.program, cli.args);
    info!("Supervising {}", launcher.program().to_string_lossy());
    let recovery = PanelRecovery::new(config.link.clone(), alarm);
    let mut supervisor = Supervisor::new(launcher, recovery, &config.supervisor);

    let outcome = supervisor
        .run(async {
            let name = signals.recv().await;
            info!("Received {}", name);
        })
        .await;

    if let Some(child) = supervisor.child() {
        debug!("Last child: pid {:?}, {:?}", child.pid, child.termination);
    }
    info!("Supervisor {}: {:?}", supervisor.state(), outcome);
    info!("========== Failsafe monitor stopped ==========");
    Ok(outcome)
}
