//! Console plus optional append-only file logging.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. A log file that cannot be opened only
/// costs the file layer.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let mut open_error = None;
    let file_layer = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                open_error = Some((path, e));
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    if let Some((path, e)) = open_error {
        warn!("Cannot open log file {}: {}", path.display(), e);
    }
    Ok(())
}
