//! TFT Clock Runtime
//!
//! Process plumbing shared by the renderer and the supervisor: TOML
//! configuration files, log output and shutdown signals.

pub mod config;
pub mod logging;
pub mod signals;

pub use config::{load_or_default, ConfigSource, Loaded};
pub use signals::ShutdownSignals;
