//! Configuration management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tftclock_hw::surface::parse_hex_color;
use tftclock_hw::LinkConfig;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Bus and pin assignment, shared with the renderer
    #[serde(default)]
    pub link: LinkConfig,

    /// Restart policy and recovery timing
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

/// Supervisor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Abnormal exits tolerated inside one restart window
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,

    /// Restart window length in seconds
    #[serde(default = "default_restart_window_secs")]
    pub restart_window_secs: u64,

    /// Pause after a reset before relaunching, in milliseconds
    #[serde(default = "default_recovery_cooldown_ms")]
    pub recovery_cooldown_ms: u64,

    /// How long the error indicator is held before giving up, in milliseconds
    #[serde(default = "default_circuit_cooldown_ms")]
    pub circuit_cooldown_ms: u64,

    /// Time a child gets to exit after SIGTERM, in milliseconds
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    /// Append-only event log
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Error indicator color (#RRGGBB)
    #[serde(default = "default_alarm_color")]
    pub alarm_color: String,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_restarts: default_max_restarts(),
            restart_window_secs: default_restart_window_secs(),
            recovery_cooldown_ms: default_recovery_cooldown_ms(),
            circuit_cooldown_ms: default_circuit_cooldown_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            log_file: default_log_file(),
            alarm_color: default_alarm_color(),
        }
    }
}

fn default_max_restarts() -> u32 {
    10
}

fn default_restart_window_secs() -> u64 {
    60
}

fn default_recovery_cooldown_ms() -> u64 {
    2000
}

fn default_circuit_cooldown_ms() -> u64 {
    10_000
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}

fn default_log_file() -> PathBuf {
    PathBuf::from("/tmp/clock_failsafe.log")
}

fn default_alarm_color() -> String {
    "#FF0000".to_string()
}

impl SupervisorConfig {
    pub fn restart_window(&self) -> Duration {
        Duration::from_secs(self.restart_window_secs)
    }

    pub fn recovery_cooldown(&self) -> Duration {
        Duration::from_millis(self.recovery_cooldown_ms)
    }

    pub fn circuit_cooldown(&self) -> Duration {
        Duration::from_millis(self.circuit_cooldown_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Alarm color in RGB565.
    pub fn alarm(&self) -> Result<u16> {
        parse_hex_color(&self.alarm_color)
            .with_context(|| format!("Invalid alarm color: {}", self.alarm_color))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_defaults() {
        let config = SupervisorConfig::default();
        assert_eq!(config.max_restarts, 10);
        assert_eq!(config.restart_window(), Duration::from_secs(60));
        assert_eq!(config.recovery_cooldown(), Duration::from_secs(2));
        assert_eq!(config.circuit_cooldown(), Duration::from_secs(10));
        assert_eq!(config.alarm().unwrap(), 0xF800);
        assert_eq!(config.log_file, Path::new("/tmp/clock_failsafe.log"));
    }

    #[test]
    fn test_partial_supervisor_section() {
        let config: Config = toml::from_str(
            r##"
            [supervisor]
            max_restarts = 3
            alarm_color = "#0000FF"
            "##,
        )
        .unwrap();

        assert_eq!(config.supervisor.max_restarts, 3);
        assert_eq!(config.supervisor.restart_window_secs, 60);
        assert_eq!(config.supervisor.alarm().unwrap(), 0x001F);
        assert_eq!(config.link.reset_pin, 24);
    }

    #[test]
    fn test_invalid_alarm_color() {
        let config = SupervisorConfig {
            alarm_color: "red".to_string(),
            ..SupervisorConfig::default()
        };
        assert!(config.alarm().is_err());
    }

    #[test]
    fn test_non_ascii_alarm_color_is_rejected() {
        let config: Config = toml::from_str(
            r##"
            [supervisor]
            alarm_color = "#aébcd"
            "##,
        )
        .unwrap();
        assert!(config.supervisor.alarm().is_err());
    }

    #[test]
    fn test_shipped_config_parses() {
        let config: Config = toml::from_str(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config.supervisor.max_restarts, 10);
        assert_eq!(config.supervisor.shutdown_grace(), Duration::from_secs(5));
        assert_eq!(config.link.backlight_pin, Some(18));
    }
}
