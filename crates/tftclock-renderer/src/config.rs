//! Configuration management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tftclock_hw::surface::parse_hex_color;
use tftclock_hw::LinkConfig;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Bus and pin assignment
    #[serde(default)]
    pub link: LinkConfig,

    /// Clock face settings
    #[serde(default)]
    pub clock: ClockConfig,
}

/// Clock face configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Wall-clock poll interval in milliseconds
    #[serde(default = "default_poll")]
    pub poll: u64,

    /// Time color (#RRGGBB)
    #[serde(default = "default_time_color")]
    pub time_color: String,

    /// Date color (#RRGGBB)
    #[serde(default = "default_date_color")]
    pub date_color: String,

    /// Background color (#RRGGBB)
    #[serde(default = "default_background")]
    pub background: String,

    /// Glyph scale for the time line
    #[serde(default = "default_time_scale")]
    pub time_scale: u16,

    /// Glyph scale for the date line
    #[serde(default = "default_date_scale")]
    pub date_scale: u16,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            poll: default_poll(),
            time_color: default_time_color(),
            date_color: default_date_color(),
            background: default_background(),
            time_scale: default_time_scale(),
            date_scale: default_date_scale(),
        }
    }
}

// Default value functions
fn default_poll() -> u64 {
    100
}

fn default_time_color() -> String {
    "#00FFFF".to_string()
}

fn default_date_color() -> String {
    "#FFFF00".to_string()
}

fn default_background() -> String {
    "#000000".to_string()
}

fn default_time_scale() -> u16 {
    6
}

fn default_date_scale() -> u16 {
    3
}

/// Resolved face colors in RGB565.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub time: u16,
    pub date: u16,
    pub background: u16,
}

impl ClockConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll)
    }

    pub fn palette(&self) -> Result<Palette> {
        Ok(Palette {
            time: color(&self.time_color)?,
            date: color(&self.date_color)?,
            background: color(&self.background)?,
        })
    }
}

fn color(hex: &str) -> Result<u16> {
    parse_hex_color(hex).with_context(|| format!("Invalid color: {}", hex))
}
