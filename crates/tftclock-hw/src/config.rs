//! Link configuration shared by the renderer and the supervisor.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How bytes reach the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkMode {
    /// Kernel spidev block transfers.
    #[default]
    Spidev,
    /// Software clocked over discrete GPIO lines.
    BitBang,
}

impl std::fmt::Display for LinkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkMode::Spidev => write!(f, "spidev"),
            LinkMode::BitBang => write!(f, "bit-bang"),
        }
    }
}

/// Bus and pin assignment for the panel.
///
/// Pin numbers are line offsets on `gpio_chip` (BCM numbering on a
/// Raspberry Pi).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default)]
    pub mode: LinkMode,

    /// spidev node used in [`LinkMode::Spidev`].
    #[serde(default = "default_spi_device")]
    pub spi_device: String,

    /// Bus clock in Hz.
    #[serde(default = "default_speed_hz")]
    pub speed_hz: u32,

    /// GPIO character device holding the control lines.
    #[serde(default = "default_gpio_chip")]
    pub gpio_chip: String,

    /// Hardware reset line (active low).
    #[serde(default = "default_reset_pin")]
    pub reset_pin: u32,

    /// Data/command select line (low = command).
    #[serde(default = "default_dc_pin")]
    pub dc_pin: u32,

    /// Backlight enable line. Unset when the backlight is tied to VCC.
    #[serde(default)]
    pub backlight_pin: Option<u32>,

    /// Clock line used in [`LinkMode::BitBang`].
    #[serde(default = "default_clock_pin")]
    pub clock_pin: u32,

    /// Data (MOSI) line used in [`LinkMode::BitBang`].
    #[serde(default = "default_data_pin")]
    pub data_pin: u32,

    /// Chip-select line used in [`LinkMode::BitBang`] (active low).
    #[serde(default = "default_cs_pin")]
    pub cs_pin: u32,

    /// Half clock period in microseconds for bit-bang derating. 0 runs flat out.
    #[serde(default)]
    pub bitbang_delay_us: u32,
}

fn default_spi_device() -> String {
    "/dev/spidev0.0".to_string()
}

fn default_speed_hz() -> u32 {
    32_000_000
}

fn default_gpio_chip() -> String {
    "/dev/gpiochip0".to_string()
}

fn default_reset_pin() -> u32 {
    24
}

fn default_dc_pin() -> u32 {
    25
}

fn default_clock_pin() -> u32 {
    11
}

fn default_data_pin() -> u32 {
    10
}

fn default_cs_pin() -> u32 {
    8
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            mode: LinkMode::default(),
            spi_device: default_spi_device(),
            speed_hz: default_speed_hz(),
            gpio_chip: default_gpio_chip(),
            reset_pin: default_reset_pin(),
            dc_pin: default_dc_pin(),
            backlight_pin: None,
            clock_pin: default_clock_pin(),
            data_pin: default_data_pin(),
            cs_pin: default_cs_pin(),
            bitbang_delay_us: 0,
        }
    }
}

impl LinkConfig {
    /// Checks that no GPIO line is assigned twice for the selected mode.
    pub fn validate(&self) -> Result<()> {
        if self.speed_hz == 0 {
            return Err(Error::Config("speed_hz must be non-zero".to_string()));
        }

        let mut pins = vec![("reset", self.reset_pin), ("dc", self.dc_pin)];
        if let Some(pin) = self.backlight_pin {
            pins.push(("backlight", pin));
        }
        if self.mode == LinkMode::BitBang {
            pins.push(("clock", self.clock_pin));
            pins.push(("data", self.data_pin));
            pins.push(("cs", self.cs_pin));
        }

        for (i, (name, pin)) in pins.iter().enumerate() {
            if let Some((other, _)) = pins[i + 1..].iter().find(|(_, p)| p == pin) {
                return Err(Error::Config(format!(
                    "GPIO {} assigned to both {} and {}",
                    pin, name, other
                )));
            }
        }
        Ok(())
    }
}
