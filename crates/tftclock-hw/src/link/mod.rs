//! Link transport: command/data byte primitives over a serial bus.
//!
//! Two realizations share the [`Link`] contract and produce the same
//! on-wire sequence for the same input:
//! - [`SpiLink`]: hardware block transfers through an `embedded-hal` SPI device
//!   (spidev on Linux).
//! - [`BitBangLink`]: software clocked over discrete GPIO lines.

mod bitbang;
mod lines;
mod spi;

#[cfg(test)]
pub(crate) mod wire_log;

pub use bitbang::BitBangLink;
pub use lines::ControlLines;
pub use spi::{SpiLink, SPIDEV_CHUNK_SIZE};

use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{CdevPin, Delay, SpidevDevice};
use tracing::{debug, info};

use crate::config::{LinkConfig, LinkMode};
use crate::{Error, Result};

/// Byte-level access to the panel controller.
pub trait Link {
    /// Drives the mode-select line to "command", then clocks out `command`.
    fn write_command(&mut self, command: u8) -> Result<()>;

    /// Drives the mode-select line to "data", then clocks out every byte.
    fn write_data(&mut self, bytes: &[u8]) -> Result<()>;

    /// Sets the hardware reset line level (`false` asserts reset).
    fn set_reset(&mut self, high: bool) -> Result<()>;

    /// Switches the backlight. No-op when no backlight line is wired.
    fn set_backlight(&mut self, on: bool) -> Result<()>;

    /// Largest data burst, in bytes, the link prefers per transfer.
    fn max_transfer(&self) -> usize;
}

impl<T: Link + ?Sized> Link for Box<T> {
    fn write_command(&mut self, command: u8) -> Result<()> {
        (**self).write_command(command)
    }

    fn write_data(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_data(bytes)
    }

    fn set_reset(&mut self, high: bool) -> Result<()> {
        (**self).set_reset(high)
    }

    fn set_backlight(&mut self, on: bool) -> Result<()> {
        (**self).set_backlight(on)
    }

    fn max_transfer(&self) -> usize {
        (**self).max_transfer()
    }
}

/// A link opened from configuration, realization chosen at runtime.
pub type DynLink = Box<dyn Link + Send>;

/// Opens the configured link, claiming the SPI device and GPIO lines.
///
/// Any open or claim failure is reported as [`Error::DeviceUnavailable`];
/// retrying is left to the caller.
pub fn open(config: &LinkConfig) -> Result<DynLink> {
    config.validate()?;

    let mut chip = Chip::new(&config.gpio_chip)
        .map_err(|e| unavailable(&config.gpio_chip, e))?;

    let dc = request_line(&mut chip, config.dc_pin, 0, "tftclock-dc")?;
    let reset = request_line(&mut chip, config.reset_pin, 1, "tftclock-reset")?;
    let backlight = config
        .backlight_pin
        .map(|pin| request_line(&mut chip, pin, 1, "tftclock-backlight"))
        .transpose()?;
    let lines = ControlLines::new(dc, reset, backlight);

    let link: DynLink = match config.mode {
        LinkMode::Spidev => {
            let spi = open_spidev(config)?;
            Box::new(SpiLink::new(spi, lines))
        }
        LinkMode::BitBang => {
            let clock = request_line(&mut chip, config.clock_pin, 0, "tftclock-clk")?;
            let data = request_line(&mut chip, config.data_pin, 0, "tftclock-mosi")?;
            let cs = request_line(&mut chip, config.cs_pin, 1, "tftclock-cs")?;
            Box::new(BitBangLink::new(
                clock,
                data,
                cs,
                lines,
                Delay,
                config.bitbang_delay_us,
            ))
        }
    };

    info!(
        "Link opened ({} mode, reset={}, dc={}, backlight={:?})",
        config.mode, config.reset_pin, config.dc_pin, config.backlight_pin
    );
    Ok(link)
}

/// Returns true if the configured bus device node can be opened.
pub fn device_present(config: &LinkConfig) -> bool {
    let path = match config.mode {
        LinkMode::Spidev => &config.spi_device,
        LinkMode::BitBang => &config.gpio_chip,
    };
    std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .is_ok()
}

fn open_spidev(config: &LinkConfig) -> Result<SpidevDevice> {
    let mut spi =
        SpidevDevice::open(&config.spi_device).map_err(|e| unavailable(&config.spi_device, e))?;

    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(config.speed_hz)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.configure(&options)
        .map_err(|e| unavailable(&config.spi_device, e))?;

    debug!(
        "Configured {} at {} Hz, mode 0, 8-bit words",
        config.spi_device, config.speed_hz
    );
    Ok(spi)
}

fn request_line(chip: &mut Chip, offset: u32, initial: u8, consumer: &str) -> Result<CdevPin> {
    let device = format!("GPIO {}", offset);
    let handle = chip
        .get_line(offset)
        .and_then(|line| line.request(LineRequestFlags::OUTPUT, initial, consumer))
        .map_err(|e| unavailable(&device, e))?;
    CdevPin::new(handle).map_err(|e| unavailable(&device, e))
}

fn unavailable<E: std::fmt::Debug>(device: &str, err: E) -> Error {
    Error::DeviceUnavailable {
        device: device.to_string(),
        reason: format!("{:?}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_device_is_unavailable() {
        let config = LinkConfig {
            gpio_chip: "/nonexistent/gpiochip".to_string(),
            ..LinkConfig::default()
        };
        assert!(matches!(
            open(&config),
            Err(Error::DeviceUnavailable { .. })
        ));
        assert!(!device_present(&LinkConfig {
            spi_device: "/nonexistent/spidev".to_string(),
            ..LinkConfig::default()
        }));
    }

    // Hardware tests are skipped by default
    #[test]
    #[ignore]
    fn test_open_default_link() {
        let link = open(&LinkConfig::default());
        assert!(link.is_ok());
    }
}
