//! Control lines shared by both link realizations.

use embedded_hal::digital::OutputPin;

use crate::{Error, Result};

/// Mode-select, reset and optional backlight lines.
pub struct ControlLines<DC, RST, BL> {
    dc: DC,
    reset: RST,
    backlight: Option<BL>,
}

impl<DC, RST, BL> ControlLines<DC, RST, BL>
where
    DC: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
{
    pub fn new(dc: DC, reset: RST, backlight: Option<BL>) -> Self {
        Self {
            dc,
            reset,
            backlight,
        }
    }

    /// Next transfer carries a command byte.
    pub fn select_command(&mut self) -> Result<()> {
        self.dc.set_low().map_err(gpio_err)
    }

    /// Next transfer carries data bytes.
    pub fn select_data(&mut self) -> Result<()> {
        self.dc.set_high().map_err(gpio_err)
    }

    pub fn set_reset(&mut self, high: bool) -> Result<()> {
        if high {
            self.reset.set_high().map_err(gpio_err)
        } else {
            self.reset.set_low().map_err(gpio_err)
        }
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<()> {
        match self.backlight.as_mut() {
            Some(pin) if on => pin.set_high().map_err(gpio_err),
            Some(pin) => pin.set_low().map_err(gpio_err),
            None => Ok(()),
        }
    }
}

pub(crate) fn gpio_err<E: std::fmt::Debug>(err: E) -> Error {
    Error::Gpio(format!("{:?}", err))
}
