//! ST7789 command set and initialization constants.
//!
//! The controller is write-only in this design: no command returns status,
//! so each step is followed by the settle time the datasheet requires.

use std::time::Duration;

/// Controller commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Software reset.
    SoftwareReset = 0x01,
    /// Leave sleep mode.
    SleepOut = 0x11,
    /// Normal display mode (partial mode off).
    NormalMode = 0x13,
    /// Display inversion on.
    InversionOn = 0x21,
    /// Display on.
    DisplayOn = 0x29,
    /// Column address set.
    ColumnAddress = 0x2A,
    /// Row address set.
    RowAddress = 0x2B,
    /// Memory write.
    MemoryWrite = 0x2C,
    /// Memory data access control (orientation, RGB order).
    MemoryAccess = 0x36,
    /// Interface pixel format.
    PixelFormat = 0x3A,
}

impl Command {
    /// Decodes a command byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Command::SoftwareReset),
            0x11 => Some(Command::SleepOut),
            0x13 => Some(Command::NormalMode),
            0x21 => Some(Command::InversionOn),
            0x29 => Some(Command::DisplayOn),
            0x2A => Some(Command::ColumnAddress),
            0x2B => Some(Command::RowAddress),
            0x2C => Some(Command::MemoryWrite),
            0x36 => Some(Command::MemoryAccess),
            0x3A => Some(Command::PixelFormat),
            _ => None,
        }
    }
}

/// MADCTL: MV=1 (row/column exchange, 90° landscape), RGB order.
pub const MADCTL_LANDSCAPE: u8 = 0x60;

/// COLMOD: 16 bits per pixel (RGB565) on both interfaces.
pub const COLMOD_RGB565: u8 = 0x55;

/// Backlight off before reset, so the reset glitch is not visible.
pub const BACKLIGHT_OFF_SETTLE: Duration = Duration::from_millis(50);

/// Reset line high before the pulse.
pub const RESET_PRE_HIGH: Duration = Duration::from_millis(10);

/// Reset line held low. Shorter pulses leave a crashed controller wedged.
pub const RESET_PULSE: Duration = Duration::from_millis(50);

/// Settle after releasing reset.
pub const RESET_SETTLE: Duration = Duration::from_millis(150);

/// Settle after SWRESET.
pub const SOFTWARE_RESET_SETTLE: Duration = Duration::from_millis(200);

/// Settle after SLPOUT.
pub const SLEEP_OUT_SETTLE: Duration = Duration::from_millis(120);

/// Settle after NORON and INVON.
pub const MODE_SETTLE: Duration = Duration::from_millis(10);

/// Settle after DISPON.
pub const DISPLAY_ON_SETTLE: Duration = Duration::from_millis(120);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::SoftwareReset as u8, 0x01);
        assert_eq!(Command::MemoryWrite as u8, 0x2C);
        assert_eq!(Command::from_byte(0x3A), Some(Command::PixelFormat));
        assert_eq!(Command::from_byte(0x04), None);
    }
}
