//! ST7789 protocol driver.
//!
//! Sequences [`Link`] primitives into the controller's command set and keeps
//! track of where the controller is in its bring-up:
//!
//! ```text
//! Unpowered -> ResetPending -> AwakeUnconfigured -> Configured -> Active
//!   (reset pulse)   (SWRESET, SLPOUT)  (MADCTL, COLMOD,   (DISPON,
//!                                        NORON, INVON)     backlight)
//! ```
//!
//! Address windows may be programmed from `Configured` or `Active`; pixel
//! data is only written in `Active`.

mod command;
mod window;

pub use command::{Command, COLMOD_RGB565, MADCTL_LANDSCAPE};
pub use window::Window;

use std::fmt;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use tracing::{debug, info, warn};

use crate::link::Link;
use crate::surface::Surface;
use crate::{Error, Result, PANEL_HEIGHT, PANEL_WIDTH};

use command::{
    BACKLIGHT_OFF_SETTLE, DISPLAY_ON_SETTLE, MODE_SETTLE, RESET_PRE_HIGH, RESET_PULSE,
    RESET_SETTLE, SLEEP_OUT_SETTLE, SOFTWARE_RESET_SETTLE,
};

/// Controller bring-up state as tracked by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    /// Unknown or powered-down controller.
    #[default]
    Unpowered,
    /// Hardware reset pulse issued.
    ResetPending,
    /// Software reset and sleep-out issued.
    AwakeUnconfigured,
    /// Orientation and pixel format programmed.
    Configured,
    /// Display on; pixel data accepted.
    Active,
}

impl PanelState {
    fn accepts_window(&self) -> bool {
        matches!(self, PanelState::Configured | PanelState::Active)
    }
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelState::Unpowered => write!(f, "unpowered"),
            PanelState::ResetPending => write!(f, "reset-pending"),
            PanelState::AwakeUnconfigured => write!(f, "awake-unconfigured"),
            PanelState::Configured => write!(f, "configured"),
            PanelState::Active => write!(f, "active"),
        }
    }
}

/// Protocol driver for one panel on one link.
pub struct Panel<L, D> {
    link: L,
    delay: D,
    width: u16,
    height: u16,
    state: PanelState,
    /// Pixel values still owed to the current window.
    remaining: usize,
    /// RAMWR issued for the current window.
    ram_open: bool,
    /// Scratch buffer for big-endian encoding.
    buffer: Vec<u8>,
}

impl<L, D> Panel<L, D>
where
    L: Link,
    D: DelayNs,
{
    /// Creates a driver for the standard 320x240 panel.
    pub fn new(link: L, delay: D) -> Self {
        Self::with_dimensions(link, delay, PANEL_WIDTH, PANEL_HEIGHT)
    }

    /// Creates a driver for a panel with a custom drawable area.
    pub fn with_dimensions(link: L, delay: D, width: u16, height: u16) -> Self {
        Self {
            link,
            delay,
            width,
            height,
            state: PanelState::Unpowered,
            remaining: 0,
            ram_open: false,
            buffer: Vec::new(),
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Releases the link, e.g. to close the bus.
    pub fn into_link(self) -> L {
        self.link
    }

    fn wait(&mut self, duration: Duration) {
        self.delay.delay_us(duration.as_micros() as u32);
    }

    fn require(&self, operation: &'static str, expected: PanelState) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn command_with(&mut self, command: Command, payload: &[u8]) -> Result<()> {
        self.link.write_command(command as u8)?;
        if !payload.is_empty() {
            self.link.write_data(payload)?;
        }
        Ok(())
    }

    /// Pulses the hardware reset line. Valid from any state; this is the
    /// only step that assumes nothing about the controller.
    pub fn hardware_reset(&mut self) -> Result<()> {
        self.state = PanelState::Unpowered;
        self.remaining = 0;
        self.ram_open = false;

        self.link.set_backlight(false)?;
        self.wait(BACKLIGHT_OFF_SETTLE);

        self.link.set_reset(true)?;
        self.wait(RESET_PRE_HIGH);
        self.link.set_reset(false)?;
        self.wait(RESET_PULSE);
        self.link.set_reset(true)?;
        self.wait(RESET_SETTLE);

        self.state = PanelState::ResetPending;
        debug!("Hardware reset complete");
        Ok(())
    }

    /// Software reset followed by sleep-out.
    pub fn wake(&mut self) -> Result<()> {
        self.require("wake", PanelState::ResetPending)?;

        self.command_with(Command::SoftwareReset, &[])?;
        self.wait(SOFTWARE_RESET_SETTLE);
        self.command_with(Command::SleepOut, &[])?;
        self.wait(SLEEP_OUT_SETTLE);

        self.state = PanelState::AwakeUnconfigured;
        debug!("Controller awake");
        Ok(())
    }

    /// Programs orientation, pixel format, normal mode and inversion.
    pub fn configure(&mut self) -> Result<()> {
        self.require("configure", PanelState::AwakeUnconfigured)?;

        self.command_with(Command::MemoryAccess, &[MADCTL_LANDSCAPE])?;
        self.command_with(Command::PixelFormat, &[COLMOD_RGB565])?;
        self.command_with(Command::NormalMode, &[])?;
        self.wait(MODE_SETTLE);
        self.command_with(Command::InversionOn, &[])?;
        self.wait(MODE_SETTLE);

        self.state = PanelState::Configured;
        debug!(
            "Controller configured (MADCTL={:#04X}, COLMOD={:#04X})",
            MADCTL_LANDSCAPE, COLMOD_RGB565
        );
        Ok(())
    }

    /// Turns the display and backlight on.
    pub fn display_on(&mut self) -> Result<()> {
        self.require("display on", PanelState::Configured)?;

        self.command_with(Command::DisplayOn, &[])?;
        self.wait(DISPLAY_ON_SETTLE);
        self.link.set_backlight(true)?;

        self.state = PanelState::Active;
        debug!("Display on");
        Ok(())
    }

    /// Full bring-up from an unknown state to `Active`.
    ///
    /// Safe to repeat: every call starts with the hardware reset and issues
    /// the same sequence.
    pub fn init(&mut self) -> Result<()> {
        self.hardware_reset()?;
        self.wake()?;
        self.configure()?;
        self.display_on()?;
        info!("Panel initialized ({}x{})", self.width, self.height);
        Ok(())
    }

    /// Programs the address window.
    ///
    /// The memory write (RAMWR) is deferred to the first pixel burst, so a
    /// window may be set up while `Configured` without touching panel RAM.
    pub fn set_window(&mut self, window: Window) -> Result<()> {
        if !self.state.accepts_window() {
            return Err(Error::InvalidState {
                operation: "set window",
                state: self.state,
            });
        }
        window.validate(self.width, self.height)?;

        if self.remaining > 0 {
            warn!(
                "Window {} programmed with {} pixels still owed to the previous one",
                window, self.remaining
            );
        }

        self.command_with(Command::ColumnAddress, &window.column_bytes())?;
        self.command_with(Command::RowAddress, &window.row_bytes())?;

        self.remaining = window.area();
        self.ram_open = false;
        Ok(())
    }

    fn open_ram(&mut self) -> Result<()> {
        if !self.ram_open {
            self.command_with(Command::MemoryWrite, &[])?;
            self.ram_open = true;
        }
        Ok(())
    }

    /// Streams pixels into the open window as big-endian RGB565.
    ///
    /// The burst is split into [`Link::max_transfer`] sized transfers; the
    /// split never changes order or content.
    pub fn write_pixels(&mut self, pixels: &[u16]) -> Result<()> {
        self.require("pixel write", PanelState::Active)?;
        if pixels.len() > self.remaining {
            return Err(Error::PixelOverrun {
                remaining: self.remaining,
                actual: pixels.len(),
            });
        }
        self.open_ram()?;

        let per_transfer = self.pixels_per_transfer();
        let mut buffer = std::mem::take(&mut self.buffer);
        let mut result = Ok(());
        for chunk in pixels.chunks(per_transfer) {
            buffer.clear();
            buffer.extend(chunk.iter().flat_map(|p| p.to_be_bytes()));
            result = self.link.write_data(&buffer);
            if result.is_err() {
                break;
            }
            self.remaining -= chunk.len();
        }
        self.buffer = buffer;
        result
    }

    /// Sends the whole surface to the panel.
    pub fn refresh(&mut self, surface: &Surface) -> Result<()> {
        self.require("refresh", PanelState::Active)?;
        let expected = self.width as usize * self.height as usize;
        if surface.width() != self.width || surface.height() != self.height {
            return Err(Error::SurfaceSize {
                expected,
                actual: surface.pixels().len(),
            });
        }

        self.set_window(Window::full(self.width, self.height))?;
        self.write_pixels(surface.pixels())
    }

    /// Floods the whole drawable area with one color.
    pub fn fill(&mut self, color: u16) -> Result<()> {
        self.require("pixel write", PanelState::Active)?;
        self.set_window(Window::full(self.width, self.height))?;
        self.open_ram()?;

        let per_transfer = self.pixels_per_transfer();
        let chunk: Vec<u8> = std::iter::repeat(color.to_be_bytes())
            .take(per_transfer)
            .flatten()
            .collect();

        while self.remaining > 0 {
            let count = self.remaining.min(per_transfer);
            self.link.write_data(&chunk[..count * 2])?;
            self.remaining -= count;
        }
        Ok(())
    }

    /// Brings the panel up from scratch and floods it with `color`.
    ///
    /// Makes no assumption about the state a crashed renderer left behind.
    pub fn show_error_indicator(&mut self, color: u16) -> Result<()> {
        info!("Showing error indicator ({:#06X})", color);
        self.init()?;
        self.fill(color)
    }

    /// Switches the backlight without touching controller state.
    pub fn set_backlight(&mut self, on: bool) -> Result<()> {
        self.link.set_backlight(on)
    }

    fn pixels_per_transfer(&self) -> usize {
        (self.link.max_transfer() / 2).max(1)
    }
}
