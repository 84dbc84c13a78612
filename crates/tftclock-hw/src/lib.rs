//! TFT Clock Hardware Library
//!
//! Link transports and a protocol driver for ST7789-class SPI panels, plus
//! the pixel surface the renderer paints into.

pub mod config;
pub mod error;
pub mod link;
pub mod panel;
pub mod sim;
pub mod surface;

pub use config::{LinkConfig, LinkMode};
pub use error::{Error, Result};
pub use link::Link;
pub use panel::{Panel, PanelState, Window};
pub use surface::Surface;

/// Panel driver over a configured link with real-time delays.
pub type HardwarePanel = Panel<link::DynLink, linux_embedded_hal::Delay>;

/// Opens the configured link and wraps it in an uninitialized driver.
pub fn open_panel(config: &LinkConfig) -> Result<HardwarePanel> {
    let link = link::open(config)?;
    Ok(Panel::new(link, linux_embedded_hal::Delay))
}

/// Drawable area in the configured (90° rotated, landscape) orientation.
pub const PANEL_WIDTH: u16 = 320;
pub const PANEL_HEIGHT: u16 = 240;

/// RGB565 colors used by the driver and its callers.
pub mod color {
    pub const BLACK: u16 = 0x0000;
    pub const WHITE: u16 = 0xFFFF;
    pub const RED: u16 = 0xF800;
    pub const GREEN: u16 = 0x07E0;
    pub const BLUE: u16 = 0x001F;
    pub const CYAN: u16 = 0x07FF;
    pub const MAGENTA: u16 = 0xF81F;
    pub const YELLOW: u16 = 0xFFE0;
}
