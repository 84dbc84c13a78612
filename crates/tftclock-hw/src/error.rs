//! Error types for the TFT clock hardware library.

use thiserror::Error;

use crate::panel::{PanelState, Window};

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the hardware.
#[derive(Error, Debug)]
pub enum Error {
    /// SPI device or GPIO line could not be opened or claimed.
    #[error("device unavailable: {device}: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    /// Transfer on an opened bus failed.
    #[error("bus error: {0}")]
    Bus(String),

    /// A control line could not be driven.
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// Operation issued while the controller is in the wrong state.
    #[error("{operation} not valid while panel is {state}")]
    InvalidState {
        operation: &'static str,
        state: PanelState,
    },

    /// Address window outside the drawable area or with inverted corners.
    #[error("window {window} outside {width}x{height} panel")]
    WindowOutOfBounds {
        window: Window,
        width: u16,
        height: u16,
    },

    /// More pixel values than the programmed window holds.
    #[error("pixel burst overruns window: {remaining} left, got {actual}")]
    PixelOverrun { remaining: usize, actual: usize },

    /// Surface size does not match the panel.
    #[error("surface size mismatch: expected {expected}, got {actual}")]
    SurfaceSize { expected: usize, actual: usize },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}
