//! Host-side model of the panel controller.
//!
//! [`SimulatedPanel`] implements [`Link`] and decodes the byte stream the way
//! an ST7789 would: it tracks bring-up state, address windows and the RAM
//! write cursor, keeps a copy of display memory, and records every protocol
//! violation instead of silently desynchronizing like real hardware.

use crate::link::Link;
use crate::panel::{Command, PanelState, Window};
use crate::Result;

/// One primitive as issued on the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    Command(u8),
    Data(Vec<u8>),
    Reset(bool),
    Backlight(bool),
}

/// A sequence the controller would mishandle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Burst ended with a pixel count different from the window area.
    PixelCount {
        window: Window,
        expected: usize,
        written: usize,
    },
    /// RAMWR or pixel data before the display was active.
    WriteWhileInactive { state: PanelState },
    /// CASET/RASET before the controller was configured.
    WindowWhileUnconfigured { state: PanelState },
    /// Window outside the panel or with inverted corners.
    WindowOutOfBounds { window: Window },
    /// Parameter command followed by the wrong number of bytes.
    MalformedParameters { command: u8, len: usize },
    /// Data with no command expecting it.
    StrayData { len: usize },
}

struct Burst {
    window: Window,
    written: usize,
    high_byte: Option<u8>,
    bytes: Vec<u8>,
}

/// Simulated controller behind a link.
pub struct SimulatedPanel {
    width: u16,
    height: u16,
    max_transfer: usize,
    state: PanelState,
    reset_low: bool,
    backlight: bool,
    transcript: Vec<Transfer>,
    violations: Vec<Violation>,
    memory: Vec<u16>,
    command: Option<u8>,
    params: Vec<u8>,
    columns: (u16, u16),
    rows: (u16, u16),
    madctl: Option<u8>,
    colmod: Option<u8>,
    burst: Option<Burst>,
    last_burst: Vec<u8>,
}

impl SimulatedPanel {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            max_transfer: crate::link::SPIDEV_CHUNK_SIZE,
            state: PanelState::Unpowered,
            reset_low: false,
            backlight: false,
            transcript: Vec::new(),
            violations: Vec::new(),
            memory: vec![0; width as usize * height as usize],
            command: None,
            params: Vec::new(),
            columns: (0, width.saturating_sub(1)),
            rows: (0, height.saturating_sub(1)),
            madctl: None,
            colmod: None,
            burst: None,
            last_burst: Vec::new(),
        }
    }

    /// Sets the chunk size reported through [`Link::max_transfer`].
    pub fn with_max_transfer(mut self, max_transfer: usize) -> Self {
        self.max_transfer = max_transfer;
        self
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn backlight(&self) -> bool {
        self.backlight
    }

    pub fn transcript(&self) -> &[Transfer] {
        &self.transcript
    }

    /// Command bytes in issue order.
    pub fn commands(&self) -> Vec<u8> {
        self.transcript
            .iter()
            .filter_map(|t| match t {
                Transfer::Command(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Display memory, row-major.
    pub fn memory(&self) -> &[u16] {
        &self.memory
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<u16> {
        if x < self.width && y < self.height {
            Some(self.memory[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Raw data bytes of the most recent RAM write burst.
    pub fn last_burst_bytes(&self) -> Vec<u8> {
        match &self.burst {
            Some(burst) => burst.bytes.clone(),
            None => self.last_burst.clone(),
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Closes any open burst and returns every recorded violation.
    pub fn finish(mut self) -> Vec<Violation> {
        self.close_command();
        self.violations
    }

    fn close_command(&mut self) {
        if let Some(command) = self.command.take() {
            let expected = match Command::from_byte(command) {
                Some(Command::ColumnAddress) | Some(Command::RowAddress) => Some(4),
                Some(Command::MemoryAccess) | Some(Command::PixelFormat) => Some(1),
                _ => None,
            };
            if let Some(expected) = expected {
                if self.params.len() != expected {
                    self.violations.push(Violation::MalformedParameters {
                        command,
                        len: self.params.len(),
                    });
                }
            }
        }
        self.params.clear();

        if let Some(burst) = self.burst.take() {
            let expected = burst.window.area();
            if burst.written != expected {
                self.violations.push(Violation::PixelCount {
                    window: burst.window,
                    expected,
                    written: burst.written,
                });
            }
            self.last_burst = burst.bytes;
        }
    }

    fn apply_command(&mut self, byte: u8) {
        self.close_command();
        self.command = Some(byte);

        match Command::from_byte(byte) {
            Some(Command::SoftwareReset) => {
                if self.state != PanelState::Unpowered {
                    self.state = PanelState::ResetPending;
                    self.madctl = None;
                    self.colmod = None;
                }
            }
            Some(Command::SleepOut) => {
                if self.state == PanelState::ResetPending {
                    self.state = PanelState::AwakeUnconfigured;
                }
            }
            Some(Command::DisplayOn) => {
                if self.state == PanelState::Configured {
                    self.state = PanelState::Active;
                }
            }
            Some(Command::ColumnAddress) | Some(Command::RowAddress) => {
                if !matches!(self.state, PanelState::Configured | PanelState::Active) {
                    self.violations
                        .push(Violation::WindowWhileUnconfigured { state: self.state });
                }
            }
            Some(Command::MemoryWrite) => self.open_burst(),
            _ => {}
        }
    }

    fn open_burst(&mut self) {
        if self.state != PanelState::Active {
            self.violations
                .push(Violation::WriteWhileInactive { state: self.state });
            return;
        }
        let window = Window::new(self.columns.0, self.rows.0, self.columns.1, self.rows.1);
        if window.validate(self.width, self.height).is_err() {
            self.violations.push(Violation::WindowOutOfBounds { window });
            return;
        }
        self.burst = Some(Burst {
            window,
            written: 0,
            high_byte: None,
            bytes: Vec::new(),
        });
    }

    fn apply_data(&mut self, bytes: &[u8]) {
        if self.burst.is_some() {
            self.write_ram(bytes);
            return;
        }

        match self.command.and_then(Command::from_byte) {
            Some(Command::ColumnAddress)
            | Some(Command::RowAddress)
            | Some(Command::MemoryAccess)
            | Some(Command::PixelFormat) => {
                self.params.extend_from_slice(bytes);
                self.apply_params();
            }
            Some(Command::MemoryWrite) => {
                // Burst refused at RAMWR; already reported.
            }
            _ => self.violations.push(Violation::StrayData { len: bytes.len() }),
        }
    }

    fn apply_params(&mut self) {
        let p = &self.params;
        match self.command.and_then(Command::from_byte) {
            Some(Command::ColumnAddress) if p.len() == 4 => {
                self.columns = (
                    u16::from_be_bytes([p[0], p[1]]),
                    u16::from_be_bytes([p[2], p[3]]),
                );
            }
            Some(Command::RowAddress) if p.len() == 4 => {
                self.rows = (
                    u16::from_be_bytes([p[0], p[1]]),
                    u16::from_be_bytes([p[2], p[3]]),
                );
            }
            Some(Command::MemoryAccess) if p.len() == 1 => self.madctl = Some(p[0]),
            Some(Command::PixelFormat) if p.len() == 1 => self.colmod = Some(p[0]),
            _ => {}
        }

        if self.state == PanelState::AwakeUnconfigured
            && self.madctl.is_some()
            && self.colmod.is_some()
        {
            self.state = PanelState::Configured;
        }
    }

    fn write_ram(&mut self, bytes: &[u8]) {
        let width = self.width as usize;
        let Some(burst) = self.burst.as_mut() else {
            return;
        };
        burst.bytes.extend_from_slice(bytes);

        for &byte in bytes {
            let Some(high) = burst.high_byte.take() else {
                burst.high_byte = Some(byte);
                continue;
            };
            let value = u16::from_be_bytes([high, byte]);
            let index = burst.written;
            burst.written += 1;
            if index >= burst.window.area() {
                continue;
            }
            let x = burst.window.x0 as usize + index % burst.window.width();
            let y = burst.window.y0 as usize + index / burst.window.width();
            self.memory[y * width + x] = value;
        }
    }
}

impl Link for SimulatedPanel {
    fn write_command(&mut self, command: u8) -> Result<()> {
        self.transcript.push(Transfer::Command(command));
        self.apply_command(command);
        Ok(())
    }

    fn write_data(&mut self, bytes: &[u8]) -> Result<()> {
        self.transcript.push(Transfer::Data(bytes.to_vec()));
        self.apply_data(bytes);
        Ok(())
    }

    fn set_reset(&mut self, high: bool) -> Result<()> {
        self.transcript.push(Transfer::Reset(high));
        if !high {
            self.reset_low = true;
        } else if self.reset_low {
            // Rising edge: controller restarts, pending burst is discarded.
            self.reset_low = false;
            self.command = None;
            self.params.clear();
            if let Some(burst) = self.burst.take() {
                self.last_burst = burst.bytes;
            }
            self.madctl = None;
            self.colmod = None;
            self.columns = (0, self.width.saturating_sub(1));
            self.rows = (0, self.height.saturating_sub(1));
            self.state = PanelState::ResetPending;
        }
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> Result<()> {
        self.transcript.push(Transfer::Backlight(on));
        self.backlight = on;
        Ok(())
    }

    fn max_transfer(&self) -> usize {
        self.max_transfer
    }
}
