//! Test doubles that watch the electrical lines and decode what a
//! controller would latch.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Clock,
    Mosi,
    Cs,
    Dc,
    Reset,
    Backlight,
}

#[derive(Default)]
struct State {
    clock: bool,
    mosi: bool,
    cs: bool,
    dc: bool,
    shift: u8,
    bit_count: u8,
    bytes: Vec<(bool, u8)>,
    controls: Vec<(Line, bool)>,
    spi_writes: Vec<usize>,
    clock_edges_outside_cs: usize,
}

/// Shared view of every line driven by the link under test.
#[derive(Clone, Default)]
pub struct Wire(Rc<RefCell<State>>);

impl Wire {
    pub fn new() -> Self {
        let wire = Self::default();
        wire.0.borrow_mut().cs = true;
        wire
    }

    pub fn pin(&self, line: Line) -> WirePin {
        WirePin {
            line,
            wire: self.clone(),
        }
    }

    pub fn spi(&self) -> WireSpi {
        WireSpi { wire: self.clone() }
    }

    /// Latched bytes tagged with the mode-select level (true = data).
    pub fn bytes(&self) -> Vec<(bool, u8)> {
        self.0.borrow().bytes.clone()
    }

    pub fn controls(&self) -> Vec<(Line, bool)> {
        self.0.borrow().controls.clone()
    }

    pub fn spi_writes(&self) -> Vec<usize> {
        self.0.borrow().spi_writes.clone()
    }

    pub fn stray_clock_edges(&self) -> usize {
        self.0.borrow().clock_edges_outside_cs
    }

    pub fn cs_high(&self) -> bool {
        self.0.borrow().cs
    }

    fn drive(&self, line: Line, high: bool) {
        let mut s = self.0.borrow_mut();
        match line {
            Line::Clock => {
                let rising = !s.clock && high;
                s.clock = high;
                if rising {
                    if s.cs {
                        s.clock_edges_outside_cs += 1;
                        return;
                    }
                    s.shift = (s.shift << 1) | s.mosi as u8;
                    s.bit_count += 1;
                    if s.bit_count == 8 {
                        let entry = (s.dc, s.shift);
                        s.bytes.push(entry);
                        s.shift = 0;
                        s.bit_count = 0;
                    }
                }
            }
            Line::Mosi => s.mosi = high,
            Line::Cs => s.cs = high,
            Line::Dc => s.dc = high,
            Line::Reset | Line::Backlight => s.controls.push((line, high)),
        }
    }
}

pub struct WirePin {
    line: Line,
    wire: Wire,
}

impl digital::ErrorType for WirePin {
    type Error = Infallible;
}

impl OutputPin for WirePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.wire.drive(self.line, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.wire.drive(self.line, true);
        Ok(())
    }
}

/// SPI peripheral that latches whole bytes at the current mode-select level.
pub struct WireSpi {
    wire: Wire,
}

impl spi::ErrorType for WireSpi {
    type Error = Infallible;
}

impl SpiDevice for WireSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut s = self.wire.0.borrow_mut();
        for op in operations.iter() {
            if let Operation::Write(buf) = op {
                let dc = s.dc;
                s.bytes.extend(buf.iter().map(|&b| (dc, b)));
                s.spi_writes.push(buf.len());
            }
        }
        Ok(())
    }
}

/// Delay that only accumulates the requested time.
#[derive(Clone, Default)]
pub struct NoDelay(Rc<RefCell<u64>>);

impl NoDelay {
    pub fn total_ns(&self) -> u64 {
        *self.0.borrow()
    }
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.0.borrow_mut() += ns as u64;
    }
}
