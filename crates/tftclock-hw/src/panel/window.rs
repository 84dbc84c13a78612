//! Address window programmed before a pixel burst.

use std::fmt;

use crate::{Error, Result};

/// Inclusive rectangle (x0,y0)-(x1,y1) the controller cursor walks
/// row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl Window {
    pub fn new(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Window covering a whole `width` x `height` area.
    pub fn full(width: u16, height: u16) -> Self {
        Self::new(0, 0, width.saturating_sub(1), height.saturating_sub(1))
    }

    pub fn width(&self) -> usize {
        (self.x1 as usize + 1).saturating_sub(self.x0 as usize)
    }

    pub fn height(&self) -> usize {
        (self.y1 as usize + 1).saturating_sub(self.y0 as usize)
    }

    /// Number of pixel values the controller expects after RAMWR.
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Checks 0 <= x0 <= x1 < width and 0 <= y0 <= y1 < height.
    pub fn validate(&self, width: u16, height: u16) -> Result<()> {
        if self.x0 > self.x1 || self.y0 > self.y1 || self.x1 >= width || self.y1 >= height {
            return Err(Error::WindowOutOfBounds {
                window: *self,
                width,
                height,
            });
        }
        Ok(())
    }

    /// CASET payload: big-endian start and end column.
    pub fn column_bytes(&self) -> [u8; 4] {
        span_bytes(self.x0, self.x1)
    }

    /// RASET payload: big-endian start and end row.
    pub fn row_bytes(&self) -> [u8; 4] {
        span_bytes(self.y0, self.y1)
    }
}

fn span_bytes(start: u16, end: u16) -> [u8; 4] {
    let [s0, s1] = start.to_be_bytes();
    let [e0, e1] = end.to_be_bytes();
    [s0, s1, e0, e1]
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})-({},{})", self.x0, self.y0, self.x1, self.y1)
    }
}
