//! Hardware-assisted block transfers over an SPI device.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use super::lines::ControlLines;
use super::Link;
use crate::{Error, Result};

/// Default spidev buffer size; larger writes are split.
pub const SPIDEV_CHUNK_SIZE: usize = 4096;

/// Link backed by an SPI peripheral.
pub struct SpiLink<SPI, DC, RST, BL> {
    spi: SPI,
    lines: ControlLines<DC, RST, BL>,
    chunk_size: usize,
}

impl<SPI, DC, RST, BL> SpiLink<SPI, DC, RST, BL>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
{
    pub fn new(spi: SPI, lines: ControlLines<DC, RST, BL>) -> Self {
        Self::with_chunk_size(spi, lines, SPIDEV_CHUNK_SIZE)
    }

    pub fn with_chunk_size(spi: SPI, lines: ControlLines<DC, RST, BL>, chunk_size: usize) -> Self {
        Self {
            spi,
            lines,
            chunk_size: chunk_size.max(1),
        }
    }

    fn transfer(&mut self, bytes: &[u8]) -> Result<()> {
        for chunk in bytes.chunks(self.chunk_size) {
            self.spi
                .write(chunk)
                .map_err(|e| Error::Bus(format!("{:?}", e)))?;
        }
        Ok(())
    }
}

impl<SPI, DC, RST, BL> Link for SpiLink<SPI, DC, RST, BL>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
{
    fn write_command(&mut self, command: u8) -> Result<()> {
        self.lines.select_command()?;
        self.transfer(&[command])
    }

    fn write_data(&mut self, bytes: &[u8]) -> Result<()> {
        self.lines.select_data()?;
        self.transfer(bytes)
    }

    fn set_reset(&mut self, high: bool) -> Result<()> {
        self.lines.set_reset(high)
    }

    fn set_backlight(&mut self, on: bool) -> Result<()> {
        self.lines.set_backlight(on)
    }

    fn max_transfer(&self) -> usize {
        self.chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::wire_log::{Line, WirePin, WireSpi, Wire};

    fn spi_link(wire: &Wire, chunk: usize) -> SpiLink<WireSpi, WirePin, WirePin, WirePin> {
        let lines = ControlLines::new(
            wire.pin(Line::Dc),
            wire.pin(Line::Reset),
            Some(wire.pin(Line::Backlight)),
        );
        SpiLink::with_chunk_size(wire.spi(), lines, chunk)
    }

    #[test]
    fn test_command_then_data_levels() {
        let wire = Wire::new();
        let mut link = spi_link(&wire, 4096);

        link.write_command(0x2A).unwrap();
        link.write_data(&[0x00, 0x01, 0x3F]).unwrap();

        assert_eq!(
            wire.bytes(),
            vec![(false, 0x2A), (true, 0x00), (true, 0x01), (true, 0x3F)]
        );
    }

    #[test]
    fn test_data_split_into_chunks() {
        let wire = Wire::new();
        let mut link = spi_link(&wire, 3);

        link.write_data(&[1, 2, 3, 4, 5, 6, 7]).unwrap();

        assert_eq!(wire.spi_writes(), vec![3, 3, 1]);
        assert_eq!(wire.bytes().len(), 7);
    }

    #[test]
    fn test_reset_and_backlight_lines() {
        let wire = Wire::new();
        let mut link = spi_link(&wire, 4096);

        link.set_reset(false).unwrap();
        link.set_reset(true).unwrap();
        link.set_backlight(true).unwrap();

        assert_eq!(
            wire.controls(),
            vec![
                (Line::Reset, false),
                (Line::Reset, true),
                (Line::Backlight, true)
            ]
        );
    }
}
