//! Software bit-banged transfers over discrete GPIO lines.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use super::lines::{gpio_err, ControlLines};
use super::Link;
use crate::Result;

/// Link that clocks every bit by hand, MSB first, SPI mode 0.
///
/// Chip-select is held low for the whole transfer. Each bit drives the clock
/// low, presents the data bit, then raises the clock (the controller samples
/// on the rising edge). A non-zero `half_period_us` stretches both clock
/// phases for marginal wiring.
pub struct BitBangLink<CLK, MOSI, CS, DC, RST, BL, D> {
    clock: CLK,
    data: MOSI,
    cs: CS,
    lines: ControlLines<DC, RST, BL>,
    delay: D,
    half_period_us: u32,
}

impl<CLK, MOSI, CS, DC, RST, BL, D> BitBangLink<CLK, MOSI, CS, DC, RST, BL, D>
where
    CLK: OutputPin,
    MOSI: OutputPin,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
    D: DelayNs,
{
    pub fn new(
        clock: CLK,
        data: MOSI,
        cs: CS,
        lines: ControlLines<DC, RST, BL>,
        delay: D,
        half_period_us: u32,
    ) -> Self {
        Self {
            clock,
            data,
            cs,
            lines,
            delay,
            half_period_us,
        }
    }

    fn settle(&mut self) {
        if self.half_period_us > 0 {
            self.delay.delay_us(self.half_period_us);
        }
    }

    fn clock_out(&mut self, bytes: &[u8]) -> Result<()> {
        self.cs.set_low().map_err(gpio_err)?;
        for &byte in bytes {
            for bit in (0..8).rev() {
                self.clock.set_low().map_err(gpio_err)?;
                if byte & (1 << bit) != 0 {
                    self.data.set_high().map_err(gpio_err)?;
                } else {
                    self.data.set_low().map_err(gpio_err)?;
                }
                self.settle();
                self.clock.set_high().map_err(gpio_err)?;
                self.settle();
            }
        }
        self.clock.set_low().map_err(gpio_err)?;
        self.cs.set_high().map_err(gpio_err)
    }
}

impl<CLK, MOSI, CS, DC, RST, BL, D> Link for BitBangLink<CLK, MOSI, CS, DC, RST, BL, D>
where
    CLK: OutputPin,
    MOSI: OutputPin,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
    D: DelayNs,
{
    fn write_command(&mut self, command: u8) -> Result<()> {
        self.lines.select_command()?;
        self.clock_out(&[command])
    }

    fn write_data(&mut self, bytes: &[u8]) -> Result<()> {
        self.lines.select_data()?;
        self.clock_out(bytes)
    }

    fn set_reset(&mut self, high: bool) -> Result<()> {
        self.lines.set_reset(high)
    }

    fn set_backlight(&mut self, on: bool) -> Result<()> {
        self.lines.set_backlight(on)
    }

    /// One 16-bit pixel per transfer.
    fn max_transfer(&self) -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::wire_log::{Line, NoDelay, WirePin, Wire};
    use crate::link::SpiLink;

    type WireBitBang = BitBangLink<WirePin, WirePin, WirePin, WirePin, WirePin, WirePin, NoDelay>;

    fn bitbang_link(wire: &Wire, half_period_us: u32, delay: NoDelay) -> WireBitBang {
        let lines = ControlLines::new(
            wire.pin(Line::Dc),
            wire.pin(Line::Reset),
            Some(wire.pin(Line::Backlight)),
        );
        BitBangLink::new(
            wire.pin(Line::Clock),
            wire.pin(Line::Mosi),
            wire.pin(Line::Cs),
            lines,
            delay,
            half_period_us,
        )
    }

    fn drive(link: &mut dyn Link) {
        link.write_command(0x2A).unwrap();
        link.write_data(&[0x00, 0x00, 0x01, 0x3F]).unwrap();
        link.write_command(0x2C).unwrap();
        link.write_data(&[0xF8, 0x00, 0x07, 0xE0, 0xA5, 0x5A]).unwrap();
    }

    #[test]
    fn test_msb_first() {
        let wire = Wire::new();
        let mut link = bitbang_link(&wire, 0, NoDelay::default());

        link.write_data(&[0b1000_0001, 0b0100_0000]).unwrap();

        assert_eq!(wire.bytes(), vec![(true, 0x81), (true, 0x40)]);
        assert!(wire.cs_high());
        assert_eq!(wire.stray_clock_edges(), 0);
    }

    #[test]
    fn test_matches_block_transfer_on_the_wire() {
        let bitbang_wire = Wire::new();
        let mut bitbang = bitbang_link(&bitbang_wire, 0, NoDelay::default());
        drive(&mut bitbang);

        let spi_wire = Wire::new();
        let lines = ControlLines::new(
            spi_wire.pin(Line::Dc),
            spi_wire.pin(Line::Reset),
            Some(spi_wire.pin(Line::Backlight)),
        );
        let mut spi = SpiLink::new(spi_wire.spi(), lines);
        drive(&mut spi);

        assert_eq!(bitbang_wire.bytes(), spi_wire.bytes());
        assert_eq!(bitbang_wire.bytes().len(), 12);
    }

    #[test]
    fn test_half_period_derating() {
        let wire = Wire::new();
        let delay = NoDelay::default();
        let mut link = bitbang_link(&wire, 5, delay.clone());

        link.write_command(0x29).unwrap();

        // Two half periods per bit, eight bits.
        assert_eq!(delay.total_ns(), 16 * 5_000);
    }

    #[test]
    fn test_one_pixel_per_transfer() {
        let wire = Wire::new();
        let link = bitbang_link(&wire, 0, NoDelay::default());
        assert_eq!(link.max_transfer(), 2);
    }
}
