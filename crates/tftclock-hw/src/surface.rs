//! RGB565 pixel surface the renderer paints into.

use crate::{PANEL_HEIGHT, PANEL_WIDTH};

/// Total pixel count for the panel.
pub const PIXEL_COUNT: usize = PANEL_WIDTH as usize * PANEL_HEIGHT as usize;

/// Row-major grid of RGB565 values sized to the panel's drawable area.
#[derive(Clone)]
pub struct Surface {
    /// Pixel data in RGB565 format.
    data: Vec<u16>,
    width: u16,
    height: u16,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    /// Creates a 320x240 surface initialized to black.
    pub fn new() -> Self {
        Self {
            data: vec![0; PIXEL_COUNT],
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
        }
    }

    /// Creates a surface with custom dimensions.
    pub fn with_dimensions(width: u16, height: u16) -> Self {
        let size = width as usize * height as usize;
        Self {
            data: vec![0; size],
            width,
            height,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Returns a reference to the raw pixel data.
    pub fn pixels(&self) -> &[u16] {
        &self.data
    }

    /// Returns a mutable reference to the raw pixel data.
    pub fn pixels_mut(&mut self) -> &mut [u16] {
        &mut self.data
    }

    /// Clears the surface to a solid color.
    pub fn clear(&mut self, color: u16) {
        self.data.fill(color);
    }

    /// Sets a pixel; coordinates outside the surface are ignored.
    pub fn set_pixel(&mut self, x: u16, y: u16, color: u16) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            self.data[idx] = color;
        }
    }

    pub fn get_pixel(&self, x: u16, y: u16) -> Option<u16> {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            Some(self.data[idx])
        } else {
            None
        }
    }

    /// Fills a rectangle, clipped to the surface.
    pub fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: u16) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for py in y..y_end {
            let row = py as usize * self.width as usize;
            for px in x..x_end {
                self.data[row + px as usize] = color;
            }
        }
    }
}

/// Converts RGB888 to RGB565.
#[inline]
pub fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = (r >> 3) as u16;
    let g6 = (g >> 2) as u16;
    let b5 = (b >> 3) as u16;
    (r5 << 11) | (g6 << 5) | b5
}

/// Parses a `#RRGGBB` string to RGB565.
pub fn parse_hex_color(hex: &str) -> Option<u16> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(rgb888_to_rgb565(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb565_conversion() {
        assert_eq!(rgb888_to_rgb565(255, 0, 0), 0xF800);
        assert_eq!(rgb888_to_rgb565(0, 255, 0), 0x07E0);
        assert_eq!(rgb888_to_rgb565(0, 0, 255), 0x001F);
        assert_eq!(rgb888_to_rgb565(255, 255, 255), 0xFFFF);
        assert_eq!(rgb888_to_rgb565(0, 0, 0), 0x0000);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF0000"), Some(0xF800));
        assert_eq!(parse_hex_color("00FFFF"), Some(0x07FF));
        assert_eq!(parse_hex_color("#FFFF00"), Some(0xFFE0));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("invalid"), None);
    }

    #[test]
    fn test_parse_hex_color_non_ascii() {
        // Six bytes, but a multi-byte character straddles the channel split.
        assert_eq!(parse_hex_color("#aébcd"), None);
        assert_eq!(parse_hex_color("ééé"), None);
    }

    #[test]
    fn test_surface_ops() {
        let mut surface = Surface::new();
        assert_eq!(surface.width(), 320);
        assert_eq!(surface.height(), 240);

        surface.set_pixel(10, 20, 0xF800);
        assert_eq!(surface.get_pixel(10, 20), Some(0xF800));
        assert_eq!(surface.get_pixel(320, 0), None);

        surface.clear(0xFFFF);
        assert_eq!(surface.get_pixel(0, 0), Some(0xFFFF));
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut surface = Surface::with_dimensions(8, 4);
        surface.fill_rect(6, 2, 10, 10, 0x001F);

        assert_eq!(surface.get_pixel(7, 3), Some(0x001F));
        assert_eq!(surface.get_pixel(6, 2), Some(0x001F));
        assert_eq!(surface.get_pixel(5, 2), Some(0));
        assert_eq!(surface.pixels().iter().filter(|&&p| p != 0).count(), 4);
    }
}
