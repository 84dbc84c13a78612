//! Clock face layout.

use chrono::NaiveDateTime;
use tftclock_hw::Surface;

use crate::config::Palette;
use crate::text::{draw_text, text_height, text_width};

/// Gap between the time and date lines.
const LINE_GAP: u16 = 30;

/// Largest glyph scale; anything bigger cannot fit a digit on the panel.
const MAX_SCALE: u16 = 64;

/// Large centered time with the date underneath.
pub struct ClockFace {
    palette: Palette,
    time_scale: u16,
    date_scale: u16,
}

impl ClockFace {
    pub fn new(palette: Palette, time_scale: u16, date_scale: u16) -> Self {
        Self {
            palette,
            time_scale: time_scale.clamp(1, MAX_SCALE),
            date_scale: date_scale.clamp(1, MAX_SCALE),
        }
    }

    /// Repaints the whole surface for `now`.
    pub fn draw(&self, surface: &mut Surface, now: &NaiveDateTime) {
        let time = now.format("%H:%M:%S").to_string();
        let date = now.format("%Y-%m-%d").to_string();

        surface.clear(self.palette.background);

        let time_h = text_height(self.time_scale);
        let date_h = text_height(self.date_scale);
        let block = time_h.saturating_add(LINE_GAP).saturating_add(date_h);
        let top = surface.height().saturating_sub(block) / 2;

        let time_x = centered(surface.width(), text_width(&time, self.time_scale));
        draw_text(surface, time_x, top, &time, self.palette.time, self.time_scale);

        let date_x = centered(surface.width(), text_width(&date, self.date_scale));
        let date_y = top.saturating_add(time_h).saturating_add(LINE_GAP);
        draw_text(surface, date_x, date_y, &date, self.palette.date, self.date_scale);
    }
}

fn centered(total: u16, content: u16) -> u16 {
    total.saturating_sub(content) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PALETTE: Palette = Palette {
        time: 0x07FF,
        date: 0xFFE0,
        background: 0x0000,
    };

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn bounds(surface: &Surface, color: u16) -> (u16, u16, u16, u16) {
        let mut b = (u16::MAX, u16::MAX, 0, 0);
        for y in 0..surface.height() {
            for x in 0..surface.width() {
                if surface.get_pixel(x, y) == Some(color) {
                    b = (b.0.min(x), b.1.min(y), b.2.max(x), b.3.max(y));
                }
            }
        }
        b
    }

    #[test]
    fn test_lines_centered_and_stacked() {
        let face = ClockFace::new(PALETTE, 6, 3);
        let mut surface = Surface::new();
        face.draw(&mut surface, &at(20, 34, 56));

        let (tx0, ty0, tx1, _) = bounds(&surface, PALETTE.time);
        // "20:34:56" is 234 px wide at scale 6.
        assert_eq!(tx0, 43);
        assert!(tx1 < 43 + 234);
        assert_eq!(ty0, 73);

        let (dx0, dy0, _, dy1) = bounds(&surface, PALETTE.date);
        assert!(dx0 >= (320 - 177) / 2);
        assert!(dy0 > ty0 + 42);
        assert!(dy1 < 240);
    }

    #[test]
    fn test_redraw_clears_previous_frame() {
        let face = ClockFace::new(PALETTE, 6, 3);
        let mut surface = Surface::new();
        surface.clear(0xF800);

        face.draw(&mut surface, &at(0, 0, 0));

        assert!(!surface.pixels().contains(&0xF800));
        assert_eq!(surface.get_pixel(0, 0), Some(PALETTE.background));
    }

    #[test]
    fn test_frames_differ_per_second() {
        let face = ClockFace::new(PALETTE, 6, 3);
        let mut a = Surface::new();
        let mut b = Surface::new();
        face.draw(&mut a, &at(9, 59, 58));
        face.draw(&mut b, &at(9, 59, 59));
        assert_ne!(a.pixels(), b.pixels());
    }

    #[test]
    fn test_oversized_scale_is_clamped() {
        let face = ClockFace::new(PALETTE, 10_000, u16::MAX);
        let mut surface = Surface::new();
        face.draw(&mut surface, &at(23, 59, 59));

        // Too large to fit, but drawn without overflowing.
        assert_eq!(face.time_scale, MAX_SCALE);
        assert_eq!(face.date_scale, MAX_SCALE);
        assert_eq!(surface.get_pixel(319, 239), Some(PALETTE.background));
    }
}
