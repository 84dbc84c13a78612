//! 5x7 bitmap text for clock digits.
//!
//! Glyph rows use the low `width` bits, leftmost column in the highest bit.

use tftclock_hw::Surface;

/// Glyph height in font pixels.
pub const GLYPH_HEIGHT: u16 = 7;

/// Blank column after every glyph.
const SPACING: u16 = 1;

/// A single bitmap glyph.
#[derive(Debug)]
pub struct Glyph {
    pub width: u8,
    pub rows: [u8; 7],
}

const DIGITS: [Glyph; 10] = [
    Glyph {
        width: 5,
        rows: [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
    },
    Glyph {
        width: 5,
        rows: [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
    },
    Glyph {
        width: 5,
        rows: [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
    },
    Glyph {
        width: 5,
        rows: [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
    },
    Glyph {
        width: 5,
        rows: [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
    },
    Glyph {
        width: 5,
        rows: [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
    },
    Glyph {
        width: 5,
        rows: [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
    },
    Glyph {
        width: 5,
        rows: [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
    },
    Glyph {
        width: 5,
        rows: [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
    },
    Glyph {
        width: 5,
        rows: [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
    },
];

const COLON: Glyph = Glyph {
    width: 1,
    rows: [0x00, 0x01, 0x01, 0x00, 0x01, 0x01, 0x00],
};
const DASH: Glyph = Glyph {
    width: 5,
    rows: [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
};
const SPACE: Glyph = Glyph {
    width: 3,
    rows: [0; 7],
};

/// Looks up a glyph; characters outside the font render as a space.
pub fn glyph(c: char) -> &'static Glyph {
    match c {
        '0'..='9' => &DIGITS[c as usize - '0' as usize],
        ':' => &COLON,
        '-' => &DASH,
        _ => &SPACE,
    }
}

/// Rendered width of `text` in surface pixels.
pub fn text_width(text: &str, scale: u16) -> u16 {
    let columns: u16 = text.chars().map(|c| glyph(c).width as u16 + SPACING).sum();
    columns.saturating_sub(SPACING).saturating_mul(scale)
}

/// Rendered height of a line in surface pixels.
pub fn text_height(scale: u16) -> u16 {
    GLYPH_HEIGHT.saturating_mul(scale)
}

/// Draws `text` with its top-left corner at (x, y), clipped to the surface.
pub fn draw_text(surface: &mut Surface, x: u16, y: u16, text: &str, color: u16, scale: u16) {
    let mut cursor = x;
    for c in text.chars() {
        let glyph = glyph(c);
        for (row, bits) in glyph.rows.iter().enumerate() {
            for col in 0..glyph.width {
                if bits & (1 << (glyph.width - 1 - col)) != 0 {
                    surface.fill_rect(
                        cursor.saturating_add((col as u16).saturating_mul(scale)),
                        y.saturating_add((row as u16).saturating_mul(scale)),
                        scale,
                        scale,
                        color,
                    );
                }
            }
        }
        cursor = cursor.saturating_add((glyph.width as u16 + SPACING).saturating_mul(scale));
    }
}
