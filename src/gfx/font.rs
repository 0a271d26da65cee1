//! Text rendering: `print` (system font) and `font` (user-defined font)
//!
//! Both draw one glyph at a time via [`Gfx::plot`] so they pick up clip
//! and palette-mapping for free, then return the total advance width in
//! pixels, matching the source API's return value.

use super::Gfx;
use crate::mem::Ram;

/// Fixed vs. variable glyph spacing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontLayout {
    Variable,
    Fixed(u8),
}

/// Shared knobs for `print`/`font`.
#[derive(Clone, Copy, Debug)]
pub struct PrintOptions {
    pub color: u8,
    pub scale: i32,
    pub layout: FontLayout,
    pub smallfont: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions { color: 15, scale: 1, layout: FontLayout::Variable, smallfont: false }
    }
}

const GLYPH_W: i32 = 6;
const GLYPH_H: i32 = 6;
const SMALLFONT_H: i32 = 4;

impl Gfx {
    /// `print(text, x, y, options)`: draw using the fixed 6x6 system
    /// font. Returns the advance width in pixels.
    pub fn print(&self, ram: &mut Ram, text: &str, x: i32, y: i32, opts: PrintOptions) -> i32 {
        let mut cursor = x;
        let height = if opts.smallfont { SMALLFONT_H } else { GLYPH_H };
        for ch in text.bytes() {
            let glyph_width = self.draw_system_glyph(ram, ch, cursor, y, opts, height);
            cursor += advance(opts.layout, glyph_width) * opts.scale;
        }
        cursor - x
    }

    fn draw_system_glyph(&self, ram: &mut Ram, ch: u8, x: i32, y: i32, opts: PrintOptions, height: i32) -> i32 {
        let mut max_col = 0;
        for row in 0..height {
            let bits = ram.font_row(ch, row as u8);
            for col in 0..GLYPH_W {
                if (bits >> col) & 1 != 0 {
                    max_col = max_col.max(col + 1);
                    self.fill_scaled(ram, x + col * opts.scale, y + row * opts.scale, opts.scale, opts.color);
                }
            }
        }
        if max_col == 0 {
            GLYPH_W
        } else {
            max_col + 1
        }
    }

    /// `font(text, x, y, sheet_index, width, height, colorkey, scale,
    /// fixed)`: draw using a user-defined font taken from the sprite
    /// bank, one tile per character starting at `sheet_index + (ch as
    /// u16)`.
    #[allow(clippy::too_many_arguments)]
    pub fn font(
        &self,
        ram: &mut Ram,
        text: &str,
        x: i32,
        y: i32,
        sheet_index: u16,
        char_w: u8,
        char_h: u8,
        colorkey: &[u8],
        scale: i32,
        fixed: bool,
    ) -> i32 {
        let scale = scale.max(1);
        let mut cursor = x;
        for ch in text.bytes() {
            let tile = sheet_index + ch as u16;
            let mut max_col = 0u8;
            for ly in 0..char_h.min(8) {
                for lx in 0..char_w.min(8) {
                    let color = ram.tile_pixel(tile, lx, ly);
                    if colorkey.contains(&color) {
                        continue;
                    }
                    max_col = max_col.max(lx + 1);
                    self.fill_scaled(ram, cursor + lx as i32 * scale, y + ly as i32 * scale, scale, color);
                }
            }
            let advance_w = if fixed { char_w } else { max_col.max(1) };
            cursor += advance_w as i32 * scale;
        }
        cursor - x
    }

    fn fill_scaled(&self, ram: &mut Ram, x: i32, y: i32, scale: i32, color: u8) {
        for sy in 0..scale {
            for sx in 0..scale {
                self.plot(ram, x + sx, y + sy, color);
            }
        }
    }
}

fn advance(layout: FontLayout, glyph_width: i32) -> i32 {
    match layout {
        FontLayout::Variable => glyph_width,
        FontLayout::Fixed(w) => w as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_returns_nonzero_advance_for_visible_glyph() {
        let mut ram = Ram::new();
        // A simple glyph: full top row.
        ram.set_font_row(b'A', 0, 0b111111);
        let gfx = Gfx::new();
        let advance = gfx.print(&mut ram, "A", 0, 0, PrintOptions::default());
        assert!(advance > 0);
    }

    #[test]
    fn fixed_layout_advances_by_constant_width() {
        let mut ram = Ram::new();
        ram.set_font_row(b'A', 0, 0b000001);
        ram.set_font_row(b'B', 0, 0b111111);
        let gfx = Gfx::new();
        let opts = PrintOptions { layout: FontLayout::Fixed(8), ..PrintOptions::default() };
        let adv_a = gfx.print(&mut ram, "A", 0, 0, opts);
        let adv_b = gfx.print(&mut ram, "B", 0, 0, opts);
        assert_eq!(adv_a, adv_b);
        assert_eq!(adv_a, 8);
    }
}
