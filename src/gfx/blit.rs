//! Sprite, map, and textured-triangle blitting
//!
//! `spr`/`map` both sample 8x8 tiles out of the combined 512-tile
//! sprite/map bank (see [`crate::mem::Ram::tile_pixel`]); this module
//! only adds the transform (flip/rotate/scale), transparency, and the
//! per-cell remap hook that `map()` exposes.

use super::primitives::{trace_edge, ExtentBuffer};
use super::Gfx;
use crate::mem::Ram;

/// Horizontal/vertical mirroring applied before a tile is sampled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flip {
    pub horizontal: bool,
    pub vertical: bool,
}

/// 90-degree rotation steps (0..=3), applied after flipping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rotate(pub u8);

/// Per-cell rewrite hook for `map()`. Given a cell's screen-space
/// position and stored tile id, returns the tile id/flip/rotation
/// actually drawn — the spec's "remap callback" for dynamic tile
/// rewriting. The identity case (no callback) is handled by `map()`
/// taking `Option<&mut dyn RemapCallback>` rather than requiring every
/// caller to implement this trait.
pub trait RemapCallback {
    fn remap(&mut self, x: i32, y: i32, tile_id: u8) -> (u8, Flip, Rotate);
}

fn sample_with_transform(ram: &Ram, tile: u16, mut lx: u8, mut ly: u8, flip: Flip, rotate: Rotate) -> u8 {
    if flip.horizontal {
        lx = 7 - lx;
    }
    if flip.vertical {
        ly = 7 - ly;
    }
    let (rx, ry) = match rotate.0 & 3 {
        0 => (lx, ly),
        1 => (ly, 7 - lx),
        2 => (7 - lx, 7 - ly),
        _ => (7 - ly, lx),
    };
    ram.tile_pixel(tile, rx, ry)
}

impl Gfx {
    /// `spr(id, x, y, colorkey, scale, flip, rotate)`: draw one 8x8
    /// tile. `colorkey` lists up to 15 palette indices treated as
    /// transparent (a caller-supplied slice; the API layer clamps this
    /// to 15 entries before calling in).
    #[allow(clippy::too_many_arguments)]
    pub fn spr(
        &self,
        ram: &mut Ram,
        id: u16,
        x: i32,
        y: i32,
        colorkey: &[u8],
        scale: i32,
        flip: Flip,
        rotate: Rotate,
    ) {
        let scale = scale.max(1);
        for ly in 0..8u8 {
            for lx in 0..8u8 {
                let color = sample_with_transform(ram, id, lx, ly, flip, rotate);
                if colorkey.contains(&color) {
                    continue;
                }
                let px = x + lx as i32 * scale;
                let py = y + ly as i32 * scale;
                for sy in 0..scale {
                    for sx in 0..scale {
                        self.plot(ram, px + sx, py + sy, color);
                    }
                }
            }
        }
    }

    /// Composite sprite draw: a `w`x`h` rectangle of consecutive tiles
    /// starting at `id`, advancing one tile per row of 128 source ids
    /// (matching the sprite sheet's 16-tiles-per-row layout implied by
    /// a 128x128 sheet of 8x8 tiles).
    #[allow(clippy::too_many_arguments)]
    pub fn spr_rect(
        &self,
        ram: &mut Ram,
        id: u16,
        x: i32,
        y: i32,
        w: u8,
        h: u8,
        colorkey: &[u8],
        scale: i32,
        flip: Flip,
        rotate: Rotate,
    ) {
        const SHEET_COLUMNS: u16 = 16;
        let scale = scale.max(1);
        for row in 0..h as u16 {
            for col in 0..w as u16 {
                let (dcol, drow) = match rotate.0 & 3 {
                    0 => (col, row),
                    1 => (row, w as u16 - 1 - col),
                    2 => (w as u16 - 1 - col, h as u16 - 1 - row),
                    _ => (h as u16 - 1 - row, col),
                };
                let (scol, srow) = (
                    if flip.horizontal { w as u16 - 1 - col } else { col },
                    if flip.vertical { h as u16 - 1 - row } else { row },
                );
                let tile = id + srow * SHEET_COLUMNS + scol;
                let tx = x + dcol as i32 * 8 * scale;
                let ty = y + drow as i32 * 8 * scale;
                self.spr(ram, tile, tx, ty, colorkey, scale, flip, rotate);
            }
        }
    }

    /// `map(x, y, w, h, sx, sy, colorkey, scale, remap)`: draw a `w`x`h`
    /// cell rectangle of the map starting at cell `(x, y)`, placed on
    /// screen at `(sx, sy)`. `remap` receives the cell's screen
    /// position and stored tile id and may rewrite tile/flip/rotation
    /// per cell.
    #[allow(clippy::too_many_arguments)]
    pub fn map(
        &self,
        ram: &mut Ram,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        sx: i32,
        sy: i32,
        colorkey: &[u8],
        scale: i32,
        mut remap: Option<&mut dyn RemapCallback>,
    ) {
        let scale = scale.max(1);
        for row in 0..h {
            for col in 0..w {
                let cell_x = x + col;
                let cell_y = y + row;
                let tile_id = ram.map_cell(cell_x, cell_y);
                let screen_x = sx + col * 8 * scale;
                let screen_y = sy + row * 8 * scale;

                let (tile, flip, rotate) = match remap.as_deref_mut() {
                    Some(cb) => cb.remap(screen_x, screen_y, tile_id),
                    None => (tile_id, Flip::default(), Rotate::default()),
                };
                self.spr(ram, tile as u16, screen_x, screen_y, colorkey, scale, flip, rotate);
            }
        }
    }

    /// `mget(x, y)`: read a map cell's tile id.
    pub fn mget(&self, ram: &Ram, x: i32, y: i32) -> u8 {
        ram.map_cell(x, y)
    }

    /// `mset(x, y, tile_id)`: write a map cell's tile id.
    pub fn mset(&self, ram: &mut Ram, x: i32, y: i32, tile_id: u8) {
        ram.set_map_cell(x, y, tile_id);
    }

    /// `textri`: filled triangle with (u, v) interpolated across the
    /// same extent-buffer trace `tri` uses, sampling either the sprite
    /// sheet or the map per span, with an optional chroma-key.
    #[allow(clippy::too_many_arguments)]
    pub fn textri(
        &self,
        ram: &mut Ram,
        p: [(f32, f32); 3],
        uv: [(f32, f32); 3],
        use_map: bool,
        chroma_key: Option<u8>,
    ) {
        let (x0, y0) = (p[0].0 as i32, p[0].1 as i32);
        let (x1, y1) = (p[1].0 as i32, p[1].1 as i32);
        let (x2, y2) = (p[2].0 as i32, p[2].1 as i32);

        let mut extents = ExtentBuffer::new();
        trace_edge(&mut extents, x0, y0, x1, y1);
        trace_edge(&mut extents, x1, y1, x2, y2);
        trace_edge(&mut extents, x2, y2, x0, y0);

        let area = edge(p[0], p[1], p[2]);
        if area == 0.0 {
            return;
        }

        for (y, l, r) in extents.rows() {
            for x in l..=r {
                let point = (x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(p[1], p[2], point) / area;
                let w1 = edge(p[2], p[0], point) / area;
                let w2 = edge(p[0], p[1], point) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let u = w0 * uv[0].0 + w1 * uv[1].0 + w2 * uv[2].0;
                let v = w0 * uv[0].1 + w1 * uv[1].1 + w2 * uv[2].1;
                let color = if use_map {
                    ram.map_cell(u as i32, v as i32)
                } else {
                    let tile = ((v as i32 / 8) * 16 + (u as i32 / 8)) as u16;
                    ram.tile_pixel(tile, (u as i32 % 8) as u8, (v as i32 % 8) as u8)
                };
                if chroma_key == Some(color) {
                    continue;
                }
                self.plot(ram, x, y, color);
            }
        }
    }
}

fn edge(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    (c.0 - a.0) * (b.1 - a.1) - (c.1 - a.1) * (b.0 - a.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Identity;
    impl RemapCallback for Identity {
        fn remap(&mut self, _x: i32, _y: i32, tile_id: u8) -> (u8, Flip, Rotate) {
            (tile_id, Flip::default(), Rotate::default())
        }
    }

    #[test]
    fn spr_respects_colorkey_transparency() {
        let mut ram = Ram::new();
        for y in 0..8u8 {
            for x in 0..8u8 {
                ram.set_tile_pixel(0, x, y, 3);
            }
        }
        let gfx = Gfx::new();
        ram.set_screen_pixel(5, 5, 9);
        gfx.spr(&mut ram, 0, 0, 0, &[3], 1, Flip::default(), Rotate::default());
        assert_eq!(ram.screen_pixel(0, 0), 0);
    }

    #[test]
    fn map_remap_callback_overrides_tile() {
        let mut ram = Ram::new();
        ram.set_map_cell(0, 0, 1);
        for y in 0..8u8 {
            for x in 0..8u8 {
                ram.set_tile_pixel(9, x, y, 4);
            }
        }
        let gfx = Gfx::new();
        struct ForceTile;
        impl RemapCallback for ForceTile {
            fn remap(&mut self, _x: i32, _y: i32, _tile_id: u8) -> (u8, Flip, Rotate) {
                (9, Flip::default(), Rotate::default())
            }
        }
        let mut cb = ForceTile;
        gfx.map(&mut ram, 0, 0, 1, 1, 0, 0, &[], 1, Some(&mut cb));
        assert_eq!(ram.screen_pixel(0, 0), 4);
    }

    #[test]
    fn mget_mset_round_trip() {
        let mut ram = Ram::new();
        let gfx = Gfx::new();
        gfx.mset(&mut ram, 3, 4, 77);
        assert_eq!(gfx.mget(&ram, 3, 4), 77);
    }
}
