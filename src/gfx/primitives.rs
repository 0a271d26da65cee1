//! Primitive shapes: lines, rectangles, circles, ellipses, triangles
//!
//! Filled shapes use a per-scanline left/right extent buffer sized to
//! the screen height so each row is spanned exactly once, even where
//! two edges of the same shape cross the same row (spec §4.2, "Circle
//! ... filled variant uses a per-scanline left/right extent buffer").

use super::Gfx;
use crate::mem::{Ram, SCREEN_H};

/// Per-scanline left/right extent, one entry per screen row. `None`
/// means the row hasn't been touched yet.
pub(crate) struct ExtentBuffer {
    left: [i32; SCREEN_H],
    right: [i32; SCREEN_H],
    touched: [bool; SCREEN_H],
}

impl ExtentBuffer {
    pub(crate) fn new() -> Self {
        ExtentBuffer {
            left: [0; SCREEN_H],
            right: [0; SCREEN_H],
            touched: [false; SCREEN_H],
        }
    }

    pub(crate) fn extend(&mut self, y: i32, x: i32) {
        if y < 0 || y as usize >= SCREEN_H {
            return;
        }
        let row = y as usize;
        if !self.touched[row] {
            self.left[row] = x;
            self.right[row] = x;
            self.touched[row] = true;
        } else {
            if x < self.left[row] {
                self.left[row] = x;
            }
            if x > self.right[row] {
                self.right[row] = x;
            }
        }
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (i32, i32, i32)> + '_ {
        self.touched.iter().enumerate().filter_map(|(row, &touched)| {
            touched.then(|| (row as i32, self.left[row], self.right[row]))
        })
    }
}

impl Gfx {
    /// `line(x0, y0, x1, y1, color)`: Bresenham.
    pub fn line(&self, ram: &mut Ram, x0: i32, y0: i32, x1: i32, y1: i32, color: u8) {
        let (mut x0, mut y0) = (x0, y0);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(ram, x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// `rect(x, y, w, h, color)`: filled, drawn as horizontal spans.
    pub fn rect(&self, ram: &mut Ram, x: i32, y: i32, w: i32, h: i32, color: u8) {
        if w <= 0 || h <= 0 {
            return;
        }
        for row in y..y + h {
            self.hspan(ram, row, x, x + w - 1, color);
        }
    }

    /// `rectb(x, y, w, h, color)`: border only.
    pub fn rectb(&self, ram: &mut Ram, x: i32, y: i32, w: i32, h: i32, color: u8) {
        if w <= 0 || h <= 0 {
            return;
        }
        self.hspan(ram, y, x, x + w - 1, color);
        self.hspan(ram, y + h - 1, x, x + w - 1, color);
        for row in y..y + h {
            self.plot(ram, x, row, color);
            self.plot(ram, x + w - 1, row, color);
        }
    }

    /// `circb(x, y, radius, color)`: Bresenham/midpoint circle, border
    /// only — no double-drawing concern since each point is plotted once.
    pub fn circb(&self, ram: &mut Ram, cx: i32, cy: i32, radius: i32, color: u8) {
        self.midpoint_circle(radius, |dx, dy| {
            self.plot(ram, cx + dx, cy + dy, color);
            self.plot(ram, cx - dx, cy + dy, color);
            self.plot(ram, cx + dx, cy - dy, color);
            self.plot(ram, cx - dx, cy - dy, color);
            self.plot(ram, cx + dy, cy + dx, color);
            self.plot(ram, cx - dy, cy + dx, color);
            self.plot(ram, cx + dy, cy - dx, color);
            self.plot(ram, cx - dy, cy - dx, color);
        });
    }

    /// `circ(x, y, radius, color)`: filled circle via the shared extent
    /// buffer, so the eight-way symmetric points only ever produce one
    /// span write per row.
    pub fn circ(&self, ram: &mut Ram, cx: i32, cy: i32, radius: i32, color: u8) {
        let mut extents = ExtentBuffer::new();
        self.midpoint_circle(radius, |dx, dy| {
            extents.extend(cy + dy, cx - dx);
            extents.extend(cy + dy, cx + dx);
            extents.extend(cy - dy, cx - dx);
            extents.extend(cy - dy, cx + dx);
            extents.extend(cy + dx, cx - dy);
            extents.extend(cy + dx, cx + dy);
            extents.extend(cy - dx, cx - dy);
            extents.extend(cy - dx, cx + dy);
        });
        for (y, l, r) in extents.rows() {
            self.hspan(ram, y, l, r, color);
        }
    }

    fn midpoint_circle(&self, radius: i32, mut emit: impl FnMut(i32, i32)) {
        if radius < 0 {
            return;
        }
        let mut x = radius;
        let mut y = 0;
        let mut err = 1 - radius;
        while x >= y {
            emit(x, y);
            emit(y, x);
            y += 1;
            if err < 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }

    /// `ellib(x, y, a, b, color)`: midpoint ellipse, border only.
    pub fn ellib(&self, ram: &mut Ram, cx: i32, cy: i32, a: i32, b: i32, color: u8) {
        self.midpoint_ellipse(a, b, |dx, dy| {
            self.plot(ram, cx + dx, cy + dy, color);
            self.plot(ram, cx - dx, cy + dy, color);
            self.plot(ram, cx + dx, cy - dy, color);
            self.plot(ram, cx - dx, cy - dy, color);
        });
    }

    /// `elli(x, y, a, b, color)`: filled ellipse via the extent buffer.
    pub fn elli(&self, ram: &mut Ram, cx: i32, cy: i32, a: i32, b: i32, color: u8) {
        let mut extents = ExtentBuffer::new();
        self.midpoint_ellipse(a, b, |dx, dy| {
            extents.extend(cy + dy, cx - dx);
            extents.extend(cy + dy, cx + dx);
            extents.extend(cy - dy, cx - dx);
            extents.extend(cy - dy, cx + dx);
        });
        for (y, l, r) in extents.rows() {
            self.hspan(ram, y, l, r, color);
        }
    }

    /// Classic two-region midpoint ellipse (Foley et al.), parameterized
    /// by semi-axes `a` (x) and `b` (y).
    fn midpoint_ellipse(&self, a: i32, b: i32, mut emit: impl FnMut(i32, i32)) {
        if a <= 0 || b <= 0 {
            return;
        }
        let (a2, b2) = ((a * a) as f64, (b * b) as f64);
        let (mut x, mut y) = (0i32, b);
        let mut dx = 0.0f64;
        let mut dy = 2.0 * a2 * y as f64;

        emit(x, y);

        // Region 1: slope magnitude < 1
        let mut d1 = b2 - a2 * b as f64 + 0.25 * a2;
        while dx < dy {
            x += 1;
            dx += 2.0 * b2;
            if d1 < 0.0 {
                d1 += dx + b2;
            } else {
                y -= 1;
                dy -= 2.0 * a2;
                d1 += dx - dy + b2;
            }
            emit(x, y);
        }

        // Region 2: slope magnitude >= 1
        let mut d2 = b2 * (x as f64 + 0.5).powi(2) + a2 * (y as f64 - 1.0).powi(2) - a2 * b2;
        while y > 0 {
            y -= 1;
            dy -= 2.0 * a2;
            if d2 > 0.0 {
                d2 += a2 - dy;
            } else {
                x += 1;
                dx += 2.0 * b2;
                d2 += dx - dy + a2;
            }
            emit(x, y);
        }
    }

    /// `trib(x0,y0, x1,y1, x2,y2, color)`: three line segments.
    #[allow(clippy::too_many_arguments)]
    pub fn trib(
        &self,
        ram: &mut Ram,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: u8,
    ) {
        self.line(ram, x0, y0, x1, y1, color);
        self.line(ram, x1, y1, x2, y2, color);
        self.line(ram, x2, y2, x0, y0, color);
    }

    /// `tri(x0,y0, x1,y1, x2,y2, color)`: filled triangle, traced into
    /// the shared extent buffer then spanned per row.
    #[allow(clippy::too_many_arguments)]
    pub fn tri(
        &self,
        ram: &mut Ram,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: u8,
    ) {
        let mut extents = ExtentBuffer::new();
        trace_edge(&mut extents, x0, y0, x1, y1);
        trace_edge(&mut extents, x1, y1, x2, y2);
        trace_edge(&mut extents, x2, y2, x0, y0);
        for (y, l, r) in extents.rows() {
            self.hspan(ram, y, l, r, color);
        }
    }
}

/// Trace one triangle edge's Bresenham path into an extent buffer; used
/// by both `tri` and (via [`super::blit::textri`]) the textured
/// triangle.
pub(crate) fn trace_edge(extents: &mut ExtentBuffer, x0: i32, y0: i32, x1: i32, y1: i32) {
    let (mut x, mut y) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        extents.extend(y, x);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::Gfx;

    #[test]
    fn rect_clip_matches_scenario() {
        let mut ram = Ram::new();
        let mut gfx = Gfx::new();
        gfx.set_clip(0, 0, 10, 10);
        gfx.rect(&mut ram, 0, 0, 240, 136, 5);
        for y in 0..SCREEN_H as i32 {
            for x in 0..240 {
                let expected = if x < 10 && y < 10 { 5 } else { 0 };
                assert_eq!(ram.screen_pixel(x, y), expected);
            }
        }
    }

    #[test]
    fn filled_circle_has_no_gaps_on_center_row() {
        let mut ram = Ram::new();
        let gfx = Gfx::new();
        gfx.circ(&mut ram, 60, 60, 10, 5);
        for x in 50..=70 {
            assert_eq!(ram.screen_pixel(x, 60), 5, "gap at x={x}");
        }
    }

    #[test]
    fn filled_triangle_spans_each_row_once() {
        let mut ram = Ram::new();
        let gfx = Gfx::new();
        gfx.tri(&mut ram, 10, 10, 50, 10, 30, 40, 3);
        assert_eq!(ram.screen_pixel(30, 25), 3);
        assert_eq!(ram.screen_pixel(10, 10), 3);
    }
}
