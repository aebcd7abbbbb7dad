// ============================================================================
// Brush editing: disc stamps, interpolated strokes, value picking
// ============================================================================
//
// None of these functions snapshot: the session brackets a whole gesture with
// exactly one history entry, however many cells the gesture touches.

use crate::canvas::PixelBuffer;

/// Inclusive bounding box of cells changed by an edit, used as a partial
/// re-render hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl DirtyRect {
    pub fn from_point(x: i32, y: i32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    pub fn include(&mut self, x: i32, y: i32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        DirtyRect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x + 1) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y + 1) as u32
    }

    /// Bounding box of a cell list, `None` when empty.
    pub fn bounding(cells: &[(i32, i32)]) -> Option<DirtyRect> {
        let (&(x, y), rest) = cells.split_first()?;
        let mut rect = DirtyRect::from_point(x, y);
        for &(x, y) in rest {
            rect.include(x, y);
        }
        Some(rect)
    }
}

/// Stamp a disc of `radius` centred on `(center_x, center_y)`.
///
/// A cell is inside when `dx² + dy² <= radius²`. Returns the cells whose
/// value actually changed, in row-major order.
pub fn brush(buffer: &mut PixelBuffer, center_x: i32, center_y: i32, radius: u32, value: f64) -> Vec<(i32, i32)> {
    let r = radius as i64;
    let r2 = (r as i128) * (r as i128);
    let cx = center_x as i64;
    let cy = center_y as i64;

    // Cells off the raster can never change, so only walk the overlap.
    let x_lo = (cx - r).max(0);
    let y_lo = (cy - r).max(0);
    let x_hi = (cx + r).min(buffer.width() as i64 - 1);
    let y_hi = (cy + r).min(buffer.height() as i64 - 1);

    let mut touched = Vec::new();
    if x_lo > x_hi || y_lo > y_hi {
        return touched;
    }

    for y in y_lo..=y_hi {
        let dy = (y - cy) as i128;
        for x in x_lo..=x_hi {
            let dx = (x - cx) as i128;
            if dx * dx + dy * dy > r2 {
                continue;
            }
            if buffer.set(x as i32, y as i32, value) {
                touched.push((x as i32, y as i32));
            }
        }
    }

    touched
}

/// Bresenham walk over grid cells, endpoints inclusive.
struct LineWalk {
    x: i64,
    y: i64,
    end: (i64, i64),
    dx: i64,
    dy: i64,
    sx: i64,
    sy: i64,
    err: i64,
    done: bool,
}

impl LineWalk {
    fn new(start: (i32, i32), end: (i32, i32)) -> Self {
        let (x0, y0) = (start.0 as i64, start.1 as i64);
        let (x1, y1) = (end.0 as i64, end.1 as i64);
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        Self {
            x: x0,
            y: y0,
            end: (x1, y1),
            dx,
            dy,
            sx: if x0 < x1 { 1 } else { -1 },
            sy: if y0 < y1 { 1 } else { -1 },
            err: dx - dy,
            done: false,
        }
    }
}

impl Iterator for LineWalk {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        if self.done {
            return None;
        }
        // Every visited cell lies between the two i32 endpoints.
        let cell = (self.x as i32, self.y as i32);
        if (self.x, self.y) == self.end {
            self.done = true;
            return Some(cell);
        }
        let e2 = 2 * self.err;
        if e2 > -self.dy {
            self.err -= self.dy;
            self.x += self.sx;
        }
        if e2 < self.dx {
            self.err += self.dx;
            self.y += self.sy;
        }
        Some(cell)
    }
}

/// Grid cells from `start` to `end` inclusive, Bresenham stepping.
///
/// Consecutive cells are 8-connected, so stamping a disc at each one leaves
/// no gaps between two sampled pointer positions.
pub fn line_cells(start: (i32, i32), end: (i32, i32)) -> Vec<(i32, i32)> {
    LineWalk::new(start, end).collect()
}

/// Clip the segment to the cells whose disc of `radius` can reach the raster
/// (Liang-Barsky against `[-r, w-1+r] x [-r, h-1+r]`). Endpoints that survive
/// unclipped are returned exactly; clipped ones are rounded to the nearest
/// cell.
pub fn clip_stroke(
    start: (i32, i32),
    end: (i32, i32),
    radius: u32,
    width: u32,
    height: u32,
) -> Option<((i32, i32), (i32, i32))> {
    if width == 0 || height == 0 {
        return None;
    }
    let r = radius as f64;
    let (x_min, x_max) = (-r, (width - 1) as f64 + r);
    let (y_min, y_max) = (-r, (height - 1) as f64 + r);

    let (x0, y0) = (start.0 as f64, start.1 as f64);
    let dx = end.0 as f64 - x0;
    let dy = end.1 as f64 - y0;

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [(-dx, x0 - x_min), (dx, x_max - x0), (-dy, y0 - y_min), (dy, y_max - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }

    let at = |t: f64| ((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
    let from = if t0 == 0.0 { start } else { at(t0) };
    let to = if t1 == 1.0 { end } else { at(t1) };
    Some((from, to))
}

/// True when a disc at `(cx, cy)` reaches every cell of the raster.
fn covers_raster(buffer: &PixelBuffer, cx: i32, cy: i32, radius: u32) -> bool {
    let far = |c: i64, len: u32| c.abs().max((c - (len as i64 - 1)).abs()) as i128;
    let fx = far(cx as i64, buffer.width());
    let fy = far(cy as i64, buffer.height());
    let r = radius as i128;
    fx * fx + fy * fy <= r * r
}

/// Stamp the disc brush at every cell of the line from `start` to `end`.
///
/// Only the part of the line whose stamps can reach the raster is walked, and
/// the walk stops once a single stamp has covered the whole raster.
pub fn line_brush(buffer: &mut PixelBuffer, start: (i32, i32), end: (i32, i32), radius: u32, value: f64) -> Vec<(i32, i32)> {
    let mut touched = Vec::new();
    let Some((from, to)) = clip_stroke(start, end, radius, buffer.width(), buffer.height()) else {
        return touched;
    };
    for (x, y) in LineWalk::new(from, to) {
        touched.extend(brush(buffer, x, y, radius, value));
        if covers_raster(buffer, x, y, radius) {
            break;
        }
    }
    touched
}

/// Read a sample without mutating; NaN off the raster.
pub fn pick_value(buffer: &PixelBuffer, x: i32, y: i32) -> f64 {
    buffer.get(x, y)
}
