use crate::error::EditError;

// ============================================================================
// PIXEL BUFFER - single-band f64 raster, NaN = no data
// ============================================================================

/// Returns `true` when two samples are the same value, treating NaN as equal
/// to NaN so that rewriting a no-data cell with NaN is not a change.
#[inline]
pub fn same_sample(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// A width×height single-band raster stored row-major (`index = y * width + x`).
///
/// Dimensions are fixed for the buffer's lifetime; `values.len()` always
/// equals `width * height`.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl PixelBuffer {
    /// Create a buffer where every cell is NaN.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, f64::NAN)
    }

    pub fn filled(width: u32, height: u32, value: f64) -> Self {
        Self {
            width,
            height,
            values: vec![value; width as usize * height as usize],
        }
    }

    /// Wrap an existing row-major sample vector.
    pub fn from_values(width: u32, height: u32, values: Vec<f64>) -> Result<Self, EditError> {
        let expected = width as usize * height as usize;
        if values.len() != expected {
            return Err(EditError::InvalidInput(format!(
                "{} samples supplied for a {}x{} raster (expected {})",
                values.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self { width, height, values })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Row-major index of `(x, y)`, or `OutOfBounds`.
    pub fn checked_index(&self, x: i32, y: i32) -> Result<usize, EditError> {
        if self.in_bounds(x, y) {
            Ok(y as usize * self.width as usize + x as usize)
        } else {
            Err(EditError::OutOfBounds { x, y })
        }
    }

    /// Sample at `(x, y)`; NaN when the coordinate is off the raster.
    pub fn get(&self, x: i32, y: i32) -> f64 {
        match self.checked_index(x, y) {
            Ok(idx) => self.values[idx],
            Err(_) => f64::NAN,
        }
    }

    /// Write `value` at `(x, y)`.
    ///
    /// Returns `false` without touching the buffer when the coordinate is off
    /// the raster or the cell already holds the same value (NaN == NaN).
    pub fn set(&mut self, x: i32, y: i32, value: f64) -> bool {
        let Ok(idx) = self.checked_index(x, y) else {
            return false;
        };
        if same_sample(self.values[idx], value) {
            return false;
        }
        self.values[idx] = value;
        true
    }

    pub fn nan_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Approximate heap footprint in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<f64>()
    }
}

// ============================================================================
// RASTER STATS - display range + no-data count
// ============================================================================

/// Value range used to normalise samples for display, plus the NaN count.
///
/// `min < max` always holds so that `(v - min) / (max - min)` never divides
/// by zero; degenerate rasters get a widened fallback range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterStats {
    pub min: f64,
    pub max: f64,
    pub nan_count: usize,
}

impl Default for RasterStats {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            nan_count: 0,
        }
    }
}

impl RasterStats {
    /// Full linear scan of the buffer.
    pub fn compute(buffer: &PixelBuffer) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut nan_count = 0usize;
        let mut finite = 0usize;

        for &v in buffer.values() {
            if v.is_nan() {
                nan_count += 1;
                continue;
            }
            // Infinities render at the ends of the ramp but never set the range.
            if v.is_infinite() {
                continue;
            }
            finite += 1;
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }

        // No finite sample (all NaN, all infinite, or empty)
        if finite == 0 {
            return Self {
                min: 0.0,
                max: 1.0,
                nan_count,
            };
        }

        if min == max {
            let value = min;
            if value == 0.0 {
                max = min + 1.0;
            } else {
                let half = 0.5 * value.abs();
                min = value - half;
                max = value + half;
            }
            if min == max {
                max = min + 1.0;
            }
        }

        Self { min, max, nan_count }
    }

    /// Map `v` into `[0, 1]` over the display range. `None` for NaN.
    pub fn normalize(&self, v: f64) -> Option<f64> {
        if v.is_nan() {
            return None;
        }
        let range = self.max - self.min;
        let t = if range > 0.0 { (v - self.min) / range } else { 0.0 };
        Some(t.clamp(0.0, 1.0))
    }
}

// ============================================================================
// VIEW TRANSFORM - zoom + pan between image and viewport space
// ============================================================================

pub const MIN_ZOOM: f64 = 0.05;
pub const MAX_ZOOM: f64 = 100.0;
/// Zoom changes smaller than this are ignored.
pub const ZOOM_EPSILON: f64 = 0.001;
/// Fraction of the image extent the viewport may stray past each edge.
pub const PAN_MARGIN: f64 = 0.1;

/// Half-open rectangle of raster cells `[x0, x1) × [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ImageRegion {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl ImageRegion {
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Zoom factor and pan offset of the viewport over the raster.
///
/// `pan_x`/`pan_y` are the image-space coordinates of the viewport's top-left
/// corner, so `viewport = (image - pan) * zoom`.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
    image_width: f64,
    image_height: f64,
    viewport_width: f64,
    viewport_height: f64,
}

impl ViewTransform {
    pub fn new(image_width: u32, image_height: u32, viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            image_width: image_width as f64,
            image_height: image_height as f64,
            viewport_width: viewport_width.max(0.0),
            viewport_height: viewport_height.max(0.0),
        }
    }

    /// Back to zoom 1 and pan (0, 0) for a freshly loaded raster.
    pub fn reset(&mut self, image_width: u32, image_height: u32) {
        self.zoom = 1.0;
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        self.image_width = image_width as f64;
        self.image_height = image_height as f64;
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> (f64, f64) {
        (self.pan_x, self.pan_y)
    }

    pub fn viewport_size(&self) -> (f64, f64) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_width = width.max(0.0);
        self.viewport_height = height.max(0.0);
        self.clamp_pan();
    }

    pub fn image_to_viewport(&self, ix: f64, iy: f64) -> (f64, f64) {
        ((ix - self.pan_x) * self.zoom, (iy - self.pan_y) * self.zoom)
    }

    /// Continuous image coordinate under a viewport point.
    pub fn viewport_to_image_f(&self, vx: f64, vy: f64) -> (f64, f64) {
        (vx / self.zoom + self.pan_x, vy / self.zoom + self.pan_y)
    }

    /// Integer pixel index under a viewport point (floored).
    pub fn viewport_to_image(&self, vx: f64, vy: f64) -> (i32, i32) {
        let (ix, iy) = self.viewport_to_image_f(vx, vy);
        (ix.floor() as i32, iy.floor() as i32)
    }

    /// Multiply the zoom by `factor`. Returns `false` when the clamped change
    /// is negligible.
    pub fn set_zoom(&mut self, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let new_zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - self.zoom).abs() < ZOOM_EPSILON {
            return false;
        }
        self.zoom = new_zoom;
        self.clamp_pan();
        true
    }

    /// Jump to an absolute zoom, keeping the image point at the viewport
    /// centre fixed.
    pub fn set_zoom_absolute(&mut self, value: f64) -> bool {
        if !value.is_finite() || value <= 0.0 {
            return false;
        }
        let new_zoom = value.clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - self.zoom).abs() < ZOOM_EPSILON {
            return false;
        }
        let cx = self.viewport_width / 2.0;
        let cy = self.viewport_height / 2.0;
        let (center_x, center_y) = self.viewport_to_image_f(cx, cy);
        self.zoom = new_zoom;
        self.pan_x = center_x - cx / new_zoom;
        self.pan_y = center_y - cy / new_zoom;
        self.clamp_pan();
        true
    }

    /// Zoom by `factor` keeping the image point under `(vx, vy)` stationary.
    pub fn zoom_at_point(&mut self, factor: f64, vx: f64, vy: f64) -> bool {
        let (anchor_x, anchor_y) = self.viewport_to_image_f(vx, vy);
        if !self.set_zoom(factor) {
            return false;
        }
        self.pan_x = anchor_x - vx / self.zoom;
        self.pan_y = anchor_y - vy / self.zoom;
        self.clamp_pan();
        true
    }

    /// Drag the image by a viewport-space delta.
    pub fn pan_by(&mut self, delta_x: f64, delta_y: f64) {
        self.pan_x -= delta_x / self.zoom;
        self.pan_y -= delta_y / self.zoom;
        self.clamp_pan();
    }

    /// Put image point `(ix, iy)` at the centre of a viewport of the given size.
    pub fn center_on(&mut self, ix: f64, iy: f64, viewport_width: f64, viewport_height: f64) {
        self.viewport_width = viewport_width.max(0.0);
        self.viewport_height = viewport_height.max(0.0);
        self.pan_x = ix - (self.viewport_width / self.zoom) / 2.0;
        self.pan_y = iy - (self.viewport_height / self.zoom) / 2.0;
        self.clamp_pan();
    }

    /// Allowed pan range on one axis. When the viewport is wider than the
    /// padded image the upper bound falls below the lower one; the lower
    /// bound then wins.
    fn pan_limits(image_extent: f64, viewport_extent: f64, zoom: f64) -> (f64, f64) {
        let lo = -PAN_MARGIN * image_extent;
        let hi = (1.0 + PAN_MARGIN) * image_extent - viewport_extent / zoom;
        (lo, hi)
    }

    pub fn pan_range_x(&self) -> (f64, f64) {
        Self::pan_limits(self.image_width, self.viewport_width, self.zoom)
    }

    pub fn pan_range_y(&self) -> (f64, f64) {
        Self::pan_limits(self.image_height, self.viewport_height, self.zoom)
    }

    fn clamp_pan(&mut self) {
        let (lo_x, hi_x) = self.pan_range_x();
        let (lo_y, hi_y) = self.pan_range_y();
        self.pan_x = self.pan_x.min(hi_x).max(lo_x);
        self.pan_y = self.pan_y.min(hi_y).max(lo_y);
    }

    /// Raster cells covered (even partially) by the viewport.
    pub fn visible_region(&self) -> ImageRegion {
        let vis_w = self.viewport_width / self.zoom;
        let vis_h = self.viewport_height / self.zoom;
        let x0 = self.pan_x.max(0.0).floor().min(self.image_width);
        let y0 = self.pan_y.max(0.0).floor().min(self.image_height);
        let x1 = (self.pan_x + vis_w + 1.0).min(self.image_width).ceil().max(x0);
        let y1 = (self.pan_y + vis_h + 1.0).min(self.image_height).ceil().max(y0);
        ImageRegion {
            x0: x0 as u32,
            y0: y0 as u32,
            x1: x1 as u32,
            y1: y1 as u32,
        }
    }
}
