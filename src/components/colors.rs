use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::canvas::{ImageRegion, PixelBuffer, RasterStats, ViewTransform};

/// Fixed appearance of no-data cells: half-transparent grey.
pub const NAN_COLOR: Rgba<u8> = Rgba([128, 128, 128, 128]);

/// Viewport pixels that fall outside the raster.
pub const OFF_IMAGE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 0]);

// ============================================================================
// COLOR MAPS
// ============================================================================

/// Colour scale applied to normalised sample values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColorMap {
    #[default]
    Grayscale,
    Viridis,
    Plasma,
    Terrain,
}

impl ColorMap {
    pub fn all() -> &'static [ColorMap] {
        &[ColorMap::Grayscale, ColorMap::Viridis, ColorMap::Plasma, ColorMap::Terrain]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorMap::Grayscale => "grayscale",
            ColorMap::Viridis => "viridis",
            ColorMap::Plasma => "plasma",
            ColorMap::Terrain => "terrain",
        }
    }

    /// Lenient lookup by name; unknown names give `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "grayscale" | "greyscale" | "gray" | "grey" => Some(ColorMap::Grayscale),
            "viridis" => Some(ColorMap::Viridis),
            "plasma" => Some(ColorMap::Plasma),
            "terrain" => Some(ColorMap::Terrain),
            _ => None,
        }
    }

    /// RGB for a normalised value `t` (clamped to `[0, 1]`).
    pub fn map(&self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        use std::f64::consts::PI;
        match self {
            ColorMap::Grayscale => {
                let c = (t * 255.0).floor() as u8;
                [c, c, c]
            }
            ColorMap::Viridis => {
                let r = (t * PI).sin() * 127.0 + (t * PI / 2.0).cos() * 128.0;
                let g = (t * PI + 2.0 * PI / 3.0).sin() * 127.0 + (t * PI / 2.0 + PI / 3.0).cos() * 128.0;
                let b = (t * PI + 4.0 * PI / 3.0).sin() * 127.0 + (t * PI / 2.0 + 2.0 * PI / 3.0).cos() * 128.0;
                [channel(r), channel(g), channel(b)]
            }
            ColorMap::Plasma => {
                let r = (t * PI * 1.5).sin() * 200.0 + 55.0;
                let g = (t * PI * 0.8).cos() * 100.0 + 155.0;
                let b = (t * PI * 0.5 + PI / 2.0).sin() * 200.0 + 55.0;
                [channel(r), channel(g), channel(b)]
            }
            ColorMap::Terrain => {
                if t < 0.2 {
                    [0, 0, 128]
                } else if t < 0.4 {
                    [0, 128, 255]
                } else if t < 0.5 {
                    [255, 255, 128]
                } else if t < 0.7 {
                    [0, 192, 0]
                } else if t < 0.9 {
                    [128, 128, 128]
                } else {
                    [255, 255, 255]
                }
            }
        }
    }

    /// Full RGBA for a raw sample, normalised over `stats`.
    pub fn color_for(&self, value: f64, stats: &RasterStats) -> Rgba<u8> {
        match stats.normalize(value) {
            Some(t) => {
                let [r, g, b] = self.map(t);
                Rgba([r, g, b, 255])
            }
            None => NAN_COLOR,
        }
    }
}

impl std::str::FromStr for ColorMap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown colormap '{}'", s))
    }
}

#[inline]
fn channel(v: f64) -> u8 {
    v.floor().clamp(0.0, 255.0) as u8
}

// ============================================================================
// RENDERING
// ============================================================================

/// Render `region` at one RGBA pixel per raster cell.
pub fn render_region(buffer: &PixelBuffer, stats: &RasterStats, region: ImageRegion, colormap: ColorMap) -> RgbaImage {
    let w = region.width().min(buffer.width().saturating_sub(region.x0));
    let h = region.height().min(buffer.height().saturating_sub(region.y0));
    let mut out = RgbaImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let src_w = buffer.width() as usize;
    let values = buffer.values();
    let row_bytes = w as usize * 4;

    let raw: &mut [u8] = &mut out;
    raw.par_chunks_mut(row_bytes).enumerate().for_each(|(row, dst)| {
        let sy = region.y0 as usize + row;
        let start = sy * src_w + region.x0 as usize;
        let src = &values[start..start + w as usize];
        for (px, &v) in dst.chunks_exact_mut(4).zip(src) {
            px.copy_from_slice(&colormap.color_for(v, stats).0);
        }
    });

    out
}

/// Render what the viewport shows: one output pixel per viewport pixel,
/// nearest-neighbour sampled through the view transform.
pub fn render_viewport(buffer: &PixelBuffer, stats: &RasterStats, view: &ViewTransform, colormap: ColorMap) -> RgbaImage {
    let (vw, vh) = view.viewport_size();
    let w = vw.max(0.0).round() as u32;
    let h = vh.max(0.0).round() as u32;
    let mut out = RgbaImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let row_bytes = w as usize * 4;
    let raw: &mut [u8] = &mut out;
    raw.par_chunks_mut(row_bytes).enumerate().for_each(|(row, dst)| {
        let vy = row as f64 + 0.5;
        for (col, px) in dst.chunks_exact_mut(4).enumerate() {
            let (ix, iy) = view.viewport_to_image(col as f64 + 0.5, vy);
            let color = if buffer.in_bounds(ix, iy) {
                colormap.color_for(buffer.get(ix, iy), stats)
            } else {
                OFF_IMAGE_COLOR
            };
            px.copy_from_slice(&color.0);
        }
    });

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_spans_black_to_white() {
        assert_eq!(ColorMap::Grayscale.map(0.0), [0, 0, 0]);
        assert_eq!(ColorMap::Grayscale.map(1.0), [255, 255, 255]);
        assert_eq!(ColorMap::Grayscale.map(7.0), [255, 255, 255]);
    }

    #[test]
    fn terrain_bands() {
        assert_eq!(ColorMap::Terrain.map(0.1), [0, 0, 128]);
        assert_eq!(ColorMap::Terrain.map(0.45), [255, 255, 128]);
        assert_eq!(ColorMap::Terrain.map(0.95), [255, 255, 255]);
    }

    #[test]
    fn names_round_trip() {
        for cm in ColorMap::all() {
            assert_eq!(ColorMap::from_name(cm.name()), Some(*cm));
        }
        assert_eq!(ColorMap::from_name("Grey"), Some(ColorMap::Grayscale));
        assert!("jet".parse::<ColorMap>().is_err());
    }

    #[test]
    fn nan_cells_use_sentinel_color() {
        let stats = RasterStats::default();
        assert_eq!(ColorMap::Viridis.color_for(f64::NAN, &stats), NAN_COLOR);
    }
}
