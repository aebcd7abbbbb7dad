use std::path::PathBuf;

use image::RgbaImage;

use crate::canvas::{ImageRegion, PixelBuffer, RasterStats, ViewTransform};
use crate::components::colors::{self, ColorMap};
use crate::components::history::UndoManager;
use crate::error::EditError;
use crate::io::RasterData;
use crate::ops::brush::{self, DirtyRect};
use crate::ops::locate::{self, LocateTarget, Located};
use crate::ops::nan_fill::{self, NanFillPolicy};
use crate::settings::AppSettings;
use crate::{log_info, log_warn};

// ============================================================================
// INPUT TYPES
// ============================================================================

/// A pointer position in either coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CanvasPoint {
    /// Raster cell indices.
    Image { x: i32, y: i32 },
    /// Viewport pixels, mapped through the current view transform.
    Viewport { x: f64, y: f64 },
}

impl CanvasPoint {
    pub fn image(x: i32, y: i32) -> Self {
        CanvasPoint::Image { x, y }
    }

    pub fn viewport(x: f64, y: f64) -> Self {
        CanvasPoint::Viewport { x, y }
    }
}

/// One discrete user gesture, as produced by the input layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EditCommand {
    Brush { at: CanvasPoint, radius: u32, value: f64 },
    LineBrush { from: CanvasPoint, to: CanvasPoint, radius: u32, value: f64 },
    Pick { at: CanvasPoint },
    ReplaceAllNan(NanFillPolicy),
}

/// What an edit did, for the render layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EditOutcome {
    /// Stats after the edit (final once the gesture has ended).
    pub stats: RasterStats,
    /// Bounding box of changed cells, for partial re-render.
    pub touched: Option<DirtyRect>,
    /// Number of cell writes that changed a value.
    pub changed: usize,
    /// Value read by a pick.
    pub picked: Option<f64>,
}

/// Open brush stroke: everything between pointer-down and pointer-up.
#[derive(Clone, Debug)]
struct Stroke {
    radius: u32,
    value: f64,
    last: (i32, i32),
    dirty: Option<DirtyRect>,
    changed: usize,
}

impl Stroke {
    fn record(&mut self, cells: &[(i32, i32)]) -> Option<DirtyRect> {
        let rect = DirtyRect::bounding(cells)?;
        self.changed += cells.len();
        self.dirty = Some(match self.dirty {
            Some(d) => d.union(rect),
            None => rect,
        });
        Some(rect)
    }
}

// ============================================================================
// EDITOR SESSION
// ============================================================================

/// Single open raster with its view, history and derived stats.
///
/// The session owns all editing state; nothing is shared. Gestures follow
/// `begin_stroke → extend_stroke* → end_stroke`, and each gesture that
/// changes the raster commits exactly one history entry when it ends. The
/// history top is always the committed current state, so the pre-gesture
/// state is on the stack before a gesture's first write.
pub struct EditorSession {
    buffer: PixelBuffer,
    view: ViewTransform,
    history: UndoManager,
    stats: RasterStats,
    stroke: Option<Stroke>,
    settings: AppSettings,
    brush_value: f64,
    brush_radius: u32,

    /// Display name (file name or "Untitled")
    pub name: String,
    /// `None` for rasters that did not come from a file.
    pub path: Option<PathBuf>,
    /// Changed since load or the last `mark_saved`.
    pub is_dirty: bool,
}

impl EditorSession {
    /// Load `raster` into a fresh session.
    pub fn new(raster: RasterData, settings: AppSettings) -> Result<Self, EditError> {
        let buffer = raster.into_buffer()?;
        let view = ViewTransform::new(buffer.width(), buffer.height(), settings.viewport_width, settings.viewport_height);
        let mut history = UndoManager::new(settings.max_undo_steps);
        history.snapshot(&buffer);
        let stats = RasterStats::compute(&buffer);

        log_info!(
            "Loaded {}x{} raster ({} NaN, range {}..{})",
            buffer.width(),
            buffer.height(),
            stats.nan_count,
            stats.min,
            stats.max
        );

        Ok(Self {
            buffer,
            view,
            history,
            stats,
            stroke: None,
            brush_value: settings.brush_value,
            brush_radius: settings.brush_radius(),
            settings,
            name: "Untitled".to_string(),
            path: None,
            is_dirty: false,
        })
    }

    pub fn from_file(path: PathBuf, raster: RasterData, settings: AppSettings) -> Result<Self, EditError> {
        let mut session = Self::new(raster, settings)?;
        session.name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        session.path = Some(path);
        Ok(session)
    }

    /// Replace every piece of raster state with a newly loaded raster.
    ///
    /// Validation happens before anything is touched, so on error the
    /// current raster stays as it was. Brush settings and viewport size carry
    /// over.
    pub fn load(&mut self, raster: RasterData) -> Result<(), EditError> {
        let mut fresh = Self::new(raster, self.settings.clone())?;
        let (vw, vh) = self.view.viewport_size();
        fresh.view.set_viewport_size(vw, vh);
        fresh.view.reset(fresh.buffer.width(), fresh.buffer.height());
        fresh.brush_value = self.brush_value;
        fresh.brush_radius = self.brush_radius;
        *self = fresh;
        Ok(())
    }

    // --------------------------------------------------------------------
    // Accessors
    // --------------------------------------------------------------------

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    pub fn stats(&self) -> RasterStats {
        self.stats
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn brush_value(&self) -> f64 {
        self.brush_value
    }

    pub fn set_brush_value(&mut self, value: f64) {
        self.brush_value = value;
    }

    pub fn brush_radius(&self) -> u32 {
        self.brush_radius
    }

    pub fn set_brush_radius(&mut self, radius: u32) {
        self.brush_radius = radius;
    }

    pub fn can_undo(&self) -> bool {
        self.stroke.is_none() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.stroke.is_none() && self.history.can_redo()
    }

    pub fn mark_saved(&mut self) {
        self.is_dirty = false;
    }

    /// Map a pointer position to a raster cell.
    pub fn resolve(&self, point: CanvasPoint) -> (i32, i32) {
        match point {
            CanvasPoint::Image { x, y } => (x, y),
            CanvasPoint::Viewport { x, y } => self.view.viewport_to_image(x, y),
        }
    }

    // --------------------------------------------------------------------
    // Gesture lifecycle
    // --------------------------------------------------------------------

    /// Pointer-down: stamp the brush at `at`. An open stroke is ended first.
    pub fn begin_stroke(&mut self, at: CanvasPoint, radius: u32, value: f64) -> EditOutcome {
        if self.stroke.is_some() {
            self.end_stroke();
        }
        let (x, y) = self.resolve(at);
        let cells = brush::brush(&mut self.buffer, x, y, radius, value);
        let mut stroke = Stroke {
            radius,
            value,
            last: (x, y),
            dirty: None,
            changed: 0,
        };
        let touched = stroke.record(&cells);
        self.stroke = Some(stroke);
        EditOutcome {
            stats: self.stats,
            touched,
            changed: cells.len(),
            picked: None,
        }
    }

    /// Pointer-down with the session's current brush (`brush_radius`, and the
    /// value last set or picked).
    pub fn begin_brush_stroke(&mut self, at: CanvasPoint) -> EditOutcome {
        self.begin_stroke(at, self.brush_radius, self.brush_value)
    }

    /// Pointer-move: fill the gap from the previous sample to `to`.
    pub fn extend_stroke(&mut self, to: CanvasPoint) -> Result<EditOutcome, EditError> {
        let (x, y) = self.resolve(to);
        let stroke = self
            .stroke
            .as_mut()
            .ok_or_else(|| EditError::InvalidInput("no stroke in progress".to_string()))?;

        let cells = if stroke.last == (x, y) {
            Vec::new()
        } else {
            brush::line_brush(&mut self.buffer, stroke.last, (x, y), stroke.radius, stroke.value)
        };
        stroke.last = (x, y);
        let touched = stroke.record(&cells);

        Ok(EditOutcome {
            stats: self.stats,
            touched,
            changed: cells.len(),
            picked: None,
        })
    }

    /// Pointer-up: commit the stroke as one history entry and refresh stats.
    /// A stroke that changed nothing leaves the history alone.
    pub fn end_stroke(&mut self) -> EditOutcome {
        let Some(stroke) = self.stroke.take() else {
            return EditOutcome {
                stats: self.stats,
                touched: None,
                changed: 0,
                picked: None,
            };
        };

        if stroke.changed > 0 {
            self.commit(&format!("brush stroke ({} cells)", stroke.changed));
        }

        EditOutcome {
            stats: self.stats,
            touched: stroke.dirty,
            changed: stroke.changed,
            picked: None,
        }
    }

    fn commit(&mut self, description: &str) {
        self.history.snapshot(&self.buffer);
        self.stats = RasterStats::compute(&self.buffer);
        self.is_dirty = true;
        log_info!("Committed {} (history depth {})", description, self.history.undo_count());
    }

    // --------------------------------------------------------------------
    // Command dispatcher
    // --------------------------------------------------------------------

    /// Run one discrete gesture.
    pub fn apply(&mut self, command: EditCommand) -> Result<EditOutcome, EditError> {
        match command {
            EditCommand::Brush { at, radius, value } => {
                self.begin_stroke(at, radius, value);
                Ok(self.end_stroke())
            }
            EditCommand::LineBrush { from, to, radius, value } => {
                self.begin_stroke(from, radius, value);
                self.extend_stroke(to)?;
                Ok(self.end_stroke())
            }
            EditCommand::Pick { at } => {
                let value = self.pick(at);
                Ok(EditOutcome {
                    stats: self.stats,
                    touched: None,
                    changed: 0,
                    picked: Some(value),
                })
            }
            EditCommand::ReplaceAllNan(policy) => self.replace_all_nan(policy),
        }
    }

    /// Read the value under `at`. A non-NaN pick becomes the brush value.
    pub fn pick(&mut self, at: CanvasPoint) -> f64 {
        let (x, y) = self.resolve(at);
        let value = brush::pick_value(&self.buffer, x, y);
        if !value.is_nan() {
            self.brush_value = value;
        }
        value
    }

    /// Fill every NaN cell. Nothing is written (and no history entry is
    /// made) when the replacement cannot be resolved.
    pub fn replace_all_nan(&mut self, policy: NanFillPolicy) -> Result<EditOutcome, EditError> {
        if self.stroke.is_some() {
            self.end_stroke();
        }

        let replaced = match nan_fill::replace_all_nan(&mut self.buffer, policy) {
            Ok(n) => n,
            Err(e) => {
                log_warn!("NaN replacement ({}) rejected: {}", policy.describe(), e);
                return Err(e);
            }
        };

        let touched = if replaced > 0 {
            self.commit(&format!("NaN replacement, {} ({} cells)", policy.describe(), replaced));
            Some(DirtyRect {
                min_x: 0,
                min_y: 0,
                max_x: self.buffer.width() as i32 - 1,
                max_y: self.buffer.height() as i32 - 1,
            })
        } else {
            None
        };

        Ok(EditOutcome {
            stats: self.stats,
            touched,
            changed: replaced,
            picked: None,
        })
    }

    // --------------------------------------------------------------------
    // Undo / redo
    // --------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<&PixelBuffer, EditError> {
        if self.stroke.is_some() {
            return Err(EditError::GestureActive);
        }
        self.buffer = self.history.undo()?;
        self.stats = RasterStats::compute(&self.buffer);
        self.is_dirty = true;
        log_info!("Undo (history depth {}, redo {})", self.history.undo_count(), self.history.redo_count());
        Ok(&self.buffer)
    }

    pub fn redo(&mut self) -> Result<&PixelBuffer, EditError> {
        if self.stroke.is_some() {
            return Err(EditError::GestureActive);
        }
        self.buffer = self.history.redo()?;
        self.stats = RasterStats::compute(&self.buffer);
        self.is_dirty = true;
        log_info!("Redo (history depth {}, redo {})", self.history.undo_count(), self.history.redo_count());
        Ok(&self.buffer)
    }

    // --------------------------------------------------------------------
    // View
    // --------------------------------------------------------------------

    pub fn zoom_in(&mut self) -> bool {
        self.view.set_zoom(self.settings.zoom_step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.view.set_zoom(1.0 / self.settings.zoom_step)
    }

    pub fn zoom_by(&mut self, factor: f64) -> bool {
        self.view.set_zoom(factor)
    }

    pub fn zoom_to(&mut self, zoom: f64) -> bool {
        self.view.set_zoom_absolute(zoom)
    }

    pub fn zoom_at(&mut self, factor: f64, vx: f64, vy: f64) -> bool {
        self.view.zoom_at_point(factor, vx, vy)
    }

    /// Mouse-wheel zoom around the cursor; positive `delta_y` zooms out.
    pub fn wheel(&mut self, delta_y: f64, vx: f64, vy: f64) -> bool {
        let step = self.settings.wheel_zoom_step;
        let factor = if delta_y > 0.0 { 1.0 / step } else { step };
        self.view.zoom_at_point(factor, vx, vy)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.view.pan_by(dx, dy);
    }

    pub fn center_on(&mut self, ix: f64, iy: f64) {
        let (vw, vh) = self.view.viewport_size();
        self.view.center_on(ix, iy, vw, vh);
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.view.set_viewport_size(width, height);
    }

    /// Find `target` and centre the view on it.
    pub fn locate(&mut self, target: LocateTarget) -> Option<Located> {
        let hit = locate::locate(&self.buffer, target)?;
        self.center_on(hit.x as f64, hit.y as f64);
        Some(hit)
    }

    // --------------------------------------------------------------------
    // Render query / export
    // --------------------------------------------------------------------

    pub fn visible_region(&self) -> ImageRegion {
        self.view.visible_region()
    }

    /// The visible cells at one pixel per cell.
    pub fn render_visible(&self, colormap: ColorMap) -> RgbaImage {
        colors::render_region(&self.buffer, &self.stats, self.visible_region(), colormap)
    }

    /// The whole raster at one pixel per cell.
    pub fn render_full(&self, colormap: ColorMap) -> RgbaImage {
        let region = ImageRegion {
            x0: 0,
            y0: 0,
            x1: self.buffer.width(),
            y1: self.buffer.height(),
        };
        colors::render_region(&self.buffer, &self.stats, region, colormap)
    }

    /// What the viewport shows at the current zoom and pan.
    pub fn render_viewport(&self, colormap: ColorMap) -> RgbaImage {
        colors::render_viewport(&self.buffer, &self.stats, &self.view, colormap)
    }

    /// Copy of the current raster for serialisation.
    pub fn export(&self) -> RasterData {
        RasterData::from(&self.buffer)
    }
}
