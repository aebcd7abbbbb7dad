//! Single-band raster editing core: pixel buffer, view transform, brush and
//! NaN-fill edits, bounded undo/redo and range statistics, plus TIFF I/O,
//! Rhai edit scripts and a headless CLI on top.

#[macro_use]
pub mod logger;

pub mod canvas;
pub mod cli;
pub mod components;
pub mod error;
pub mod io;
pub mod ops;
pub mod project;
pub mod settings;

pub use canvas::{ImageRegion, PixelBuffer, RasterStats, ViewTransform};
pub use components::colors::ColorMap;
pub use components::history::{MAX_UNDO_DEPTH, UndoManager};
pub use error::EditError;
pub use io::RasterData;
pub use project::{CanvasPoint, EditCommand, EditOutcome, EditorSession};
pub use settings::AppSettings;
