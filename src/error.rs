// ============================================================================
// Edit errors: every failure the editing core can report
// ============================================================================

/// Failures produced by the raster editing core.
///
/// None of these are fatal to a session: the buffer is always left in a
/// consistent state and the caller can keep editing.
#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    /// Coordinate outside `[0, width) × [0, height)`.
    OutOfBounds { x: i32, y: i32 },
    /// The undo stack holds only the current state.
    NothingToUndo,
    /// The redo stack is empty.
    NothingToRedo,
    /// A statistic was requested over a buffer with no non-NaN values.
    NoValidData,
    /// Malformed numeric input (bad constant, wrong buffer length, ...).
    InvalidInput(String),
    /// Undo/redo requested while a stroke is still open.
    GestureActive,
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::OutOfBounds { x, y } => write!(f, "coordinate ({}, {}) is outside the raster", x, y),
            EditError::NothingToUndo => write!(f, "nothing to undo"),
            EditError::NothingToRedo => write!(f, "nothing to redo"),
            EditError::NoValidData => write!(f, "no valid (non-NaN) values available for statistics"),
            EditError::InvalidInput(e) => write!(f, "invalid input: {}", e),
            EditError::GestureActive => write!(f, "a stroke is still in progress"),
        }
    }
}

impl std::error::Error for EditError {}
