use std::collections::VecDeque;
use std::sync::Arc;

use crate::canvas::PixelBuffer;
use crate::error::EditError;

/// Default cap on retained undo entries.
pub const MAX_UNDO_DEPTH: usize = 20;

// ============================================================================
// SNAPSHOT - immutable copy of a buffer state
// ============================================================================

/// Immutable copy of a raster state captured for undo/redo.
///
/// Samples live behind an `Arc`, so moving a snapshot between the undo and
/// redo stacks never copies pixel data; only restoring does.
#[derive(Clone, Debug)]
pub struct Snapshot {
    width: u32,
    height: u32,
    values: Arc<[f64]>,
}

impl Snapshot {
    pub fn capture(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width(),
            height: buffer.height(),
            values: Arc::from(buffer.values()),
        }
    }

    /// Materialise a fresh, independently mutable buffer.
    pub fn restore(&self) -> PixelBuffer {
        // Dimensions come from a valid buffer, so the length always matches.
        PixelBuffer::from_values(self.width, self.height, self.values.to_vec())
            .unwrap_or_else(|_| PixelBuffer::new(self.width, self.height))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn memory_size(&self) -> usize {
        self.values.len() * std::mem::size_of::<f64>()
    }
}

// ============================================================================
// UNDO MANAGER - bounded snapshot history
// ============================================================================

/// Bounded undo/redo history of whole-buffer snapshots.
///
/// The top of the undo stack is always the current committed state, so at
/// least two entries are needed before anything can be undone. When the
/// stack outgrows its depth the oldest entry is evicted (FIFO eviction, LIFO
/// access). Any new snapshot invalidates the redo stack.
pub struct UndoManager {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_depth: usize,
    /// Running memory total across both stacks.
    total_memory: usize,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(MAX_UNDO_DEPTH)
    }
}

impl UndoManager {
    /// `max_depth` below 2 would make undo impossible, so it is raised to 2.
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(2),
            total_memory: 0,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Deep-copy `buffer` onto the undo stack and clear redo.
    pub fn snapshot(&mut self, buffer: &PixelBuffer) {
        for snap in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(snap.memory_size());
        }

        let snap = Snapshot::capture(buffer);
        self.total_memory += snap.memory_size();
        self.undo_stack.push_back(snap);

        self.prune();
    }

    /// Step back one state. The current top moves to the redo stack and a
    /// copy of the new top is returned.
    pub fn undo(&mut self) -> Result<PixelBuffer, EditError> {
        if self.undo_stack.len() <= 1 {
            return Err(EditError::NothingToUndo);
        }
        let current = self.undo_stack.pop_back().ok_or(EditError::NothingToUndo)?;
        self.redo_stack.push(current);
        self.undo_stack
            .back()
            .map(Snapshot::restore)
            .ok_or(EditError::NothingToUndo)
    }

    /// Re-apply the most recently undone state.
    pub fn redo(&mut self) -> Result<PixelBuffer, EditError> {
        let snap = self.redo_stack.pop().ok_or(EditError::NothingToRedo)?;
        let restored = snap.restore();
        self.undo_stack.push_back(snap);
        self.prune();
        Ok(restored)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Current committed state, if any.
    pub fn current(&self) -> Option<&Snapshot> {
        self.undo_stack.back()
    }

    /// Undo entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.undo_stack.iter()
    }

    /// Memory held by both stacks (O(1) via cached total).
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    fn prune(&mut self) {
        while self.undo_stack.len() > self.max_depth {
            if let Some(removed) = self.undo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
        }
    }
}
