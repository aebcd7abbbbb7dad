//! Tests for the bounded undo/redo history

use tiffedit::{EditError, MAX_UNDO_DEPTH, PixelBuffer, UndoManager};

fn state(value: f64) -> PixelBuffer {
    PixelBuffer::filled(2, 2, value)
}

#[test]
fn test_initial_state_cannot_be_undone() {
    let mut history = UndoManager::default();
    history.snapshot(&state(0.0));

    assert!(!history.can_undo());
    assert_eq!(history.undo().err(), Some(EditError::NothingToUndo));
    assert_eq!(history.redo().err(), Some(EditError::NothingToRedo));
}

#[test]
fn test_undo_then_redo_is_identity() {
    let mut history = UndoManager::default();
    history.snapshot(&state(0.0));
    history.snapshot(&state(1.0));

    let undone = history.undo().unwrap();
    assert_eq!(undone, state(0.0));
    assert!(history.can_redo());

    let redone = history.redo().unwrap();
    assert_eq!(redone, state(1.0));
    assert!(!history.can_redo());
    assert_eq!(history.current().map(|s| s.values().to_vec()), Some(vec![1.0; 4]));
}

#[test]
fn test_new_snapshot_clears_redo() {
    let mut history = UndoManager::default();
    history.snapshot(&state(0.0));
    history.snapshot(&state(1.0));
    history.undo().unwrap();

    history.snapshot(&state(2.0));
    assert!(!history.can_redo());
    assert_eq!(history.redo().err(), Some(EditError::NothingToRedo));

    assert_eq!(history.undo().unwrap(), state(0.0));
}

#[test]
fn test_depth_is_bounded_and_oldest_evicted() {
    let mut history = UndoManager::default();
    for i in 0..25 {
        history.snapshot(&state(i as f64));
    }
    assert_eq!(history.undo_count(), MAX_UNDO_DEPTH);

    let mut last = None;
    for _ in 0..MAX_UNDO_DEPTH - 1 {
        last = Some(history.undo().unwrap());
    }
    // States 0..=4 were evicted
    assert_eq!(last, Some(state(5.0)));
    assert_eq!(history.undo().err(), Some(EditError::NothingToUndo));
    assert_eq!(history.redo_count(), MAX_UNDO_DEPTH - 1);
}

#[test]
fn test_custom_depth_has_floor_of_two() {
    let history = UndoManager::new(0);
    assert_eq!(history.max_depth(), 2);

    let mut history = UndoManager::new(3);
    for i in 0..10 {
        history.snapshot(&state(i as f64));
    }
    assert_eq!(history.undo_count(), 3);
}

#[test]
fn test_snapshots_are_independent_copies() {
    let mut history = UndoManager::default();
    let mut buffer = state(0.0);
    history.snapshot(&buffer);
    buffer.set(0, 0, 42.0);
    history.snapshot(&buffer);

    let mut restored = history.undo().unwrap();
    assert_eq!(restored.get(0, 0), 0.0);
    restored.set(1, 1, -1.0);
    assert_eq!(history.redo().unwrap().get(1, 1), 0.0);
}

#[test]
fn test_memory_usage_tracks_both_stacks() {
    let mut history = UndoManager::default();
    let per_state = state(0.0).memory_bytes();
    history.snapshot(&state(0.0));
    history.snapshot(&state(1.0));
    history.snapshot(&state(2.0));
    assert_eq!(history.memory_usage(), 3 * per_state);

    history.undo().unwrap();
    assert_eq!(history.memory_usage(), 3 * per_state);

    // Dropping redo on a new snapshot frees it
    history.snapshot(&state(3.0));
    assert_eq!(history.memory_usage(), 3 * per_state);

    history.clear();
    assert_eq!(history.memory_usage(), 0);
    assert_eq!(history.undo_count(), 0);
}
