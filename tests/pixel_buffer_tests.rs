//! Tests for the pixel buffer and the derived range statistics

use tiffedit::{EditError, PixelBuffer, RasterStats};

fn sample_buffer() -> PixelBuffer {
    // 3x2, row-major
    PixelBuffer::from_values(3, 2, vec![1.0, 2.0, 3.0, 4.0, f64::NAN, 6.0]).unwrap()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_buffer_is_all_nan() {
    let buffer = PixelBuffer::new(4, 3);
    assert_eq!(buffer.len(), 12);
    assert_eq!(buffer.nan_count(), 12);
}

#[test]
fn test_from_values_rejects_wrong_length() {
    let result = PixelBuffer::from_values(3, 3, vec![0.0; 8]);
    assert!(matches!(result, Err(EditError::InvalidInput(_))));
}

#[test]
fn test_zero_sized_buffer() {
    let buffer = PixelBuffer::new(0, 0);
    assert!(buffer.is_empty());
    assert!(buffer.get(0, 0).is_nan());
}

// ============================================================================
// Indexing
// ============================================================================

#[test]
fn test_row_major_indexing() {
    let buffer = sample_buffer();
    assert_eq!(buffer.get(2, 0), 3.0);
    assert_eq!(buffer.get(0, 1), 4.0);
    assert_eq!(buffer.checked_index(2, 1), Ok(5));
}

#[test]
fn test_out_of_bounds_reads_are_nan() {
    let buffer = sample_buffer();
    assert!(buffer.get(-1, 0).is_nan());
    assert!(buffer.get(3, 0).is_nan());
    assert!(buffer.get(0, 2).is_nan());
    assert_eq!(buffer.checked_index(3, 0), Err(EditError::OutOfBounds { x: 3, y: 0 }));
}

#[test]
fn test_out_of_bounds_writes_are_ignored() {
    let mut buffer = sample_buffer();
    let before = buffer.clone();
    assert!(!buffer.set(-1, -1, 9.0));
    assert!(!buffer.set(3, 1, 9.0));
    assert_eq!(buffer, before);
}

#[test]
fn test_set_reports_change() {
    let mut buffer = sample_buffer();
    assert!(buffer.set(0, 0, 10.0));
    assert!(!buffer.set(0, 0, 10.0));
    assert_eq!(buffer.get(0, 0), 10.0);
}

#[test]
fn test_writing_nan_over_nan_is_not_a_change() {
    let mut buffer = sample_buffer();
    assert!(!buffer.set(1, 1, f64::NAN));
    assert!(buffer.set(0, 0, f64::NAN));
    assert_eq!(buffer.nan_count(), 2);
}

// ============================================================================
// Stats
// ============================================================================

#[test]
fn test_stats_ignore_nan() {
    let stats = RasterStats::compute(&sample_buffer());
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 6.0);
    assert_eq!(stats.nan_count, 1);
}

#[test]
fn test_stats_all_nan_falls_back_to_unit_range() {
    let stats = RasterStats::compute(&PixelBuffer::new(5, 5));
    assert_eq!((stats.min, stats.max, stats.nan_count), (0.0, 1.0, 25));
}

#[test]
fn test_stats_single_value_is_widened() {
    let stats = RasterStats::compute(&PixelBuffer::filled(2, 2, 4.0));
    assert_eq!((stats.min, stats.max), (2.0, 6.0));

    let stats = RasterStats::compute(&PixelBuffer::filled(2, 2, -4.0));
    assert_eq!((stats.min, stats.max), (-6.0, -2.0));
}

#[test]
fn test_stats_all_zero_gets_unit_range() {
    let stats = RasterStats::compute(&PixelBuffer::filled(3, 1, 0.0));
    assert_eq!((stats.min, stats.max), (0.0, 1.0));
    assert!(stats.min < stats.max);
}

#[test]
fn test_stats_skip_infinities() {
    let stats = RasterStats::compute(&PixelBuffer::filled(2, 2, f64::INFINITY));
    assert_eq!((stats.min, stats.max, stats.nan_count), (0.0, 1.0, 0));

    let buffer = PixelBuffer::from_values(2, 2, vec![f64::NEG_INFINITY, 2.0, f64::INFINITY, 6.0]).unwrap();
    let stats = RasterStats::compute(&buffer);
    assert_eq!((stats.min, stats.max), (2.0, 6.0));
    assert_eq!(stats.normalize(f64::NEG_INFINITY), Some(0.0));
    assert_eq!(stats.normalize(f64::INFINITY), Some(1.0));
}

#[test]
fn test_normalize_clamps_and_skips_nan() {
    let stats = RasterStats { min: 10.0, max: 20.0, nan_count: 0 };
    assert_eq!(stats.normalize(15.0), Some(0.5));
    assert_eq!(stats.normalize(-5.0), Some(0.0));
    assert_eq!(stats.normalize(99.0), Some(1.0));
    assert_eq!(stats.normalize(f64::NAN), None);
}
