//! Tests for zoom / pan arithmetic

use tiffedit::ViewTransform;
use tiffedit::canvas::{MAX_ZOOM, MIN_ZOOM};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// 100x100 raster in a 50x50 viewport: pan has room on every side.
fn small_viewport() -> ViewTransform {
    ViewTransform::new(100, 100, 50.0, 50.0)
}

#[test]
fn test_identity_transform_at_load() {
    let view = small_viewport();
    assert_eq!(view.zoom(), 1.0);
    assert_eq!(view.pan(), (0.0, 0.0));
    assert_eq!(view.viewport_to_image(12.7, 3.2), (12, 3));
    assert_eq!(view.image_to_viewport(12.0, 3.0), (12.0, 3.0));
}

#[test]
fn test_viewport_to_image_floors() {
    let mut view = small_viewport();
    assert!(view.set_zoom(2.0));
    assert_eq!(view.viewport_to_image(3.0, 3.9), (1, 1));
    assert_eq!(view.viewport_to_image(-1.0, -0.1), (-1, -1));
}

#[test]
fn test_zoom_is_clamped() {
    let mut view = small_viewport();
    assert!(view.set_zoom(1_000.0));
    assert_eq!(view.zoom(), MAX_ZOOM);
    assert!(!view.set_zoom(1.5));

    assert!(view.set_zoom(1e-9));
    assert_eq!(view.zoom(), MIN_ZOOM);
}

#[test]
fn test_negligible_or_invalid_zoom_is_ignored() {
    let mut view = small_viewport();
    assert!(!view.set_zoom(1.0005));
    assert!(!view.set_zoom(0.0));
    assert!(!view.set_zoom(-2.0));
    assert!(!view.set_zoom(f64::NAN));
    assert_eq!(view.zoom(), 1.0);
}

#[test]
fn test_zoom_at_point_keeps_anchor_fixed() {
    let mut view = small_viewport();
    let (ax, ay) = view.viewport_to_image_f(20.0, 30.0);

    assert!(view.zoom_at_point(2.0, 20.0, 30.0));
    let (vx, vy) = view.image_to_viewport(ax, ay);
    assert!(approx(vx, 20.0), "vx = {}", vx);
    assert!(approx(vy, 30.0), "vy = {}", vy);

    assert!(view.zoom_at_point(0.8, 20.0, 30.0));
    let (vx, vy) = view.image_to_viewport(ax, ay);
    assert!(approx(vx, 20.0));
    assert!(approx(vy, 30.0));
}

#[test]
fn test_pan_is_clamped_to_margin() {
    let mut view = small_viewport();

    // Dragging right moves the viewport towards negative image space
    view.pan_by(10_000.0, 10_000.0);
    assert_eq!(view.pan(), (-10.0, -10.0));

    // 110% of the extent minus the visible width
    view.pan_by(-10_000.0, -10_000.0);
    let (px, py) = view.pan();
    assert!(approx(px, 60.0) && approx(py, 60.0), "pan = ({}, {})", px, py);
}

#[test]
fn test_lower_pan_bound_wins_when_viewport_exceeds_image() {
    let mut view = ViewTransform::new(10, 10, 800.0, 600.0);
    let (lo, hi) = view.pan_range_x();
    assert!(hi < lo);

    view.pan_by(0.0, 0.0);
    assert_eq!(view.pan(), (-1.0, -1.0));
}

fn assert_pan_within_limits(view: &ViewTransform) {
    let (px, py) = view.pan();
    for (pan, (lo, hi)) in [(px, view.pan_range_x()), (py, view.pan_range_y())] {
        if hi < lo {
            assert!(approx(pan, lo), "pan {} should sit at {} (zoom {})", pan, lo, view.zoom());
        } else {
            assert!(pan >= lo - 1e-9 && pan <= hi + 1e-9, "pan {} outside [{}, {}] (zoom {})", pan, lo, hi, view.zoom());
        }
    }
}

#[test]
fn test_every_zoom_keeps_pan_within_limits() {
    let corners = [(0.0, 0.0), (50.0, 0.0), (0.0, 50.0), (50.0, 50.0), (-30.0, 80.0)];
    let factors = [2.0, 5.0, 0.5, 0.1, 30.0, 0.3, 1.7];

    for &(vx, vy) in &corners {
        let mut view = small_viewport();
        view.pan_by(-10_000.0, -10_000.0);
        for &factor in &factors {
            view.zoom_at_point(factor, vx, vy);
            assert_pan_within_limits(&view);
        }
    }

    let mut view = small_viewport();
    for &factor in &factors {
        view.set_zoom(factor);
        assert_pan_within_limits(&view);
    }

    let mut view = small_viewport();
    view.pan_by(10_000.0, 10_000.0);
    for value in [0.05, 3.0, 0.2, 100.0, 0.7] {
        view.set_zoom_absolute(value);
        assert_pan_within_limits(&view);
    }
}

#[test]
fn test_center_on_places_point_mid_viewport() {
    let mut view = small_viewport();
    view.center_on(40.0, 30.0, 50.0, 50.0);
    assert_eq!(view.pan(), (15.0, 5.0));
    assert_eq!(view.image_to_viewport(40.0, 30.0), (25.0, 25.0));
}

#[test]
fn test_set_zoom_absolute_keeps_centre() {
    let mut view = small_viewport();
    view.center_on(50.0, 50.0, 50.0, 50.0);
    assert!(view.set_zoom_absolute(4.0));
    assert_eq!(view.zoom(), 4.0);
    let (cx, cy) = view.viewport_to_image_f(25.0, 25.0);
    assert!(approx(cx, 50.0));
    assert!(approx(cy, 50.0));
}

#[test]
fn test_reset_restores_identity() {
    let mut view = small_viewport();
    view.zoom_at_point(3.0, 10.0, 10.0);
    view.pan_by(-20.0, -5.0);
    view.reset(40, 30);
    assert_eq!(view.zoom(), 1.0);
    assert_eq!(view.pan(), (0.0, 0.0));
    assert_eq!(view.viewport_size(), (50.0, 50.0));
}

#[test]
fn test_visible_region_follows_pan_and_zoom() {
    let mut view = small_viewport();
    view.center_on(50.0, 50.0, 50.0, 50.0);
    assert!(view.set_zoom_absolute(2.0));
    // 25x25 cells visible around the centre, plus the partially covered edge
    let region = view.visible_region();
    assert_eq!((region.x0, region.y0), (37, 37));
    assert_eq!((region.x1, region.y1), (64, 64));
}
