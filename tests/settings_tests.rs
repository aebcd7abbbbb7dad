//! Tests for the key=value settings file

use tiffedit::AppSettings;
use tiffedit::ColorMap;
use tiffedit::io::{SampleFormat, TiffCompression};

#[test]
fn test_defaults() {
    let s = AppSettings::default();
    assert_eq!(s.max_undo_steps, 20);
    assert_eq!(s.brush_radius(), 1);
    assert_eq!(s.colormap, ColorMap::Grayscale);
    assert_eq!((s.viewport_width, s.viewport_height), (800.0, 600.0));
}

#[test]
fn test_config_string_round_trip() {
    let s = AppSettings {
        max_undo_steps: 7,
        brush_size: 9,
        brush_value: -3.5,
        zoom_step: 1.5,
        wheel_zoom_step: 1.25,
        colormap: ColorMap::Terrain,
        tiff_compression: TiffCompression::Deflate,
        sample_format: SampleFormat::Float64,
        viewport_width: 1024.0,
        viewport_height: 768.0,
    };
    let parsed = AppSettings::from_config_str(&s.to_config_string());
    assert_eq!(parsed, s);
    assert_eq!(parsed.brush_radius(), 4);
}

#[test]
fn test_bad_values_fall_back_to_defaults() {
    let parsed = AppSettings::from_config_str(
        "# comment\n\
         max_undo_steps=1\n\
         zoom_step=-2\n\
         colormap=rainbow\n\
         brush_size=lots\n\
         unknown_key=5\n\
         not a pair\n\
         viewport_width = 640\n",
    );
    let defaults = AppSettings::default();
    assert_eq!(parsed.max_undo_steps, defaults.max_undo_steps);
    assert_eq!(parsed.zoom_step, defaults.zoom_step);
    assert_eq!(parsed.colormap, defaults.colormap);
    assert_eq!(parsed.brush_size, defaults.brush_size);
    assert_eq!(parsed.viewport_width, 640.0);
}

#[test]
fn test_save_options_follow_settings() {
    let s = AppSettings {
        tiff_compression: TiffCompression::Lzw,
        ..AppSettings::default()
    };
    let options = s.save_options();
    assert_eq!(options.compression, TiffCompression::Lzw);
    assert_eq!(options.sample_format, SampleFormat::Float32);
}
