use std::path::PathBuf;

use crate::components::colors::ColorMap;
use crate::components::history::MAX_UNDO_DEPTH;
use crate::io::{SampleFormat, TiffCompression, TiffSaveOptions};

/// Editor preferences that persist across sessions.
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Maximum number of retained undo states
    pub max_undo_steps: usize,
    /// Brush diameter in cells; the disc radius is `brush_size / 2`
    pub brush_size: u32,
    /// Value painted by the brush (NaN paints no-data)
    pub brush_value: f64,
    /// Factor applied by zoom-in / zoom-out steps
    pub zoom_step: f64,
    /// Factor applied per mouse-wheel notch
    pub wheel_zoom_step: f64,
    /// Colour scale for rendering
    pub colormap: ColorMap,
    /// Compression used when exporting
    pub tiff_compression: TiffCompression,
    /// Sample type used when exporting
    pub sample_format: SampleFormat,
    /// Viewport size used for view maths when no UI supplies one
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            max_undo_steps: MAX_UNDO_DEPTH,
            brush_size: 3,
            brush_value: 0.0,
            zoom_step: 1.2,
            wheel_zoom_step: 1.1,
            colormap: ColorMap::Grayscale,
            tiff_compression: TiffCompression::None,
            sample_format: SampleFormat::Float32,
            viewport_width: 800.0,
            viewport_height: 600.0,
        }
    }
}

impl AppSettings {
    /// Disc radius derived from the brush diameter.
    pub fn brush_radius(&self) -> u32 {
        self.brush_size / 2
    }

    pub fn save_options(&self) -> TiffSaveOptions {
        TiffSaveOptions {
            compression: self.tiff_compression,
            sample_format: self.sample_format,
        }
    }

    /// Path to the settings file.
    /// On Linux:   ~/.config/tiffedit/tiffedit_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\TiffEdit\tiffedit_settings.cfg
    /// On macOS:   ~/Library/Application Support/TiffEdit/tiffedit_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("TiffEdit").join("tiffedit_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("TiffEdit")
                    .join("tiffedit_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("tiffedit").join("tiffedit_settings.cfg"))
        }
    }

    /// Serialise as `key=value` lines.
    pub fn to_config_string(&self) -> String {
        format!(
            "max_undo_steps={}\n\
             brush_size={}\n\
             brush_value={}\n\
             zoom_step={}\n\
             wheel_zoom_step={}\n\
             colormap={}\n\
             tiff_compression={}\n\
             sample_format={}\n\
             viewport_width={}\n\
             viewport_height={}\n",
            self.max_undo_steps,
            self.brush_size,
            self.brush_value,
            self.zoom_step,
            self.wheel_zoom_step,
            self.colormap.name(),
            self.tiff_compression.name(),
            self.sample_format.name(),
            self.viewport_width,
            self.viewport_height,
        )
    }

    /// Parse `key=value` lines. Unknown keys and unparsable values keep their
    /// defaults.
    pub fn from_config_str(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "max_undo_steps" => {
                    s.max_undo_steps = val.parse().ok().filter(|&n: &usize| n >= 2).unwrap_or(MAX_UNDO_DEPTH);
                }
                "brush_size" => {
                    s.brush_size = val.parse().unwrap_or(3);
                }
                "brush_value" => {
                    s.brush_value = val.parse().unwrap_or(0.0);
                }
                "zoom_step" => {
                    s.zoom_step = parse_positive(val).unwrap_or(1.2);
                }
                "wheel_zoom_step" => {
                    s.wheel_zoom_step = parse_positive(val).unwrap_or(1.1);
                }
                "colormap" => {
                    s.colormap = ColorMap::from_name(val).unwrap_or_default();
                }
                "tiff_compression" => {
                    s.tiff_compression = TiffCompression::from_name(val).unwrap_or_default();
                }
                "sample_format" => {
                    s.sample_format = SampleFormat::from_name(val).unwrap_or_default();
                }
                "viewport_width" => {
                    s.viewport_width = parse_positive(val).unwrap_or(800.0);
                }
                "viewport_height" => {
                    s.viewport_height = parse_positive(val).unwrap_or(600.0);
                }
                _ => {
                    crate::log_warn!("settings: ignoring unknown key '{}'", key);
                }
            }
        }
        s
    }

    /// Save settings to disk.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::settings_path() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }

    /// Load settings from disk (defaults if the file is missing or corrupt).
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        let Ok(content) = std::fs::read_to_string(&path) else { return Self::default() };
        Self::from_config_str(&content)
    }
}

fn parse_positive(val: &str) -> Option<f64> {
    val.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}
