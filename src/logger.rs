//! Session log: one file per run, truncated when the run starts.
//!
//! Default location:
//!   Windows:  `%APPDATA%\TiffEdit\tiffedit.log`
//!   Linux:    `$XDG_DATA_HOME/TiffEdit/tiffedit.log` (or `~/.local/share/...`)
//!   macOS:    `~/Library/Application Support/TiffEdit/tiffedit.log`
//!
//! Library code logs through `log_info!` / `log_warn!` / `log_err!`. Before
//! `init_at` has run the macros do nothing, so tests and embedders
//! need no setup.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// Severity tag written in front of every entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        })
    }
}

struct Sink {
    path: PathBuf,
    file: Mutex<File>,
    /// Entries at or above this level are mirrored to stderr.
    echo_from: Option<Level>,
}

static SINK: OnceLock<Sink> = OnceLock::new();

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Error, format_args!($($arg)*))
    };
}

/// Path of the active log file, once initialised.
pub fn log_path() -> Option<&'static PathBuf> {
    SINK.get().map(|s| &s.path)
}

/// Append one entry. Silently dropped before initialisation or on I/O error.
pub fn write(level: Level, args: fmt::Arguments<'_>) {
    let Some(sink) = SINK.get() else { return };
    let line = format!("[{}] [{}] {}", clock(), level, args);
    if let Ok(mut file) = sink.file.lock() {
        let _ = writeln!(file, "{}", line);
    }
    if sink.echo_from.is_some_and(|min| level >= min) {
        eprintln!("{}", line);
    }
}

fn write_raw(sink: &Sink, text: &str) {
    if let Ok(mut file) = sink.file.lock() {
        let _ = writeln!(file, "{}", text);
    }
}

/// Start logging to `path`, optionally echoing entries of `echo_from` and
/// above to stderr. The first successful call wins; later calls are ignored.
///
/// Also chains a panic hook so a crash leaves its message in the log.
pub fn init_at(path: PathBuf, echo_from: Option<Level>) {
    if SINK.get().is_some() {
        return;
    }
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }

    let file = match OpenOptions::new().create(true).write(true).truncate(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("[logger] cannot open {}: {}", path.display(), e);
            return;
        }
    };

    let sink = Sink { path, file: Mutex::new(file), echo_from };
    if SINK.set(sink).is_err() {
        return;
    }
    let Some(sink) = SINK.get() else { return };

    write_raw(sink, &format!("=== TiffEdit {} session started (unix {}) ===", env!("CARGO_PKG_VERSION"), epoch_secs()));
    write_raw(sink, &format!("Log file: {}", sink.path.display()));
    write_raw(sink, "");

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(sink) = SINK.get() {
            write_raw(sink, &format!("[{}] [PANIC] {}", clock(), info));
        }
        previous(info);
    }));
}

/// Per-platform default log location.
pub fn default_log_path() -> PathBuf {
    platform_data_dir().join("TiffEdit").join("tiffedit.log")
}

fn platform_data_dir() -> PathBuf {
    let home = || std::env::var_os("HOME").map(PathBuf::from);

    let dir = if cfg!(target_os = "windows") {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else if cfg!(target_os = "macos") {
        home().map(|h| h.join("Library").join("Application Support"))
    } else {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| home().map(|h| h.join(".local").join("share")))
    };
    dir.unwrap_or_else(|| PathBuf::from("."))
}

fn epoch_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// UTC wall clock as HH:MM:SS.mmm.
fn clock() -> String {
    let Ok(d) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return "??:??:??.???".to_string();
    };
    let day_secs = d.as_secs() % 86_400;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        day_secs / 3600,
        (day_secs % 3600) / 60,
        day_secs % 60,
        d.subsec_millis()
    )
}
