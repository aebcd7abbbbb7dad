// ============================================================================
// Edit scripts: Rhai-based sandboxed batch editing
// ============================================================================
//
// A script drives an `EditorSession` through the same command entry points
// an interactive front end would use, so every script call is one gesture
// with its own undo entry. Scripts see image coordinates only.

use std::sync::{Arc, Mutex};

use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Scope};

use crate::ops::locate::LocateTarget;
use crate::ops::nan_fill::NanFillPolicy;
use crate::project::{CanvasPoint, EditCommand, EditorSession};

/// Session handle shared between the host and registered script functions.
pub type SharedSession = Arc<Mutex<EditorSession>>;

type ConsoleBuffer = Arc<Mutex<Vec<String>>>;

// ============================================================================
// Error type
// ============================================================================

#[derive(Debug, Clone)]
pub struct ScriptError {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl ScriptError {
    fn from_rhai(e: &EvalAltResult) -> Self {
        let pos = e.position();
        Self {
            message: e.to_string(),
            line: pos.line().filter(|&l| l > 0),
            column: pos.position().filter(|&c| c > 0),
        }
    }

    /// Error text with line/column context and a hint for common mistakes.
    pub fn friendly_message(&self) -> String {
        let raw = &self.message;
        let cleaned = raw.split(" (line ").next().unwrap_or(raw);
        let mut parts = Vec::new();

        match (self.line, self.column) {
            (Some(line), Some(col)) => parts.push(format!("Error on line {}, column {}:", line, col)),
            (Some(line), None) => parts.push(format!("Error on line {}:", line)),
            _ => parts.push("Script error:".to_string()),
        }
        parts.push(format!("  {}", cleaned));

        if raw.contains("Function not found:") {
            parts.push(String::new());
            parts.push("  Tip: available edit functions are width, height, get, brush, line,".to_string());
            parts.push("  pick, fill_nan, undo, redo, range_min, range_max, nan_count, nan, locate.".to_string());
        } else if raw.contains("Too many operations") {
            parts.push(String::new());
            parts.push("  Tip: the script exceeded the operation limit; check for endless loops.".to_string());
        }

        parts.join("\n")
    }
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ScriptError {}

// ============================================================================
// Entry point
// ============================================================================

/// Compile and run `source` against `session`. Returns everything the
/// script printed.
pub fn run_edit_script(session: &SharedSession, source: &str) -> Result<Vec<String>, ScriptError> {
    let console: ConsoleBuffer = Arc::new(Mutex::new(Vec::new()));
    let engine = create_engine(session.clone(), console.clone());

    let ast = engine.compile(source).map_err(|e| {
        let pos = e.position();
        ScriptError {
            message: e.to_string(),
            line: pos.line().filter(|&l| l > 0),
            column: pos.position().filter(|&c| c > 0),
        }
    })?;

    let mut scope = Scope::new();
    engine
        .run_ast_with_scope(&mut scope, &ast)
        .map_err(|e| ScriptError::from_rhai(&e))?;

    let lines = console.lock().unwrap_or_else(|e| e.into_inner()).clone();
    Ok(lines)
}

// ============================================================================
// Engine construction with sandbox + API registration
// ============================================================================

fn create_engine(session: SharedSession, console: ConsoleBuffer) -> Engine {
    let mut engine = Engine::new();

    // ── Sandbox limits ──
    engine.set_max_operations(50_000_000);
    engine.set_max_call_levels(64);
    engine.set_max_expr_depths(64, 64);
    engine.set_max_string_size(10_000);
    engine.set_max_array_size(10_000);
    engine.set_max_map_size(1_000);

    let out = console.clone();
    engine.on_print(move |s| {
        out.lock().unwrap_or_else(|e| e.into_inner()).push(s.to_string());
    });
    let out = console;
    engine.on_debug(move |s, _src, pos| {
        out.lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(format!("[debug {}] {}", pos, s));
    });

    register_info_api(&mut engine, session.clone());
    register_edit_api(&mut engine, session.clone());
    register_history_api(&mut engine, session);

    engine
}

/// Numeric script argument: accepts both `9` and `9.0`.
fn to_f64(value: &Dynamic) -> Result<f64, Box<EvalAltResult>> {
    if let Ok(f) = value.as_float() {
        return Ok(f);
    }
    if let Ok(i) = value.as_int() {
        return Ok(i as f64);
    }
    Err(format!("expected a number, got {}", value.type_name()).into())
}

fn to_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

fn to_radius(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

// ============================================================================
// Raster info API
// ============================================================================

fn register_info_api(engine: &mut Engine, session: SharedSession) {
    let s = session.clone();
    engine.register_fn("width", move || -> i64 {
        let lock = s.lock().unwrap_or_else(|e| e.into_inner());
        lock.width() as i64
    });

    let s = session.clone();
    engine.register_fn("height", move || -> i64 {
        let lock = s.lock().unwrap_or_else(|e| e.into_inner());
        lock.height() as i64
    });

    let s = session.clone();
    engine.register_fn("get", move |x: i64, y: i64| -> f64 {
        let lock = s.lock().unwrap_or_else(|e| e.into_inner());
        lock.buffer().get(to_i32(x), to_i32(y))
    });

    let s = session.clone();
    engine.register_fn("range_min", move || -> f64 {
        let lock = s.lock().unwrap_or_else(|e| e.into_inner());
        lock.stats().min
    });

    let s = session.clone();
    engine.register_fn("range_max", move || -> f64 {
        let lock = s.lock().unwrap_or_else(|e| e.into_inner());
        lock.stats().max
    });

    let s = session.clone();
    engine.register_fn("nan_count", move || -> i64 {
        let lock = s.lock().unwrap_or_else(|e| e.into_inner());
        lock.stats().nan_count as i64
    });

    engine.register_fn("nan", || -> f64 { f64::NAN });

    // locate("max" | "min" | "nan") -> [x, y, value], or () when absent
    let s = session;
    engine.register_fn(
        "locate",
        move |kind: ImmutableString| -> Result<Dynamic, Box<EvalAltResult>> {
            let target: LocateTarget = kind.parse().map_err(|e: String| -> Box<EvalAltResult> { e.into() })?;
            let mut lock = s.lock().unwrap_or_else(|e| e.into_inner());
            Ok(match lock.locate(target) {
                Some(hit) => {
                    let arr: Array = vec![
                        Dynamic::from(hit.x as i64),
                        Dynamic::from(hit.y as i64),
                        Dynamic::from(hit.value),
                    ];
                    Dynamic::from(arr)
                }
                None => Dynamic::UNIT,
            })
        },
    );
}

// ============================================================================
// Edit API
// ============================================================================

fn register_edit_api(engine: &mut Engine, session: SharedSession) {
    // brush(x, y, radius, value) -> cells changed
    let s = session.clone();
    engine.register_fn(
        "brush",
        move |x: i64, y: i64, radius: i64, value: Dynamic| -> Result<i64, Box<EvalAltResult>> {
            let value = to_f64(&value)?;
            let mut lock = s.lock().unwrap_or_else(|e| e.into_inner());
            let outcome = lock
                .apply(EditCommand::Brush {
                    at: CanvasPoint::image(to_i32(x), to_i32(y)),
                    radius: to_radius(radius),
                    value,
                })
                .map_err(|e| -> Box<EvalAltResult> { e.to_string().into() })?;
            Ok(outcome.changed as i64)
        },
    );

    // line(x0, y0, x1, y1, radius, value) -> cells changed
    let s = session.clone();
    engine.register_fn(
        "line",
        move |x0: i64, y0: i64, x1: i64, y1: i64, radius: i64, value: Dynamic| -> Result<i64, Box<EvalAltResult>> {
            let value = to_f64(&value)?;
            let mut lock = s.lock().unwrap_or_else(|e| e.into_inner());
            let outcome = lock
                .apply(EditCommand::LineBrush {
                    from: CanvasPoint::image(to_i32(x0), to_i32(y0)),
                    to: CanvasPoint::image(to_i32(x1), to_i32(y1)),
                    radius: to_radius(radius),
                    value,
                })
                .map_err(|e| -> Box<EvalAltResult> { e.to_string().into() })?;
            Ok(outcome.changed as i64)
        },
    );

    let s = session.clone();
    engine.register_fn("pick", move |x: i64, y: i64| -> f64 {
        let mut lock = s.lock().unwrap_or_else(|e| e.into_inner());
        lock.pick(CanvasPoint::image(to_i32(x), to_i32(y)))
    });

    // fill_nan("mean" | "median" | "min" | "max" | "<number>") -> cells replaced
    let s = session.clone();
    engine.register_fn(
        "fill_nan",
        move |policy: ImmutableString| -> Result<i64, Box<EvalAltResult>> {
            let policy: NanFillPolicy = policy
                .parse()
                .map_err(|e: crate::error::EditError| -> Box<EvalAltResult> { e.to_string().into() })?;
            fill_nan(&s, policy)
        },
    );

    // fill_nan(value) with a numeric constant
    let s = session.clone();
    engine.register_fn("fill_nan", move |value: f64| -> Result<i64, Box<EvalAltResult>> {
        fill_nan(&s, NanFillPolicy::Constant(value))
    });

    let s = session;
    engine.register_fn("fill_nan", move |value: i64| -> Result<i64, Box<EvalAltResult>> {
        fill_nan(&s, NanFillPolicy::Constant(value as f64))
    });
}

fn fill_nan(session: &SharedSession, policy: NanFillPolicy) -> Result<i64, Box<EvalAltResult>> {
    let mut lock = session.lock().unwrap_or_else(|e| e.into_inner());
    let outcome = lock
        .apply(EditCommand::ReplaceAllNan(policy))
        .map_err(|e| -> Box<EvalAltResult> { e.to_string().into() })?;
    Ok(outcome.changed as i64)
}

// ============================================================================
// History API
// ============================================================================

fn register_history_api(engine: &mut Engine, session: SharedSession) {
    // undo() / redo() -> false when there is nothing to step to
    let s = session.clone();
    engine.register_fn("undo", move || -> bool {
        let mut lock = s.lock().unwrap_or_else(|e| e.into_inner());
        lock.undo().is_ok()
    });

    let s = session;
    engine.register_fn("redo", move || -> bool {
        let mut lock = s.lock().unwrap_or_else(|e| e.into_inner());
        lock.redo().is_ok()
    });
}
