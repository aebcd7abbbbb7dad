// ============================================================================
// TiffEdit CLI: headless raster editing via command-line arguments
// ============================================================================
//
// Usage examples:
//   tiffedit -i dem.tif --fill-nan median -o dem_filled.tif
//   tiffedit -i dem.tif --brush 120,80,3,0 --brush 10,10,1,nan --stats
//   tiffedit -i "tiles/*.tif" --script clean.rhai --output-dir cleaned/
//   tiffedit -i dem.tif --locate max --zoom 4 --render max.png --colormap terrain
//
// Every edit goes through an `EditorSession`, so the CLI exercises exactly
// the gesture/history rules an interactive front end would.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use clap::Parser;

use crate::components::colors::ColorMap;
use crate::io::{SampleFormat, TiffCompression, load_tiff, save_preview, save_tiff};
use crate::ops::locate::LocateTarget;
use crate::ops::nan_fill::NanFillPolicy;
use crate::ops::scripting::run_edit_script;
use crate::project::{CanvasPoint, EditCommand, EditorSession};
use crate::settings::AppSettings;
use crate::{log_err, log_info};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// TiffEdit headless raster editor.
#[derive(Parser, Debug)]
#[command(
    name = "tiffedit",
    version,
    about = "Headless single-band TIFF raster editor",
    long_about = "Paint values, fill no-data cells and run Rhai edit scripts on\n\
                  single-band TIFF rasters.\n\n\
                  Example:\n  \
                  tiffedit -i dem.tif --fill-nan median -o dem_filled.tif\n  \
                  tiffedit -i \"tiles/*.tif\" --script clean.rhai --output-dir out/"
)]
pub struct CliArgs {
    /// Input raster(s). Glob patterns accepted (e.g. "*.tif", "tiles/*.tiff").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing (files keep their stem).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Rhai edit script executed on each raster after the flag edits.
    #[arg(short, long, value_name = "SCRIPT.rhai")]
    pub script: Option<PathBuf>,

    /// Paint a disc: `x,y,radius,value` (value may be `nan`). Repeatable.
    #[arg(long, value_name = "X,Y,R,V")]
    pub brush: Vec<String>,

    /// Replace every NaN: mean, median, min, max, or a number.
    #[arg(long, value_name = "POLICY")]
    pub fill_nan: Option<String>,

    /// Report (and centre the view on) max, min or the first NaN.
    #[arg(long, value_name = "max|min|nan")]
    pub locate: Option<String>,

    /// Print min / max / NaN count after editing.
    #[arg(long)]
    pub stats: bool,

    /// Write a colour-mapped PNG preview here.
    #[arg(long, value_name = "PNG")]
    pub render: Option<PathBuf>,

    /// Colour map for --render: grayscale, viridis, plasma, terrain.
    #[arg(long, value_name = "NAME")]
    pub colormap: Option<String>,

    /// Render the viewport at this zoom instead of the whole raster.
    #[arg(long, value_name = "FACTOR")]
    pub zoom: Option<f64>,

    /// TIFF compression mode: none, lzw, deflate.
    #[arg(long, value_name = "MODE")]
    pub tiff_compression: Option<String>,

    /// Write 64-bit float samples instead of 32-bit.
    #[arg(long)]
    pub float64: bool,

    /// Session log location (defaults to the platform data directory).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Print script console output and per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

/// One `--brush` request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushSpec {
    pub x: i32,
    pub y: i32,
    pub radius: u32,
    pub value: f64,
}

impl std::str::FromStr for BrushSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, y, r, v] = parts.as_slice() else {
            return Err(format!("expected x,y,radius,value but got '{}'", s));
        };
        let x = x.parse().map_err(|_| format!("bad x coordinate '{}'", x))?;
        let y = y.parse().map_err(|_| format!("bad y coordinate '{}'", y))?;
        let radius = r.parse().map_err(|_| format!("bad radius '{}'", r))?;
        let value = v.parse().map_err(|_| format!("bad value '{}'", v))?;
        Ok(BrushSpec { x, y, radius, value })
    }
}

/// Everything parsed once and shared by every input file.
struct Plan {
    settings: AppSettings,
    brushes: Vec<BrushSpec>,
    fill_nan: Option<NanFillPolicy>,
    locate: Option<LocateTarget>,
    script: Option<String>,
    colormap: ColorMap,
    zoom: Option<f64>,
    stats: bool,
    verbose: bool,
}

// ============================================================================
// Batch driver
// ============================================================================

/// Process every input and return the process exit code: success only when
/// every raster was edited and saved.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = expand_inputs(&args.input);
    if let Err(e) = check_targets(&args, inputs.len()) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    let plan = match build_plan(&args) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let batch = inputs.len() > 1;
    let mut failed: Vec<&Path> = Vec::new();

    for (n, input) in inputs.iter().enumerate() {
        if batch || plan.verbose {
            println!("({} of {}) {}", n + 1, inputs.len(), input.display());
        }
        let started = Instant::now();

        let result = build_output_path(input, args.output.as_deref(), args.output_dir.as_deref())
            .ok_or_else(|| format!("no output name can be derived from '{}'", input.display()))
            .and_then(|output| {
                let render = args.render.as_deref().and_then(|r| build_render_path(r, input, batch));
                run_one(input, &output, render.as_deref(), &plan).map(|()| output)
            });

        match result {
            Ok(output) if batch || plan.verbose => {
                println!("  saved {} in {} ms", output.display(), started.elapsed().as_millis());
            }
            Ok(_) => {}
            Err(e) => {
                log_err!("{}: {}", input.display(), e);
                eprintln!("  error: {}", e);
                failed.push(input);
            }
        }
    }

    if failed.is_empty() {
        return ExitCode::SUCCESS;
    }
    if batch {
        eprintln!("{} of {} rasters failed", failed.len(), inputs.len());
    }
    ExitCode::FAILURE
}

/// Reject argument combinations that cannot work before touching any file.
fn check_targets(args: &CliArgs, input_count: usize) -> Result<(), String> {
    if input_count == 0 {
        return Err("no input rasters matched the given paths or patterns".to_string());
    }
    if input_count > 1 && args.output.is_some() {
        return Err(format!(
            "--output names a single file but {} rasters were given; use --output-dir alone for batches",
            input_count
        ));
    }
    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("cannot create output directory '{}': {}", dir.display(), e))?;
    }
    Ok(())
}

fn build_plan(args: &CliArgs) -> Result<Plan, String> {
    let mut settings = AppSettings::load();
    if let Some(mode) = &args.tiff_compression {
        settings.tiff_compression =
            TiffCompression::from_name(mode).ok_or_else(|| format!("unknown TIFF compression '{}'", mode))?;
    }
    if args.float64 {
        settings.sample_format = SampleFormat::Float64;
    }

    let colormap = match &args.colormap {
        Some(name) => name.parse::<ColorMap>()?,
        None => settings.colormap,
    };

    let brushes = args
        .brush
        .iter()
        .map(|b| b.parse::<BrushSpec>().map_err(|e| format!("--brush: {}", e)))
        .collect::<Result<Vec<_>, _>>()?;

    let fill_nan = match &args.fill_nan {
        Some(p) => Some(p.parse::<NanFillPolicy>().map_err(|e| format!("--fill-nan: {}", e))?),
        None => None,
    };

    let locate = match &args.locate {
        Some(t) => Some(t.parse::<LocateTarget>().map_err(|e| format!("--locate: {}", e))?),
        None => None,
    };

    let script = match &args.script {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .map_err(|e| format!("could not read script '{}': {}", path.display(), e))?,
        ),
        None => None,
    };

    Ok(Plan {
        settings,
        brushes,
        fill_nan,
        locate,
        script,
        colormap,
        zoom: args.zoom,
        stats: args.stats,
        verbose: args.verbose,
    })
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(input: &Path, output: &Path, render: Option<&Path>, plan: &Plan) -> Result<(), String> {
    // -- Step 1: Load ----------------------------------------------------
    let raster = load_tiff(input).map_err(|e| format!("load failed: {}", e))?;
    let mut session = EditorSession::from_file(input.to_path_buf(), raster, plan.settings.clone())
        .map_err(|e| format!("load failed: {}", e))?;

    // -- Step 2: Flag edits ----------------------------------------------
    for b in &plan.brushes {
        let outcome = session
            .apply(EditCommand::Brush {
                at: CanvasPoint::image(b.x, b.y),
                radius: b.radius,
                value: b.value,
            })
            .map_err(|e| format!("brush failed: {}", e))?;
        if plan.verbose {
            println!("  brush ({}, {}) r={} → {} cells changed", b.x, b.y, b.radius, outcome.changed);
        }
    }

    if let Some(policy) = plan.fill_nan {
        let outcome = session
            .apply(EditCommand::ReplaceAllNan(policy))
            .map_err(|e| format!("NaN replacement failed: {}", e))?;
        if plan.verbose {
            println!("  fill-nan {} → {} cells replaced", policy.describe(), outcome.changed);
        }
    }

    // -- Step 3: Script (optional) ---------------------------------------
    if let Some(src) = &plan.script {
        let shared = Arc::new(Mutex::new(session));
        let console = run_edit_script(&shared, src).map_err(|e| format!("script error: {}", e.friendly_message()))?;
        if plan.verbose {
            for line in &console {
                println!("  [script] {}", line);
            }
        }
        session = Arc::try_unwrap(shared)
            .map_err(|_| "script session still borrowed".to_string())?
            .into_inner()
            .unwrap_or_else(|e| e.into_inner());
    }

    // -- Step 4: Report --------------------------------------------------
    if let Some(target) = plan.locate {
        match session.locate(target) {
            Some(hit) => println!("  {}: ({}, {}) = {}", target.label(), hit.x, hit.y, hit.value),
            None => println!("  {}: none", target.label()),
        }
    }

    if plan.stats {
        let stats = session.stats();
        println!(
            "  {}x{}  min={}  max={}  nan={}  undo depth={}",
            session.width(),
            session.height(),
            stats.min,
            stats.max,
            stats.nan_count,
            session.history().undo_count()
        );
    }

    if let Some(path) = render {
        let preview = match plan.zoom {
            Some(z) => {
                session.zoom_to(z);
                session.render_viewport(plan.colormap)
            }
            None => session.render_full(plan.colormap),
        };
        save_preview(&preview, path).map_err(|e| format!("render failed: {}", e))?;
        log_info!("Wrote preview {}", path.display());
    }

    // -- Step 5: Save ----------------------------------------------------
    save_tiff(&session.export(), output, session.settings().save_options())
        .map_err(|e| format!("save failed: {}", e))?;
    session.mark_saved();
    log_info!("Saved {} → {}", input.display(), output.display());

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Turn each argument into paths: existing files are taken as-is, anything
/// else is tried as a glob. Order is preserved and duplicates dropped.
fn expand_inputs(args: &[String]) -> Vec<PathBuf> {
    let mut seen: Vec<PathBuf> = Vec::new();
    let keep = |path: PathBuf, seen: &mut Vec<PathBuf>| {
        if !seen.contains(&path) {
            seen.push(path);
        }
    };

    for arg in args {
        let literal = PathBuf::from(arg);
        if literal.is_file() {
            keep(literal, &mut seen);
            continue;
        }

        let matches: Vec<PathBuf> = match glob::glob(arg) {
            Ok(paths) => paths.filter_map(Result::ok).filter(|p| p.is_file()).collect(),
            Err(e) => {
                eprintln!("warning: '{}' is not a valid pattern: {}", arg, e);
                continue;
            }
        };
        if matches.is_empty() {
            eprintln!("warning: nothing matches '{}'", arg);
        }
        for path in matches {
            keep(path, &mut seen);
        }
    }

    seen
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, keeps the input stem)
/// 3. Fallback: next to the input as `<stem>.tif`, or `<stem>_out.tif` when
///    that would overwrite the input
fn build_output_path(input: &Path, output: Option<&Path>, output_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.tif", stem)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.tif", stem));
    if candidate == input {
        Some(parent.join(format!("{}_out.tif", stem)))
    } else {
        Some(candidate)
    }
}

/// In batch mode each preview gets the input stem appended.
fn build_render_path(render: &Path, input: &Path, multi: bool) -> Option<PathBuf> {
    if !multi {
        return Some(render.to_path_buf());
    }
    let base = render.file_stem()?.to_string_lossy().into_owned();
    let stem = input.file_stem()?.to_string_lossy().into_owned();
    let parent = render.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}_{}.png", base, stem)))
}
