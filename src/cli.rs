// ============================================================================
// Pixelsmith CLI: headless project editing via command-line arguments
// ============================================================================
//
// Usage examples:
//   Pixelsmith --project sprite.json --events strokes.json --save sprite.json
//   Pixelsmith -p walk.pxf --gif walk.gif --apng walk.png
//   Pixelsmith --grid-size 16 -e draw.json --png out.png
//   Pixelsmith --grid-size 32 --save-settings
//
// Everything runs synchronously on the current thread. Events are a JSON
// array of tagged objects, e.g. `[{"event": "pointer_down", "x": 1, "y": 1}]`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::io::MAX_GRID_DIM;
use crate::project::{EditorEvent, Project};
use crate::settings::EditorSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Pixelsmith headless pixel-art engine.
#[derive(Parser, Debug)]
#[command(
    name = "Pixelsmith",
    version,
    about = "Pixelsmith headless pixel-art engine",
    long_about = "Load or create a layered pixel-art project, replay a list of editor\n\
                  events against it, then save it and export PNG / GIF / APNG.\n\n\
                  Example:\n  \
                  Pixelsmith --project sprite.json --events draw.json --gif sprite.gif"
)]
pub struct CliArgs {
    /// Project to open (.json or .pxf). A new untitled project is created when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub project: Option<PathBuf>,

    /// JSON file holding an array of editor events to replay in order.
    #[arg(short, long, value_name = "FILE")]
    pub events: Option<PathBuf>,

    /// Grid edge length for a new project (overrides the settings file).
    #[arg(short, long, value_name = "N")]
    pub grid_size: Option<u32>,

    /// Write the project here after replay (.json or .pxf).
    #[arg(short, long, value_name = "FILE")]
    pub save: Option<PathBuf>,

    /// Export the composited live canvas as PNG.
    #[arg(long, value_name = "FILE")]
    pub png: Option<PathBuf>,

    /// Export every animation frame as a looping GIF.
    #[arg(long, value_name = "FILE")]
    pub gif: Option<PathBuf>,

    /// Export every animation frame as a looping APNG.
    #[arg(long, value_name = "FILE")]
    pub apng: Option<PathBuf>,

    /// Write the effective settings (after --grid-size) to the settings file.
    #[arg(long)]
    pub save_settings: bool,

    /// Print per-step timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the CLI pipeline and return an OS exit code.
/// `0` = every step succeeded, `1` = one or more steps failed.
pub fn run(args: CliArgs, mut settings: EditorSettings) -> ExitCode {
    if let Some(size) = args.grid_size {
        if size == 0 || size > MAX_GRID_DIM {
            eprintln!("error: --grid-size must be between 1 and {}.", MAX_GRID_DIM);
            return ExitCode::FAILURE;
        }
        settings.grid_size = size;
    }

    let mut any_failure = false;

    if args.save_settings {
        match EditorSettings::settings_path() {
            Some(path) => step(
                args.verbose,
                "settings",
                &path,
                || settings.save_to(&path),
                &mut any_failure,
            ),
            None => {
                eprintln!("  error: settings: no settings directory available");
                any_failure = true;
            }
        }
    }

    // -- Step 1: Open ------------------------------------------------------
    let mut project = match &args.project {
        Some(path) if path.exists() => match Project::open(path, &settings) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: could not open '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        Some(path) => {
            let mut p = Project::new_untitled(1, &settings);
            p.path = Some(path.clone());
            p.update_name_from_path();
            p
        }
        None => Project::new_untitled(1, &settings),
    };
    if args.verbose {
        println!(
            "{}: {}x{}, {} layer(s), {} frame(s)",
            project.display_title(),
            project.canvas.width,
            project.canvas.height,
            project.canvas.layers.len(),
            project.animation.frame_count()
        );
    }

    // -- Step 2: Replay events ---------------------------------------------
    if let Some(events_path) = &args.events {
        let start = Instant::now();
        match read_events(events_path) {
            Ok(events) => {
                let count = events.len();
                if let Err(e) = project.replay(events) {
                    eprintln!("  error: {}", e);
                    any_failure = true;
                }
                if args.verbose {
                    println!(
                        "  replayed {} event(s) ({:.0}ms)",
                        count,
                        start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    // -- Step 3: Outputs ---------------------------------------------------
    if let Some(path) = &args.save {
        step(args.verbose, "save", path, || project.save(Some(path.clone())), &mut any_failure);
    }
    if let Some(path) = &args.png {
        step(args.verbose, "png", path, || project.export_png(path), &mut any_failure);
    }
    if let Some(path) = &args.gif {
        step(args.verbose, "gif", path, || project.export_gif(path), &mut any_failure);
    }
    if let Some(path) = &args.apng {
        step(args.verbose, "apng", path, || project.export_apng(path), &mut any_failure);
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Helpers
// ============================================================================

fn read_events(path: &Path) -> Result<Vec<EditorEvent>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read events '{}': {}", path.display(), e))?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("could not parse events '{}': {}", path.display(), e))
}

fn step<E: std::fmt::Display>(
    verbose: bool,
    label: &str,
    path: &Path,
    action: impl FnOnce() -> Result<(), E>,
    any_failure: &mut bool,
) {
    let start = Instant::now();
    match action() {
        Ok(()) => {
            if verbose {
                println!(
                    "  {} → {} ({:.0}ms)",
                    label,
                    path.display(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
        }
        Err(e) => {
            eprintln!("  error: {} failed: {}", label, e);
            *any_failure = true;
        }
    }
}
