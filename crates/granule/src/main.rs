//! granule: measure particle circularity in a photograph from the command
//! line.
//!
//! Loads an image, optionally crops it, thresholds it, extracts and
//! measures every particle, applies the minimum-area filter, and prints
//! the resulting table. The annotated image and the CSV table can be
//! written alongside.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin granule -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use granule_export::ExportError;
use granule_pipeline::{
    AnalysisConfig, Dimensions, Edge, Particle, PipelineError, PixelRect, Session,
};
use tracing_subscriber::EnvFilter;

/// Particle circularity analysis for photographs of granular material.
///
/// Dark particles on a light background are separated with an inverse
/// threshold, traced, and measured. Results are printed as a table (or
/// JSON) and can be exported as CSV and as an annotated image.
#[derive(Parser, Debug)]
#[command(name = "granule", version)]
#[allow(clippy::option_option)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, TIFF).
    image_path: PathBuf,

    /// Binarization threshold: pixels darker than this are particle.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Minimum particle area in square pixels.
    #[arg(long, default_value = "0")]
    min_area: String,

    /// Boundary simplification tolerance in pixels (0 disables).
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_SIMPLIFY_TOLERANCE)]
    simplify_tolerance: f64,

    /// Crop to LEFT,TOP,RIGHT,BOTTOM in original pixels before analysis.
    #[arg(long, value_parser = parse_crop)]
    crop: Option<CropArg>,

    /// Write the annotated image. The extension selects the format.
    ///
    /// Without a value the image goes next to the input as
    /// `<stem>_processed.<ext>`.
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    output_image: Option<Option<PathBuf>>,

    /// Write the particle table as CSV.
    ///
    /// Without a value the table goes next to the input as
    /// `<stem>_processed.csv`.
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    output_csv: Option<Option<PathBuf>>,

    /// Print the result as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Full analysis config as a JSON string.
    ///
    /// When provided, `--threshold`, `--min-area` and
    /// `--simplify-tolerance` are ignored. Missing fields take their
    /// defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// More logging: `-v` for info, `-vv` for debug. `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Crop edges in original image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CropArg {
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
}

fn parse_crop(s: &str) -> Result<CropArg, String> {
    let parts: Vec<u32> = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("crop must be four non-negative integers: {e}"))?;
    let [left, top, right, bottom] = parts[..] else {
        return Err(format!(
            "crop must be LEFT,TOP,RIGHT,BOTTOM, got {} values",
            parts.len()
        ));
    };
    if right <= left || bottom <= top {
        return Err("crop must have RIGHT > LEFT and BOTTOM > TOP".to_string());
    }
    Ok(CropArg {
        left,
        top,
        right,
        bottom,
    })
}

/// Everything that can stop a run.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("error parsing --config-json: {0}")]
    Config(#[from] serde_json::Error),

    #[error("error reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error writing {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("crop {requested:?} is not possible: {reason}")]
    Crop { requested: CropArg, reason: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Build the analysis config and the min-area text from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<(AnalysisConfig, String), CliError> {
    if let Some(ref json) = cli.config_json {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        let min_area = config.min_area.to_string();
        return Ok((config, min_area));
    }
    let config = AnalysisConfig {
        threshold: cli.threshold,
        simplify_tolerance: cli.simplify_tolerance,
        ..AnalysisConfig::default()
    };
    Ok((config, cli.min_area.clone()))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second initialisation (tests) is harmless; keep the first.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Apply `crop` through a crop editor over an unscaled preview, so the
/// same clamps and commit rules hold as for an interactive crop.
fn apply_crop(session: &mut Session, crop: CropArg) -> Result<PixelRect, CliError> {
    let original = session.original().ok_or(PipelineError::NoImage)?;
    let dims = Dimensions::of(original);
    let (mut editor, _) = session.crop_editor(dims)?;

    // Open the rectangle fully first so no edge is clamped by a stale
    // neighbour, then place each edge.
    for (edge, position) in [
        (Edge::Left, 0),
        (Edge::Top, 0),
        (Edge::Right, crop.right),
        (Edge::Bottom, crop.bottom),
        (Edge::Left, crop.left),
        (Edge::Top, crop.top),
    ] {
        (editor, _) = editor.set_edge(edge, f64::from(position));
    }

    let placed = editor.rect();
    let matches = |actual: f64, wanted: u32| (actual - f64::from(wanted)).abs() < f64::EPSILON;
    if !(matches(placed.left, crop.left)
        && matches(placed.top, crop.top)
        && matches(placed.right, crop.right)
        && matches(placed.bottom, crop.bottom))
    {
        return Err(CliError::Crop {
            requested: crop,
            reason: format!(
                "the region must lie inside the {}x{} image and be at least {} pixels wide and tall",
                dims.width,
                dims.height,
                granule_pipeline::crop::MIN_CROP_SIZE,
            ),
        });
    }

    Ok(session.apply_crop(&editor)?)
}

/// Run one analysis as described by `cli`. Returns the text to print.
fn run(cli: &Cli) -> Result<String, CliError> {
    let (config, min_area) = config_from_cli(cli)?;

    let bytes = std::fs::read(&cli.image_path).map_err(|source| CliError::Read {
        path: cli.image_path.clone(),
        source,
    })?;
    let name = cli.image_path.to_string_lossy();

    let mut session = Session::new(config);
    session.load_bytes(&name, &bytes)?;
    if let Some(crop) = cli.crop {
        apply_crop(&mut session, crop)?;
    }
    let extracted = session.analyze()?.len();
    let particles = session.apply_filter(&min_area)?.particles.clone();
    tracing::info!(extracted, retained = particles.len(), "analysis finished");

    if let Some(path) = output_path(
        cli.output_image.as_ref(),
        &cli.image_path,
        granule_export::default_image_name,
    ) {
        let bytes = granule_export::encode_image(
            session.processed_image()?,
            &path.to_string_lossy(),
        )?;
        write_file(&path, &bytes)?;
    }
    if let Some(path) = output_path(
        cli.output_csv.as_ref(),
        &cli.image_path,
        granule_export::default_csv_name,
    ) {
        let csv = granule_export::to_csv(session.export_particles()?);
        write_file(&path, csv.as_bytes())?;
    }

    if cli.json {
        let report = serde_json::json!({
            "image": name,
            "config": session.config(),
            "extracted": extracted,
            "particles": particles,
        });
        Ok(format!("{report:#}"))
    } else {
        Ok(table(&particles, extracted))
    }
}

/// Resolve an output flag: an explicit path wins, a bare flag means the
/// default name beside `source`, and an absent flag means no output.
fn output_path(
    requested: Option<&Option<PathBuf>>,
    source: &Path,
    default_name: fn(&str) -> String,
) -> Option<PathBuf> {
    requested.map(|explicit| {
        explicit.clone().unwrap_or_else(|| {
            source.with_file_name(default_name(&source.to_string_lossy()))
        })
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

/// Human-readable particle table.
fn table(particles: &[Particle], extracted: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>6} {:>14} {:>14} {:>12}",
        "index", "perimeter", "area", "circularity"
    );
    let _ = writeln!(out, "{}", "-".repeat(49));
    for p in particles {
        let _ = writeln!(
            out,
            "{:>6} {:>14.4} {:>14.4} {:>12.4}",
            p.index, p.perimeter, p.area, p.circularity
        );
    }
    let _ = write!(
        out,
        "{} of {} particles retained",
        particles.len(),
        extracted
    );
    out
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
