//! pv: Command-line interface for terrain analysis and solar array layout.
//!
//! Wraps pv-terrain and pv-layout for scripting and quick site studies.
//!
//! # Logging
//!
//! Set `RUST_LOG` to control log output:
//! - `RUST_LOG=pv_terrain=info` - basic operation logging
//! - `RUST_LOG=pv_terrain::timing=info` - operation timing
//! - `RUST_LOG=debug` - all debug output
//!
//! # Example
//!
//! ```bash
//! # Terrain statistics from a meter-unit CSV survey
//! pv info survey.csv --unit-scale 1000
//!
//! # Slope study and layout over the same terrain
//! pv slope survey.csv --unit-scale 1000 --max-slope 20
//! pv layout survey.csv --unit-scale 1000 --gcr 0.4 --format json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;

use commands::{contours, cutfill, info, layout, mesh, slope, spacing};

/// pv - terrain analysis and solar array layout.
///
/// Import terrain surveys, analyze slopes, extract contours, estimate
/// earthwork, and generate terrain-aware rack layouts.
#[derive(Parser)]
#[command(name = "pv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

/// Rack template flags shared by the spacing and layout commands.
#[derive(Debug, clap::Args)]
pub struct TemplateArgs {
    /// Panels side by side across the rack
    #[arg(long, default_value = "2")]
    panels_per_row: u32,

    /// Panel rows along the rack length
    #[arg(long, default_value = "1")]
    rows: u32,

    /// Fixed tilt angle in degrees (use 0 for trackers)
    #[arg(long, default_value = "25")]
    tilt: f64,

    /// Panel rated power in watts
    #[arg(long, default_value = "550")]
    panel_watts: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a terrain file and display point-cloud statistics
    Info {
        /// Terrain file (CSV, Esri ASCII grid, XYZ, or PLY)
        input: PathBuf,

        /// Multiplier into mm (1000 for meter-unit files)
        #[arg(long, default_value = "1.0")]
        unit_scale: f64,
    },

    /// Triangulate a terrain file and display mesh statistics
    Mesh {
        /// Terrain file
        input: PathBuf,

        /// Multiplier into mm
        #[arg(long, default_value = "1.0")]
        unit_scale: f64,
    },

    /// Analyze slope and buildability of a terrain surface
    Slope {
        /// Terrain file
        input: PathBuf,

        /// Multiplier into mm
        #[arg(long, default_value = "1.0")]
        unit_scale: f64,

        /// Maximum buildable slope in degrees
        #[arg(long, default_value = "20")]
        max_slope: f64,
    },

    /// Extract elevation contours from a terrain surface
    Contours {
        /// Terrain file
        input: PathBuf,

        /// Multiplier into mm
        #[arg(long, default_value = "1.0")]
        unit_scale: f64,

        /// Contour interval in mm
        #[arg(long, default_value = "1000")]
        interval: f64,

        /// Lowest contour elevation in mm (defaults to terrain minimum)
        #[arg(long)]
        min_elevation: Option<f64>,

        /// Highest contour elevation in mm (defaults to terrain maximum)
        #[arg(long)]
        max_elevation: Option<f64>,
    },

    /// Cut/fill volumes between two grading states of one site
    Cutfill {
        /// Original terrain file
        before: PathBuf,

        /// Graded terrain file (same point layout)
        after: PathBuf,

        /// Multiplier into mm
        #[arg(long, default_value = "1.0")]
        unit_scale: f64,
    },

    /// Row spacing that achieves a target ground coverage ratio
    Spacing {
        /// Target GCR, in (0, 1]
        #[arg(long)]
        gcr: f64,

        #[command(flatten)]
        template: TemplateArgs,
    },

    /// Generate a grid array layout, optionally terrain-aware
    Layout {
        /// Terrain file (omit for a flat 1 km x 1 km study site)
        input: Option<PathBuf>,

        /// Multiplier into mm
        #[arg(long, default_value = "1.0")]
        unit_scale: f64,

        /// Target GCR used to derive row spacing
        #[arg(long, conflicts_with = "spacing")]
        gcr: Option<f64>,

        /// Explicit row spacing in meters
        #[arg(long)]
        spacing: Option<f64>,

        /// Maximum buildable slope in degrees
        #[arg(long, default_value = "20")]
        max_slope: f64,

        /// Stop placing once this DC capacity is reached (MW)
        #[arg(long)]
        capacity: Option<f64>,

        /// Racks per electrical string (prints grouping summary)
        #[arg(long)]
        racks_per_string: Option<usize>,

        #[command(flatten)]
        template: TemplateArgs,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins; -v flags are the fallback.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "pv_terrain=info,pv_layout=info",
            2 => "pv_terrain=debug,pv_layout=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Info { input, unit_scale } => info::run(input, *unit_scale, &cli),
        Commands::Mesh { input, unit_scale } => mesh::run(input, *unit_scale, &cli),
        Commands::Slope {
            input,
            unit_scale,
            max_slope,
        } => slope::run(input, *unit_scale, *max_slope, &cli),
        Commands::Contours {
            input,
            unit_scale,
            interval,
            min_elevation,
            max_elevation,
        } => contours::run(
            input,
            *unit_scale,
            *interval,
            *min_elevation,
            *max_elevation,
            &cli,
        ),
        Commands::Cutfill {
            before,
            after,
            unit_scale,
        } => cutfill::run(before, after, *unit_scale, &cli),
        Commands::Spacing { gcr, template } => spacing::run(*gcr, template, &cli),
        Commands::Layout {
            input,
            unit_scale,
            gcr,
            spacing,
            max_slope,
            capacity,
            racks_per_string,
            template,
        } => layout::run(
            input.as_deref(),
            *unit_scale,
            *gcr,
            *spacing,
            *max_slope,
            *capacity,
            *racks_per_string,
            template,
            &cli,
        ),
    }
}
