//! pv slope command - slope statistics and buildability.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use pv_terrain::import::load_terrain;
use pv_terrain::{SlopeMap, TerrainMesh};
use serde::Serialize;

use crate::{output, Cli, OutputFormat};

#[derive(Serialize)]
struct SlopeInfo {
    path: String,
    faces: usize,
    mean_slope_deg: f64,
    max_slope_deg: f64,
    std_slope_deg: f64,
    flat: usize,
    gentle: usize,
    moderate: usize,
    steep: usize,
    very_steep: usize,
    buildable_pct: f64,
    buildable_max_deg: f64,
}

pub fn run(input: &Path, unit_scale: f64, max_slope: f64, cli: &Cli) -> Result<()> {
    let cloud = load_terrain(input, unit_scale)
        .with_context(|| format!("Failed to import terrain from {input:?}"))?;
    let mesh = TerrainMesh::from_cloud(&cloud).context("Failed to triangulate terrain")?;
    let slopes = SlopeMap::analyze(&mesh);
    let stats = slopes.statistics(max_slope);

    let info = SlopeInfo {
        path: input.display().to_string(),
        faces: slopes.len(),
        mean_slope_deg: stats.mean_slope_deg,
        max_slope_deg: stats.max_slope_deg,
        std_slope_deg: stats.std_slope_deg,
        flat: stats.class_counts[0],
        gentle: stats.class_counts[1],
        moderate: stats.class_counts[2],
        steep: stats.class_counts[3],
        very_steep: stats.class_counts[4],
        buildable_pct: stats.buildable_pct,
        buildable_max_deg: stats.buildable_max_deg,
    };

    match cli.format {
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Slope Analysis".bold().underline());
                println!("  {}: {}", "File".cyan(), info.path);
                println!("  {}: {}", "Faces".cyan(), info.faces);
                println!(
                    "  {}: {:.1} deg (max {:.1}, std {:.1})",
                    "Mean slope".cyan(),
                    info.mean_slope_deg,
                    info.max_slope_deg,
                    info.std_slope_deg
                );
                println!(
                    "  {}: flat {} / gentle {} / moderate {} / steep {} / very steep {}",
                    "Classes".cyan(),
                    info.flat,
                    info.gentle,
                    info.moderate,
                    info.steep,
                    info.very_steep
                );

                let line = format!(
                    "  {}: {:.1}% at <= {:.0} deg",
                    "Buildable".cyan(),
                    info.buildable_pct,
                    info.buildable_max_deg
                );
                if info.buildable_pct >= 75.0 {
                    println!("{}", line.green());
                } else if info.buildable_pct >= 40.0 {
                    println!("{}", line.yellow());
                } else {
                    println!("{}", line.red());
                }
            }
        }
    }

    Ok(())
}
