//! pv contours command - extract elevation contours.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use pv_terrain::import::load_terrain;
use pv_terrain::{generate_contours, TerrainMesh};
use serde::Serialize;

use crate::{output, Cli, OutputFormat};

#[derive(Serialize)]
struct ContourInfo {
    path: String,
    interval_mm: f64,
    contours: usize,
    closed: usize,
    min_elevation_mm: f64,
    max_elevation_mm: f64,
    total_length_m: f64,
}

pub fn run(
    input: &Path,
    unit_scale: f64,
    interval: f64,
    min_elevation: Option<f64>,
    max_elevation: Option<f64>,
    cli: &Cli,
) -> Result<()> {
    let cloud = load_terrain(input, unit_scale)
        .with_context(|| format!("Failed to import terrain from {input:?}"))?;
    let mesh = TerrainMesh::from_cloud(&cloud).context("Failed to triangulate terrain")?;

    let set = generate_contours(&mesh, interval, min_elevation, max_elevation)
        .context("Contour extraction failed")?;

    let (min_z, max_z) = set.elevation_range().unwrap_or((0.0, 0.0));
    let info = ContourInfo {
        path: input.display().to_string(),
        interval_mm: set.interval,
        contours: set.len(),
        closed: set.contours.iter().filter(|c| c.is_closed).count(),
        min_elevation_mm: min_z,
        max_elevation_mm: max_z,
        total_length_m: set.contours.iter().map(|c| c.length()).sum::<f64>() / 1000.0,
    };

    match cli.format {
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Contours".bold().underline());
                println!("  {}: {}", "File".cyan(), info.path);
                println!("  {}: {:.0} mm", "Interval".cyan(), info.interval_mm);
                println!(
                    "  {}: {} ({} closed)",
                    "Contours".cyan(),
                    info.contours,
                    info.closed
                );
                if info.contours > 0 {
                    println!(
                        "  {}: {:.2} .. {:.2} m",
                        "Levels".cyan(),
                        output::mm_to_m(info.min_elevation_mm),
                        output::mm_to_m(info.max_elevation_mm)
                    );
                    println!(
                        "  {}: {:.1} m",
                        "Total length".cyan(),
                        info.total_length_m
                    );
                }
            }
        }
    }

    Ok(())
}
