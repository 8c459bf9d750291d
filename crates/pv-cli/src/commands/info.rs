//! pv info command - terrain import and point-cloud statistics.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use pv_terrain::import::load_terrain;
use serde::Serialize;

use crate::{output, Cli, OutputFormat};

#[derive(Serialize)]
struct TerrainInfo {
    path: String,
    source: String,
    points: usize,
    x_extent_m: f64,
    y_extent_m: f64,
    elevation_range_m: f64,
    mean_elevation_mm: f64,
    std_elevation_mm: f64,
}

pub fn run(input: &Path, unit_scale: f64, cli: &Cli) -> Result<()> {
    let cloud = load_terrain(input, unit_scale)
        .with_context(|| format!("Failed to import terrain from {input:?}"))?;
    let stats = cloud
        .statistics()
        .context("terrain file produced an empty point cloud")?;

    let info = TerrainInfo {
        path: input.display().to_string(),
        source: cloud.source.as_str().to_string(),
        points: stats.num_points,
        x_extent_m: stats.x_extent_m,
        y_extent_m: stats.y_extent_m,
        elevation_range_m: stats.elevation_range_m,
        mean_elevation_mm: stats.mean_elevation_mm,
        std_elevation_mm: stats.std_elevation_mm,
    };

    match cli.format {
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Terrain Information".bold().underline());
                println!("  {}: {}", "File".cyan(), info.path);
                println!("  {}: {}", "Source".cyan(), info.source);
                println!("  {}: {}", "Points".cyan(), info.points);
                println!(
                    "  {}: {:.1} x {:.1} m",
                    "Extent".cyan(),
                    info.x_extent_m,
                    info.y_extent_m
                );
                println!(
                    "  {}: {:.2} m",
                    "Elevation range".cyan(),
                    info.elevation_range_m
                );
                println!(
                    "  {}: {:.0} mm (std {:.0} mm)",
                    "Mean elevation".cyan(),
                    info.mean_elevation_mm,
                    info.std_elevation_mm
                );
            }
        }
    }

    Ok(())
}
