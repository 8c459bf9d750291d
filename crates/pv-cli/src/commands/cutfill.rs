//! pv cutfill command - earthwork volumes between two grading states.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use pv_terrain::import::load_terrain;
use pv_terrain::{cut_fill, TerrainMesh};
use serde::Serialize;

use crate::{output, Cli, OutputFormat};

#[derive(Serialize)]
struct CutFillInfo {
    before: String,
    after: String,
    triangles: usize,
    cut_m3: f64,
    fill_m3: f64,
    net_m3: f64,
}

pub fn run(before: &Path, after: &Path, unit_scale: f64, cli: &Cli) -> Result<()> {
    let load_mesh = |path: &Path| -> Result<TerrainMesh> {
        let cloud = load_terrain(path, unit_scale)
            .with_context(|| format!("Failed to import terrain from {path:?}"))?;
        TerrainMesh::from_cloud(&cloud)
            .with_context(|| format!("Failed to triangulate {path:?}"))
    };

    let original = load_mesh(before)?;
    let graded = load_mesh(after)?;

    let result = cut_fill(&original, &graded).context("Cut/fill comparison failed")?;

    let info = CutFillInfo {
        before: before.display().to_string(),
        after: after.display().to_string(),
        triangles: original.face_count(),
        cut_m3: result.cut_m3(),
        fill_m3: result.fill_m3(),
        net_m3: result.net_m3(),
    };

    match cli.format {
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Cut/Fill Volumes".bold().underline());
                println!("  {}: {}", "Original".cyan(), info.before);
                println!("  {}: {}", "Graded".cyan(), info.after);
                println!("  {}: {}", "Triangles".cyan(), info.triangles);
                println!("  {}: {:.2} m³", "Cut".cyan(), info.cut_m3);
                println!("  {}: {:.2} m³", "Fill".cyan(), info.fill_m3);
                let net = format!("{:.2} m³", info.net_m3);
                if info.net_m3 >= 0.0 {
                    println!("  {}: {} (import material)", "Net".cyan(), net.yellow());
                } else {
                    println!("  {}: {} (export material)", "Net".cyan(), net.yellow());
                }
            }
        }
    }

    Ok(())
}
