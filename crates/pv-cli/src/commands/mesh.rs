//! pv mesh command - triangulate terrain and display mesh statistics.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use pv_terrain::import::load_terrain;
use pv_terrain::TerrainMesh;
use serde::Serialize;

use crate::{output, Cli, OutputFormat};

#[derive(Serialize)]
struct MeshInfo {
    path: String,
    vertices: usize,
    triangles: usize,
    min_elevation_mm: f64,
    max_elevation_mm: f64,
}

pub fn run(input: &Path, unit_scale: f64, cli: &Cli) -> Result<()> {
    let cloud = load_terrain(input, unit_scale)
        .with_context(|| format!("Failed to import terrain from {input:?}"))?;
    let mesh = TerrainMesh::from_cloud(&cloud).context("Failed to triangulate terrain")?;

    let (min_z, max_z) = mesh.elevation_range().unwrap_or((0.0, 0.0));
    let info = MeshInfo {
        path: input.display().to_string(),
        vertices: mesh.vertex_count(),
        triangles: mesh.face_count(),
        min_elevation_mm: min_z,
        max_elevation_mm: max_z,
    };

    match cli.format {
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Terrain Mesh".bold().underline());
                println!("  {}: {}", "File".cyan(), info.path);
                println!("  {}: {}", "Vertices".cyan(), info.vertices);
                println!("  {}: {}", "Triangles".cyan(), info.triangles);
                println!(
                    "  {}: {:.2} .. {:.2} m",
                    "Elevation".cyan(),
                    output::mm_to_m(info.min_elevation_mm),
                    output::mm_to_m(info.max_elevation_mm)
                );
            }
        }
    }

    Ok(())
}
