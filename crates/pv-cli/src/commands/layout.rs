//! pv layout command - generate a grid array layout.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use pv_layout::{
    create_layout_groups, generate_grid_layout, optimize_spacing_for_gcr, LayoutConfig,
};
use pv_terrain::import::load_terrain;
use pv_terrain::TerrainMesh;
use serde::Serialize;

use crate::commands::template_from_args;
use crate::{output, Cli, OutputFormat, TemplateArgs};

#[derive(Serialize)]
struct LayoutInfo {
    terrain: Option<String>,
    row_spacing_m: f64,
    max_slope_deg: f64,
    racks: usize,
    panels: u64,
    dc_capacity_kw: f64,
    ground_area_m2: f64,
    panel_area_m2: f64,
    gcr_actual: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    strings: Option<usize>,
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    input: Option<&Path>,
    unit_scale: f64,
    gcr: Option<f64>,
    spacing: Option<f64>,
    max_slope: f64,
    capacity: Option<f64>,
    racks_per_string: Option<usize>,
    template_args: &TemplateArgs,
    cli: &Cli,
) -> Result<()> {
    let template = template_from_args(template_args).into_shared();

    let mut config = LayoutConfig::new(template.clone());
    config.max_slope_deg = max_slope;
    config.target_capacity_mw = capacity;
    if let Some(gcr) = gcr {
        config.row_spacing_m = optimize_spacing_for_gcr(&template, gcr)
            .context("Spacing optimization failed")?;
    } else if let Some(spacing) = spacing {
        config.row_spacing_m = spacing;
    }

    let mesh = input
        .map(|path| -> Result<TerrainMesh> {
            let cloud = load_terrain(path, unit_scale)
                .with_context(|| format!("Failed to import terrain from {path:?}"))?;
            TerrainMesh::from_cloud(&cloud).context("Failed to triangulate terrain")
        })
        .transpose()?;

    let layout =
        generate_grid_layout(&config, mesh.as_ref()).context("Layout generation failed")?;
    let stats = layout.statistics();

    let strings = racks_per_string
        .map(|n| create_layout_groups(&layout, n).map(|groups| groups.len()))
        .transpose()
        .context("String grouping failed")?;

    let info = LayoutInfo {
        terrain: input.map(|p| p.display().to_string()),
        row_spacing_m: config.row_spacing_m,
        max_slope_deg: config.max_slope_deg,
        racks: stats.total_racks,
        panels: stats.total_panels,
        dc_capacity_kw: stats.dc_capacity_kw,
        ground_area_m2: stats.ground_area_m2,
        panel_area_m2: stats.panel_area_m2,
        gcr_actual: stats.gcr_actual,
        strings,
    };

    match cli.format {
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Array Layout".bold().underline());
                match &info.terrain {
                    Some(path) => println!("  {}: {}", "Terrain".cyan(), path),
                    None => println!("  {}: flat study site", "Terrain".cyan()),
                }
                println!(
                    "  {}: {:.2} m rows, max slope {:.0} deg",
                    "Scan".cyan(),
                    info.row_spacing_m,
                    info.max_slope_deg
                );
                println!(
                    "  {}: {} ({} panels)",
                    "Racks".cyan(),
                    info.racks,
                    info.panels
                );
                println!(
                    "  {}: {}",
                    "DC capacity".cyan(),
                    format!("{:.1} kW", info.dc_capacity_kw).green().bold()
                );
                println!(
                    "  {}: {:.0} m² ground, {:.0} m² panels",
                    "Area".cyan(),
                    info.ground_area_m2,
                    info.panel_area_m2
                );
                println!("  {}: {:.3}", "Achieved GCR".cyan(), info.gcr_actual);
                if let Some(strings) = info.strings {
                    println!("  {}: {}", "Strings".cyan(), strings);
                }
            }
        }
    }

    Ok(())
}
