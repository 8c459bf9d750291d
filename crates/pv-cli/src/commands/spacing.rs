//! pv spacing command - row pitch from a GCR target.

use anyhow::{Context, Result};
use colored::Colorize;
use pv_layout::optimize_spacing_for_gcr;
use serde::Serialize;

use crate::commands::template_from_args;
use crate::{output, Cli, OutputFormat, TemplateArgs};

#[derive(Serialize)]
struct SpacingInfo {
    gcr_target: f64,
    rack_width_m: f64,
    rack_length_m: f64,
    tilt_deg: f64,
    projected_length_m: f64,
    row_spacing_m: f64,
}

pub fn run(gcr: f64, template_args: &TemplateArgs, cli: &Cli) -> Result<()> {
    let template = template_from_args(template_args);
    let spacing =
        optimize_spacing_for_gcr(&template, gcr).context("Spacing optimization failed")?;

    let info = SpacingInfo {
        gcr_target: gcr,
        rack_width_m: template.width_m(),
        rack_length_m: template.length_m(),
        tilt_deg: template.tilt_deg,
        projected_length_m: template.projected_length_m(),
        row_spacing_m: spacing,
    };

    match cli.format {
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Row Spacing".bold().underline());
                println!(
                    "  {}: {:.2} x {:.2} m at {:.0} deg tilt",
                    "Rack".cyan(),
                    info.rack_width_m,
                    info.rack_length_m,
                    info.tilt_deg
                );
                println!(
                    "  {}: {:.3} m",
                    "Projected length".cyan(),
                    info.projected_length_m
                );
                println!("  {}: {:.2}", "GCR target".cyan(), info.gcr_target);
                println!(
                    "  {}: {}",
                    "Row spacing".cyan(),
                    format!("{:.2} m", info.row_spacing_m).green().bold()
                );
            }
        }
    }

    Ok(())
}
