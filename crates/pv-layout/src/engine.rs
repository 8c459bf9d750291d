//! Layout generation: spacing math, the grid placement scan, grouping,
//! and build-area estimation.
//!
//! Every operation here is a pure function over immutable inputs: the same
//! config and terrain always produce bit-identical placement lists.

use nalgebra::{Point2, Point3, Vector3};
use tracing::{debug, info};

use pv_terrain::sample::{elevation_at, slope_aspect_at, Interpolation};
use pv_terrain::{SlopeMap, TerrainMesh};

use crate::error::{LayoutError, LayoutResult};
use crate::layout::{ArrayLayout, LayoutConfig, RackPlacement, StringGroup};
use crate::template::RackTemplate;

/// Default scan area when neither terrain nor a capacity target bounds the
/// site: 1 km x 1 km.
const DEFAULT_EXTENT_MM: f64 = 1_000_000.0;

/// Row spacing that achieves a target ground coverage ratio, in meters.
///
/// GCR is plan panel area over occupied ground area. For one rack of width
/// `w` and tilted length `L` in a row pitched at `spacing`:
/// `gcr = (w * L * cos(tilt)) / (w * spacing)`, so
/// `spacing = projected_length / gcr`.
///
/// # Errors
///
/// [`LayoutError::Config`] when `target_gcr` is outside `(0, 1]`.
pub fn optimize_spacing_for_gcr(template: &RackTemplate, target_gcr: f64) -> LayoutResult<f64> {
    if !(target_gcr > 0.0 && target_gcr <= 1.0) {
        return Err(LayoutError::Config {
            details: format!("GCR target must be in (0, 1], got {target_gcr}"),
        });
    }
    Ok(template.projected_length_m() / target_gcr)
}

/// Achieved ground coverage ratio of a layout (0 for an empty layout).
pub fn calculate_actual_gcr(layout: &ArrayLayout) -> f64 {
    layout.statistics().gcr_actual
}

/// Generate a grid array layout, optionally following a terrain surface.
///
/// The scan rectangle comes from the terrain bounds when a mesh is given;
/// otherwise from a capacity-sized square when `target_capacity_mw` is set;
/// otherwise the default 1 km x 1 km area. Rows advance by `row_spacing_m`
/// and cells within a row by the rack width, with strict `<` bounds tests:
/// a cell exactly at the rectangle edge is not placed.
///
/// Per cell, with terrain: slope and aspect are sampled at the cell center
/// through the nearest-face lookup and elevation through linear
/// interpolation. Cells steeper than `max_slope_deg` and cells whose
/// elevation query returns no data are skipped, not errors. Without
/// terrain every cell is flat at z = 0.
///
/// With a capacity target, the scan finishes the row in which cumulative
/// DC capacity crosses the target and then stops.
pub fn generate_grid_layout(
    config: &LayoutConfig,
    terrain: Option<&TerrainMesh>,
) -> LayoutResult<ArrayLayout> {
    let template = &config.template;
    template.validate()?;
    if config.row_spacing_m <= 0.0 {
        return Err(LayoutError::Config {
            details: format!("row spacing must be positive, got {} m", config.row_spacing_m),
        });
    }

    let (x_min, x_max, y_min, y_max) = scan_rect(config, terrain);
    let slopes = terrain.map(SlopeMap::analyze);

    let width_mm = template.width_mm();
    let length_mm = template.length_mm();
    let spacing_mm = config.row_spacing_m * 1000.0;
    let per_rack_kw = template.dc_capacity_kw();
    let target_kw = config.target_capacity_mw.map(|mw| mw * 1000.0);

    let mut placements = Vec::new();
    let mut placed_kw = 0.0;
    let mut skipped_steep = 0usize;
    let mut skipped_nodata = 0usize;
    let mut skipped_boundary = 0usize;

    let mut y = y_min;
    while y + length_mm < y_max {
        let mut x = x_min;
        while x + width_mm < x_max {
            let center = Point2::new(x + width_mm / 2.0, y + length_mm / 2.0);

            if let Some(boundary) = &config.boundary_mm {
                if !point_in_polygon(&center, boundary) {
                    skipped_boundary += 1;
                    x += width_mm;
                    continue;
                }
            }

            let (slope, aspect, z) = match (terrain, &slopes) {
                (Some(mesh), Some(slopes)) => {
                    match sample_cell(mesh, slopes, center.x, center.y) {
                        Some(sample) => sample,
                        None => {
                            skipped_nodata += 1;
                            x += width_mm;
                            continue;
                        }
                    }
                }
                _ => (0.0, 0.0, 0.0),
            };

            if slope > config.max_slope_deg {
                skipped_steep += 1;
                x += width_mm;
                continue;
            }

            placements.push(RackPlacement {
                position: Point3::new(x, y, z),
                rotation_deg: Vector3::zeros(),
                terrain_slope_deg: slope,
                terrain_aspect_deg: aspect,
                rack_id: format!("Rack_{:04}", placements.len()),
                string_id: None,
            });
            placed_kw += per_rack_kw;

            x += width_mm;
        }

        // Capacity is checked between rows so a crossing row still
        // finishes; partial rows waste DC collection runs.
        if target_kw.is_some_and(|t| placed_kw >= t) {
            debug!(
                target: "pv_layout::engine",
                placed_kw,
                "Capacity target reached, stopping after completed row"
            );
            break;
        }

        y += spacing_mm;
    }

    info!(
        target: "pv_layout::engine",
        racks = placements.len(),
        dc_kw = format!("{placed_kw:.1}"),
        skipped_steep,
        skipped_nodata,
        skipped_boundary,
        terrain = terrain.is_some(),
        "Generated grid layout"
    );

    Ok(ArrayLayout {
        config: config.clone(),
        placements,
    })
}

/// Partition a layout's placements into contiguous electrical strings.
///
/// Groups are fixed-size in placement order; the last group may be
/// smaller.
///
/// # Errors
///
/// [`LayoutError::Config`] when `racks_per_string` is zero.
pub fn create_layout_groups(
    layout: &ArrayLayout,
    racks_per_string: usize,
) -> LayoutResult<Vec<StringGroup>> {
    if racks_per_string == 0 {
        return Err(LayoutError::Config {
            details: "racks_per_string must be at least 1".into(),
        });
    }

    let groups = (0..layout.placements.len())
        .step_by(racks_per_string)
        .enumerate()
        .map(|(group_idx, start)| {
            let end = (start + racks_per_string).min(layout.placements.len());
            StringGroup {
                id: format!("String_{group_idx:04}"),
                members: (start..end).collect(),
            }
        })
        .collect();

    Ok(groups)
}

/// Estimated site requirements for a target DC capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaEstimate {
    /// Ground area needed at the configured GCR, m².
    pub required_area_m2: f64,
    /// Rack count needed to reach the capacity.
    pub estimated_rack_count: usize,
}

/// Estimate the site area a target DC capacity needs, without generating
/// placements: invert the per-rack capacity and GCR math.
pub fn estimate_build_area(
    config: &LayoutConfig,
    target_capacity_mw: f64,
) -> LayoutResult<AreaEstimate> {
    if target_capacity_mw <= 0.0 {
        return Err(LayoutError::Config {
            details: format!("target capacity must be positive, got {target_capacity_mw} MW"),
        });
    }
    let template = &config.template;
    template.validate()?;

    let rack_count = (target_capacity_mw * 1000.0 / template.dc_capacity_kw()).ceil() as usize;
    let rack_area_m2 = template.width_m() * template.projected_length_m();

    let gcr = if config.gcr_target > 0.0 {
        config.gcr_target
    } else {
        0.4
    };

    Ok(AreaEstimate {
        required_area_m2: rack_count as f64 * rack_area_m2 / gcr,
        estimated_rack_count: rack_count,
    })
}

/// Slope, aspect, and elevation at a cell center, or `None` when the
/// terrain has no answer there (out of hull, empty face table).
fn sample_cell(
    mesh: &TerrainMesh,
    slopes: &SlopeMap,
    x: f64,
    y: f64,
) -> Option<(f64, f64, f64)> {
    let z = elevation_at(mesh, x, y, Interpolation::Linear)?;
    let (slope, aspect) = slope_aspect_at(mesh, slopes, x, y)?;
    Some((slope, aspect, z))
}

/// Scan rectangle `(x_min, x_max, y_min, y_max)` in mm.
fn scan_rect(config: &LayoutConfig, terrain: Option<&TerrainMesh>) -> (f64, f64, f64, f64) {
    if let Some(bounds) = terrain.and_then(|mesh| mesh.bounds()) {
        let (min, max) = bounds;
        return (min.x, max.x, min.y, max.y);
    }

    if let Some(target_mw) = config.target_capacity_mw {
        // Roughly square site sized for the target, with a 20% margin.
        let template = &config.template;
        let racks_needed = (target_mw * 1000.0 / template.dc_capacity_kw()).ceil();
        let racks_per_row = racks_needed.sqrt().floor() + 2.0;
        let width_mm = racks_per_row * template.width_mm() * 1.2;
        let length_mm = racks_per_row * config.row_spacing_m * 1000.0 * 1.2;
        return (0.0, width_mm, 0.0, length_mm);
    }

    (0.0, DEFAULT_EXTENT_MM, 0.0, DEFAULT_EXTENT_MM)
}

/// Even-odd ray-cast point-in-polygon test in the XY plane.
fn point_in_polygon(point: &Point2<f64>, polygon: &[Point2<f64>]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y) {
            let x_cross = pi.x + (point.y - pi.y) / (pj.y - pi.y) * (pj.x - pi.x);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::PanelSpec;

    #[test]
    fn spacing_inverts_the_gcr_formula() {
        let rack = RackTemplate::single_axis_tracker("t", PanelSpec::default(), 2, 1);
        let spacing = optimize_spacing_for_gcr(&rack, 0.4).unwrap();
        assert!((spacing - rack.length_m() / 0.4).abs() < 1e-12);

        // Full coverage: spacing equals the projected length.
        let spacing = optimize_spacing_for_gcr(&rack, 1.0).unwrap();
        assert!((spacing - rack.projected_length_m()).abs() < 1e-12);
    }

    #[test]
    fn gcr_out_of_range_is_rejected() {
        let rack = RackTemplate::default();
        for bad in [0.0, -0.2, 1.0001, 5.0] {
            assert!(matches!(
                optimize_spacing_for_gcr(&rack, bad),
                Err(LayoutError::Config { .. })
            ));
        }
    }

    #[test]
    fn point_in_polygon_square() {
        let square = vec![
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(100.0, 100.0),
            Point2::new(0.0, 100.0),
        ];
        assert!(point_in_polygon(&Point2::new(50.0, 50.0), &square));
        assert!(!point_in_polygon(&Point2::new(150.0, 50.0), &square));
        assert!(!point_in_polygon(&Point2::new(-1.0, -1.0), &square));
    }

    #[test]
    fn capacity_sized_scan_rect_scales_with_target() {
        let mut config = LayoutConfig::new(RackTemplate::default().into_shared());
        config.target_capacity_mw = Some(1.0);
        let (x0, x1, y0, y1) = scan_rect(&config, None);
        assert_eq!((x0, y0), (0.0, 0.0));
        assert!(x1 > 0.0 && y1 > 0.0);

        config.target_capacity_mw = Some(10.0);
        let (_, x1_big, _, _) = scan_rect(&config, None);
        assert!(x1_big > x1);
    }
}
