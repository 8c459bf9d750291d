//! Layout configuration and results.

use std::sync::Arc;

use nalgebra::{Point2, Point3, Vector3};

use crate::template::RackTemplate;

/// One placed rack instance.
///
/// Owns no geometry: the shape lives in the shared [`RackTemplate`], which
/// placements reference through the layout's config. A placement is only
/// the per-instance state.
#[derive(Debug, Clone, PartialEq)]
pub struct RackPlacement {
    /// Rack origin (south-west corner of the footprint), mm.
    pub position: Point3<f64>,
    /// Rotation deltas in degrees: x = tilt trim, y = bank (terrain
    /// following), z = azimuth trim. The template's base tilt and azimuth
    /// are not repeated here.
    pub rotation_deg: Vector3<f64>,
    /// Terrain slope recorded at the placement site.
    pub terrain_slope_deg: f64,
    /// Terrain aspect recorded at the placement site.
    pub terrain_aspect_deg: f64,
    /// Deterministic, zero-padded identifier (`Rack_0042`).
    pub rack_id: String,
    /// Electrical string assignment, when grouped.
    pub string_id: Option<String>,
}

/// Layout generation parameters.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Shared rack template.
    pub template: Arc<RackTemplate>,
    /// North-south row spacing, meters.
    pub row_spacing_m: f64,
    /// Ground coverage ratio target, (0, 1].
    pub gcr_target: f64,
    /// Maximum buildable slope in degrees.
    pub max_slope_deg: f64,
    /// Stop placing once this DC capacity is reached (MW).
    pub target_capacity_mw: Option<f64>,
    /// Placement boundary polygon in mm (XY). Cells whose center falls
    /// outside are skipped.
    pub boundary_mm: Option<Vec<Point2<f64>>>,
}

impl LayoutConfig {
    pub fn new(template: Arc<RackTemplate>) -> Self {
        Self {
            template,
            row_spacing_m: 6.0,
            gcr_target: 0.4,
            max_slope_deg: 20.0,
            target_capacity_mw: None,
            boundary_mm: None,
        }
    }
}

/// Aggregate statistics derived from a layout's placement list.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutStatistics {
    pub total_racks: usize,
    pub total_panels: u64,
    pub dc_capacity_kw: f64,
    /// Occupied ground area (racks x row spacing x rack width), m².
    pub ground_area_m2: f64,
    /// Plan panel area (racks x width x length), m².
    pub panel_area_m2: f64,
    /// Achieved ground coverage ratio, 0 when no ground is occupied.
    pub gcr_actual: f64,
}

/// A generated array layout: the config used plus every placement.
///
/// Constructed once by the engine; statistics are recomputed from the
/// placement list on demand rather than stored, so the value is never
/// half-updated.
#[derive(Debug, Clone)]
pub struct ArrayLayout {
    pub config: LayoutConfig,
    pub placements: Vec<RackPlacement>,
}

impl ArrayLayout {
    /// Compute aggregate statistics from the placement list.
    pub fn statistics(&self) -> LayoutStatistics {
        let template = &self.config.template;
        let total_racks = self.placements.len();
        let racks = total_racks as f64;

        let panel_area_m2 = racks * template.width_m() * template.length_m();
        let ground_area_m2 = racks * self.config.row_spacing_m * template.width_m();

        LayoutStatistics {
            total_racks,
            total_panels: total_racks as u64 * template.total_panels() as u64,
            dc_capacity_kw: racks * template.dc_capacity_kw(),
            ground_area_m2,
            panel_area_m2,
            gcr_actual: if ground_area_m2 > 0.0 {
                panel_area_m2 / ground_area_m2
            } else {
                0.0
            },
        }
    }
}

/// A contiguous electrical string of racks.
#[derive(Debug, Clone, PartialEq)]
pub struct StringGroup {
    /// Zero-padded identifier (`String_0003`).
    pub id: String,
    /// Indices into the layout's placement list, in placement order.
    pub members: Vec<usize>,
}
