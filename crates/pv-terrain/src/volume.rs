//! Cut/fill earthwork volumes between two terrain surfaces.
//!
//! Uses the triangular prism method: both meshes must share a triangulation
//! (same point layout, triangle correspondence by index), and each triangle
//! contributes `area x mean elevation difference`. Plan area is taken from
//! the original surface; it does not change under vertical grading.

use tracing::info;

use crate::error::{TerrainError, TerrainResult};
use crate::types::TerrainMesh;

/// Earthwork volume summary. All volumes are non-negative except `net_mm3`,
/// which is `fill - cut` (positive means material must be brought in).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutFill {
    pub cut_mm3: f64,
    pub fill_mm3: f64,
    pub net_mm3: f64,
}

const MM3_PER_M3: f64 = 1e9;

impl CutFill {
    pub fn cut_m3(&self) -> f64 {
        self.cut_mm3 / MM3_PER_M3
    }

    pub fn fill_m3(&self) -> f64 {
        self.fill_mm3 / MM3_PER_M3
    }

    pub fn net_m3(&self) -> f64 {
        self.net_mm3 / MM3_PER_M3
    }
}

/// Compute cut and fill volumes from `original` to `graded`.
///
/// # Errors
///
/// [`TerrainError::IncompatibleMesh`] when the meshes do not have the same
/// vertex and triangle counts. Index correspondence beyond the counts is
/// assumed, not verified; build both meshes from the same point layout.
pub fn cut_fill(original: &TerrainMesh, graded: &TerrainMesh) -> TerrainResult<CutFill> {
    if original.face_count() != graded.face_count() {
        return Err(TerrainError::IncompatibleMesh {
            left_faces: original.face_count(),
            right_faces: graded.face_count(),
            details: format!(
                "triangle counts differ ({} vs {})",
                original.face_count(),
                graded.face_count()
            ),
        });
    }
    if original.vertex_count() != graded.vertex_count() {
        return Err(TerrainError::IncompatibleMesh {
            left_faces: original.face_count(),
            right_faces: graded.face_count(),
            details: format!(
                "vertex counts differ ({} vs {})",
                original.vertex_count(),
                graded.vertex_count()
            ),
        });
    }

    let mut cut = 0.0;
    let mut fill = 0.0;

    for i in 0..original.face_count() {
        let area = original.face_area(i);

        let mean_z = |mesh: &TerrainMesh, idx: usize| -> f64 {
            let [a, b, c] = mesh.triangle_points(idx);
            (a.z + b.z + c.z) / 3.0
        };
        let dz = mean_z(graded, i) - mean_z(original, i);

        let volume = area * dz;
        if volume > 0.0 {
            fill += volume;
        } else {
            cut += -volume;
        }
    }

    let result = CutFill {
        cut_mm3: cut,
        fill_mm3: fill,
        net_mm3: fill - cut,
    };

    info!(
        target: "pv_terrain::volume",
        triangles = original.face_count(),
        cut_m3 = format!("{:.3}", result.cut_m3()),
        fill_m3 = format!("{:.3}", result.fill_m3()),
        net_m3 = format!("{:.3}", result.net_m3()),
        "Cut/fill computed"
    );

    Ok(result)
}
