//! Elevation and slope queries against a terrain mesh.
//!
//! Scalar queries return `Option<f64>`: `None` means the query point lies
//! outside the triangulated convex hull. That is an expected, checkable
//! outcome, not an error. Sampled grids keep their rectangular shape and
//! mark out-of-hull cells with `f64::NAN` instead.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::slope::SlopeMap;
use crate::types::{GridElevations, TerrainMesh};

/// Barycentric containment tolerance, scale-free.
///
/// Points on a shared edge between two triangles must land in one of them;
/// a small negative allowance absorbs floating-point noise.
const BARY_EPS: f64 = 1e-9;

/// Scattered-data interpolation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Piecewise-linear: barycentric blend of the containing triangle.
    Linear,
    /// Piecewise-cubic: curved point-normal triangle patch blending vertex
    /// normals, the TIN analogue of a Clough-Tocher interpolant. Smooth
    /// across triangle edges; exact on planar input.
    Cubic,
}

/// Interpolate the elevation at `(x, y)` in mm.
///
/// Returns `None` when the point falls outside the triangulated hull.
pub fn elevation_at(mesh: &TerrainMesh, x: f64, y: f64, method: Interpolation) -> Option<f64> {
    let (face, bary) = locate(mesh, x, y)?;
    Some(match method {
        Interpolation::Linear => {
            let [a, b, c] = mesh.triangle_points(face);
            bary[0] * a.z + bary[1] * b.z + bary[2] * c.z
        }
        Interpolation::Cubic => pn_patch_z(mesh, face, bary),
    })
}

/// Sample an `n` x `n` regular grid of elevations.
///
/// Bounds default to the mesh's XY bounding box; pass
/// `Some(((x_min, x_max), (y_min, y_max)))` for a sub-region. Cells with no
/// terrain under them hold NaN. Rows are sampled in parallel; each worker
/// reads the shared mesh and fills its own row.
pub fn grid_elevations(
    mesh: &TerrainMesh,
    grid_size: usize,
    bounds: Option<((f64, f64), (f64, f64))>,
) -> GridElevations {
    let mesh_bounds = mesh
        .bounds()
        .map(|(min, max)| ((min.x, max.x), (min.y, max.y)));
    // A constructed mesh always has vertices; the zero fallback only keeps
    // hand-built empty meshes from panicking (they sample to all-NaN).
    let ((x_min, x_max), (y_min, y_max)) =
        bounds.or(mesh_bounds).unwrap_or(((0.0, 0.0), (0.0, 0.0)));

    let xs = linspace(x_min, x_max, grid_size);
    let ys = linspace(y_min, y_max, grid_size);

    let z: Vec<Vec<f64>> = ys
        .par_iter()
        .map(|&y| {
            xs.iter()
                .map(|&x| elevation_at(mesh, x, y, Interpolation::Linear).unwrap_or(f64::NAN))
                .collect()
        })
        .collect();

    let grid = GridElevations { xs, ys, z };
    debug!(
        target: "pv_terrain::sample",
        grid_size,
        valid = grid.valid_cells(),
        total = grid_size * grid_size,
        "Sampled elevation grid"
    );
    grid
}

/// Slope at `(x, y)`, from the face whose centroid is nearest in 2D.
///
/// This is deliberately a nearest-centroid lookup rather than a local
/// gradient estimate: the returned slope is constant across each face's
/// neighborhood and changes in steps at centroid midlines. Callers (the
/// layout scan in particular) depend on this coarser granularity, so keep
/// the approximation when touching this.
///
/// Returns `None` only when the mesh has no faces. Unlike [`elevation_at`],
/// a point outside the hull still resolves to the nearest face.
pub fn slope_at(mesh: &TerrainMesh, slopes: &SlopeMap, x: f64, y: f64) -> Option<f64> {
    nearest_face(mesh, x, y).map(|i| slopes.face_slope_deg[i])
}

/// Slope and aspect at `(x, y)` via the same nearest-centroid lookup.
pub fn slope_aspect_at(
    mesh: &TerrainMesh,
    slopes: &SlopeMap,
    x: f64,
    y: f64,
) -> Option<(f64, f64)> {
    nearest_face(mesh, x, y).map(|i| (slopes.face_slope_deg[i], slopes.face_aspect_deg[i]))
}

/// Batch form of [`slope_at`] for a list of `(x, y)` query points.
pub fn slopes_at(mesh: &TerrainMesh, slopes: &SlopeMap, points: &[(f64, f64)]) -> Vec<Option<f64>> {
    points
        .par_iter()
        .map(|&(x, y)| slope_at(mesh, slopes, x, y))
        .collect()
}

/// Index of the face whose centroid is nearest to `(x, y)` in 2D.
fn nearest_face(mesh: &TerrainMesh, x: f64, y: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for i in 0..mesh.face_count() {
        let c = mesh.face_centroid(i);
        let d2 = (c.x - x).powi(2) + (c.y - y).powi(2);
        if best.map_or(true, |(_, bd)| d2 < bd) {
            best = Some((i, d2));
        }
    }
    best.map(|(i, _)| i)
}

/// Locate the triangle containing `(x, y)` and its barycentric coordinates.
fn locate(mesh: &TerrainMesh, x: f64, y: f64) -> Option<(usize, [f64; 3])> {
    for i in 0..mesh.face_count() {
        let [a, b, c] = mesh.triangle_points(i);
        if let Some(bary) = barycentric_2d(x, y, &a, &b, &c) {
            return Some((i, bary));
        }
    }
    None
}

/// Barycentric coordinates of `(x, y)` in the XY projection of a triangle,
/// or `None` when outside (or the triangle projects to zero area).
fn barycentric_2d(
    x: f64,
    y: f64,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Option<[f64; 3]> {
    let det = (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y);
    if det.abs() < f64::EPSILON {
        return None;
    }
    let w1 = ((b.x - x) * (c.y - y) - (c.x - x) * (b.y - y)) / det;
    let w2 = ((c.x - x) * (a.y - y) - (a.x - x) * (c.y - y)) / det;
    let w3 = 1.0 - w1 - w2;
    if w1 >= -BARY_EPS && w2 >= -BARY_EPS && w3 >= -BARY_EPS {
        Some([w1, w2, w3])
    } else {
        None
    }
}

/// Elevation of the cubic point-normal triangle patch over face `face` at
/// the given barycentric coordinates.
///
/// Control points follow the PN-triangle construction: each edge midpoint
/// control point is the linear point pulled onto the tangent plane of its
/// nearest corner, and the center control point is lifted off the average.
/// The patch is evaluated at the barycentric coordinates of the XY query;
/// the patch's lateral drift is negligible at terrain mesh scales.
fn pn_patch_z(mesh: &TerrainMesh, face: usize, bary: [f64; 3]) -> f64 {
    let [p1, p2, p3] = mesh.triangle_points(face);
    let tri = mesh.triangles[face];
    let normals = mesh.vertex_normals();
    let n1 = normals[tri[0] as usize];
    let n2 = normals[tri[1] as usize];
    let n3 = normals[tri[2] as usize];

    let ctrl = |p: Point3<f64>, q: Point3<f64>, n: Vector3<f64>| -> Vector3<f64> {
        // Edge control point near p, projected onto p's tangent plane.
        (2.0 * p.coords + q.coords - (q - p).dot(&n) * n) / 3.0
    };

    let b300 = p1.coords;
    let b030 = p2.coords;
    let b003 = p3.coords;
    let b210 = ctrl(p1, p2, n1);
    let b120 = ctrl(p2, p1, n2);
    let b021 = ctrl(p2, p3, n2);
    let b012 = ctrl(p3, p2, n3);
    let b102 = ctrl(p3, p1, n3);
    let b201 = ctrl(p1, p3, n1);
    let e = (b210 + b120 + b021 + b012 + b102 + b201) / 6.0;
    let v = (b300 + b030 + b003) / 3.0;
    let b111 = e + (e - v) / 2.0;

    let [u, v_, w] = bary;
    let s = b300 * u.powi(3)
        + b030 * v_.powi(3)
        + b003 * w.powi(3)
        + b210 * 3.0 * u * u * v_
        + b120 * 3.0 * u * v_ * v_
        + b201 * 3.0 * u * u * w
        + b102 * 3.0 * u * w * w
        + b021 * 3.0 * v_ * v_ * w
        + b012 * 3.0 * v_ * w * w
        + b111 * 6.0 * u * v_ * w;
    s.z
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PointCloud, TerrainSource};
    use nalgebra::Point3;

    fn plane_mesh(slope_deg: f64) -> TerrainMesh {
        let tan = slope_deg.to_radians().tan();
        let mut cloud = PointCloud::new(TerrainSource::Synthetic);
        for iy in 0..5 {
            for ix in 0..5 {
                let (x, y) = (ix as f64 * 1000.0, iy as f64 * 1000.0);
                cloud.push(Point3::new(x, y, y * tan));
            }
        }
        TerrainMesh::from_cloud(&cloud).unwrap()
    }

    #[test]
    fn linear_interpolation_reproduces_a_plane() {
        let mesh = plane_mesh(10.0);
        let tan = 10.0_f64.to_radians().tan();
        for &(x, y) in &[(500.0, 500.0), (1750.0, 3100.0), (3999.0, 3999.0)] {
            let z = elevation_at(&mesh, x, y, Interpolation::Linear).unwrap();
            assert!((z - y * tan).abs() < 1e-6, "at ({x}, {y}): {z}");
        }
    }

    #[test]
    fn cubic_matches_linear_on_planar_terrain() {
        // All vertex normals agree on a plane, so the PN patch is the plane.
        let mesh = plane_mesh(10.0);
        let linear = elevation_at(&mesh, 2300.0, 1700.0, Interpolation::Linear).unwrap();
        let cubic = elevation_at(&mesh, 2300.0, 1700.0, Interpolation::Cubic).unwrap();
        assert!((linear - cubic).abs() < 1.0);
    }

    #[test]
    fn outside_hull_is_none_not_an_error() {
        let mesh = plane_mesh(5.0);
        assert_eq!(elevation_at(&mesh, -1.0, 2000.0, Interpolation::Linear), None);
        assert_eq!(elevation_at(&mesh, 2000.0, 4001.0, Interpolation::Cubic), None);
    }

    #[test]
    fn vertices_and_edges_are_inside() {
        let mesh = plane_mesh(5.0);
        // Exactly on a vertex and exactly on a shared edge.
        assert!(elevation_at(&mesh, 1000.0, 1000.0, Interpolation::Linear).is_some());
        assert!(elevation_at(&mesh, 1500.0, 1000.0, Interpolation::Linear).is_some());
    }

    #[test]
    fn grid_marks_out_of_bounds_cells_nan() {
        let mesh = plane_mesh(5.0);
        let grid = grid_elevations(&mesh, 10, Some(((-2000.0, 6000.0), (-2000.0, 6000.0))));
        assert_eq!(grid.size(), (10, 10));
        assert!(grid.z[0][0].is_nan());
        assert!(grid.valid_cells() > 0);
    }

    #[test]
    fn slope_lookup_uses_nearest_centroid() {
        let mesh = plane_mesh(10.0);
        let slopes = SlopeMap::analyze(&mesh);
        let s = slope_at(&mesh, &slopes, 2000.0, 2000.0).unwrap();
        assert!((s - 10.0).abs() < 0.5);
        // Outside the hull still resolves to the nearest face.
        assert!(slope_at(&mesh, &slopes, -5000.0, -5000.0).is_some());
    }
}
