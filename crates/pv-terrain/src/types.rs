//! Core terrain data types.

use std::path::PathBuf;
use std::sync::OnceLock;

use hashbrown::HashMap;
use nalgebra::{Point2, Point3, Vector3};

/// Provenance of a terrain point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerrainSource {
    /// Surveyed points (total station, GNSS, LiDAR).
    Survey,
    /// Sampled from a gridded digital elevation model.
    DemGrid,
    /// Imported from a CSV point list.
    CsvPoints,
    /// Generated programmatically (tests, demos).
    Synthetic,
}

impl TerrainSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerrainSource::Survey => "survey",
            TerrainSource::DemGrid => "dem_grid",
            TerrainSource::CsvPoints => "csv_points",
            TerrainSource::Synthetic => "synthetic",
        }
    }
}

/// Summary statistics for a point cloud.
#[derive(Debug, Clone)]
pub struct CloudStatistics {
    pub num_points: usize,
    /// X extent in meters.
    pub x_extent_m: f64,
    /// Y extent in meters.
    pub y_extent_m: f64,
    /// Elevation range (max - min) in meters.
    pub elevation_range_m: f64,
    /// Mean elevation in mm.
    pub mean_elevation_mm: f64,
    /// Standard deviation of elevation in mm.
    pub std_elevation_mm: f64,
}

/// Raw terrain input: an ordered 3D point cloud.
///
/// Coordinates are in millimeters. Point order is significant: the mesh
/// built from a cloud keeps vertex order equal to point order, so external
/// consumers can map vertices back to source points by index.
#[derive(Debug, Clone)]
pub struct PointCloud {
    /// The points, in import order.
    pub points: Vec<Point3<f64>>,

    /// Where the data came from.
    pub source: TerrainSource,

    /// Originating file, when imported.
    pub source_file: Option<PathBuf>,

    /// Free-form import metadata (row counts, unit scale, grid headers).
    pub metadata: HashMap<String, String>,
}

impl PointCloud {
    /// Create an empty cloud with the given provenance.
    pub fn new(source: TerrainSource) -> Self {
        Self {
            points: Vec::new(),
            source,
            source_file: None,
            metadata: HashMap::new(),
        }
    }

    /// Create an empty cloud with pre-allocated capacity.
    pub fn with_capacity(source: TerrainSource, capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            source,
            source_file: None,
            metadata: HashMap::new(),
        }
    }

    /// Create a cloud from a list of positions.
    pub fn from_points(points: Vec<Point3<f64>>, source: TerrainSource) -> Self {
        Self {
            points,
            source,
            source_file: None,
            metadata: HashMap::new(),
        }
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point.
    #[inline]
    pub fn push(&mut self, point: Point3<f64>) {
        self.points.push(point);
    }

    /// Add a point from raw coordinates.
    #[inline]
    pub fn push_coords(&mut self, x: f64, y: f64, z: f64) {
        self.points.push(Point3::new(x, y, z));
    }

    /// Axis-aligned bounding box, or `None` for an empty cloud.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        bounds_of(&self.points)
    }

    /// Min and max elevation in mm, or `None` for an empty cloud.
    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        self.bounds().map(|(min, max)| (min.z, max.z))
    }

    /// Statistical summary of the cloud.
    pub fn statistics(&self) -> Option<CloudStatistics> {
        let (min, max) = self.bounds()?;
        let n = self.points.len() as f64;
        let mean = self.points.iter().map(|p| p.z).sum::<f64>() / n;
        let var = self.points.iter().map(|p| (p.z - mean).powi(2)).sum::<f64>() / n;

        Some(CloudStatistics {
            num_points: self.points.len(),
            x_extent_m: (max.x - min.x) / 1000.0,
            y_extent_m: (max.y - min.y) / 1000.0,
            elevation_range_m: (max.z - min.z) / 1000.0,
            mean_elevation_mm: mean,
            std_elevation_mm: var.sqrt(),
        })
    }
}

/// A triangulated terrain surface.
///
/// Vertex order equals the order of the source point cloud. Triangle index
/// triples are valid by construction (see [`TerrainMesh::from_cloud`]).
///
/// Face and vertex normals are derived data: computed on first access and
/// memoized per instance behind [`OnceLock`], so a shared `&TerrainMesh` is
/// safe to query from parallel workers.
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    /// Vertex positions in mm, index-addressable.
    pub vertices: Vec<Point3<f64>>,

    /// Triangles as counter-clockwise (in XY) index triples into `vertices`.
    pub triangles: Vec<[u32; 3]>,

    face_normals: OnceLock<Vec<Vector3<f64>>>,
    vertex_normals: OnceLock<Vec<Vector3<f64>>>,
}

/// Fallback normal for zero-area triangles: straight up.
///
/// A degenerate (collinear or repeated-vertex) triangle has a zero-length
/// cross product; normalizing it would produce NaN. Terrain surfaces are
/// height fields, so the vertical is the one direction that is always
/// meaningful.
fn vertical() -> Vector3<f64> {
    Vector3::z()
}

impl TerrainMesh {
    /// Build a mesh from raw parts. Triangle indices must be valid.
    pub(crate) fn from_parts(vertices: Vec<Point3<f64>>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            face_normals: OnceLock::new(),
            vertex_normals: OnceLock::new(),
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangular faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.triangles.len()
    }

    /// Axis-aligned bounding box.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        bounds_of(&self.vertices)
    }

    /// Min and max elevation in mm.
    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        self.bounds().map(|(min, max)| (min.z, max.z))
    }

    /// The three corner positions of face `i`.
    #[inline]
    pub fn triangle_points(&self, i: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.triangles[i];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Centroid of face `i`.
    pub fn face_centroid(&self, i: usize) -> Point3<f64> {
        let [a, b, c] = self.triangle_points(i);
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    /// Area of face `i` in mm².
    pub fn face_area(&self, i: usize) -> f64 {
        let [a, b, c] = self.triangle_points(i);
        0.5 * (b - a).cross(&(c - a)).norm()
    }

    /// Unit face normals, one per triangle.
    ///
    /// Zero-area triangles get the vertical fallback normal; the result
    /// never contains NaN.
    pub fn face_normals(&self) -> &[Vector3<f64>] {
        self.face_normals.get_or_init(|| {
            self.triangles
                .iter()
                .map(|&[a, b, c]| {
                    let a = self.vertices[a as usize];
                    let b = self.vertices[b as usize];
                    let c = self.vertices[c as usize];
                    normalize_or_vertical((b - a).cross(&(c - a)))
                })
                .collect()
        })
    }

    /// Unit vertex normals, averaged from adjacent face normals.
    ///
    /// Isolated vertices (none in a Delaunay mesh, but the zero-guard holds
    /// regardless) get the vertical fallback.
    pub fn vertex_normals(&self) -> &[Vector3<f64>] {
        self.vertex_normals.get_or_init(|| {
            let face_normals = self.face_normals();
            let mut sums = vec![Vector3::zeros(); self.vertices.len()];
            for (tri, normal) in self.triangles.iter().zip(face_normals) {
                for &v in tri {
                    sums[v as usize] += normal;
                }
            }
            sums.into_iter().map(normalize_or_vertical).collect()
        })
    }
}

fn normalize_or_vertical(v: Vector3<f64>) -> Vector3<f64> {
    let len = v.norm();
    if len > 0.0 && len.is_finite() {
        v / len
    } else {
        vertical()
    }
}

fn bounds_of(points: &[Point3<f64>]) -> Option<(Point3<f64>, Point3<f64>)> {
    let first = *points.first()?;
    let mut min = first;
    let mut max = first;
    for p in &points[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }
    Some((min, max))
}

/// A regular grid of sampled elevations.
///
/// `z[j][i]` is the elevation at `(xs[i], ys[j])`. Cells outside the
/// triangulated hull hold `f64::NAN`, the no-data sentinel for grids
/// (scalar queries use `Option` instead); the grid stays rectangular so
/// consumers can index without unwrapping.
#[derive(Debug, Clone)]
pub struct GridElevations {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub z: Vec<Vec<f64>>,
}

impl GridElevations {
    /// Grid dimensions as (columns, rows).
    pub fn size(&self) -> (usize, usize) {
        (self.xs.len(), self.ys.len())
    }

    /// Count of cells with valid data.
    pub fn valid_cells(&self) -> usize {
        self.z
            .iter()
            .map(|row| row.iter().filter(|v| !v.is_nan()).count())
            .sum()
    }
}

/// A single elevation contour: an ordered polyline at constant elevation.
#[derive(Debug, Clone)]
pub struct ContourLine {
    /// Elevation in mm.
    pub elevation: f64,
    /// Polyline vertices in the XY plane (mm).
    pub points: Vec<Point2<f64>>,
    /// True when the polyline closes on itself (first point == last point).
    pub is_closed: bool,
}

impl ContourLine {
    /// Total polyline length in mm.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum()
    }
}

/// Contour lines extracted at a fixed elevation interval.
#[derive(Debug, Clone)]
pub struct ContourSet {
    pub contours: Vec<ContourLine>,
    /// Elevation interval between levels, in mm.
    pub interval: f64,
}

impl ContourSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Min and max contour elevation, or `None` when empty.
    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        let first = self.contours.first()?.elevation;
        let (min, max) = self.contours.iter().fold((first, first), |(lo, hi), c| {
            (lo.min(c.elevation), hi.max(c.elevation))
        });
        Some((min, max))
    }

    /// First contour within `tolerance` mm of `elevation`.
    pub fn contour_at(&self, elevation: f64, tolerance: f64) -> Option<&ContourLine> {
        self.contours
            .iter()
            .find(|c| (c.elevation - elevation).abs() <= tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_quad() -> TerrainMesh {
        TerrainMesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1000.0, 0.0, 0.0),
                Point3::new(1000.0, 1000.0, 0.0),
                Point3::new(0.0, 1000.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn cloud_bounds_and_statistics() {
        let mut cloud = PointCloud::new(TerrainSource::Synthetic);
        cloud.push_coords(0.0, 0.0, 100.0);
        cloud.push_coords(2000.0, 1000.0, 300.0);
        cloud.push_coords(1000.0, 3000.0, 200.0);

        let (min, max) = cloud.bounds().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 100.0));
        assert_eq!(max, Point3::new(2000.0, 3000.0, 300.0));

        let stats = cloud.statistics().unwrap();
        assert_eq!(stats.num_points, 3);
        assert!((stats.x_extent_m - 2.0).abs() < 1e-9);
        assert!((stats.mean_elevation_mm - 200.0).abs() < 1e-9);
    }

    #[test]
    fn flat_mesh_normals_point_up() {
        let mesh = flat_quad();
        for n in mesh.face_normals() {
            assert!((n.z - 1.0).abs() < 1e-12);
        }
        for n in mesh.vertex_normals() {
            assert!((n.norm() - 1.0).abs() < 1e-12);
            assert!((n.z - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn degenerate_triangle_gets_vertical_normal() {
        // Second triangle is collinear: zero area.
        let mesh = TerrainMesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1000.0, 0.0, 0.0),
                Point3::new(0.0, 1000.0, 0.0),
                Point3::new(2000.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 1, 3]],
        );
        let normals = mesh.face_normals();
        assert_eq!(normals[1], Vector3::z());
        assert!(normals.iter().all(|n| n.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn face_area_and_centroid() {
        let mesh = flat_quad();
        assert!((mesh.face_area(0) - 500_000.0).abs() < 1e-6);
        let c = mesh.face_centroid(1);
        assert!((c.x - 1000.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn contour_line_length() {
        let line = ContourLine {
            elevation: 100.0,
            points: vec![
                Point2::new(0.0, 0.0),
                Point2::new(3.0, 4.0),
                Point2::new(3.0, 14.0),
            ],
            is_closed: false,
        };
        assert!((line.length() - 15.0).abs() < 1e-12);
    }
}
