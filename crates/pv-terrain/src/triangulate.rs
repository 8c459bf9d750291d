//! Surface triangulation from terrain point clouds.
//!
//! Points are projected to the XY plane and triangulated with a 2D Delaunay
//! triangulation; the original elevations ride along on the vertices. The
//! result is a TIN (triangulated irregular network) covering the convex hull
//! of the input.

use delaunator::triangulate;
use tracing::{debug, info};

use crate::error::{TerrainError, TerrainResult};
use crate::tracing_ext::OperationTimer;
use crate::types::{PointCloud, TerrainMesh};

impl TerrainMesh {
    /// Triangulate a point cloud into a terrain surface.
    ///
    /// Vertex order in the mesh equals point order in the cloud; downstream
    /// consumers rely on this to map vertices back to source points.
    ///
    /// # Errors
    ///
    /// - [`TerrainError::InsufficientData`] for fewer than 3 points.
    /// - [`TerrainError::DegenerateInput`] when all points are collinear and
    ///   the triangulation yields no triangles.
    pub fn from_cloud(cloud: &PointCloud) -> TerrainResult<TerrainMesh> {
        if cloud.len() < 3 {
            return Err(TerrainError::InsufficientData { got: cloud.len() });
        }

        let _timer = OperationTimer::with_count("triangulate", cloud.len());

        let xy: Vec<delaunator::Point> = cloud
            .points
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();

        let triangulation = triangulate(&xy);
        if triangulation.triangles.is_empty() {
            return Err(TerrainError::DegenerateInput {
                details: format!(
                    "{} points are collinear in the XY plane; no triangles produced",
                    cloud.len()
                ),
            });
        }

        // Delaunator emits counter-clockwise triangles in XY, so the face
        // normals of a height field point into the upper hemisphere.
        let triangles: Vec<[u32; 3]> = triangulation
            .triangles
            .chunks_exact(3)
            .map(|c| [c[0] as u32, c[1] as u32, c[2] as u32])
            .collect();

        debug!(
            target: "pv_terrain::mesh",
            hull_points = triangulation.hull.len(),
            "Delaunay triangulation complete"
        );
        info!(
            target: "pv_terrain::mesh",
            vertices = cloud.len(),
            triangles = triangles.len(),
            source = cloud.source.as_str(),
            "Built terrain mesh"
        );

        Ok(TerrainMesh::from_parts(cloud.points.clone(), triangles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TerrainSource;
    use nalgebra::Point3;

    #[test]
    fn triangulates_a_square() {
        let cloud = PointCloud::from_points(
            vec![
                Point3::new(0.0, 0.0, 10.0),
                Point3::new(1000.0, 0.0, 20.0),
                Point3::new(1000.0, 1000.0, 30.0),
                Point3::new(0.0, 1000.0, 40.0),
            ],
            TerrainSource::Synthetic,
        );
        let mesh = TerrainMesh::from_cloud(&cloud).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        // Vertex order preserved, elevations intact.
        assert_eq!(mesh.vertices[3], Point3::new(0.0, 1000.0, 40.0));
        // Every index triple is in range.
        for tri in &mesh.triangles {
            assert!(tri.iter().all(|&i| (i as usize) < mesh.vertex_count()));
        }
    }

    #[test]
    fn rejects_too_few_points() {
        let cloud = PointCloud::from_points(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            TerrainSource::Synthetic,
        );
        assert!(matches!(
            TerrainMesh::from_cloud(&cloud),
            Err(TerrainError::InsufficientData { got: 2 })
        ));
    }

    #[test]
    fn rejects_collinear_points() {
        let cloud = PointCloud::from_points(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1000.0, 0.0, 5.0),
                Point3::new(2000.0, 0.0, 10.0),
                Point3::new(3000.0, 0.0, 15.0),
            ],
            TerrainSource::Survey,
        );
        assert!(matches!(
            TerrainMesh::from_cloud(&cloud),
            Err(TerrainError::DegenerateInput { .. })
        ));
    }
}
