//! Property-based tests: invariants that must hold for arbitrary input.

use proptest::prelude::*;

use pv_terrain::{ColorScheme, PointCloud, SlopeMap, SlopeThresholds, TerrainMesh, TerrainSource};

fn arbitrary_cloud() -> impl Strategy<Value = PointCloud> {
    proptest::collection::vec(
        (
            -100_000.0..100_000.0f64,
            -100_000.0..100_000.0f64,
            -50_000.0..50_000.0f64,
        ),
        3..40,
    )
    .prop_map(|triples| {
        let mut cloud = PointCloud::new(TerrainSource::Synthetic);
        for (x, y, z) in triples {
            cloud.push_coords(x, y, z);
        }
        cloud
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn meshes_preserve_vertices_and_produce_finite_unit_normals(cloud in arbitrary_cloud()) {
        // Degenerate clouds (collinear, duplicate-only) are allowed to fail;
        // the invariants below apply to every cloud that meshes at all.
        let Ok(mesh) = TerrainMesh::from_cloud(&cloud) else {
            return Ok(());
        };

        prop_assert_eq!(mesh.vertex_count(), cloud.len());
        prop_assert!(mesh.face_count() >= 1);

        for tri in &mesh.triangles {
            for &i in tri {
                prop_assert!((i as usize) < mesh.vertex_count());
            }
        }

        for n in mesh.face_normals() {
            prop_assert!(n.iter().all(|c| c.is_finite()));
            prop_assert!((n.norm() - 1.0).abs() < 1e-6);
        }
        for n in mesh.vertex_normals() {
            prop_assert!(n.iter().all(|c| c.is_finite()));
            prop_assert!((n.norm() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn slope_and_aspect_stay_in_range(cloud in arbitrary_cloud()) {
        let Ok(mesh) = TerrainMesh::from_cloud(&cloud) else {
            return Ok(());
        };
        let slopes = SlopeMap::analyze(&mesh);

        prop_assert_eq!(slopes.len(), mesh.face_count());
        for &s in &slopes.face_slope_deg {
            prop_assert!((0.0..=90.0).contains(&s), "slope {} out of range", s);
        }
        for &a in &slopes.face_aspect_deg {
            prop_assert!((0.0..360.0).contains(&a), "aspect {} out of range", a);
        }
    }

    #[test]
    fn heatmap_channels_are_bounded_for_any_slope_or_aspect(
        slopes in proptest::collection::vec(0.0..1000.0f64, 1..200),
        aspect_offset in -720.0..720.0f64,
    ) {
        let aspects: Vec<f64> = slopes
            .iter()
            .enumerate()
            .map(|(i, _)| (aspect_offset + i as f64 * 7.3).rem_euclid(360.0))
            .collect();
        let map = SlopeMap {
            face_slope_deg: slopes,
            face_aspect_deg: aspects,
            thresholds: SlopeThresholds::default(),
        };

        for scheme in [ColorScheme::Slope, ColorScheme::Aspect] {
            let colors = map.heatmap_colors(scheme);
            prop_assert_eq!(colors.len(), map.len());
            for color in colors {
                for channel in color {
                    prop_assert!((0.0..=1.0).contains(&channel));
                }
            }
        }
    }
}
