//! End-to-end tests for the terrain pipeline: import -> mesh -> analysis.
//!
//! The concrete scenarios here (grid sizes, slopes, tolerances) match the
//! behavior site-design workflows depend on; treat count and tolerance
//! changes as breaking.

use std::io::Write;

use pv_terrain::import::{
    load_csv_points, load_dem_ascii, load_terrain, load_xyz_text, synthetic_terrain, CsvOptions,
    TerrainFormat,
};
use pv_terrain::{
    cut_fill, elevation_at, generate_contours, grid_elevations, ColorScheme, Interpolation,
    SlopeMap, TerrainError, TerrainMesh, TerrainSource,
};
use tempfile::NamedTempFile;

fn sloped_plane(extent_mm: f64, spacing_mm: f64, slope_deg: f64) -> TerrainMesh {
    let tan = slope_deg.to_radians().tan();
    let cloud = synthetic_terrain(extent_mm, extent_mm, spacing_mm, |_, y| y * tan);
    TerrainMesh::from_cloud(&cloud).unwrap()
}

// =============================================================================
// Meshing
// =============================================================================

#[test]
fn five_by_five_grid_produces_25_vertices_and_32_triangles() {
    // 5x5 points at 2 m spacing: 16 cells, 2 triangles each.
    let mesh = sloped_plane(8000.0, 2000.0, 5.0);
    assert_eq!(mesh.vertex_count(), 25);
    assert_eq!(mesh.face_count(), 32);

    let slopes = SlopeMap::analyze(&mesh);
    assert!((slopes.mean_slope() - 5.0).abs() < 0.5);
}

#[test]
fn mesh_vertex_order_matches_cloud_order() {
    let cloud = synthetic_terrain(4000.0, 4000.0, 1000.0, |x, y| x * 0.01 + y * 0.02);
    let mesh = TerrainMesh::from_cloud(&cloud).unwrap();
    assert_eq!(mesh.vertex_count(), cloud.len());
    for (vertex, point) in mesh.vertices.iter().zip(&cloud.points) {
        assert_eq!(vertex, point);
    }
}

#[test]
fn triangulation_is_deterministic() {
    let cloud = synthetic_terrain(10_000.0, 10_000.0, 1000.0, |x, y| (x * 0.003).sin() * 200.0 + y * 0.05);
    let a = TerrainMesh::from_cloud(&cloud).unwrap();
    let b = TerrainMesh::from_cloud(&cloud).unwrap();
    assert_eq!(a.triangles, b.triangles);
}

// =============================================================================
// Slope analysis
// =============================================================================

#[test]
fn flat_terrain_has_sub_degree_slopes() {
    let mesh = sloped_plane(10_000.0, 2000.0, 0.0);
    let slopes = SlopeMap::analyze(&mesh);
    assert!(slopes.mean_slope() < 1.0);
    assert!(slopes.max_slope() < 1.0);
}

#[test]
fn constant_slopes_are_recovered_within_half_a_degree() {
    for angle in [5.0, 10.0, 20.0, 30.0] {
        let mesh = sloped_plane(10_000.0, 2000.0, angle);
        let slopes = SlopeMap::analyze(&mesh);
        assert!(
            (slopes.mean_slope() - angle).abs() < 0.5,
            "expected ~{angle}, got {}",
            slopes.mean_slope()
        );
    }
}

#[test]
fn thirty_degree_terrain_is_mostly_unbuildable_at_twenty() {
    let mesh = sloped_plane(5000.0, 1000.0, 30.0);
    let slopes = SlopeMap::analyze(&mesh);
    let buildable = slopes.buildable_faces(20.0);
    assert!(
        (buildable.len() as f64) < mesh.face_count() as f64 * 0.5,
        "{} of {} faces buildable",
        buildable.len(),
        mesh.face_count()
    );
}

#[test]
fn heatmaps_cover_every_face_with_valid_channels() {
    // 60 degree terrain: slopes beyond the 45 degree color ramp.
    let mesh = sloped_plane(5000.0, 1000.0, 60.0);
    let slopes = SlopeMap::analyze(&mesh);

    for scheme in [ColorScheme::Slope, ColorScheme::Aspect] {
        let colors = slopes.heatmap_colors(scheme);
        assert_eq!(colors.len(), mesh.face_count());
        for color in colors {
            for channel in color {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }
}

// =============================================================================
// Elevation sampling
// =============================================================================

#[test]
fn interpolation_reproduces_a_constant_slope_plane() {
    let mesh = sloped_plane(10_000.0, 1000.0, 10.0);
    let tan = 10.0_f64.to_radians().tan();

    for method in [Interpolation::Linear, Interpolation::Cubic] {
        let z = elevation_at(&mesh, 5000.0, 5000.0, method).unwrap();
        assert!(
            (z - 5000.0 * tan).abs() < 100.0,
            "{method:?}: expected {}, got {z}",
            5000.0 * tan
        );
    }
}

#[test]
fn out_of_hull_queries_return_none_never_crash() {
    let mesh = sloped_plane(10_000.0, 1000.0, 10.0);
    for &(x, y) in &[(-500.0, 5000.0), (10_500.0, 5000.0), (5000.0, -1.0), (1e9, 1e9)] {
        assert_eq!(elevation_at(&mesh, x, y, Interpolation::Linear), None);
        assert_eq!(elevation_at(&mesh, x, y, Interpolation::Cubic), None);
    }
}

#[test]
fn full_hull_grid_has_no_nodata_cells() {
    let mesh = sloped_plane(10_000.0, 2000.0, 5.0);
    let grid = grid_elevations(&mesh, 20, None);
    assert_eq!(grid.size(), (20, 20));
    assert_eq!(grid.valid_cells(), 400);
}

// =============================================================================
// Contours
// =============================================================================

#[test]
fn plane_contours_are_straight_lines_at_level_elevations() {
    let mesh = sloped_plane(10_000.0, 1000.0, 10.0);
    let tan = 10.0_f64.to_radians().tan();

    let set = generate_contours(&mesh, 500.0, None, None).unwrap();
    assert!(set.len() >= 3);

    for level in [500.0, 1000.0, 1500.0] {
        let contour = set
            .contour_at(level, 0.5)
            .unwrap_or_else(|| panic!("no contour at {level}"));
        let expected_y = level / tan;
        for p in &contour.points {
            assert!(
                (p.y - expected_y).abs() < 10.0,
                "level {level}: point y {} vs {expected_y}",
                p.y
            );
        }
    }
}

#[test]
fn bowl_contours_close_on_themselves() {
    let cloud = synthetic_terrain(10_000.0, 10_000.0, 500.0, |x, y| {
        let (dx, dy) = (x - 5000.0, y - 5000.0);
        (dx * dx + dy * dy) * 1e-4
    });
    let mesh = TerrainMesh::from_cloud(&cloud).unwrap();

    let set = generate_contours(&mesh, 300.0, None, Some(1000.0)).unwrap();
    let ring = set.contour_at(300.0, 0.5).expect("level 300 contour");
    assert!(ring.is_closed, "interior bowl contour should close");
    assert!(ring.length() > 0.0);
}

#[test]
fn contour_interval_zero_is_a_config_error() {
    let mesh = sloped_plane(5000.0, 1000.0, 5.0);
    assert!(matches!(
        generate_contours(&mesh, 0.0, None, None),
        Err(TerrainError::Config { .. })
    ));
}

// =============================================================================
// Cut/fill
// =============================================================================

#[test]
fn cut_fill_of_a_mesh_against_itself_is_zero() {
    let mesh = sloped_plane(10_000.0, 2000.0, 7.5);
    let result = cut_fill(&mesh, &mesh).unwrap();
    assert_eq!(result.cut_mm3, 0.0);
    assert_eq!(result.fill_mm3, 0.0);
    assert_eq!(result.net_mm3, 0.0);
}

#[test]
fn grading_up_half_a_meter_fills_the_plan_area() {
    let extent = 10_000.0;
    let before = synthetic_terrain(extent, extent, 1000.0, |_, _| 0.0);
    let after = synthetic_terrain(extent, extent, 1000.0, |_, _| 500.0);

    let result = cut_fill(
        &TerrainMesh::from_cloud(&before).unwrap(),
        &TerrainMesh::from_cloud(&after).unwrap(),
    )
    .unwrap();

    // 10 m x 10 m x 0.5 m = 50 m^3.
    assert!((result.fill_m3() - 50.0).abs() < 1e-6);
    assert_eq!(result.cut_mm3, 0.0);
}

// =============================================================================
// Import
// =============================================================================

#[test]
fn csv_import_scales_and_skips_headers() {
    let mut file = NamedTempFile::with_suffix(".csv").unwrap();
    writeln!(file, "x,y,z").unwrap();
    writeln!(file, "1.0, 2.0, 3.0").unwrap();
    writeln!(file, "4.0, 5.0, 6.0").unwrap();
    writeln!(file, "7.0, 8.0, 9.0").unwrap();
    file.flush().unwrap();

    let cloud = load_csv_points(
        file.path(),
        &CsvOptions {
            skip_header: 1,
            unit_scale: 1000.0,
            ..CsvOptions::default()
        },
    )
    .unwrap();

    assert_eq!(cloud.len(), 3);
    assert_eq!(cloud.source, TerrainSource::CsvPoints);
    assert_eq!(cloud.points[0].x, 1000.0);
    assert_eq!(cloud.points[2].z, 9000.0);
}

#[test]
fn dem_import_orients_north_up_and_drops_nodata() {
    let mut file = NamedTempFile::with_suffix(".asc").unwrap();
    write!(
        file,
        "ncols 3\nnrows 2\nxllcorner 0.0\nyllcorner 0.0\ncellsize 10.0\nNODATA_value -9999\n\
         1 2 -9999\n4 5 6\n"
    )
    .unwrap();
    file.flush().unwrap();

    let cloud = load_dem_ascii(file.path(), 1000.0).unwrap();
    assert_eq!(cloud.len(), 5);
    assert_eq!(cloud.source, TerrainSource::DemGrid);

    // First point is the north-west corner: row 0 sits at y = cellsize.
    assert_eq!(cloud.points[0].x, 0.0);
    assert_eq!(cloud.points[0].y, 10_000.0);
    assert_eq!(cloud.points[0].z, 1000.0);
    // Southern row at y = 0.
    assert_eq!(cloud.points[2].y, 0.0);
}

#[test]
fn xyz_import_skips_comments_and_junk_lines() {
    let mut file = NamedTempFile::with_suffix(".xyz").unwrap();
    write!(
        file,
        "# survey dump\n1 2 3\nnot a point\n4\t5\t6\n\n7 8 9\n"
    )
    .unwrap();
    file.flush().unwrap();

    let cloud = load_xyz_text(file.path(), 1.0).unwrap();
    assert_eq!(cloud.len(), 3);
    assert_eq!(cloud.metadata.get("lines_skipped").map(String::as_str), Some("1"));
}

#[test]
fn content_sniffing_finds_dem_headers_in_txt_files() {
    let mut file = NamedTempFile::with_suffix(".txt").unwrap();
    write!(
        file,
        "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 5\n1 2\n3 4\n"
    )
    .unwrap();
    file.flush().unwrap();

    assert_eq!(
        TerrainFormat::detect(file.path()).unwrap(),
        TerrainFormat::DemAscii
    );
    let cloud = load_terrain(file.path(), 1.0).unwrap();
    assert_eq!(cloud.len(), 4);
}

#[test]
fn imported_terrain_feeds_the_full_pipeline() {
    // Meter-unit CSV through import, meshing, slope, and a sample query.
    let mut file = NamedTempFile::with_suffix(".csv").unwrap();
    for iy in 0..6 {
        for ix in 0..6 {
            writeln!(file, "{},{},{}", ix, iy, iy as f64 * 0.1).unwrap();
        }
    }
    file.flush().unwrap();

    let cloud = load_terrain(file.path(), 1000.0).unwrap();
    let mesh = TerrainMesh::from_cloud(&cloud).unwrap();
    assert_eq!(mesh.vertex_count(), 36);

    let slopes = SlopeMap::analyze(&mesh);
    let expected = 0.1_f64.atan().to_degrees();
    assert!((slopes.mean_slope() - expected).abs() < 0.5);

    let z = elevation_at(&mesh, 2500.0, 2500.0, Interpolation::Linear).unwrap();
    assert!((z - 250.0).abs() < 1.0);
}
