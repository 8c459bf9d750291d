//! Contour extraction via marching squares.
//!
//! The mesh is resampled onto a regular grid (see [`crate::sample`]) and
//! iso-lines are traced per elevation level with a marching-squares pass.
//! This is an approximation of true TIN contouring: accuracy is bounded by
//! the sampling grid, which is acceptable for site-planning visuals.

use hashbrown::HashMap;
use nalgebra::Point2;
use tracing::{debug, info};

use crate::error::{TerrainError, TerrainResult};
use crate::sample::grid_elevations;
use crate::tracing_ext::OperationTimer;
use crate::types::{ContourLine, ContourSet, GridElevations, TerrainMesh};

/// Sampling grid resolution for contour extraction.
const CONTOUR_GRID_SIZE: usize = 100;

/// Endpoint quantization for polyline assembly, in mm.
///
/// Segment endpoints produced from the same cell edge are bit-identical,
/// but joining keys are quantized anyway so the map never splits a chain
/// over representation noise.
const JOIN_QUANTUM: f64 = 1e-3;

/// Extract contour lines at a fixed elevation interval.
///
/// Levels run from `ceil(min / interval) * interval` up through the maximum
/// elevation, where the range defaults to the mesh's Z extent and may be
/// narrowed by `min_elevation` / `max_elevation`.
///
/// # Errors
///
/// [`TerrainError::Config`] when `interval` is not positive.
pub fn generate_contours(
    mesh: &TerrainMesh,
    interval: f64,
    min_elevation: Option<f64>,
    max_elevation: Option<f64>,
) -> TerrainResult<ContourSet> {
    if !(interval > 0.0) {
        return Err(TerrainError::Config {
            details: format!("contour interval must be positive, got {interval}"),
        });
    }

    let _timer = OperationTimer::with_count("generate_contours", mesh.face_count());

    let (z_min, z_max) = mesh.elevation_range().unwrap_or((0.0, 0.0));
    let lo = min_elevation.unwrap_or(z_min);
    let hi = max_elevation.unwrap_or(z_max);

    let start = (lo / interval).ceil() * interval;
    let levels: Vec<f64> = (0..)
        .map(|k| start + k as f64 * interval)
        .take_while(|&level| level <= hi + interval / 2.0)
        .collect();

    let grid = grid_elevations(mesh, CONTOUR_GRID_SIZE, None);

    let mut contours = Vec::new();
    for &level in &levels {
        let segments = march_level(&grid, level);
        let polylines = assemble_polylines(segments);
        debug!(
            target: "pv_terrain::contour",
            level,
            polylines = polylines.len(),
            "Traced contour level"
        );
        for (points, is_closed) in polylines {
            if points.len() > 1 {
                contours.push(ContourLine {
                    elevation: level,
                    points,
                    is_closed,
                });
            }
        }
    }

    info!(
        target: "pv_terrain::contour",
        levels = levels.len(),
        contours = contours.len(),
        interval,
        "Contour extraction complete"
    );

    Ok(ContourSet { contours, interval })
}

type Seg = [(f64, f64); 2];

/// Marching squares over one elevation level. Cells touching a NaN sample
/// are skipped: no data, no contour.
fn march_level(grid: &GridElevations, level: f64) -> Vec<Seg> {
    let (nx, ny) = grid.size();
    let mut segments = Vec::new();
    if nx < 2 || ny < 2 {
        return segments;
    }

    for j in 0..ny - 1 {
        for i in 0..nx - 1 {
            // Corners counter-clockwise from the lower-left.
            let z = [
                grid.z[j][i],
                grid.z[j][i + 1],
                grid.z[j + 1][i + 1],
                grid.z[j + 1][i],
            ];
            if z.iter().any(|v| v.is_nan()) {
                continue;
            }
            let p = [
                (grid.xs[i], grid.ys[j]),
                (grid.xs[i + 1], grid.ys[j]),
                (grid.xs[i + 1], grid.ys[j + 1]),
                (grid.xs[i], grid.ys[j + 1]),
            ];

            let mut case = 0usize;
            for (bit, &corner) in z.iter().enumerate() {
                if corner >= level {
                    case |= 1 << bit;
                }
            }
            if case == 0 || case == 15 {
                continue;
            }

            // Edge k runs from corner k to corner (k + 1) % 4.
            let cross = |k: usize| -> Option<(f64, f64)> {
                let (za, zb) = (z[k], z[(k + 1) % 4]);
                let (pa, pb) = (p[k], p[(k + 1) % 4]);
                if (za >= level) == (zb >= level) || za == zb {
                    return None;
                }
                let t = (level - za) / (zb - za);
                Some((pa.0 + t * (pb.0 - pa.0), pa.1 + t * (pb.1 - pa.1)))
            };

            let edge_pairs: &[(usize, usize)] = match case {
                1 => &[(3, 0)],
                2 => &[(0, 1)],
                3 => &[(3, 1)],
                4 => &[(1, 2)],
                6 => &[(0, 2)],
                7 => &[(3, 2)],
                8 => &[(2, 3)],
                9 => &[(0, 2)],
                11 => &[(1, 2)],
                12 => &[(3, 1)],
                13 => &[(0, 1)],
                14 => &[(3, 0)],
                // Saddles: disambiguate with the cell-center mean.
                5 | 10 => {
                    let center_above = z.iter().sum::<f64>() / 4.0 >= level;
                    if (case == 5) == center_above {
                        &[(0, 1), (2, 3)]
                    } else {
                        &[(3, 0), (1, 2)]
                    }
                }
                _ => unreachable!("cases 0 and 15 handled above"),
            };

            for &(ea, eb) in edge_pairs {
                if let (Some(a), Some(b)) = (cross(ea), cross(eb)) {
                    segments.push([a, b]);
                }
            }
        }
    }

    segments
}

fn quantize(p: (f64, f64)) -> (i64, i64) {
    (
        (p.0 / JOIN_QUANTUM).round() as i64,
        (p.1 / JOIN_QUANTUM).round() as i64,
    )
}

/// Join loose segments into polylines by shared endpoints.
///
/// Open chains start from endpoints used by exactly one segment; whatever
/// remains afterwards is a closed loop.
fn assemble_polylines(segments: Vec<Seg>) -> Vec<(Vec<Point2<f64>>, bool)> {
    let mut by_endpoint: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (idx, seg) in segments.iter().enumerate() {
        by_endpoint.entry(quantize(seg[0])).or_default().push(idx);
        by_endpoint.entry(quantize(seg[1])).or_default().push(idx);
    }

    let mut used = vec![false; segments.len()];
    let mut polylines = Vec::new();

    // Two passes: open chains first, then leftover loops.
    for open_pass in [true, false] {
        for start in 0..segments.len() {
            if used[start] {
                continue;
            }
            if open_pass {
                let degree_one = segments[start]
                    .iter()
                    .any(|&e| by_endpoint[&quantize(e)].len() == 1);
                if !degree_one {
                    continue;
                }
            }

            // Orient an open chain to begin at its loose end.
            let begin_at_tail =
                open_pass && by_endpoint[&quantize(segments[start][0])].len() != 1;
            let (head, mut tail) = if begin_at_tail {
                (segments[start][1], segments[start][0])
            } else {
                (segments[start][0], segments[start][1])
            };

            used[start] = true;
            let first = quantize(head);
            let mut points = vec![Point2::new(head.0, head.1), Point2::new(tail.0, tail.1)];

            loop {
                let key = quantize(tail);
                let next = by_endpoint[&key].iter().copied().find(|&s| !used[s]);
                let Some(next) = next else { break };
                used[next] = true;
                let seg = segments[next];
                tail = if quantize(seg[0]) == key { seg[1] } else { seg[0] };
                points.push(Point2::new(tail.0, tail.1));
                if quantize(tail) == first {
                    break;
                }
            }

            let is_closed = quantize(tail) == first && points.len() > 2;
            polylines.push((points, is_closed));
        }
    }

    polylines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane_grid(n: usize, slope_tan: f64) -> GridElevations {
        let xs: Vec<f64> = (0..n).map(|i| i as f64 * 100.0).collect();
        let ys = xs.clone();
        let z = ys
            .iter()
            .map(|&y| xs.iter().map(|_| y * slope_tan).collect())
            .collect();
        GridElevations { xs, ys, z }
    }

    #[test]
    fn plane_level_is_a_straight_open_line() {
        let grid = plane_grid(11, 0.1);
        let segments = march_level(&grid, 50.0);
        assert!(!segments.is_empty());
        let polylines = assemble_polylines(segments);
        assert_eq!(polylines.len(), 1);
        let (points, is_closed) = &polylines[0];
        assert!(!is_closed);
        // z = 0.1 * y crosses 50 at y = 500 exactly.
        for p in points {
            assert!((p.y - 500.0).abs() < 1e-9);
        }
    }

    #[test]
    fn bowl_level_is_a_closed_loop() {
        let n = 21;
        let xs: Vec<f64> = (0..n).map(|i| i as f64 * 100.0).collect();
        let ys = xs.clone();
        let z: Vec<Vec<f64>> = ys
            .iter()
            .map(|&y| {
                xs.iter()
                    .map(|&x| {
                        let (dx, dy) = (x - 1000.0, y - 1000.0);
                        (dx * dx + dy * dy) * 1e-3
                    })
                    .collect()
            })
            .collect();
        let grid = GridElevations { xs, ys, z };

        // Circle of radius ~550 mm, comfortably inside the grid.
        let polylines = assemble_polylines(march_level(&grid, 300.0));
        assert_eq!(polylines.len(), 1);
        assert!(polylines[0].1, "bowl contour should close");
    }

    #[test]
    fn nan_cells_produce_no_segments() {
        let mut grid = plane_grid(5, 0.1);
        for row in &mut grid.z {
            for v in row.iter_mut() {
                *v = f64::NAN;
            }
        }
        assert!(march_level(&grid, 10.0).is_empty());
    }

    #[test]
    fn interval_must_be_positive() {
        let mesh = crate::types::TerrainMesh::from_parts(
            vec![
                nalgebra::Point3::new(0.0, 0.0, 0.0),
                nalgebra::Point3::new(1000.0, 0.0, 0.0),
                nalgebra::Point3::new(0.0, 1000.0, 500.0),
            ],
            vec![[0, 1, 2]],
        );
        assert!(matches!(
            generate_contours(&mesh, 0.0, None, None),
            Err(TerrainError::Config { .. })
        ));
    }
}
