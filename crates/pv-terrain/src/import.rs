//! Terrain file import.
//!
//! Each supported format is a pure `path -> PointCloud` loader, selected
//! either explicitly through [`TerrainFormat`] or by auto-detection
//! (extension first, then content sniffing). All parse validation happens
//! here: the meshing core never sees malformed data.
//!
//! Coordinates are scaled into millimeters at import time via `unit_scale`
//! (1000.0 for files in meters, 1.0 for files already in mm).

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{TerrainError, TerrainResult};
use crate::types::{PointCloud, TerrainSource};

/// Supported terrain input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerrainFormat {
    /// Delimited point list with X/Y/Z columns.
    CsvPoints,
    /// Esri ASCII grid (`ncols`/`nrows`/... header plus elevation rows).
    DemAscii,
    /// Whitespace-separated `x y z` text.
    XyzText,
    /// PLY point cloud (common LiDAR survey export).
    Ply,
}

impl TerrainFormat {
    /// Format implied by the file extension alone, when unambiguous.
    ///
    /// `.xyz` and `.txt` are not decided here: plain-text files are
    /// regularly mislabeled, so they go through content sniffing.
    pub fn from_extension(path: &Path) -> Option<TerrainFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(TerrainFormat::CsvPoints),
            "asc" | "dem" => Some(TerrainFormat::DemAscii),
            "ply" => Some(TerrainFormat::Ply),
            _ => None,
        }
    }

    /// Detect the format of a file: extension first, then a peek at the
    /// first lines of content.
    pub fn detect(path: &Path) -> TerrainResult<TerrainFormat> {
        if let Some(format) = Self::from_extension(path) {
            return Ok(format);
        }

        let file = File::open(path).map_err(|e| TerrainError::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut head = String::new();
        BufReader::new(file)
            .take(4096)
            .read_to_string(&mut head)
            .map_err(|e| TerrainError::IoRead {
                path: path.to_path_buf(),
                source: e,
            })?;

        let lines: Vec<&str> = head.lines().take(10).collect();
        if lines.first().is_some_and(|l| l.trim_start().starts_with("ply")) {
            return Ok(TerrainFormat::Ply);
        }
        if lines
            .iter()
            .any(|l| {
                let lower = l.to_ascii_lowercase();
                lower.contains("ncols") || lower.contains("nrows")
            })
        {
            return Ok(TerrainFormat::DemAscii);
        }
        if lines.iter().any(|l| l.contains(',')) {
            return Ok(TerrainFormat::CsvPoints);
        }
        Ok(TerrainFormat::XyzText)
    }
}

/// Options for CSV point import.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Zero-based column index of the X coordinate.
    pub x_col: usize,
    /// Zero-based column index of the Y coordinate.
    pub y_col: usize,
    /// Zero-based column index of the Z coordinate.
    pub z_col: usize,
    /// Header rows to skip.
    pub skip_header: usize,
    /// Field delimiter.
    pub delimiter: char,
    /// Multiplier into mm.
    pub unit_scale: f64,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            x_col: 0,
            y_col: 1,
            z_col: 2,
            skip_header: 0,
            delimiter: ',',
            unit_scale: 1.0,
        }
    }
}

/// Import a terrain file with format auto-detection.
pub fn load_terrain(path: impl AsRef<Path>, unit_scale: f64) -> TerrainResult<PointCloud> {
    let path = path.as_ref();
    let format = TerrainFormat::detect(path)?;
    info!(
        target: "pv_terrain::import",
        path = %path.display(),
        format = ?format,
        unit_scale,
        "Importing terrain"
    );

    let cloud = match format {
        TerrainFormat::CsvPoints => load_csv_points(
            path,
            &CsvOptions {
                unit_scale,
                ..CsvOptions::default()
            },
        ),
        TerrainFormat::DemAscii => load_dem_ascii(path, unit_scale),
        TerrainFormat::XyzText => load_xyz_text(path, unit_scale),
        TerrainFormat::Ply => load_ply_points(path, unit_scale),
    }?;

    info!(
        target: "pv_terrain::import",
        points = cloud.len(),
        source = cloud.source.as_str(),
        "Terrain import complete"
    );
    Ok(cloud)
}

/// Import a CSV point list.
///
/// Malformed rows are errors: a survey export with broken rows should be
/// fixed, not silently thinned.
pub fn load_csv_points(path: impl AsRef<Path>, options: &CsvOptions) -> TerrainResult<PointCloud> {
    let path = path.as_ref();
    let reader = open(path)?;

    let mut cloud = PointCloud::new(TerrainSource::CsvPoints);
    let max_col = options.x_col.max(options.y_col).max(options.z_col);

    for (line_num, line) in reader.lines().enumerate() {
        let line = read_line(path, line)?;
        if line_num < options.skip_header {
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(options.delimiter).map(str::trim).collect();
        if fields.len() <= max_col {
            return Err(TerrainError::parse_at(
                path,
                line_num + 1,
                format!("expected at least {} columns, got {}", max_col + 1, fields.len()),
            ));
        }

        let coord = |col: usize, name: &str| -> TerrainResult<f64> {
            fields[col].parse::<f64>().map_err(|_| {
                TerrainError::parse_at(
                    path,
                    line_num + 1,
                    format!("invalid {name} value {:?} in column {col}", fields[col]),
                )
            })
        };

        cloud.push_coords(
            coord(options.x_col, "x")? * options.unit_scale,
            coord(options.y_col, "y")? * options.unit_scale,
            coord(options.z_col, "z")? * options.unit_scale,
        );
    }

    if cloud.is_empty() {
        return Err(TerrainError::Parse {
            path: path.to_path_buf(),
            line: None,
            details: "no data rows found".into(),
        });
    }

    cloud.source_file = Some(path.to_path_buf());
    cloud
        .metadata
        .insert("num_points_imported".into(), cloud.len().to_string());
    cloud
        .metadata
        .insert("unit_scale".into(), options.unit_scale.to_string());
    Ok(cloud)
}

/// Import an Esri ASCII grid DEM.
///
/// Row 0 of the data block is the northern edge: `y = yllcorner +
/// (nrows - 1 - row) * cellsize`. Cells matching `NODATA_value` are
/// dropped.
pub fn load_dem_ascii(path: impl AsRef<Path>, unit_scale: f64) -> TerrainResult<PointCloud> {
    let path = path.as_ref();
    let reader = open(path)?;

    let mut header: Vec<(String, f64)> = Vec::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = read_line(path, line)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };

        if rows.is_empty() && first.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            let value: f64 = tokens
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| {
                    TerrainError::parse_at(
                        path,
                        line_num + 1,
                        format!("header line {first:?} has no numeric value"),
                    )
                })?;
            header.push((first.to_ascii_lowercase(), value));
        } else {
            let row: Vec<f64> = std::iter::once(first)
                .chain(tokens)
                .map(|t| {
                    t.parse::<f64>().map_err(|_| {
                        TerrainError::parse_at(
                            path,
                            line_num + 1,
                            format!("invalid elevation value {t:?}"),
                        )
                    })
                })
                .collect::<TerrainResult<_>>()?;
            rows.push(row);
        }
    }

    let field = |key: &str| -> TerrainResult<f64> {
        header
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
            .ok_or_else(|| TerrainError::Parse {
                path: path.to_path_buf(),
                line: None,
                details: format!("missing required header: {key}"),
            })
    };

    let ncols = field("ncols")? as usize;
    let nrows = field("nrows")? as usize;
    let xllcorner = field("xllcorner")? * unit_scale;
    let yllcorner = field("yllcorner")? * unit_scale;
    let cellsize = field("cellsize")? * unit_scale;
    let nodata = field("nodata_value").unwrap_or(-9999.0);

    if rows.len() != nrows {
        return Err(TerrainError::Parse {
            path: path.to_path_buf(),
            line: None,
            details: format!("expected {nrows} grid rows, got {}", rows.len()),
        });
    }

    let mut cloud = PointCloud::with_capacity(TerrainSource::DemGrid, ncols * nrows);
    for (row_idx, row) in rows.iter().enumerate() {
        if row.len() != ncols {
            return Err(TerrainError::Parse {
                path: path.to_path_buf(),
                line: None,
                details: format!(
                    "grid row {row_idx} has {} columns, expected {ncols}",
                    row.len()
                ),
            });
        }
        for (col_idx, &z) in row.iter().enumerate() {
            if z == nodata {
                continue;
            }
            cloud.push_coords(
                xllcorner + col_idx as f64 * cellsize,
                yllcorner + (nrows - 1 - row_idx) as f64 * cellsize,
                z * unit_scale,
            );
        }
    }

    if cloud.is_empty() {
        return Err(TerrainError::Parse {
            path: path.to_path_buf(),
            line: None,
            details: "no valid elevation data (all cells are nodata)".into(),
        });
    }

    cloud.source_file = Some(path.to_path_buf());
    for (key, value) in [
        ("ncols", ncols as f64),
        ("nrows", nrows as f64),
        ("cellsize", cellsize),
        ("nodata_value", nodata),
        ("unit_scale", unit_scale),
    ] {
        cloud.metadata.insert(key.into(), value.to_string());
    }
    Ok(cloud)
}

/// Import whitespace-separated XYZ text.
///
/// Comment lines (`#`) and malformed lines are skipped with a warning;
/// survey dumps in this format routinely carry trailing junk.
pub fn load_xyz_text(path: impl AsRef<Path>, unit_scale: f64) -> TerrainResult<PointCloud> {
    let path = path.as_ref();
    let reader = open(path)?;

    let mut cloud = PointCloud::new(TerrainSource::Survey);
    let mut skipped = 0usize;

    for (line_num, line) in reader.lines().enumerate() {
        let line = read_line(path, line)?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let parsed = if parts.len() >= 3 {
            match (
                parts[0].parse::<f64>(),
                parts[1].parse::<f64>(),
                parts[2].parse::<f64>(),
            ) {
                (Ok(x), Ok(y), Ok(z)) => Some((x, y, z)),
                _ => None,
            }
        } else {
            None
        };

        match parsed {
            Some((x, y, z)) => {
                cloud.push_coords(x * unit_scale, y * unit_scale, z * unit_scale)
            }
            None => {
                warn!(
                    target: "pv_terrain::import",
                    line = line_num + 1,
                    "Skipping malformed XYZ line"
                );
                skipped += 1;
            }
        }
    }

    if cloud.is_empty() {
        return Err(TerrainError::Parse {
            path: path.to_path_buf(),
            line: None,
            details: "no valid points found".into(),
        });
    }

    cloud.source_file = Some(path.to_path_buf());
    cloud
        .metadata
        .insert("num_points_imported".into(), cloud.len().to_string());
    cloud
        .metadata
        .insert("lines_skipped".into(), skipped.to_string());
    Ok(cloud)
}

/// Import a PLY point cloud (vertex positions only).
pub fn load_ply_points(path: impl AsRef<Path>, unit_scale: f64) -> TerrainResult<PointCloud> {
    use ply_rs::parser::Parser;

    let path = path.as_ref();
    let file = File::open(path).map_err(|e| TerrainError::IoRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<ply_rs::ply::DefaultElement>::new();
    let ply = parser.read_ply(&mut reader).map_err(|e| TerrainError::Parse {
        path: path.to_path_buf(),
        line: None,
        details: format!("PLY parse error: {e:?}"),
    })?;

    let vertices = ply.payload.get("vertex").ok_or_else(|| TerrainError::Parse {
        path: path.to_path_buf(),
        line: None,
        details: "PLY file has no vertex element".into(),
    })?;

    let mut cloud = PointCloud::with_capacity(TerrainSource::Survey, vertices.len());
    for element in vertices {
        let coord = |name: &str| -> TerrainResult<f64> {
            element
                .get(name)
                .and_then(ply_scalar)
                .ok_or_else(|| TerrainError::Parse {
                    path: path.to_path_buf(),
                    line: None,
                    details: format!("PLY vertex is missing numeric property {name:?}"),
                })
        };
        cloud.push_coords(
            coord("x")? * unit_scale,
            coord("y")? * unit_scale,
            coord("z")? * unit_scale,
        );
    }

    if cloud.is_empty() {
        return Err(TerrainError::Parse {
            path: path.to_path_buf(),
            line: None,
            details: "PLY file contains no vertices".into(),
        });
    }

    cloud.source_file = Some(path.to_path_buf());
    cloud
        .metadata
        .insert("num_points_imported".into(), cloud.len().to_string());
    Ok(cloud)
}

fn ply_scalar(property: &ply_rs::ply::Property) -> Option<f64> {
    use ply_rs::ply::Property;
    match *property {
        Property::Char(v) => Some(v as f64),
        Property::UChar(v) => Some(v as f64),
        Property::Short(v) => Some(v as f64),
        Property::UShort(v) => Some(v as f64),
        Property::Int(v) => Some(v as f64),
        Property::UInt(v) => Some(v as f64),
        Property::Float(v) => Some(v as f64),
        Property::Double(v) => Some(v),
        _ => None,
    }
}

/// Generate a regular-grid synthetic terrain (tests, demos, DEM stand-ins).
///
/// Points cover `0..=x_extent` by `0..=y_extent` at `spacing`, column-major
/// (X outer, Y inner), with `z = elevation(x, y)`. All values in mm.
pub fn synthetic_terrain(
    x_extent: f64,
    y_extent: f64,
    spacing: f64,
    elevation: impl Fn(f64, f64) -> f64,
) -> PointCloud {
    let mut cloud = PointCloud::new(TerrainSource::Synthetic);
    let mut x = 0.0;
    while x <= x_extent + spacing / 2.0 {
        let mut y = 0.0;
        while y <= y_extent + spacing / 2.0 {
            cloud.push_coords(x, y, elevation(x, y));
            y += spacing;
        }
        x += spacing;
    }
    cloud
        .metadata
        .insert("grid_spacing_mm".into(), spacing.to_string());
    cloud
}

fn open(path: &Path) -> TerrainResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| TerrainError::IoRead {
            path: path.to_path_buf(),
            source: e,
        })
}

fn read_line(path: &Path, line: std::io::Result<String>) -> TerrainResult<String> {
    line.map_err(|e| TerrainError::IoRead {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_detection() {
        assert_eq!(
            TerrainFormat::from_extension(Path::new("site.csv")),
            Some(TerrainFormat::CsvPoints)
        );
        assert_eq!(
            TerrainFormat::from_extension(Path::new("tile.ASC")),
            Some(TerrainFormat::DemAscii)
        );
        assert_eq!(
            TerrainFormat::from_extension(Path::new("scan.ply")),
            Some(TerrainFormat::Ply)
        );
        // Plain text defers to content sniffing.
        assert_eq!(TerrainFormat::from_extension(Path::new("pts.xyz")), None);
        assert_eq!(TerrainFormat::from_extension(Path::new("noext")), None);
    }

    #[test]
    fn synthetic_grid_has_expected_shape() {
        let cloud = synthetic_terrain(4000.0, 4000.0, 1000.0, |_, y| y * 0.1);
        assert_eq!(cloud.len(), 25);
        assert_eq!(cloud.source, TerrainSource::Synthetic);
        let (min, max) = cloud.bounds().unwrap();
        assert_eq!((min.x, max.x), (0.0, 4000.0));
        assert_eq!((min.z, max.z), (0.0, 400.0));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_terrain("/nonexistent/terrain.xyz", 1.0).unwrap_err();
        assert!(matches!(err, TerrainError::IoRead { .. }));
    }
}
