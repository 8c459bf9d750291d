//! Error types for terrain operations.
//!
//! Every public entry point validates its input and reports failures through
//! [`TerrainError`]; once validated, internal helpers assume well-formed data
//! and do not re-validate. Each variant carries a stable diagnostic code
//! (`terrain::...`) and a recovery hint for terminal display via miette.
//!
//! Out-of-hull elevation and slope queries are *not* errors: they return
//! `None` (or NaN cells in a sampled grid), which callers are expected to
//! check for. See [`crate::sample`].

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for terrain operations.
pub type TerrainResult<T> = Result<T, TerrainError>;

/// Errors produced by terrain meshing, analysis, and import.
#[derive(Debug, Error, Diagnostic)]
pub enum TerrainError {
    /// Too few points to triangulate a surface.
    #[error("not enough points to build a terrain mesh: got {got}, need at least 3")]
    #[diagnostic(
        code(terrain::mesh::insufficient_data),
        help("A triangulated surface needs at least 3 points. Check the import filters (nodata, column indices) if the source file should contain more.")
    )]
    InsufficientData { got: usize },

    /// Input is geometrically degenerate (e.g. all points collinear).
    #[error("degenerate terrain input: {details}")]
    #[diagnostic(
        code(terrain::mesh::degenerate_input),
        help("The points span no area in the XY plane, so triangulation produced no triangles. Survey lines and single transects cannot form a surface.")
    )]
    DegenerateInput { details: String },

    /// Two meshes passed to cut/fill do not share a triangulation.
    #[error("incompatible meshes for cut/fill: {details}")]
    #[diagnostic(
        code(terrain::volume::incompatible_mesh),
        help("Cut/fill compares surfaces triangle by triangle. Build the graded mesh from the same point layout as the original (same XY positions, same order).")
    )]
    IncompatibleMesh {
        left_faces: usize,
        right_faces: usize,
        details: String,
    },

    /// A parameter is outside its valid range.
    #[error("invalid configuration: {details}")]
    #[diagnostic(code(terrain::config::invalid))]
    Config { details: String },

    /// Error reading a terrain file.
    #[error("failed to read terrain file {path}")]
    #[diagnostic(
        code(terrain::io::read),
        help("Check that the file exists and is readable.")
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing a terrain file.
    #[error("failed to parse terrain file {path}: {details}")]
    #[diagnostic(
        code(terrain::io::parse),
        help("The file may be malformed or in a different format than detected. Pass the format explicitly instead of relying on auto-detection.")
    )]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        details: String,
    },

    /// Unrecognized terrain file format.
    #[error("unsupported terrain format: {extension:?}")]
    #[diagnostic(
        code(terrain::io::unsupported_format),
        help("Supported formats: CSV point lists, Esri ASCII grids (.asc/.dem), XYZ text, PLY point clouds.")
    )]
    UnsupportedFormat { extension: Option<String> },
}

impl TerrainError {
    /// Shorthand for a parse error with a line number.
    pub(crate) fn parse_at(path: &std::path::Path, line: usize, details: impl Into<String>) -> Self {
        TerrainError::Parse {
            path: path.to_path_buf(),
            line: Some(line),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_include_context() {
        let err = TerrainError::InsufficientData { got: 2 };
        assert!(err.to_string().contains("got 2"));

        let err = TerrainError::IncompatibleMesh {
            left_faces: 10,
            right_faces: 12,
            details: "triangle counts differ (10 vs 12)".into(),
        };
        assert!(err.to_string().contains("10 vs 12"));
    }
}
