//! Error types for layout generation.

use miette::Diagnostic;
use thiserror::Error;

use pv_terrain::TerrainError;

/// Result type alias for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Errors produced by layout configuration and generation.
///
/// Terrain-query failures *inside* the placement scan are not errors: the
/// affected cell is skipped as unbuildable and the scan continues. Only
/// failures at entry points (an unbuildable configuration, a terrain
/// operation that cannot start) surface here.
#[derive(Debug, Error, Diagnostic)]
pub enum LayoutError {
    /// A layout parameter is outside its valid range.
    #[error("invalid layout configuration: {details}")]
    #[diagnostic(
        code(layout::config::invalid),
        help("Typical values: GCR 0.3-0.5, row spacing 4-8 m, max slope 15-25 degrees.")
    )]
    Config { details: String },

    /// A terrain operation failed before the scan could run.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Terrain(#[from] TerrainError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrain_errors_convert() {
        let terrain = TerrainError::InsufficientData { got: 1 };
        let layout: LayoutError = terrain.into();
        assert!(matches!(layout, LayoutError::Terrain(_)));
    }
}
