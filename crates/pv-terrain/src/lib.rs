//! Terrain surface engine for solar site design.
//!
//! This crate turns raw elevation point clouds into triangulated terrain
//! surfaces and answers the geometric questions site design needs:
//!
//! - **Meshing**: 2D Delaunay triangulation of scattered survey points
//!   ([`TerrainMesh::from_cloud`])
//! - **Slope analysis**: per-face slope/aspect, classification bands,
//!   buildability, heatmap colors ([`SlopeMap`])
//! - **Sampling**: elevation interpolation (linear or cubic), regular-grid
//!   sampling, approximate slope queries ([`sample`])
//! - **Contours**: marching-squares iso-lines at a fixed interval
//!   ([`generate_contours`])
//! - **Earthwork**: cut/fill volumes between grading states ([`cut_fill`])
//! - **Import**: CSV / Esri ASCII DEM / XYZ / PLY terrain files
//!   ([`import`])
//!
//! # Units and axes
//!
//! All coordinates are millimeters in a right-handed system with Z up and
//! +Y as grid north. Aspect bearings are compass degrees (0 = north,
//! 90 = east).
//!
//! # Quick start
//!
//! ```no_run
//! use pv_terrain::{import, SlopeMap, TerrainMesh};
//!
//! let cloud = import::load_terrain("survey.csv", 1000.0)?; // meters -> mm
//! let mesh = TerrainMesh::from_cloud(&cloud)?;
//! let slopes = SlopeMap::analyze(&mesh);
//!
//! println!(
//!     "{} faces, mean slope {:.1} deg, {:.0}% buildable at 20 deg",
//!     mesh.face_count(),
//!     slopes.mean_slope(),
//!     slopes.statistics(20.0).buildable_pct,
//! );
//! # Ok::<(), pv_terrain::TerrainError>(())
//! ```
//!
//! # Failure model
//!
//! Bad input fails fast at the public entry points with a typed
//! [`TerrainError`]. Queries that simply have no answer (a point outside
//! the triangulated hull) return `None` or NaN grid cells instead; see
//! [`sample`]. Degenerate geometry (zero-area triangles) maps to defined
//! fallback values and never propagates NaN into slope or aspect output.

pub mod contour;
pub mod error;
pub mod import;
pub mod sample;
pub mod slope;
pub mod tracing_ext;
pub mod triangulate;
pub mod types;
pub mod volume;

pub use contour::generate_contours;
pub use error::{TerrainError, TerrainResult};
pub use sample::{elevation_at, grid_elevations, slope_aspect_at, slope_at, Interpolation};
pub use slope::{ColorScheme, SlopeClass, SlopeMap, SlopeStatistics, SlopeThresholds};
pub use types::{
    CloudStatistics, ContourLine, ContourSet, GridElevations, PointCloud, TerrainMesh,
    TerrainSource,
};
pub use volume::{cut_fill, CutFill};
