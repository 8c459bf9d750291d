//! Tracing helpers for terrain operations.
//!
//! Enable output by installing a subscriber in the application:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//! // RUST_LOG=pv_terrain=debug for detailed output,
//! // RUST_LOG=pv_terrain::timing=info for operation timing only.
//! ```

use std::time::Instant;
use tracing::{debug, info};

use crate::types::{PointCloud, TerrainMesh};

/// Logs an operation's duration on drop.
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
}

impl OperationTimer {
    pub fn new(name: &'static str) -> Self {
        debug!(target: "pv_terrain::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Timer with an input-size field (points, faces, cells).
    pub fn with_count(name: &'static str, count: usize) -> Self {
        debug!(
            target: "pv_terrain::timing",
            operation = name,
            count,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        info!(
            target: "pv_terrain::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", self.elapsed_ms()),
            "Operation completed"
        );
    }
}

/// Log point-cloud shape at debug level.
pub fn log_cloud_stats(cloud: &PointCloud, context: &str) {
    let extent = cloud
        .bounds()
        .map(|(min, max)| format!("{:.0} x {:.0} mm", max.x - min.x, max.y - min.y))
        .unwrap_or_else(|| "empty".into());

    debug!(
        target: "pv_terrain::cloud_state",
        context,
        points = cloud.len(),
        source = cloud.source.as_str(),
        extent,
        "Point cloud state"
    );
}

/// Log mesh shape at debug level.
pub fn log_mesh_stats(mesh: &TerrainMesh, context: &str) {
    let elevation = mesh
        .elevation_range()
        .map(|(lo, hi)| format!("{lo:.0}..{hi:.0} mm"))
        .unwrap_or_else(|| "empty".into());

    debug!(
        target: "pv_terrain::mesh_state",
        context,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        elevation,
        "Mesh state"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TerrainSource;

    #[test]
    fn timer_measures_elapsed_time() {
        let timer = OperationTimer::new("test_operation");
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.elapsed_ms() >= 5.0);
    }

    #[test]
    fn stat_loggers_accept_empty_inputs() {
        log_cloud_stats(&PointCloud::new(TerrainSource::Synthetic), "test");
        log_mesh_stats(&TerrainMesh::from_parts(Vec::new(), Vec::new()), "test");
    }
}
