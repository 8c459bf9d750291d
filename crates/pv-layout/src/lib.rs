//! Terrain-aware solar array layout.
//!
//! This crate turns a rack template plus site constraints into a concrete
//! array of placements:
//!
//! - **Templates**: immutable panel/rack prototypes shared by reference
//!   across every placement ([`RackTemplate`], [`PanelSpec`])
//! - **Spacing math**: row pitch from a ground-coverage-ratio target
//!   ([`optimize_spacing_for_gcr`])
//! - **Placement**: a deterministic row-major grid scan that samples the
//!   terrain at each candidate cell and skips unbuildable ground
//!   ([`generate_grid_layout`])
//! - **Aggregation**: panel counts, DC capacity, achieved GCR
//!   ([`ArrayLayout::statistics`]), electrical string grouping
//!   ([`create_layout_groups`]), and site-area estimation
//!   ([`estimate_build_area`])
//!
//! Terrain comes from [`pv_terrain`]; positions are millimeters, site-level
//! distances (row spacing, areas) are meters, matching field drawings.
//!
//! # Example
//!
//! ```
//! use pv_layout::{
//!     generate_grid_layout, optimize_spacing_for_gcr, LayoutConfig, PanelSpec, RackTemplate,
//! };
//!
//! let rack = RackTemplate::single_axis_tracker("sat-2p", PanelSpec::default(), 2, 1)
//!     .into_shared();
//! let mut config = LayoutConfig::new(rack.clone());
//! config.row_spacing_m = optimize_spacing_for_gcr(&rack, 0.35)?;
//! config.target_capacity_mw = Some(2.0);
//!
//! let layout = generate_grid_layout(&config, None)?;
//! let stats = layout.statistics();
//! assert!(stats.dc_capacity_kw >= 2000.0);
//! # Ok::<(), pv_layout::LayoutError>(())
//! ```

pub mod engine;
pub mod error;
pub mod layout;
pub mod template;

pub use engine::{
    calculate_actual_gcr, create_layout_groups, estimate_build_area, generate_grid_layout,
    optimize_spacing_for_gcr, AreaEstimate,
};
pub use error::{LayoutError, LayoutResult};
pub use layout::{ArrayLayout, LayoutConfig, LayoutStatistics, RackPlacement, StringGroup};
pub use template::{PanelSpec, RackKind, RackTemplate};
