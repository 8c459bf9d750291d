//! Panel and rack templates.
//!
//! A [`RackTemplate`] is the immutable prototype shared by every placement
//! in an array: placements hold an `Arc<RackTemplate>` handle plus their
//! per-instance deltas (position, rotation, recorded terrain attributes)
//! and never copy or mutate the template itself.

use std::sync::Arc;

use crate::error::{LayoutError, LayoutResult};

/// Solar panel (module) specification.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSpec {
    /// Panel width in mm (short edge).
    pub width_mm: f64,
    /// Panel height in mm (long edge).
    pub height_mm: f64,
    /// Panel thickness in mm.
    pub thickness_mm: f64,

    /// Rated power at STC, watts.
    pub power_watts: f64,
    /// Open-circuit voltage.
    pub voltage_voc: f64,
    /// Short-circuit current.
    pub current_isc: f64,
    /// Voltage at maximum power point.
    pub voltage_mpp: f64,
    /// Current at maximum power point.
    pub current_mpp: f64,

    pub manufacturer: String,
    pub model: String,
    /// Module efficiency, 0..1.
    pub efficiency: f64,
}

impl Default for PanelSpec {
    /// A generic 550 W mono module in the common 1134 x 2278 mm format.
    fn default() -> Self {
        Self {
            width_mm: 1134.0,
            height_mm: 2278.0,
            thickness_mm: 35.0,
            power_watts: 550.0,
            voltage_voc: 49.5,
            current_isc: 13.9,
            voltage_mpp: 41.7,
            current_mpp: 13.2,
            manufacturer: "Generic".into(),
            model: "550W-Mono".into(),
            efficiency: 0.21,
        }
    }
}

impl PanelSpec {
    /// Validate physical and electrical plausibility.
    pub fn validate(&self) -> LayoutResult<()> {
        if self.width_mm <= 0.0 || self.height_mm <= 0.0 {
            return Err(LayoutError::Config {
                details: format!(
                    "panel dimensions must be positive, got {} x {} mm",
                    self.width_mm, self.height_mm
                ),
            });
        }
        if self.power_watts <= 0.0 {
            return Err(LayoutError::Config {
                details: format!("panel power must be positive, got {} W", self.power_watts),
            });
        }
        Ok(())
    }
}

/// Racking system type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RackKind {
    FixedTilt,
    SingleAxisTracker,
    EastWest,
    DualAxisTracker,
}

impl RackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RackKind::FixedTilt => "fixed",
            RackKind::SingleAxisTracker => "tracker",
            RackKind::EastWest => "east_west",
            RackKind::DualAxisTracker => "dual_tracker",
        }
    }
}

/// Shared rack template: geometry plus mounting parameters.
///
/// Width runs east-west (panels side by side), length runs along the slope
/// direction (rows of panels in portrait).
#[derive(Debug, Clone, PartialEq)]
pub struct RackTemplate {
    pub name: String,
    pub panel: PanelSpec,
    /// Panels side by side across the rack.
    pub panels_per_row: u32,
    /// Panel rows along the rack length.
    pub rows: u32,
    pub kind: RackKind,
    /// Fixed tilt angle in degrees (0 for trackers at rest).
    pub tilt_deg: f64,
    /// Azimuth the rack faces, compass degrees (180 = south).
    pub azimuth_deg: f64,
    /// Post height above terrain, meters.
    pub post_height_m: f64,
    /// Minimum ground clearance, meters.
    pub clearance_m: f64,
}

impl Default for RackTemplate {
    fn default() -> Self {
        Self {
            name: "fixed-2p".into(),
            panel: PanelSpec::default(),
            panels_per_row: 2,
            rows: 1,
            kind: RackKind::FixedTilt,
            tilt_deg: 25.0,
            azimuth_deg: 180.0,
            post_height_m: 2.0,
            clearance_m: 0.5,
        }
    }
}

impl RackTemplate {
    /// Fixed-tilt rack template.
    pub fn fixed_tilt(
        name: impl Into<String>,
        panel: PanelSpec,
        panels_per_row: u32,
        rows: u32,
        tilt_deg: f64,
    ) -> Self {
        Self {
            name: name.into(),
            panel,
            panels_per_row,
            rows,
            kind: RackKind::FixedTilt,
            tilt_deg,
            ..Self::default()
        }
    }

    /// Single-axis tracker template. Trackers are modeled flat (tilt 0):
    /// the torque tube rotates through the day but the plan footprint is
    /// the horizontal one.
    pub fn single_axis_tracker(
        name: impl Into<String>,
        panel: PanelSpec,
        panels_per_row: u32,
        rows: u32,
    ) -> Self {
        Self {
            name: name.into(),
            panel,
            panels_per_row,
            rows,
            kind: RackKind::SingleAxisTracker,
            tilt_deg: 0.0,
            ..Self::default()
        }
    }

    /// Wrap in the shared handle placements reference.
    pub fn into_shared(self) -> Arc<RackTemplate> {
        Arc::new(self)
    }

    /// Validate the template.
    pub fn validate(&self) -> LayoutResult<()> {
        self.panel.validate()?;
        if self.panels_per_row == 0 || self.rows == 0 {
            return Err(LayoutError::Config {
                details: "rack must hold at least one panel".into(),
            });
        }
        if !(0.0..=90.0).contains(&self.tilt_deg) {
            return Err(LayoutError::Config {
                details: format!("tilt must be in 0..=90 degrees, got {}", self.tilt_deg),
            });
        }
        Ok(())
    }

    /// Total rack width (across) in mm.
    pub fn width_mm(&self) -> f64 {
        self.panels_per_row as f64 * self.panel.width_mm
    }

    /// Total rack length (along slope) in mm.
    pub fn length_mm(&self) -> f64 {
        self.rows as f64 * self.panel.height_mm
    }

    pub fn width_m(&self) -> f64 {
        self.width_mm() / 1000.0
    }

    pub fn length_m(&self) -> f64 {
        self.length_mm() / 1000.0
    }

    /// Panels per rack instance.
    pub fn total_panels(&self) -> u32 {
        self.panels_per_row * self.rows
    }

    /// DC capacity per rack instance, kW.
    pub fn dc_capacity_kw(&self) -> f64 {
        self.total_panels() as f64 * self.panel.power_watts / 1000.0
    }

    /// Horizontal projection of the rack length under tilt, meters.
    pub fn projected_length_m(&self) -> f64 {
        self.length_m() * self.tilt_deg.to_radians().cos()
    }
}
