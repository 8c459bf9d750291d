//! Per-face slope and aspect analysis.
//!
//! Slope is the angle between a face and the horizontal, derived from the
//! face normal: `slope = acos(clamp(|n.z|, 0, 1))`. Aspect is the compass
//! bearing the face looks toward, from the normal's horizontal component:
//! `aspect = atan2(n.x, n.y)` normalized to 0..360 with 0 = north and
//! 90 = east.
//!
//! Degenerate faces never reach this module with a NaN normal (the mesh
//! substitutes the vertical fallback), so slope and aspect outputs are
//! always finite.

use rayon::prelude::*;

use crate::types::TerrainMesh;

/// Slope band at or above which a face counts as very steep, in degrees.
pub const VERY_STEEP_DEG: f64 = 35.0;

/// Slope at which the heatmap color ramp saturates, in degrees.
const COLOR_RAMP_MAX_DEG: f64 = 45.0;

/// Slope classification band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlopeClass {
    Flat,
    Gentle,
    Moderate,
    Steep,
    VerySteep,
}

impl SlopeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlopeClass::Flat => "flat",
            SlopeClass::Gentle => "gentle",
            SlopeClass::Moderate => "moderate",
            SlopeClass::Steep => "steep",
            SlopeClass::VerySteep => "very_steep",
        }
    }
}

/// Ascending classification thresholds in degrees.
///
/// Buckets are half-open: a face exactly at a threshold belongs to the
/// higher band. The very-steep band starts at the fixed [`VERY_STEEP_DEG`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeThresholds {
    /// Below this: flat.
    pub low: f64,
    /// Below this (and at least `low`): gentle.
    pub mid: f64,
    /// Below this (and at least `mid`): moderate.
    pub high: f64,
}

impl Default for SlopeThresholds {
    fn default() -> Self {
        Self {
            low: 5.0,
            mid: 15.0,
            high: 25.0,
        }
    }
}

/// Heatmap color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    /// Green (flat) to red (steep), saturating at 45 degrees.
    Slope,
    /// Hue wheel over the compass bearing.
    Aspect,
}

/// Per-face slope statistics.
#[derive(Debug, Clone)]
pub struct SlopeStatistics {
    pub mean_slope_deg: f64,
    pub max_slope_deg: f64,
    pub min_slope_deg: f64,
    pub std_slope_deg: f64,
    /// Face counts per class, indexed Flat..VerySteep.
    pub class_counts: [usize; 5],
    /// Percentage of faces at or below `buildable_max_deg`.
    pub buildable_pct: f64,
    pub buildable_max_deg: f64,
}

/// Slope and aspect for every face of one terrain mesh.
#[derive(Debug, Clone)]
pub struct SlopeMap {
    /// Slope angle per face, 0..=90 degrees.
    pub face_slope_deg: Vec<f64>,
    /// Aspect bearing per face, 0..360 degrees, 0 = north, clockwise.
    pub face_aspect_deg: Vec<f64>,
    /// Classification thresholds.
    pub thresholds: SlopeThresholds,
}

impl SlopeMap {
    /// Analyze a mesh with the default thresholds.
    pub fn analyze(mesh: &TerrainMesh) -> SlopeMap {
        Self::analyze_with(mesh, SlopeThresholds::default())
    }

    /// Analyze a mesh with custom thresholds.
    pub fn analyze_with(mesh: &TerrainMesh, thresholds: SlopeThresholds) -> SlopeMap {
        let (face_slope_deg, face_aspect_deg): (Vec<f64>, Vec<f64>) = mesh
            .face_normals()
            .par_iter()
            .map(|n| {
                let slope = n.z.abs().clamp(0.0, 1.0).acos().to_degrees();
                // rem_euclid can round up to the modulus itself for tiny
                // negative bearings; keep the result strictly below 360.
                let mut aspect = n.x.atan2(n.y).to_degrees().rem_euclid(360.0);
                if aspect >= 360.0 {
                    aspect = 0.0;
                }
                (slope, aspect)
            })
            .unzip();

        SlopeMap {
            face_slope_deg,
            face_aspect_deg,
            thresholds,
        }
    }

    /// Number of faces.
    #[inline]
    pub fn len(&self) -> usize {
        self.face_slope_deg.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.face_slope_deg.is_empty()
    }

    /// Classify one slope value.
    pub fn classify_slope(&self, slope_deg: f64) -> SlopeClass {
        if slope_deg < self.thresholds.low {
            SlopeClass::Flat
        } else if slope_deg < self.thresholds.mid {
            SlopeClass::Gentle
        } else if slope_deg < self.thresholds.high {
            SlopeClass::Moderate
        } else if slope_deg < VERY_STEEP_DEG {
            SlopeClass::Steep
        } else {
            SlopeClass::VerySteep
        }
    }

    /// Classification for every face.
    pub fn classify(&self) -> Vec<SlopeClass> {
        self.face_slope_deg
            .iter()
            .map(|&s| self.classify_slope(s))
            .collect()
    }

    /// Indices of faces with slope at or below `max_slope_deg` (inclusive).
    pub fn buildable_faces(&self, max_slope_deg: f64) -> Vec<usize> {
        self.face_slope_deg
            .iter()
            .enumerate()
            .filter(|(_, &s)| s <= max_slope_deg)
            .map(|(i, _)| i)
            .collect()
    }

    /// Mean slope in degrees (0 for an empty map).
    pub fn mean_slope(&self) -> f64 {
        if self.face_slope_deg.is_empty() {
            return 0.0;
        }
        self.face_slope_deg.iter().sum::<f64>() / self.face_slope_deg.len() as f64
    }

    /// Maximum slope in degrees (0 for an empty map).
    pub fn max_slope(&self) -> f64 {
        self.face_slope_deg.iter().fold(0.0, |a, &b| a.max(b))
    }

    /// Statistical summary, with buildability judged at `buildable_max_deg`.
    pub fn statistics(&self, buildable_max_deg: f64) -> SlopeStatistics {
        let n = self.face_slope_deg.len().max(1) as f64;
        let mean = self.mean_slope();
        let var = self
            .face_slope_deg
            .iter()
            .map(|s| (s - mean).powi(2))
            .sum::<f64>()
            / n;

        let mut class_counts = [0usize; 5];
        for class in self.classify() {
            class_counts[class as usize] += 1;
        }

        let buildable = self.buildable_faces(buildable_max_deg).len();

        SlopeStatistics {
            mean_slope_deg: mean,
            max_slope_deg: self.max_slope(),
            min_slope_deg: self
                .face_slope_deg
                .iter()
                .fold(f64::INFINITY, |a, &b| a.min(b))
                .min(90.0),
            std_slope_deg: var.sqrt(),
            class_counts,
            buildable_pct: buildable as f64 / n * 100.0,
            buildable_max_deg,
        }
    }

    /// Per-face RGB heatmap colors, every channel in [0, 1].
    ///
    /// The slope scheme clamps slopes to the 0..45 degree ramp, so values
    /// beyond the ramp (and any aspect whatsoever) still map into range.
    pub fn heatmap_colors(&self, scheme: ColorScheme) -> Vec<[f64; 3]> {
        match scheme {
            ColorScheme::Slope => self
                .face_slope_deg
                .par_iter()
                .map(|&s| {
                    let t = (s / COLOR_RAMP_MAX_DEG).clamp(0.0, 1.0);
                    [t, 1.0 - t * 0.5, 0.1]
                })
                .collect(),
            ColorScheme::Aspect => self
                .face_aspect_deg
                .par_iter()
                .map(|&a| {
                    let h = a.rem_euclid(360.0) / 360.0;
                    hue_to_rgb(h)
                })
                .collect(),
        }
    }
}

/// Piecewise-linear hue approximation: h in [0, 1] to RGB.
fn hue_to_rgb(h: f64) -> [f64; 3] {
    [
        ((h * 6.0 - 3.0).abs() - 1.0).clamp(0.0, 1.0),
        (2.0 - (h * 6.0 - 2.0).abs()).clamp(0.0, 1.0),
        (2.0 - (h * 6.0 - 4.0).abs()).clamp(0.0, 1.0),
    ]
}
