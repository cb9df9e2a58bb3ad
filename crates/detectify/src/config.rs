//! Detection pipeline configuration.

use crate::plausibility::PlausibilityThresholds;
use crate::DetectError;
use detectify_core::{RansacOptions, Real};
use serde::{Deserialize, Serialize};

/// Configuration of a detection pass.
///
/// Serializable so the CLI can load it from JSON; missing fields take their
/// default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Multi-model RANSAC parameters.
    pub ransac: RansacOptions,
    /// Shape sanity bounds for projected reference rectangles.
    pub plausibility: PlausibilityThresholds,
    /// A reference with this many correspondences or fewer is skipped.
    pub min_correspondences: usize,
    /// Factor applied to reported corners and homographies, e.g. to undo an
    /// up-sampling of the frame before feature extraction.
    pub output_scale: Real,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ransac: RansacOptions::default(),
            plausibility: PlausibilityThresholds::default(),
            min_correspondences: 12,
            output_scale: 1.0,
        }
    }
}

fn require(cond: bool, msg: &str) -> Result<(), DetectError> {
    if cond {
        Ok(())
    } else {
        Err(DetectError::InvalidConfig(msg.to_string()))
    }
}

impl DetectorConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// [`DetectError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), DetectError> {
        let r = &self.ransac;
        require(
            r.thresh.is_finite() && r.thresh > 0.0,
            "ransac.thresh must be positive",
        )?;
        require(r.top_n > 0, "ransac.top_n must be at least 1")?;
        require(
            r.max_subset_attempts > 0,
            "ransac.max_subset_attempts must be at least 1",
        )?;

        let p = &self.plausibility;
        require(
            p.min_edge_length.is_finite() && p.min_edge_length >= 0.0,
            "plausibility.min_edge_length must be non-negative",
        )?;
        require(
            p.max_scale_deviation.is_finite() && p.max_scale_deviation > 0.0,
            "plausibility.max_scale_deviation must be positive",
        )?;
        require(
            (0.0..180.0).contains(&p.min_corner_angle_deg),
            "plausibility.min_corner_angle_deg must be in [0, 180)",
        )?;
        require(
            p.max_shear.map_or(true, |v| v.is_finite() && v > 0.0),
            "plausibility.max_shear must be positive when set",
        )?;
        require(
            p.max_projection.map_or(true, |v| v.is_finite() && v > 0.0),
            "plausibility.max_projection must be positive when set",
        )?;

        require(
            self.output_scale.is_finite() && self.output_scale > 0.0,
            "output_scale must be positive",
        )
    }
}
