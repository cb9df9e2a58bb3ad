//! Turning ranked homography hypotheses into distinct object instances.
//!
//! Multi-model RANSAC returns many near-duplicates of the dominant instance.
//! The selector walks the ranking best-first and keeps a model only if it
//! shares no correspondence with a model already kept and it projects the
//! reference rectangle to a plausible quadrilateral.

use crate::plausibility::{check_homography, check_quad, PlausibilityThresholds, ReferenceSize};
use crate::DetectError;
use detectify_core::{Correspondence, Mat3, ModelResult, Pt2};
use log::debug;
use serde::{Deserialize, Serialize};

/// One detected instance of a reference in the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCandidate {
    /// Label of the reference this instance belongs to.
    pub label: String,
    /// Projected reference corners: top-left, top-right, bottom-right, bottom-left.
    pub corners: [Pt2; 4],
    /// Reference-to-frame homography.
    pub homography: Mat3,
    pub inlier_count: usize,
    /// Caller-side indices ([`Correspondence::index`]) of the supporting matches.
    pub inliers: Vec<usize>,
}

/// Correspondences already attributed to an accepted instance.
#[derive(Debug, Clone)]
struct ClaimMask {
    claimed: Vec<bool>,
}

impl ClaimMask {
    fn new(len: usize) -> Self {
        Self {
            claimed: vec![false; len],
        }
    }

    fn any_claimed<I: IntoIterator<Item = usize>>(&self, positions: I) -> bool {
        positions.into_iter().any(|i| self.claimed[i])
    }

    fn overlaps(&self, mask: &[bool]) -> bool {
        self.claimed.iter().zip(mask).any(|(&c, &m)| c && m)
    }

    fn claim(&mut self, mask: &[bool]) {
        for (c, &m) in self.claimed.iter_mut().zip(mask) {
            *c |= m;
        }
    }
}

fn validate_model<M>(model: &ModelResult<M>, len: usize) -> Result<(), DetectError> {
    if model.inlier_mask.len() != len {
        return Err(DetectError::MaskLengthMismatch {
            expected: len,
            found: model.inlier_mask.len(),
        });
    }
    if let Some(&index) = model.sample.iter().find(|&&i| i >= len) {
        return Err(DetectError::SampleIndexOutOfRange { index, len });
    }
    Ok(())
}

/// Select non-overlapping, plausible instances from ranked `models`.
///
/// `models` must be ordered best-first and their masks indexed by position
/// in `matches`. Rejected models never claim correspondences, so a weaker
/// model overlapping only a rejected one may still be accepted.
///
/// # Errors
///
/// [`DetectError::InvalidReference`] for a non-positive or non-finite size;
/// [`DetectError::MaskLengthMismatch`] or [`DetectError::SampleIndexOutOfRange`]
/// if a model was not produced from `matches`.
pub fn select_instances(
    label: &str,
    matches: &[Correspondence],
    models: &[ModelResult<Mat3>],
    reference: &ReferenceSize,
    thresholds: &PlausibilityThresholds,
) -> Result<Vec<DetectionCandidate>, DetectError> {
    if !reference.is_valid() {
        return Err(DetectError::InvalidReference {
            label: label.to_string(),
            width: reference.width,
            height: reference.height,
        });
    }

    let mut claims = ClaimMask::new(matches.len());
    let mut selected = Vec::new();

    for (rank, model) in models.iter().enumerate() {
        validate_model(model, matches.len())?;

        // Cheap pre-check on the minimal sample before scanning the full mask.
        if claims.any_claimed(model.sample.iter().copied())
            || claims.overlaps(&model.inlier_mask)
        {
            debug!("{label}: model #{rank} overlaps an accepted instance");
            continue;
        }

        if let Err(why) = check_homography(&model.model, thresholds) {
            debug!("{label}: model #{rank} rejected, {why}");
            continue;
        }

        let Some(corners) = reference.project(&model.model) else {
            debug!("{label}: model #{rank} maps a corner to infinity");
            continue;
        };

        if let Err(why) = check_quad(&corners, reference, thresholds) {
            debug!("{label}: model #{rank} rejected, {why}");
            continue;
        }

        claims.claim(&model.inlier_mask);
        selected.push(DetectionCandidate {
            label: label.to_string(),
            corners,
            homography: model.model,
            inlier_count: model.inlier_count,
            inliers: model.inlier_indices().map(|i| matches[i].index).collect(),
        });
    }

    debug!(
        "{label}: selected {} of {} ranked models",
        selected.len(),
        models.len()
    );
    Ok(selected)
}
