//! Per-frame detection driver.
//!
//! A frame is matched against every reference independently; each reference
//! runs its own multi-model RANSAC pass followed by instance selection. The
//! passes share nothing, so [`FrameDetector::detect_frame`] fans them out over
//! the rayon thread pool and joins the results in reference order.

use crate::config::DetectorConfig;
use crate::plausibility::ReferenceSize;
use crate::selector::{select_instances, DetectionCandidate};
use crate::DetectError;
use detectify_core::{Correspondence, Mat3, Real};
use detectify_linear::find_homography_candidates_with_rng;
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Tentative matches between one reference image and the current frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMatches {
    pub label: String,
    /// Reference image width in pixels.
    pub width: Real,
    /// Reference image height in pixels.
    pub height: Real,
    /// `src` in reference pixels, `dst` in frame pixels.
    pub correspondences: Vec<Correspondence>,
}

impl ReferenceMatches {
    pub fn size(&self) -> ReferenceSize {
        ReferenceSize::new(self.width, self.height)
    }
}

/// Instances of one reference found in a frame, best-supported first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDetections {
    pub label: String,
    pub candidates: Vec<DetectionCandidate>,
}

/// Detections for every reference of a frame, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    pub references: Vec<ReferenceDetections>,
}

impl FrameDetections {
    /// Total number of instances across all references.
    pub fn instance_count(&self) -> usize {
        self.references.iter().map(|r| r.candidates.len()).sum()
    }

    /// All instances, grouped by reference.
    pub fn candidates(&self) -> impl Iterator<Item = &DetectionCandidate> {
        self.references.iter().flat_map(|r| r.candidates.iter())
    }

    pub fn get(&self, label: &str) -> Option<&ReferenceDetections> {
        self.references.iter().find(|r| r.label == label)
    }
}

/// Seed of the RNG stream used for the reference at `position` in a frame.
fn stream_seed(seed: u64, position: usize) -> u64 {
    seed ^ (position as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Scale corners and homography from detection space to output space.
fn rescale(candidate: &mut DetectionCandidate, scale: Real) {
    if scale == 1.0 {
        return;
    }
    let s = Mat3::new(scale, 0.0, 0.0, 0.0, scale, 0.0, 0.0, 0.0, 1.0);
    candidate.homography = s * candidate.homography;
    for c in candidate.corners.iter_mut() {
        c.coords *= scale;
    }
}

/// Detects instances of planar references from tentative correspondences.
#[derive(Debug, Clone)]
pub struct FrameDetector {
    config: DetectorConfig,
}

impl FrameDetector {
    /// # Errors
    ///
    /// [`DetectError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: DetectorConfig) -> Result<Self, DetectError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect all instances of one reference, seeding from `ransac.seed`.
    pub fn detect_reference(
        &self,
        reference: &ReferenceMatches,
    ) -> Result<ReferenceDetections, DetectError> {
        let mut rng = StdRng::seed_from_u64(stream_seed(self.config.ransac.seed, 0));
        self.detect_reference_with_rng(reference, &mut rng)
    }

    /// Detect all instances of one reference, drawing samples from `rng`.
    ///
    /// References with `min_correspondences` matches or fewer yield no
    /// candidates without running RANSAC.
    ///
    /// # Errors
    ///
    /// [`DetectError::InvalidReference`] for a non-positive or non-finite size.
    pub fn detect_reference_with_rng<R: Rng>(
        &self,
        reference: &ReferenceMatches,
        rng: &mut R,
    ) -> Result<ReferenceDetections, DetectError> {
        let label = reference.label.as_str();
        let size = reference.size();
        if !size.is_valid() {
            return Err(DetectError::InvalidReference {
                label: label.to_string(),
                width: size.width,
                height: size.height,
            });
        }

        let matches = &reference.correspondences;
        if matches.len() <= self.config.min_correspondences {
            debug!(
                "{label}: {} correspondences, need more than {}; skipped",
                matches.len(),
                self.config.min_correspondences
            );
            return Ok(ReferenceDetections {
                label: label.to_string(),
                candidates: Vec::new(),
            });
        }

        let models = find_homography_candidates_with_rng(matches, &self.config.ransac, rng);
        debug!("{label}: {} ranked models from {} matches", models.len(), matches.len());

        let mut candidates =
            select_instances(label, matches, &models, &size, &self.config.plausibility)?;
        for c in candidates.iter_mut() {
            rescale(c, self.config.output_scale);
        }

        Ok(ReferenceDetections {
            label: label.to_string(),
            candidates,
        })
    }

    /// Detect every reference of a frame in parallel.
    ///
    /// Each reference gets its own RNG stream derived from `ransac.seed` and
    /// its position, so results do not depend on thread scheduling.
    ///
    /// # Errors
    ///
    /// Any error raised by a single reference aborts the whole frame.
    pub fn detect_frame(
        &self,
        references: &[ReferenceMatches],
    ) -> Result<FrameDetections, DetectError> {
        let references = references
            .par_iter()
            .enumerate()
            .map(|(position, reference)| {
                let mut rng =
                    StdRng::seed_from_u64(stream_seed(self.config.ransac.seed, position));
                self.detect_reference_with_rng(reference, &mut rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let detections = FrameDetections { references };
        debug!(
            "frame: {} instances across {} references",
            detections.instance_count(),
            detections.references.len()
        );
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detectify_core::Pt2;

    fn sparse_reference(n: usize) -> ReferenceMatches {
        ReferenceMatches {
            label: "poster".into(),
            width: 100.0,
            height: 80.0,
            correspondences: (0..n)
                .map(|i| {
                    let p = Pt2::new(i as f64 * 3.0, (i % 4) as f64 * 9.0);
                    Correspondence::new(p, p, i)
                })
                .collect(),
        }
    }

    #[test]
    fn stream_seeds_differ_per_position() {
        assert_ne!(stream_seed(1, 0), stream_seed(1, 1));
        assert_ne!(stream_seed(1, 0), 1);
    }

    #[test]
    fn rescale_moves_corners_and_homography_together() {
        let mut c = DetectionCandidate {
            label: "x".into(),
            corners: [Pt2::new(3.0, 6.0); 4],
            homography: Mat3::new(1.0, 0.0, 3.0, 0.0, 1.0, 6.0, 0.0, 0.0, 1.0),
            inlier_count: 0,
            inliers: Vec::new(),
        };
        rescale(&mut c, 1.0 / 3.0);
        assert!((c.corners[0] - Pt2::new(1.0, 2.0)).norm() < 1e-12);
        let p = detectify_core::project_point(&c.homography, &Pt2::origin()).unwrap();
        assert!((p - Pt2::new(1.0, 2.0)).norm() < 1e-12);
    }

    #[test]
    fn too_few_matches_are_skipped() {
        let detector = FrameDetector::new(DetectorConfig::default()).unwrap();
        let out = detector.detect_reference(&sparse_reference(12)).unwrap();
        assert_eq!(out.label, "poster");
        assert!(out.candidates.is_empty());
    }

    #[test]
    fn invalid_reference_size_is_an_error() {
        let detector = FrameDetector::new(DetectorConfig::default()).unwrap();
        let mut reference = sparse_reference(20);
        reference.width = 0.0;
        assert!(matches!(
            detector.detect_reference(&reference),
            Err(DetectError::InvalidReference { .. })
        ));
    }

    #[test]
    fn invalid_config_is_refused() {
        let mut config = DetectorConfig::default();
        config.ransac.thresh = 0.0;
        assert!(FrameDetector::new(config).is_err());
    }

    #[test]
    fn empty_frame_has_no_detections() {
        let detector = FrameDetector::new(DetectorConfig::default()).unwrap();
        let out = detector.detect_frame(&[]).unwrap();
        assert_eq!(out, FrameDetections::default());
        assert_eq!(out.instance_count(), 0);
    }
}
