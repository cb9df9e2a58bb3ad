//! Multi-instance detection of planar references.
//!
//! Given tentative point correspondences between a reference image and a
//! frame, `detectify` recovers every instance of the reference visible in the
//! frame:
//!
//! 1. [`detectify_linear::find_homography_candidates`] ranks up to `top_n`
//!    homography hypotheses by inlier support,
//! 2. [`select_instances`] keeps the hypotheses that share no correspondence
//!    with a better one and project the reference to a plausible shape,
//! 3. [`FrameDetector`] runs this for every reference of a frame in parallel.
//!
//! ```no_run
//! use detectify::{DetectorConfig, FrameDetector, ReferenceMatches};
//!
//! # fn load() -> Vec<ReferenceMatches> { Vec::new() }
//! let detector = FrameDetector::new(DetectorConfig::default())?;
//! let frame = detector.detect_frame(&load())?;
//! for c in frame.candidates() {
//!     println!("{} at {:?} ({} inliers)", c.label, c.corners, c.inlier_count);
//! }
//! # Ok::<(), detectify::DetectError>(())
//! ```

mod config;
mod detector;
mod error;
mod plausibility;
mod selector;

pub use config::DetectorConfig;
pub use detector::{FrameDetections, FrameDetector, ReferenceDetections, ReferenceMatches};
pub use error::DetectError;
pub use plausibility::{
    check_homography, check_quad, is_plausible, Implausibility, PlausibilityThresholds,
    ReferenceSize,
};
pub use selector::{select_instances, DetectionCandidate};

pub use detectify_core::{Correspondence, Mat3, Pt2, RansacOptions, Real};
