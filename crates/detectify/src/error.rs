use thiserror::Error;

/// Contract violations reported by the detection pipeline.
///
/// Routine estimation outcomes (too few matches, degenerate samples,
/// implausible geometry) are not errors; they simply produce no detections.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectError {
    #[error("inlier mask covers {found} correspondences, expected {expected}")]
    MaskLengthMismatch { expected: usize, found: usize },
    #[error("minimal-sample index {index} is out of range for {len} correspondences")]
    SampleIndexOutOfRange { index: usize, len: usize },
    #[error("reference '{label}' has invalid size {width}x{height}")]
    InvalidReference {
        label: String,
        width: f64,
        height: f64,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
