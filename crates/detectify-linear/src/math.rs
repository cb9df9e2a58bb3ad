//! Point normalization for DLT-style solvers.
//!
//! Normalizing points before building the DLT system keeps the normal
//! equations well conditioned when coordinates are in the hundreds of pixels.
//! The variant used here is an L1 normalization: each axis is centered on the
//! centroid and scaled by the inverse mean absolute deviation along that axis.
//!
//! # Example
//!
//! ```
//! use detectify_core::Pt2;
//! use detectify_linear::math::L1Normalization;
//!
//! let points = vec![
//!     Pt2::new(100.0, 200.0),
//!     Pt2::new(150.0, 250.0),
//!     Pt2::new(120.0, 220.0),
//! ];
//!
//! let norm = L1Normalization::from_points(&points).unwrap();
//! let p = norm.apply(&points[0]);
//! // normalized points have zero mean and unit mean absolute deviation per axis
//! assert!(p.x < 0.0 && p.y < 0.0);
//! ```

use detectify_core::{Mat3, Pt2, Vec2};

/// Per-axis L1 normalization of a 2D point set.
///
/// A point `p` is mapped to `((p.x - mean.x) * scale.x, (p.y - mean.y) * scale.y)`,
/// where `scale` is `count / Σ|p - mean|` per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L1Normalization {
    /// Centroid of the point set.
    pub mean: Pt2,
    /// Inverse mean absolute deviation, per axis.
    pub scale: Vec2,
}

impl L1Normalization {
    /// Compute the normalization for `points`.
    ///
    /// Returns `None` if the input is empty, not finite, or has (numerically)
    /// zero spread along either axis, e.g. coincident points.
    pub fn from_points(points: &[Pt2]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let n = points.len() as f64;
        let mut mean = Vec2::zeros();
        for p in points {
            mean += p.coords;
        }
        mean /= n;

        let mut spread = Vec2::zeros();
        for p in points {
            spread += (p.coords - mean).abs();
        }

        if !(spread.x.is_finite() && spread.y.is_finite())
            || spread.x <= f64::EPSILON
            || spread.y <= f64::EPSILON
        {
            return None;
        }

        Some(Self {
            mean: Pt2::from(mean),
            scale: Vec2::new(n / spread.x, n / spread.y),
        })
    }

    /// Normalize a single point.
    pub fn apply(&self, p: &Pt2) -> Pt2 {
        Pt2::new(
            (p.x - self.mean.x) * self.scale.x,
            (p.y - self.mean.y) * self.scale.y,
        )
    }

    /// Homogeneous matrix `T` with `T * p == apply(p)`.
    pub fn matrix(&self) -> Mat3 {
        Mat3::new(
            self.scale.x,
            0.0,
            -self.mean.x * self.scale.x,
            0.0,
            self.scale.y,
            -self.mean.y * self.scale.y,
            0.0,
            0.0,
            1.0,
        )
    }

    /// Closed-form inverse of [`matrix`](Self::matrix).
    pub fn inverse_matrix(&self) -> Mat3 {
        Mat3::new(
            1.0 / self.scale.x,
            0.0,
            self.mean.x,
            0.0,
            1.0 / self.scale.y,
            self.mean.y,
            0.0,
            0.0,
            1.0,
        )
    }
}
