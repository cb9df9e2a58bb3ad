//! Geometric sanity checks on projected reference rectangles.
//!
//! A homography can fit its inliers well and still describe a view no camera
//! would produce: a rectangle collapsed to a sliver, sheared into a thin
//! parallelogram, or folded over itself. These checks look only at the four
//! projected corners and the reference dimensions.

use detectify_core::{project_point, Mat3, Pt2, Real};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bounds used by [`check_quad`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibilityThresholds {
    /// Every projected edge must be strictly longer than this (pixels).
    pub min_edge_length: Real,
    /// Maximum relative deviation of an edge's scale ratio from the mean ratio.
    pub max_scale_deviation: Real,
    /// Minimum interior angle at every projected corner (degrees).
    pub min_corner_angle_deg: Real,
    /// Optional bound on the off-diagonal terms `|H[0,1]|` and `|H[1,0]|`.
    pub max_shear: Option<Real>,
    /// Optional bound on the perspective terms `|H[2,0]|` and `|H[2,1]|`.
    pub max_projection: Option<Real>,
}

impl Default for PlausibilityThresholds {
    fn default() -> Self {
        Self {
            min_edge_length: 8.0,
            max_scale_deviation: 0.5,
            min_corner_angle_deg: 30.0,
            max_shear: None,
            max_projection: None,
        }
    }
}

/// Pixel dimensions of a reference image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSize {
    pub width: Real,
    pub height: Real,
}

impl ReferenceSize {
    pub fn new(width: Real, height: Real) -> Self {
        Self { width, height }
    }

    /// Both dimensions finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.width > 0.0 && self.height.is_finite() && self.height > 0.0
    }

    /// Reference corners: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Pt2; 4] {
        [
            Pt2::new(0.0, 0.0),
            Pt2::new(self.width, 0.0),
            Pt2::new(self.width, self.height),
            Pt2::new(0.0, self.height),
        ]
    }

    /// Project the reference rectangle through `h`, keeping corner order.
    ///
    /// `None` if any corner maps to infinity.
    pub fn project(&self, h: &Mat3) -> Option<[Pt2; 4]> {
        let [a, b, c, d] = self.corners();
        Some([
            project_point(h, &a)?,
            project_point(h, &b)?,
            project_point(h, &c)?,
            project_point(h, &d)?,
        ])
    }
}

/// Reason a projected quadrilateral was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum Implausibility {
    #[error("edge {edge} is {length:.2} px long")]
    EdgeTooShort { edge: usize, length: Real },
    #[error("edge {edge} scale ratio {ratio:.3} is far from the mean {mean:.3}")]
    InconsistentScale { edge: usize, ratio: Real, mean: Real },
    #[error("corner {corner} angle is {angle_deg:.1} deg")]
    CornerTooSharp { corner: usize, angle_deg: Real },
    #[error("shear term {value:.4} exceeds {limit}")]
    ShearTooLarge { value: Real, limit: Real },
    #[error("projective term {value:.6} exceeds {limit}")]
    ProjectionTooLarge { value: Real, limit: Real },
}

/// Bound the raw entries of `h` (normalized to `H[2,2] = 1`).
///
/// Both bounds are off unless set in `thresholds`.
pub fn check_homography(
    h: &Mat3,
    thresholds: &PlausibilityThresholds,
) -> Result<(), Implausibility> {
    if let Some(limit) = thresholds.max_shear {
        let value = h[(0, 1)].abs().max(h[(1, 0)].abs());
        if value.is_nan() || value >= limit {
            return Err(Implausibility::ShearTooLarge { value, limit });
        }
    }
    if let Some(limit) = thresholds.max_projection {
        let value = h[(2, 0)].abs().max(h[(2, 1)].abs());
        if value.is_nan() || value >= limit {
            return Err(Implausibility::ProjectionTooLarge { value, limit });
        }
    }
    Ok(())
}

/// Validate a projected quadrilateral against the reference it came from.
///
/// `quad` must be in reference corner order (see [`ReferenceSize::corners`]).
/// Edges are compared in the order top, bottom, right, left, i.e. against
/// width, width, height, height.
pub fn check_quad(
    quad: &[Pt2; 4],
    reference: &ReferenceSize,
    thresholds: &PlausibilityThresholds,
) -> Result<(), Implausibility> {
    let edges = [
        (quad[0], quad[1], reference.width),
        (quad[3], quad[2], reference.width),
        (quad[1], quad[2], reference.height),
        (quad[0], quad[3], reference.height),
    ];

    let mut ratios = [0.0; 4];
    for (edge, (a, b, ref_len)) in edges.iter().enumerate() {
        let length = (b - a).norm();
        if length.is_nan() || length <= thresholds.min_edge_length {
            return Err(Implausibility::EdgeTooShort { edge, length });
        }
        ratios[edge] = length / ref_len;
    }

    let mean = ratios.iter().sum::<Real>() / 4.0;
    for (edge, &ratio) in ratios.iter().enumerate() {
        if !ratio.is_finite() || (ratio - mean).abs() > thresholds.max_scale_deviation * mean {
            return Err(Implausibility::InconsistentScale { edge, ratio, mean });
        }
    }

    for corner in 0..4 {
        let p = quad[corner];
        let prev = quad[(corner + 3) % 4] - p;
        let next = quad[(corner + 1) % 4] - p;
        let cos = (prev.dot(&next) / (prev.norm() * next.norm())).clamp(-1.0, 1.0);
        let angle_deg = cos.acos().to_degrees();
        if angle_deg.is_nan() || angle_deg < thresholds.min_corner_angle_deg {
            return Err(Implausibility::CornerTooSharp { corner, angle_deg });
        }
    }

    Ok(())
}

/// Convenience wrapper around [`check_quad`].
pub fn is_plausible(
    quad: &[Pt2; 4],
    reference: &ReferenceSize,
    thresholds: &PlausibilityThresholds,
) -> bool {
    check_quad(quad, reference, thresholds).is_ok()
}
