//! Degenerate minimal-sample rejection.

use detectify_core::Pt2;

/// Squared-cosine bound above which the angle at a vertex counts as flat
/// (roughly 10.6° away from 0° or 180°).
pub const COLLINEAR_COS2_THRESHOLD: f64 = 0.966;

/// Returns `true` iff no three of `points` are nearly collinear.
///
/// For every triple `(i > j > k)` the squared cosine of the angle at vertex
/// `i` is compared with [`COLLINEAR_COS2_THRESHOLD`] using only dot products
/// and squared norms. A triple containing coincident points has no defined
/// angle and is treated as collinear.
pub fn is_well_spread(points: &[Pt2]) -> bool {
    for i in 2..points.len() {
        for j in 0..i {
            let d1 = points[j] - points[i];
            let norm1 = d1.norm_squared();

            for k in 0..j {
                let d2 = points[k] - points[i];
                let norm = d2.norm_squared() * norm1;
                let dot = d1.dot(&d2);

                if norm <= f64::MIN_POSITIVE || dot * dot > COLLINEAR_COS2_THRESHOLD * norm {
                    return false;
                }
            }
        }
    }
    true
}
