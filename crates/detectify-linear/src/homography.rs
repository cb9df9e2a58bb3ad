//! Homography estimation (plane-induced projective transform).
//!
//! Implements the normalized Direct Linear Transform (DLT) and a robust
//! multi-model RANSAC wrapper. The homography `H` maps **reference points**
//! to **scene points** in pixels: `x' ~ H x`.
//!
//! Input points should be in consistent units; normalization is applied
//! internally for numerical stability and the output is de-normalized.

use crate::degeneracy::is_well_spread;
use crate::math::L1Normalization;
use detectify_core::{
    project_point, ransac_top_n, ransac_top_n_with_rng, Correspondence, Estimator, Mat3,
    ModelResult, Pt2, RansacOptions,
};
use nalgebra::{linalg::SymmetricEigen, SMatrix};
use rand::Rng;
use thiserror::Error;

/// Determinants below this magnitude mark a (numerically) non-invertible map.
const MIN_ABS_DETERMINANT: f64 = 1e-12;

/// `|H[2,2]|` below this fraction of `‖H‖` means `H[2,2]` is zero up to rounding.
const MIN_RELATIVE_H22: f64 = 1e-10;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HomographyError {
    #[error("need at least 4 point correspondences, got {0}")]
    NotEnoughPoints(usize),
    #[error("source / destination point counts differ: {src} vs {dst}")]
    MismatchedLengths { src: usize, dst: usize },
    #[error("degenerate point spread: points coincide along an axis")]
    DegenerateSpread,
    #[error("eigendecomposition of the normal matrix did not converge")]
    EigenDecomposition,
    #[error("homography maps the origin to infinity")]
    PointAtInfinity,
    #[error("homography is singular")]
    Singular,
}

/// High-level entry point for homography estimation.
#[derive(Debug, Clone, Copy)]
pub struct HomographySolver;

/// Estimate `H` such that `dst ~ H src` using the normalized DLT.
///
/// The returned homography is scaled so that `H[2,2] == 1`.
pub fn dlt_homography(src: &[Pt2], dst: &[Pt2]) -> Result<Mat3, HomographyError> {
    HomographySolver::dlt(src, dst)
}

impl HomographySolver {
    /// Estimate a homography `H` such that `dst ~ H src`.
    ///
    /// Both point sets are L1-normalized, the 9x9 normal matrix `LᵀL` of the
    /// DLT system is accumulated, and `h` is the eigenvector of its smallest
    /// eigenvalue. Exact for 4 points, least squares for more.
    pub fn dlt(src: &[Pt2], dst: &[Pt2]) -> Result<Mat3, HomographyError> {
        let n = src.len();
        if dst.len() != n {
            return Err(HomographyError::MismatchedLengths {
                src: n,
                dst: dst.len(),
            });
        }
        if n < 4 {
            return Err(HomographyError::NotEnoughPoints(n));
        }

        let src_norm = L1Normalization::from_points(src).ok_or(HomographyError::DegenerateSpread)?;
        let dst_norm = L1Normalization::from_points(dst).ok_or(HomographyError::DegenerateSpread)?;

        let mut ltl = SMatrix::<f64, 9, 9>::zeros();
        for (ps, pd) in src.iter().zip(dst.iter()) {
            let s = src_norm.apply(ps);
            let d = dst_norm.apply(pd);

            let lx = [s.x, s.y, 1.0, 0.0, 0.0, 0.0, -d.x * s.x, -d.x * s.y, -d.x];
            let ly = [0.0, 0.0, 0.0, s.x, s.y, 1.0, -d.y * s.x, -d.y * s.y, -d.y];

            for j in 0..9 {
                for k in j..9 {
                    ltl[(j, k)] += lx[j] * lx[k] + ly[j] * ly[k];
                }
            }
        }
        for j in 1..9 {
            for k in 0..j {
                ltl[(j, k)] = ltl[(k, j)];
            }
        }

        let eig = SymmetricEigen::try_new(ltl, f64::EPSILON, 1_000)
            .ok_or(HomographyError::EigenDecomposition)?;
        let min_idx = eig
            .eigenvalues
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(idx, _)| idx)
            .ok_or(HomographyError::EigenDecomposition)?;
        let h_vec = eig.eigenvectors.column(min_idx);

        let mut h_norm = Mat3::zeros();
        for r in 0..3 {
            for c in 0..3 {
                h_norm[(r, c)] = h_vec[3 * r + c];
            }
        }

        let h_mat = dst_norm.inverse_matrix() * h_norm * src_norm.matrix();

        // normalise such that H[2,2] = 1
        let scale = h_mat[(2, 2)];
        if !scale.is_finite() || scale.abs() <= MIN_RELATIVE_H22 * h_mat.norm() {
            return Err(HomographyError::PointAtInfinity);
        }
        let h_mat = h_mat / scale;

        if h_mat.iter().any(|v| !v.is_finite()) || h_mat.determinant().abs() < MIN_ABS_DETERMINANT
        {
            return Err(HomographyError::Singular);
        }

        Ok(h_mat)
    }
}

/// [`Estimator`] fitting homographies to [`Correspondence`]s.
///
/// Samples are rejected when either their source or destination points
/// contain a nearly collinear triple; residuals are squared reprojection
/// errors in the destination image.
#[derive(Debug, Clone, Copy)]
pub struct HomographyEstimator;

impl Estimator for HomographyEstimator {
    type Datum = Correspondence;
    type Model = Mat3;

    const MIN_SAMPLES: usize = 4;

    fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model> {
        let (src, dst) = sample_points(data, sample_indices);
        HomographySolver::dlt(&src, &dst).ok()
    }

    fn squared_residual(model: &Self::Model, datum: &Self::Datum) -> Option<f64> {
        let proj = project_point(model, &datum.src)?;
        Some((proj - datum.dst).norm_squared())
    }

    fn is_degenerate(data: &[Self::Datum], sample_indices: &[usize]) -> bool {
        let (src, dst) = sample_points(data, sample_indices);
        !is_well_spread(&src) || !is_well_spread(&dst)
    }
}

/// Source and destination points of a minimal sample, without allocating.
fn sample_points(
    data: &[Correspondence],
    sample_indices: &[usize],
) -> ([Pt2; HomographyEstimator::MIN_SAMPLES], [Pt2; HomographyEstimator::MIN_SAMPLES]) {
    debug_assert_eq!(sample_indices.len(), HomographyEstimator::MIN_SAMPLES);
    let src = std::array::from_fn(|k| data[sample_indices[k]].src);
    let dst = std::array::from_fn(|k| data[sample_indices[k]].dst);
    (src, dst)
}

/// Find up to `opts.top_n` homography hypotheses ranked by inlier count.
///
/// Inlier masks are indexed by position in `matches`; use
/// [`Correspondence::index`] to map them back to the caller's list.
pub fn find_homography_candidates(
    matches: &[Correspondence],
    opts: &RansacOptions,
) -> Vec<ModelResult<Mat3>> {
    ransac_top_n::<HomographyEstimator>(matches, opts)
}

/// Same as [`find_homography_candidates`], drawing samples from `rng`.
pub fn find_homography_candidates_with_rng<R: Rng>(
    matches: &[Correspondence],
    opts: &RansacOptions,
    rng: &mut R,
) -> Vec<ModelResult<Mat3>> {
    ransac_top_n_with_rng::<HomographyEstimator, R>(matches, opts, rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Pt2> {
        vec![
            Pt2::new(0.0, 0.0),
            Pt2::new(1.0, 0.0),
            Pt2::new(1.0, 1.0),
            Pt2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn identity_from_unit_square() {
        let sq = unit_square();
        let h = dlt_homography(&sq, &sq).unwrap();
        assert!((h - Mat3::identity()).norm() < 1e-9, "h = {h}");
    }

    #[test]
    fn basic_homography() {
        let img: Vec<Pt2> = unit_square().iter().map(|p| Pt2::new(2.0 * p.x, 2.0 * p.y)).collect();
        let h = dlt_homography(&unit_square(), &img).unwrap();
        assert!((h[(0, 0)] - 2.0).abs() < 1e-6);
        assert!((h[(2, 2)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn four_points_are_fitted_exactly() {
        let src = vec![
            Pt2::new(12.0, 30.0),
            Pt2::new(310.0, 18.0),
            Pt2::new(295.0, 240.0),
            Pt2::new(20.0, 260.0),
        ];
        let dst = vec![
            Pt2::new(402.0, 118.0),
            Pt2::new(611.0, 140.0),
            Pt2::new(590.0, 371.0),
            Pt2::new(380.0, 330.0),
        ];
        let h = dlt_homography(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            let p = project_point(&h, s).unwrap();
            assert!((p - d).norm() < 1e-6, "{p} vs {d}");
        }
    }

    #[test]
    fn not_enough_points() {
        let sq = unit_square();
        assert_eq!(
            dlt_homography(&sq[..3], &sq[..3]),
            Err(HomographyError::NotEnoughPoints(3))
        );
    }

    #[test]
    fn mismatched_lengths() {
        let sq = unit_square();
        assert_eq!(
            dlt_homography(&sq, &sq[..3]),
            Err(HomographyError::MismatchedLengths { src: 4, dst: 3 })
        );
    }

    #[test]
    fn coincident_points_have_no_solution() {
        let same = vec![Pt2::new(5.0, 5.0); 4];
        assert_eq!(
            dlt_homography(&same, &unit_square()),
            Err(HomographyError::DegenerateSpread)
        );
    }

    #[test]
    fn origin_mapped_to_infinity_has_no_solution() {
        // H = [[0, 0, 1], [0, 1, 0], [1, 0, 0]] sends (x, y) to (1/x, y/x)
        // and has H[2,2] = 0, whatever the source scale.
        for scale in [1.0, 10.0, 100.0, 1000.0] {
            let src: Vec<Pt2> = [(1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0)]
                .iter()
                .map(|&(x, y)| Pt2::new(x * scale, y * scale))
                .collect();
            let dst: Vec<Pt2> = src.iter().map(|p| Pt2::new(1.0 / p.x, p.y / p.x)).collect();
            assert_eq!(
                dlt_homography(&src, &dst),
                Err(HomographyError::PointAtInfinity),
                "source scale {scale}"
            );
        }
    }

    #[test]
    fn rank_deficient_map_is_singular() {
        // (x, y) -> (x, x): every destination lies on one line.
        let src: Vec<Pt2> = (0..3)
            .flat_map(|i| (0..3).map(move |j| Pt2::new(i as f64, j as f64)))
            .collect();
        let dst: Vec<Pt2> = src.iter().map(|p| Pt2::new(p.x, p.x)).collect();
        assert_eq!(dlt_homography(&src, &dst), Err(HomographyError::Singular));
    }

    #[test]
    fn sample_points_follow_sample_order() {
        let data = Correspondence::from_point_lists(&unit_square(), &unit_square()).unwrap();
        let (src, dst) = sample_points(&data, &[3, 1, 0, 2]);
        assert_eq!(src[0], Pt2::new(0.0, 1.0));
        assert_eq!(dst[3], Pt2::new(1.0, 1.0));
    }

    #[test]
    fn estimator_rejects_collinear_destination_samples() {
        let src = unit_square();
        let dst = vec![
            Pt2::new(0.0, 0.0),
            Pt2::new(1.0, 1.0),
            Pt2::new(2.0, 2.0),
            Pt2::new(0.0, 5.0),
        ];
        let data = Correspondence::from_point_lists(&src, &dst).unwrap();
        assert!(HomographyEstimator::is_degenerate(&data, &[0, 1, 2, 3]));
        assert!(!HomographyEstimator::is_degenerate(
            &Correspondence::from_point_lists(&src, &src).unwrap(),
            &[0, 1, 2, 3]
        ));
    }

    #[test]
    fn residual_at_infinity_is_outlier() {
        // w = x - 1 vanishes at x = 1.
        let h = Mat3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0);
        let c = Correspondence::new(Pt2::new(1.0, 3.0), Pt2::new(0.0, 0.0), 0);
        assert!(HomographyEstimator::squared_residual(&h, &c).is_none());

        let c = Correspondence::new(Pt2::new(3.0, 4.0), Pt2::new(1.5, 2.0), 1);
        let r = HomographyEstimator::squared_residual(&h, &c).unwrap();
        assert!(r < 1e-18);
    }
}
