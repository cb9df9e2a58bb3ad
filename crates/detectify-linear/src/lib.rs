//! Closed-form homography fitting for `detectify`.
//!
//! - [`HomographySolver::dlt`]: L1-normalized DLT solved through the
//!   symmetric eigendecomposition of the 9x9 normal matrix,
//! - [`is_well_spread`]: the near-collinearity guard applied to minimal
//!   samples before they reach the solver,
//! - [`HomographyEstimator`] / [`find_homography_candidates`]: the solver
//!   plugged into the multi-model RANSAC engine of `detectify-core`.

mod degeneracy;
mod homography;
pub mod math;

pub use degeneracy::*;
pub use homography::*;
