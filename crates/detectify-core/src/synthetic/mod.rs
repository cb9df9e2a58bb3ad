//! Deterministic synthetic data generation helpers.
//!
//! Small building blocks for constructing synthetic correspondence sets used
//! in tests and examples:
//! - planar point grids and homography-mapped correspondences,
//! - deterministic pseudo-random noise and outlier placement.
//!
//! Every helper takes an explicit seed and produces a stable point ordering.
//!
//! # Example
//!
//! ```
//! use detectify_core::{synthetic::planar, Mat3};
//!
//! let h = Mat3::new(1.0, 0.0, 50.0, 0.0, 1.0, 20.0, 0.0, 0.0, 1.0);
//! let grid = planar::grid_points_2d(5, 4, 10.0);
//! let matches = planar::correspondences_through(&h, &grid, None, 0).unwrap();
//! assert_eq!(matches.len(), 20);
//! ```

pub mod noise;
pub mod planar;
