//! Core math and data primitives for `detectify`.
//!
//! This crate provides the building blocks shared by the other crates in the
//! workspace:
//!
//! - linear algebra type aliases (`Real`, `Pt2`, `Mat3`, and friends) and
//!   homogeneous helpers,
//! - [`Correspondence`], the indexed point pair consumed by every estimator,
//! - a deterministic, model-agnostic multi-model RANSAC engine that keeps the
//!   `top_n` best-supported hypotheses instead of a single winner.
//!
//! # Modules
//!
//! - \[`math`\]: basic type aliases and homogeneous helpers.
//! - \[`ransac`\]: generic robust estimation with a bounded ranking.
//! - \[`synthetic`\]: deterministic synthetic data helpers (tests/examples).

/// Indexed point correspondences.
mod correspondence;
/// Linear algebra type aliases and helpers.
mod math;
/// Generic multi-model RANSAC engine and traits.
mod ransac;
/// Deterministic synthetic data generation helpers.
pub mod synthetic;

pub use correspondence::*;
pub use math::*;
pub use ransac::*;
