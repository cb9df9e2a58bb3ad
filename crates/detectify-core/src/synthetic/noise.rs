//! Deterministic noise helpers for synthetic datasets.
//!
//! The functions here avoid `thread_rng` and do not depend on the internal
//! algorithm of `rand` RNGs. This keeps synthetic datasets stable across
//! versions and platforms.

use crate::{Pt2, Real, Vec2};

/// Deterministic uniform pixel noise in `[-max_abs_px, +max_abs_px]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformPixelNoise {
    /// Base seed controlling the pseudo-random sequence.
    pub seed: u64,
    /// Maximum absolute per-axis noise (pixels).
    pub max_abs_px: Real,
}

impl UniformPixelNoise {
    /// Sample a deterministic 2D noise vector for a given `(stream, point_idx)` key.
    #[inline]
    pub fn sample(&self, stream: usize, point_idx: usize) -> Vec2 {
        let max_abs = self.max_abs_px.abs();
        if max_abs == 0.0 {
            return Vec2::zeros();
        }

        let (u, v) = unit_pair(self.seed, stream, point_idx);
        Vec2::new((u - 0.5) * 2.0 * max_abs, (v - 0.5) * 2.0 * max_abs)
    }

    /// Apply deterministic noise to a pixel position.
    #[inline]
    pub fn apply(&self, stream: usize, point_idx: usize, p: Pt2) -> Pt2 {
        p + self.sample(stream, point_idx)
    }
}

/// `count` points spread uniformly over `[0, width) x [0, height)`.
pub fn uniform_points(seed: u64, count: usize, width: Real, height: Real) -> Vec<Pt2> {
    (0..count)
        .map(|i| {
            let (u, v) = unit_pair(seed, usize::MAX, i);
            Pt2::new(u * width, v * height)
        })
        .collect()
}

#[inline]
fn unit_pair(seed: u64, stream: usize, point_idx: usize) -> (Real, Real) {
    let key = mix_key(seed, stream, point_idx);
    let u = u64_to_unit_f64(splitmix64(key));
    let v = u64_to_unit_f64(splitmix64(key ^ 0x94D0_49BB_1331_11EB));
    (u, v)
}

#[inline]
fn mix_key(seed: u64, stream: usize, point_idx: usize) -> u64 {
    seed ^ (stream as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (point_idx as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
fn u64_to_unit_f64(x: u64) -> Real {
    // Top 53 bits -> [0, 1).
    let mantissa = x >> 11;
    (mantissa as Real) * (1.0 / ((1u64 << 53) as Real))
}
