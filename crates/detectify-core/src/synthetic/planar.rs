//! Synthetic planar correspondence helpers.
//!
//! Reference points live on a 2D grid; scene points are obtained by mapping
//! them through a known homography, optionally with deterministic noise.

use crate::{project_point, Correspondence, Mat3, Pt2, Real};
use std::ops::RangeInclusive;

use super::noise::UniformPixelNoise;

/// Generate a planar grid of 2D points with `nx * ny` points.
///
/// Points are ordered deterministically in row-major order (Y major):
/// `(x = 0..nx-1, y = 0..ny-1)`.
pub fn grid_points_2d(nx: usize, ny: usize, spacing: Real) -> Vec<Pt2> {
    grid_points_range_2d(
        0..=(nx.saturating_sub(1) as i32),
        0..=(ny.saturating_sub(1) as i32),
        spacing,
    )
}

/// Generate a planar grid of 2D points over integer index ranges.
///
/// The output order is deterministic in row-major order (Y major).
pub fn grid_points_range_2d(
    x: RangeInclusive<i32>,
    y: RangeInclusive<i32>,
    spacing: Real,
) -> Vec<Pt2> {
    let nx = (*x.end() as i64 - *x.start() as i64 + 1).max(0) as usize;
    let ny = (*y.end() as i64 - *y.start() as i64 + 1).max(0) as usize;
    let mut points = Vec::with_capacity(nx.saturating_mul(ny));

    for j in y {
        for i in x.clone() {
            points.push(Pt2::new(i as Real * spacing, j as Real * spacing));
        }
    }
    points
}

/// Map `src` through `h` into correspondences, requiring every point to be projectable.
///
/// Correspondence indices start at `first_index`; noise (if any) is keyed by
/// that index so that concatenated sets stay deterministic.
pub fn correspondences_through(
    h: &Mat3,
    src: &[Pt2],
    noise: Option<&UniformPixelNoise>,
    first_index: usize,
) -> Option<Vec<Correspondence>> {
    src.iter()
        .enumerate()
        .map(|(i, p)| {
            let index = first_index + i;
            let dst = project_point(h, p)?;
            let dst = noise.map_or(dst, |n| n.apply(0, index, dst));
            Some(Correspondence::new(*p, dst, index))
        })
        .collect()
}

/// Pair independently placed source and destination points.
///
/// Useful as gross outliers: each pair is consistent with no particular model.
pub fn random_correspondences(src: &[Pt2], dst: &[Pt2], first_index: usize) -> Vec<Correspondence> {
    src.iter()
        .zip(dst.iter())
        .enumerate()
        .map(|(i, (&s, &d))| Correspondence::new(s, d, first_index + i))
        .collect()
}
