//! Tentative point correspondences between a reference image and a scene.

use crate::Pt2;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// A matched point pair plus its position in the caller's match list.
///
/// `index` travels with the pair end-to-end so that inlier masks computed on
/// a filtered or reordered list can be mapped back to the original matches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Point in the reference (source) image.
    pub src: Pt2,
    /// Point in the scene (destination) image.
    pub dst: Pt2,
    /// Index into the caller's original correspondence list.
    pub index: usize,
}

impl Correspondence {
    pub fn new(src: Pt2, dst: Pt2, index: usize) -> Self {
        Self { src, dst, index }
    }

    /// Zip two parallel point lists into indexed correspondences.
    ///
    /// # Errors
    ///
    /// Returns an error if the two lists differ in length.
    ///
    /// # Example
    ///
    /// ```
    /// use detectify_core::{Correspondence, Pt2};
    ///
    /// let src = vec![Pt2::new(0.0, 0.0), Pt2::new(1.0, 0.0)];
    /// let dst = vec![Pt2::new(5.0, 5.0), Pt2::new(6.0, 5.0)];
    /// let matches = Correspondence::from_point_lists(&src, &dst).unwrap();
    /// assert_eq!(matches[1].index, 1);
    /// ```
    pub fn from_point_lists(src: &[Pt2], dst: &[Pt2]) -> Result<Vec<Self>> {
        ensure!(
            src.len() == dst.len(),
            "source / destination point counts must match: {} vs {}",
            src.len(),
            dst.len()
        );
        Ok(src
            .iter()
            .zip(dst.iter())
            .enumerate()
            .map(|(index, (&s, &d))| Self::new(s, d, index))
            .collect())
    }
}
