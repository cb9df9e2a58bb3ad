//! Generic, model-agnostic multi-model RANSAC.
//!
//! Implement [`Estimator`] for a model and call [`ransac_top_n`] with a slice
//! of data and some [`RansacOptions`]. Instead of a single best model, the
//! engine keeps the `top_n` best-supported hypotheses, ranked by descending
//! inlier count, so that several instances of the same model can be recovered
//! from one data set.
//!
//! Failure is never reported as an error: insufficient data, degenerate
//! samples and failed fits all end in fewer (possibly zero) ranked models.

use log::{debug, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration parameters for the multi-model RANSAC engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacOptions {
    /// Number of sampling iterations; the loop always runs to this budget.
    pub max_iters: usize,
    /// Inlier threshold on the (non-squared) residual.
    pub thresh: f64,
    /// A model is ranked only if its inlier count is strictly greater than this.
    pub min_inliers: usize,
    /// Maximum number of retained models.
    ///
    /// Each instance in the data is re-discovered many times, so this must
    /// leave room for weaker instances behind the duplicates of the strongest
    /// one; a few percent of `max_iters` is a workable size.
    pub top_n: usize,
    /// Random-number generator seed (for reproducibility).
    pub seed: u64,
    /// Draws allowed per iteration to find a non-degenerate minimal sample.
    pub max_subset_attempts: usize,
}

impl Default for RansacOptions {
    fn default() -> Self {
        Self {
            max_iters: 10_000,
            thresh: 3.0,
            min_inliers: 12,
            top_n: 500,
            seed: 1_234_567,
            max_subset_attempts: 10_000,
        }
    }
}

/// Model estimator plugged into the RANSAC engine.
pub trait Estimator {
    type Datum;
    type Model: Clone;

    /// Minimal number of samples needed to estimate a model.
    const MIN_SAMPLES: usize;

    /// Fit a model from a subset of data indices.
    ///
    /// Return `None` if fitting fails; the trial is then discarded.
    fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model>;

    /// Squared residual of one datum, compared against `thresh²`.
    ///
    /// `None` marks the datum as an outlier unconditionally (e.g. a point
    /// mapped to infinity).
    fn squared_residual(model: &Self::Model, datum: &Self::Datum) -> Option<f64>;

    /// Degeneracy check on a candidate minimal sample.
    ///
    /// Default: assume non-degenerate.
    fn is_degenerate(_data: &[Self::Datum], _sample_indices: &[usize]) -> bool {
        false
    }
}

/// One scored hypothesis.
///
/// `inlier_mask` has one entry per datum of the estimation input and exactly
/// `inlier_count` of them are `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResult<M> {
    /// Indices of the minimal sample the model was fitted on.
    pub sample: Vec<usize>,
    pub model: M,
    pub inlier_count: usize,
    pub inlier_mask: Vec<bool>,
}

impl<M> ModelResult<M> {
    /// Positions of the inliers in the estimation input.
    pub fn inlier_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.inlier_mask
            .iter()
            .enumerate()
            .filter_map(|(i, &inlier)| inlier.then_some(i))
    }
}

/// Fixed-capacity sequence of models sorted by descending inlier count.
///
/// Among equal inlier counts, the model offered first keeps the better rank.
#[derive(Debug, Clone)]
pub struct RankedModels<M> {
    capacity: usize,
    models: Vec<ModelResult<M>>,
}

impl<M> RankedModels<M> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            models: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn as_slice(&self) -> &[ModelResult<M>] {
        &self.models
    }

    pub fn into_vec(self) -> Vec<ModelResult<M>> {
        self.models
    }

    /// Whether a model with `inlier_count` inliers would enter the ranking.
    pub fn would_accept(&self, inlier_count: usize) -> bool {
        if self.capacity == 0 {
            return false;
        }
        match self.models.last() {
            Some(worst) if self.models.len() >= self.capacity => inlier_count > worst.inlier_count,
            _ => true,
        }
    }

    /// Insert `candidate` at its rank, evicting the worst model on overflow.
    ///
    /// Returns the rank the candidate was placed at, or `None` if rejected.
    pub fn offer(&mut self, candidate: ModelResult<M>) -> Option<usize> {
        if !self.would_accept(candidate.inlier_count) {
            return None;
        }
        let rank = self
            .models
            .partition_point(|m| m.inlier_count >= candidate.inlier_count);
        self.models.insert(rank, candidate);
        self.models.truncate(self.capacity);
        Some(rank)
    }
}

fn score_model<E: Estimator>(
    data: &[E::Datum],
    model: &E::Model,
    thresh_sq: f64,
) -> (Vec<bool>, usize) {
    let mut count = 0;
    let mask = data
        .iter()
        .map(|datum| {
            let inlier = E::squared_residual(model, datum).is_some_and(|r| r <= thresh_sq);
            count += usize::from(inlier);
            inlier
        })
        .collect();
    (mask, count)
}

/// Draw `out.len()` distinct indices below `n` by rejection.
fn draw_distinct<R: Rng>(rng: &mut R, n: usize, out: &mut [usize]) {
    for k in 0..out.len() {
        loop {
            let candidate = rng.random_range(0..n);
            if !out[..k].contains(&candidate) {
                out[k] = candidate;
                break;
            }
        }
    }
}

/// Fill `sample` with a non-degenerate minimal sample.
///
/// Returns `false` once `max_attempts` draws were all rejected.
fn draw_valid_sample<E: Estimator, R: Rng>(
    data: &[E::Datum],
    rng: &mut R,
    sample: &mut [usize],
    max_attempts: usize,
) -> bool {
    for _ in 0..max_attempts {
        draw_distinct(rng, data.len(), sample);
        if !E::is_degenerate(data, sample) {
            return true;
        }
    }
    false
}

/// Run the multi-model RANSAC loop with an RNG seeded from `opts.seed`.
pub fn ransac_top_n<E: Estimator>(
    data: &[E::Datum],
    opts: &RansacOptions,
) -> Vec<ModelResult<E::Model>> {
    let mut rng = StdRng::seed_from_u64(opts.seed);
    ransac_top_n_with_rng::<E, _>(data, opts, &mut rng)
}

/// Run the multi-model RANSAC loop drawing samples from `rng`.
///
/// Returns at most `opts.top_n` models ranked by descending inlier count.
///
/// - Fewer than `MIN_SAMPLES` data: empty, the model is underdetermined.
/// - Exactly `MIN_SAMPLES` data: no sampling; the direct fit of all data is
///   the sole model (all data marked inliers) unless the set is degenerate.
/// - If an iteration cannot find a non-degenerate sample within
///   `opts.max_subset_attempts` draws, the search stops and the models
///   ranked so far are returned.
pub fn ransac_top_n_with_rng<E: Estimator, R: Rng>(
    data: &[E::Datum],
    opts: &RansacOptions,
    rng: &mut R,
) -> Vec<ModelResult<E::Model>> {
    let n = data.len();
    if n < E::MIN_SAMPLES || opts.top_n == 0 {
        return Vec::new();
    }

    if n == E::MIN_SAMPLES {
        let sample: Vec<usize> = (0..n).collect();
        if E::is_degenerate(data, &sample) {
            debug!("minimal data set is degenerate; no model");
            return Vec::new();
        }
        return E::fit(data, &sample)
            .map(|model| {
                vec![ModelResult {
                    sample,
                    model,
                    inlier_count: n,
                    inlier_mask: vec![true; n],
                }]
            })
            .unwrap_or_default();
    }

    let thresh_sq = opts.thresh * opts.thresh;
    let mut ranked = RankedModels::new(opts.top_n);
    let mut sample = vec![0usize; E::MIN_SAMPLES];

    for iter in 0..opts.max_iters {
        if !draw_valid_sample::<E, R>(data, rng, &mut sample, opts.max_subset_attempts) {
            debug!(
                "no non-degenerate sample after {} draws at iteration {}; stopping with {} models",
                opts.max_subset_attempts,
                iter,
                ranked.len()
            );
            break;
        }

        let Some(model) = E::fit(data, &sample) else {
            continue;
        };

        let (inlier_mask, inlier_count) = score_model::<E>(data, &model, thresh_sq);
        if inlier_count <= opts.min_inliers || !ranked.would_accept(inlier_count) {
            continue;
        }

        let candidate = ModelResult {
            sample: sample.clone(),
            model,
            inlier_count,
            inlier_mask,
        };
        if let Some(rank) = ranked.offer(candidate) {
            trace!("iteration {iter}: model with {inlier_count} inliers ranked #{rank}");
        }
    }

    ranked.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct LineModel {
        slope: f64,
        intercept: f64,
    }

    struct LineEstimator;

    impl Estimator for LineEstimator {
        type Datum = (f64, f64); // (x, y)
        type Model = LineModel;

        const MIN_SAMPLES: usize = 2;

        fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model> {
            let p0 = data[sample_indices[0]];
            let p1 = data[sample_indices[1]];
            let dx = p1.0 - p0.0;
            if dx.abs() < 1e-9 {
                return None;
            }
            let slope = (p1.1 - p0.1) / dx;
            Some(LineModel {
                slope,
                intercept: p0.1 - slope * p0.0,
            })
        }

        fn squared_residual(model: &Self::Model, datum: &Self::Datum) -> Option<f64> {
            let (x, y) = *datum;
            let numer = model.slope * x - y + model.intercept;
            Some(numer * numer / (model.slope * model.slope + 1.0))
        }

        fn is_degenerate(data: &[Self::Datum], sample_indices: &[usize]) -> bool {
            let p0 = data[sample_indices[0]];
            let p1 = data[sample_indices[1]];
            (p1.0 - p0.0).abs() < 1e-9
        }
    }

    fn result(count: usize, tag: usize) -> ModelResult<usize> {
        ModelResult {
            sample: vec![tag],
            model: tag,
            inlier_count: count,
            inlier_mask: Vec::new(),
        }
    }

    fn opts() -> RansacOptions {
        RansacOptions {
            max_iters: 300,
            thresh: 0.05,
            min_inliers: 4,
            top_n: 4,
            seed: 42,
            max_subset_attempts: 100,
        }
    }

    #[test]
    fn ranking_is_descending_and_bounded() {
        let mut ranked = RankedModels::new(3);
        for (count, tag) in [(5, 0), (9, 1), (7, 2), (8, 3), (6, 4)] {
            ranked.offer(result(count, tag));
        }
        let counts: Vec<usize> = ranked.as_slice().iter().map(|m| m.inlier_count).collect();
        assert_eq!(counts, vec![9, 8, 7]);
    }

    #[test]
    fn ties_keep_discovery_order() {
        let mut ranked = RankedModels::new(3);
        assert_eq!(ranked.offer(result(5, 0)), Some(0));
        assert_eq!(ranked.offer(result(5, 1)), Some(1));
        assert_eq!(ranked.offer(result(6, 2)), Some(0));
        // Full: an equal count does not beat the worst retained model.
        assert_eq!(ranked.offer(result(5, 3)), None);
        let tags: Vec<usize> = ranked.as_slice().iter().map(|m| m.model).collect();
        assert_eq!(tags, vec![2, 0, 1]);
    }

    #[test]
    fn zero_capacity_accepts_nothing() {
        let mut ranked = RankedModels::new(0);
        assert_eq!(ranked.offer(result(100, 0)), None);
        assert!(ranked.is_empty());
    }

    #[test]
    fn insufficient_data_yields_no_models() {
        let data = vec![(0.0, 0.0)];
        assert!(ransac_top_n::<LineEstimator>(&data, &opts()).is_empty());
    }

    #[test]
    fn minimal_data_is_fitted_directly() {
        let data = vec![(0.0, 1.0), (1.0, 3.0)];
        let models = ransac_top_n::<LineEstimator>(&data, &opts());
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].inlier_count, 2);
        assert_eq!(models[0].inlier_mask, vec![true, true]);
        assert!((models[0].model.slope - 2.0).abs() < 1e-12);
    }

    #[test]
    fn minimal_degenerate_data_yields_no_models() {
        let data = vec![(1.0, 1.0), (1.0, 3.0)];
        assert!(ransac_top_n::<LineEstimator>(&data, &opts()).is_empty());
    }

    #[test]
    fn exhausted_sampling_stops_the_search() {
        // Every pair shares the same x: no sample is ever non-degenerate.
        let data: Vec<(f64, f64)> = (0..10).map(|i| (2.0, i as f64)).collect();
        assert!(ransac_top_n::<LineEstimator>(&data, &opts()).is_empty());
    }

    #[test]
    fn inlier_count_must_exceed_min_inliers() {
        // Every line through two of these points explains exactly 4 of them.
        let on_line = |n: usize| -> Vec<(f64, f64)> {
            (0..n).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect()
        };
        assert!(ransac_top_n::<LineEstimator>(&on_line(4), &opts()).is_empty());

        let models = ransac_top_n::<LineEstimator>(&on_line(5), &opts());
        assert!(!models.is_empty());
        assert!(models.iter().all(|m| m.inlier_count == 5));
    }

    #[test]
    fn recovers_two_lines_with_consistent_masks() {
        let mut data = Vec::new();
        for i in 0..12 {
            let x = i as f64;
            data.push((x, 2.0 * x + 1.0));
        }
        for i in 0..8 {
            let x = i as f64 + 0.5;
            data.push((x, -x + 30.0));
        }
        data.push((3.3, -7.0));
        data.push((9.1, 40.0));

        // Keep every hypothesis so the weaker line is not crowded out by
        // duplicates of the stronger one.
        let opts = RansacOptions {
            top_n: 1_000,
            ..opts()
        };
        let models = ransac_top_n::<LineEstimator>(&data, &opts);
        assert!(!models.is_empty());
        for m in &models {
            assert_eq!(m.inlier_mask.len(), data.len());
            assert_eq!(m.inlier_indices().count(), m.inlier_count);
            assert!(m.inlier_count > 4);
        }
        for pair in models.windows(2) {
            assert!(pair[0].inlier_count >= pair[1].inlier_count);
        }
        let best = &models[0].model;
        assert!((best.slope - 2.0).abs() < 1e-6);
        assert!(models
            .iter()
            .any(|m| (m.model.slope + 1.0).abs() < 1e-6 && m.inlier_count == 8));
    }
}
