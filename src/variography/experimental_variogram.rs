use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::spatial_database::SampleSet;
use crate::variography::model_variograms::iso_fitter::FitError;

/// Upper limit on the automatically chosen number of lags.
pub const MAX_AUTO_LAGS: usize = 15;
/// Pairs targeted per lag when choosing the number of lags.
pub const PAIRS_PER_LAG: usize = 30;
/// A model can only be fit to at least this many populated lags.
pub const MIN_LAGS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagBounds {
    pub lb: f64,
    pub ub: f64,
}

impl LagBounds {
    pub fn new(lb: f64, ub: f64) -> Self {
        Self { lb, ub }
    }
}

/// Number of equal width lags used when none is configured.
pub fn default_lag_count(n_pairs: usize) -> usize {
    (n_pairs / PAIRS_PER_LAG).clamp(MIN_LAGS, MAX_AUTO_LAGS)
}

/// Omnidirectional experimental variogram.
///
/// Only populated lags are kept, so all vectors have the same length.
/// # Members
/// * `lags` - distance bounds of each lag
/// * `lag_distances` - mean separation distance of the pairs in each lag
/// * `semivariance` - mean of `(v_i - v_j)^2 / 2` over the pairs in each lag
/// * `counts` - number of pairs in each lag
#[derive(Debug, Clone)]
pub struct ExperimentalVariogram {
    pub lags: Vec<LagBounds>,
    pub lag_distances: Vec<f64>,
    pub semivariance: Vec<f64>,
    pub counts: Vec<u32>,
}

impl ExperimentalVariogram {
    /// Bin every unique sample pair into `n_lags` equal width lags spanning the observed
    /// pair distances. `None` picks [`default_lag_count`].
    pub fn compute(samples: &SampleSet, n_lags: Option<usize>) -> Result<Self, FitError> {
        let values = samples.values();

        //distance and half squared difference of every unordered pair
        let pairs = (0..samples.len())
            .tuple_combinations()
            .map(|(i, j)| {
                let dv = values[i] - values[j];
                (samples.pairwise_distance(i, j), 0.5 * dv * dv)
            })
            .collect::<Vec<_>>();

        let n_lags = n_lags.unwrap_or_else(|| default_lag_count(pairs.len())).max(1);

        let (min_d, max_d) = match pairs.iter().map(|(d, _)| OrderedFloat(*d)).minmax() {
            itertools::MinMaxResult::NoElements => return Err(FitError::TooFewLags { found: 0 }),
            itertools::MinMaxResult::OneElement(d) => (d.0, d.0),
            itertools::MinMaxResult::MinMax(lo, hi) => (lo.0, hi.0),
        };

        // spreads at rounding level are treated as a single distance
        let spread = max_d - min_d;
        let width = if spread > f64::EPSILON * max_d.max(1.0) * 16.0 {
            spread / n_lags as f64
        } else {
            0.0
        };

        let mut distance_sums = vec![0f64; n_lags];
        let mut gamma_sums = vec![0f64; n_lags];
        let mut counts = vec![0u32; n_lags];

        for (d, gamma) in pairs.iter() {
            // the last lag is closed so the farthest pair lands in it
            let lag = if width > 0.0 {
                (((d - min_d) / width).floor() as usize).min(n_lags - 1)
            } else {
                0
            };
            distance_sums[lag] += d;
            gamma_sums[lag] += gamma;
            counts[lag] += 1;
        }

        let mut vgram = Self {
            lags: Vec::with_capacity(n_lags),
            lag_distances: Vec::with_capacity(n_lags),
            semivariance: Vec::with_capacity(n_lags),
            counts: Vec::with_capacity(n_lags),
        };

        for lag in 0..n_lags {
            if counts[lag] == 0 {
                continue;
            }
            let n = counts[lag] as f64;
            vgram.lags.push(LagBounds::new(
                min_d + lag as f64 * width,
                min_d + (lag + 1) as f64 * width,
            ));
            vgram.lag_distances.push(distance_sums[lag] / n);
            vgram.semivariance.push(gamma_sums[lag] / n);
            vgram.counts.push(counts[lag]);
        }

        tracing::debug!(
            n_pairs = pairs.len(),
            n_lags,
            populated = vgram.len(),
            "computed experimental variogram"
        );

        if vgram.len() < MIN_LAGS {
            return Err(FitError::TooFewLags { found: vgram.len() });
        }

        Ok(vgram)
    }

    pub fn len(&self) -> usize {
        self.lag_distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lag_distances.is_empty()
    }

    pub fn max_semivariance(&self) -> f64 {
        self.semivariance
            .iter()
            .copied()
            .map(OrderedFloat)
            .max()
            .map_or(0.0, |g| g.0)
    }
}
