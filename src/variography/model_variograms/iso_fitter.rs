use itertools::izip;
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rmpfit::{MPConfig, MPFitter, MPPar, MPResult, MPSuccess};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spatial_database::SampleSet;
use crate::variography::experimental_variogram::ExperimentalVariogram;

use super::{VariogramKind, VariogramModel};

/// Relative lower bound on the fitted range, as a fraction of the largest pair distance.
const MIN_RANGE_FRACTION: f64 = 1e-6;
/// Upper bound on the fitted partial sill, as a multiple of the largest lag semivariance.
const MAX_SILL_FACTOR: f64 = 10.0;

const NUGGET: usize = 0;
const PARTIAL_SILL: usize = 1;
const RANGE: usize = 2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("only {found} distance lag(s) contain sample pairs, at least 2 are required")]
    TooFewLags { found: usize },

    #[error("all empirical semivariances are zero")]
    ZeroVariance,

    #[error("optimizer did not converge: {0}")]
    NotConverged(String),

    #[error("invalid variogram parameters (nugget: {nugget}, sill: {sill}, range: {range})")]
    InvalidModel { nugget: f64, sill: f64, range: f64 },

    #[error("unknown variogram model `{0}`")]
    UnknownKind(String),
}

/// Variogram fitting parameters.
/// # Members
/// * `n_lags` - number of equal width lags, `None` chooses from the pair count
/// * `max_iter` - iteration cap of each least squares run
/// * `restarts` - extra runs from random initial guesses
/// * `seed` - seed for the random initial guesses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitParams {
    pub n_lags: Option<usize>,
    pub max_iter: usize,
    pub restarts: usize,
    pub seed: u64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            n_lags: None,
            max_iter: 200,
            restarts: 0,
            seed: 0,
        }
    }
}

/// Bounded least squares fit of `[nugget, partial_sill, range]` to an experimental variogram.
pub struct VariogramFitter {
    pub kind: VariogramKind,
    pub lags: Vec<f64>,
    pub exp_var: Vec<f64>,
    pub mppar_params: Vec<MPPar>,
    pub max_iter: usize,
}

impl VariogramFitter {
    pub fn new(
        kind: VariogramKind,
        exp_vgram: &ExperimentalVariogram,
        max_distance: f64,
        max_iter: usize,
    ) -> Self {
        let max_gamma = exp_vgram.max_semivariance();

        let nugget = MPPar {
            limited_low: true,
            limit_low: 0.0,
            limited_up: true,
            limit_up: max_gamma,
            ..Default::default()
        };
        let partial_sill = MPPar {
            limited_low: true,
            limit_low: 0.0,
            limited_up: true,
            limit_up: MAX_SILL_FACTOR * max_gamma,
            ..Default::default()
        };
        let range = MPPar {
            limited_low: true,
            limit_low: MIN_RANGE_FRACTION * max_distance,
            limited_up: true,
            limit_up: max_distance,
            // only the slope of the linear model is identifiable
            fixed: kind == VariogramKind::Linear,
            ..Default::default()
        };

        let mut fitter = Self {
            kind,
            lags: exp_vgram.lag_distances.clone(),
            exp_var: exp_vgram.semivariance.clone(),
            mppar_params: vec![nugget, partial_sill, range],
            max_iter,
        };

        //pin the nugget when there are fewer lags than free parameters
        if fitter.n_free() > fitter.lags.len() {
            fitter.mppar_params[NUGGET].fixed = true;
        }

        fitter
    }

    pub fn n_free(&self) -> usize {
        self.mppar_params.iter().filter(|p| !p.fixed).count()
    }

    /// Move `params` inside the parameter bounds.
    pub fn clamp_to_bounds(&self, params: &mut [f64; 3]) {
        for (p, par) in params.iter_mut().zip(self.mppar_params.iter()) {
            if par.limited_low {
                *p = p.max(par.limit_low);
            }
            if par.limited_up {
                *p = p.min(par.limit_up);
            }
        }
    }

    #[inline(always)]
    pub fn variogram(&self, params: &[f64], h: f64) -> f64 {
        params[NUGGET] + self.kind.structure(params[RANGE], params[PARTIAL_SILL], h)
    }

    /// Residual sum of squares of the parameters against the experimental variogram.
    pub fn rss(&self, params: &[f64]) -> f64 {
        self.lags
            .iter()
            .zip(self.exp_var.iter())
            .map(|(h, g)| {
                let r = g - self.variogram(params, *h);
                r * r
            })
            .sum()
    }

    /// Run one bounded least squares fit starting from `init`.
    /// Returns the converged parameters and their residual sum of squares.
    pub fn fit_from(&mut self, mut init: [f64; 3]) -> Result<([f64; 3], f64), FitError> {
        self.clamp_to_bounds(&mut init);

        let status = self
            .mpfit(&mut init)
            .map_err(|e| FitError::NotConverged(e.to_string()))?;

        if matches!(status.success, MPSuccess::MaxIter) {
            return Err(FitError::NotConverged(format!(
                "iteration limit of {} reached",
                self.max_iter
            )));
        }

        if init.iter().any(|p| !p.is_finite()) {
            return Err(FitError::NotConverged(format!(
                "non-finite parameters {init:?}"
            )));
        }

        let rss = self.rss(&init);
        Ok((init, rss))
    }
}

impl MPFitter for VariogramFitter {
    fn eval(&mut self, params: &[f64], deviates: &mut [f64]) -> MPResult<()> {
        for (d, x, y) in izip!(deviates.iter_mut(), self.lags.iter(), self.exp_var.iter()) {
            *d = *y - self.variogram(params, *x);
        }

        Ok(())
    }

    fn number_of_points(&self) -> usize {
        self.lags.len()
    }

    fn config(&self) -> MPConfig {
        MPConfig {
            max_iter: self.max_iter,
            ..Default::default()
        }
    }

    fn parameters(&self) -> Option<&[MPPar]> {
        Some(self.mppar_params.as_slice())
    }
}

/// Fit a variogram model of the given kind to the samples.
///
/// The first run starts from `nugget = 0`, `sill = variance of the values` and
/// `range = half the largest pair distance`; `params.restarts` further runs start from
/// random guesses and the lowest residual wins.
pub fn fit(
    samples: &SampleSet,
    kind: VariogramKind,
    params: &FitParams,
) -> Result<VariogramModel, FitError> {
    let exp_vgram = ExperimentalVariogram::compute(samples, params.n_lags)?;

    let max_gamma = exp_vgram.max_semivariance();
    if max_gamma <= 0.0 {
        return Err(FitError::ZeroVariance);
    }

    let max_distance = samples.max_pairwise_distance();
    let initial_range = 0.5 * max_distance;

    let mut fitter = VariogramFitter::new(kind, &exp_vgram, max_distance, params.max_iter);

    let mut rng = StdRng::seed_from_u64(params.seed);
    let starts = std::iter::once([0.0, samples.value_variance(), initial_range])
        .chain((0..params.restarts).map(|_| {
            [
                rng.gen_range(0.0..0.5 * max_gamma),
                rng.gen_range(0.1 * max_gamma..2.0 * max_gamma),
                if kind == VariogramKind::Linear {
                    initial_range
                } else {
                    rng.gen_range(MIN_RANGE_FRACTION * max_distance..max_distance)
                },
            ]
        }))
        .collect::<Vec<_>>();

    let mut last_err = None;
    let best = starts
        .into_iter()
        .filter_map(|start| match fitter.fit_from(start) {
            Ok(res) => {
                tracing::debug!(?start, fitted = ?res.0, rss = res.1, "variogram fit attempt");
                Some(res)
            }
            Err(e) => {
                tracing::debug!(?start, error = %e, "variogram fit attempt failed");
                last_err = Some(e);
                None
            }
        })
        .min_by_key(|(_, rss)| OrderedFloat(*rss));

    let Some((best, rss)) = best else {
        return Err(last_err.unwrap_or_else(|| FitError::NotConverged("no fit attempts".into())));
    };

    let model = VariogramModel::new(
        kind,
        best[NUGGET],
        best[NUGGET] + best[PARTIAL_SILL],
        best[RANGE],
    )?;

    tracing::info!(
        model = %model,
        rss,
        n_lags = exp_vgram.len(),
        "fitted variogram"
    );

    Ok(model)
}
