use nalgebra::{linalg::LU, DMatrix, DVector, Dyn, Point2};

use crate::error::{KrigingError, Result};
use crate::spatial_database::SampleSet;
use crate::variography::model_variograms::VariogramModel;

use super::SolverParams;

/// Separations at or below this are treated as coincident.
const ZERO_DISTANCE: f64 = 1e-10;

/// Semivariance entry of the kriging system.
///
/// Coincident locations get 0 rather than the nugget, so the nugget acts as a
/// discontinuity at the origin and keeps the system well conditioned.
#[inline(always)]
fn system_gamma(variogram: &VariogramModel, h: f64) -> f64 {
    if h <= ZERO_DISTANCE {
        0.0
    } else {
        variogram.semivariance(h)
    }
}

/// Clamp a raw kriging variance at zero.
///
/// Returns the variance and whether it was negative beyond `tolerance`.
#[inline(always)]
fn clamp_variance(raw: f64, tolerance: f64) -> (f64, bool) {
    if raw >= 0.0 {
        (raw, false)
    } else if raw >= -tolerance {
        (0.0, false)
    } else {
        (0.0, true)
    }
}

/// Estimate and estimation variance at one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KrigingEstimate {
    pub estimate: f64,
    pub variance: f64,
    /// The raw variance was negative beyond tolerance and has been clamped to zero.
    pub clamped: bool,
}

/// Ordinary kriging weights of one location, in sample order.
#[derive(Debug, Clone, PartialEq)]
pub struct KrigingWeights {
    pub weights: Vec<f64>,
    pub lagrange: f64,
}

#[derive(Debug, Clone)]
enum Factorization {
    Regular(LU<f64, Dyn, Dyn>),
    Singular { pivot_ratio: f64 },
}

/// Ordinary kriging system over a full sample set.
///
/// The `(N+1)x(N+1)` matrix
/// ```text
/// |   0     ... γ(d_1N) 1 |
/// |   ...         ...   . |
/// | γ(d_N1) ...   0     1 |
/// |   1     ...   1     0 |
/// ```
/// The diagonal and zero distance right hand side entries are 0, not the nugget.
/// only depends on the samples and the variogram, so it is factored once with partial
/// pivoting LU and every target point only costs a new right hand side and two
/// triangular solves. The factorization is read only and may be shared between threads.
#[derive(Debug, Clone)]
pub struct OrdinaryKrigingSystem<'a> {
    samples: &'a SampleSet,
    variogram: VariogramModel,
    params: SolverParams,
    gamma: DMatrix<f64>,
    factorization: Factorization,
}

impl<'a> OrdinaryKrigingSystem<'a> {
    /// Build and factor the system.
    ///
    /// A numerically singular matrix does not fail construction. It is recorded and every
    /// subsequent solve reports [`KrigingError::SingularSystem`].
    pub fn new(samples: &'a SampleSet, variogram: &VariogramModel, params: SolverParams) -> Self {
        let n = samples.len();

        //only the strict lower triangle is evaluated, the matrix is symmetric with a zero diagonal
        let mut gamma = DMatrix::<f64>::zeros(n + 1, n + 1);
        for i in 0..n {
            for j in 0..i {
                let g = system_gamma(variogram, samples.pairwise_distance(i, j));
                gamma[(i, j)] = g;
                gamma[(j, i)] = g;
            }
            gamma[(i, n)] = 1.0;
            gamma[(n, i)] = 1.0;
        }

        let lu = gamma.clone().lu();

        let u_diag = lu.u().diagonal();
        let max_pivot = u_diag.amax();
        let pivot_ratio = if max_pivot > 0.0 {
            u_diag.amin() / max_pivot
        } else {
            0.0
        };

        let factorization = if pivot_ratio.is_finite() && pivot_ratio >= params.pivot_tolerance {
            Factorization::Regular(lu)
        } else {
            tracing::warn!(
                n_samples = n,
                pivot_ratio,
                tolerance = params.pivot_tolerance,
                "kriging matrix is numerically singular"
            );
            Factorization::Singular { pivot_ratio }
        };

        tracing::debug!(n_samples = n, pivot_ratio, "factored kriging system");

        Self {
            samples,
            variogram: *variogram,
            params,
            gamma,
            factorization,
        }
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn variogram(&self) -> &VariogramModel {
        &self.variogram
    }

    pub fn is_singular(&self) -> bool {
        matches!(self.factorization, Factorization::Singular { .. })
    }

    /// Right hand side and solution buffers sized for this system.
    pub fn buffers(&self) -> (DVector<f64>, DVector<f64>) {
        let n = self.n_samples() + 1;
        (DVector::zeros(n), DVector::zeros(n))
    }

    /// Populate `rhs` for `point` and solve into `weights`.
    #[inline(always)]
    fn solve_into(
        &self,
        point: &Point2<f64>,
        rhs: &mut DVector<f64>,
        weights: &mut DVector<f64>,
    ) -> Result<()> {
        let lu = match &self.factorization {
            Factorization::Regular(lu) => lu,
            Factorization::Singular { pivot_ratio } => {
                return Err(KrigingError::singular(format!(
                    "pivot ratio {pivot_ratio:e} is below tolerance {:e}",
                    self.params.pivot_tolerance
                )));
            }
        };

        let n = self.n_samples();
        if rhs.len() != n + 1 {
            *rhs = DVector::zeros(n + 1);
        }
        if weights.len() != n + 1 {
            *weights = DVector::zeros(n + 1);
        }

        for i in 0..n {
            rhs[i] = system_gamma(&self.variogram, self.samples.distance_to(i, point));
        }
        rhs[n] = 1.0;

        weights.copy_from(rhs);
        if !lu.solve_mut(weights) {
            return Err(KrigingError::singular("zero pivot in LU solve"));
        }

        if weights.iter().any(|w| !w.is_finite()) {
            return Err(KrigingError::singular("non-finite kriging weights"));
        }

        let residual = (&self.gamma * &*weights - &*rhs).amax();
        if residual > self.params.residual_tolerance * (1.0 + rhs.amax()) {
            return Err(KrigingError::singular(format!(
                "unstable solve, residual {residual:e}"
            )));
        }

        Ok(())
    }

    /// Estimate and variance at `point` using caller owned buffers.
    ///
    /// Buffers of the wrong size are reallocated; use [`Self::buffers`] to avoid that.
    pub fn solve_with_buffer(
        &self,
        point: &Point2<f64>,
        rhs: &mut DVector<f64>,
        weights: &mut DVector<f64>,
    ) -> Result<KrigingEstimate> {
        self.solve_into(point, rhs, weights)?;

        let estimate = weights
            .iter()
            .zip(self.samples.values())
            .map(|(w, v)| w * v)
            .sum::<f64>();

        // sum_i w_i * γ_i0 + μ, the last rhs entry is one
        let raw_variance = weights.dot(rhs);

        let tolerance = self.params.negative_variance_tolerance * self.variogram.sill().max(1.0);
        let (variance, clamped) = clamp_variance(raw_variance, tolerance);
        if clamped {
            tracing::warn!(
                x = point.x,
                y = point.y,
                variance = raw_variance,
                "negative kriging variance clamped to zero"
            );
        }

        Ok(KrigingEstimate {
            estimate,
            variance,
            clamped,
        })
    }

    /// Estimate and variance at `point`.
    pub fn solve(&self, point: &Point2<f64>) -> Result<KrigingEstimate> {
        let (mut rhs, mut weights) = self.buffers();
        self.solve_with_buffer(point, &mut rhs, &mut weights)
    }

    /// Kriging weights and Lagrange multiplier at `point`.
    pub fn solve_weights(&self, point: &Point2<f64>) -> Result<KrigingWeights> {
        let (mut rhs, mut weights) = self.buffers();
        self.solve_into(point, &mut rhs, &mut weights)?;

        let n = self.n_samples();
        Ok(KrigingWeights {
            weights: weights.rows(0, n).iter().copied().collect(),
            lagrange: weights[n],
        })
    }
}
