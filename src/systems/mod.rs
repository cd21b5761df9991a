use serde::{Deserialize, Serialize};

pub mod ok_system;

/// Numerical tolerances of the kriging solve.
/// # Members
/// * `pivot_tolerance` - smallest accepted ratio between the smallest and largest LU pivot
/// * `residual_tolerance` - largest accepted `|A w - b|` relative to the matrix scale
/// * `negative_variance_tolerance` - negative variances smaller than this fraction of the
///   sill are treated as rounding noise and silently set to zero
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    pub pivot_tolerance: f64,
    pub residual_tolerance: f64,
    pub negative_variance_tolerance: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            pivot_tolerance: 1e-12,
            residual_tolerance: 1e-6,
            negative_variance_tolerance: 1e-8,
        }
    }
}
