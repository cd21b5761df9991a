use serde::{Deserialize, Serialize};

use crate::group_operators::InterpolationParams;
use crate::variography::model_variograms::iso_fitter::FitParams;
use crate::variography::model_variograms::VariogramKind;

/// Parameters of a full kriging run.
/// # Members
/// * `x_field`, `y_field` - coordinate columns of tabular input
/// * `value_field` - column holding the variable to interpolate
/// * `resolution` - output cell size, in the units of the coordinates
/// * `variogram_model` - kind of variogram fitted to the samples
/// * `fit` - variogram fitting parameters
/// * `interpolation` - grid run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KrigingConfig {
    pub x_field: String,
    pub y_field: String,
    pub value_field: String,
    pub resolution: f64,
    pub variogram_model: VariogramKind,
    pub fit: FitParams,
    pub interpolation: InterpolationParams,
}

impl Default for KrigingConfig {
    fn default() -> Self {
        Self {
            x_field: "X".to_string(),
            y_field: "Y".to_string(),
            value_field: "RESAKG".to_string(),
            resolution: 5.0,
            variogram_model: VariogramKind::Gaussian,
            fit: FitParams::default(),
            interpolation: InterpolationParams::default(),
        }
    }
}
