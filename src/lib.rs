pub mod config;
pub mod error;
pub mod group_operators;
pub mod spatial_database;
pub mod systems;
pub mod variography;
pub mod workflow;

pub mod prelude {

    pub mod re_exports {
        pub use nalgebra;
        pub use ndarray;
    }

    pub use crate::config::KrigingConfig;
    pub use crate::error::{KrigingError, Result};
    pub use crate::group_operators::{
        ordinary_kriging::{GridInterpolator, KrigedGrid},
        Execution, InterpolationParams, InterpolationReport,
    };
    pub use crate::spatial_database::{GeoTransform, GridDefinition, Sample, SampleSet};
    pub use crate::systems::{
        ok_system::{KrigingEstimate, KrigingWeights, OrdinaryKrigingSystem},
        SolverParams,
    };
    pub use crate::variography::model_variograms::{
        iso_fitter::{fit as fit_variogram, FitError, FitParams},
        VariogramKind, VariogramModel,
    };
    pub use crate::workflow::{krige, krige_csv};
}
