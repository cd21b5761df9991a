use std::io::Read;

use crate::config::KrigingConfig;
use crate::error::Result;
use crate::group_operators::ordinary_kriging::{GridInterpolator, KrigedGrid};
use crate::spatial_database::{GridDefinition, Sample, SampleSet};
use crate::variography::model_variograms::iso_fitter::fit;

/// Fit a variogram to `samples` and krige the grid covering their bounding box.
///
/// Input and fitting errors are returned before any grid cell is visited. Cells with a
/// singular system are reported in the returned [`KrigedGrid::report`].
pub fn krige<I>(samples: I, config: &KrigingConfig) -> Result<KrigedGrid>
where
    I: IntoIterator,
    I::Item: Into<Sample>,
{
    let samples = SampleSet::new(samples)?;
    krige_samples(&samples, config)
}

/// [`krige`] over a CSV table, reading the fields named in `config`.
pub fn krige_csv<R: Read>(reader: R, config: &KrigingConfig) -> Result<KrigedGrid> {
    let samples = SampleSet::from_csv_reader(
        reader,
        &config.x_field,
        &config.y_field,
        &config.value_field,
    )?;
    krige_samples(&samples, config)
}

fn krige_samples(samples: &SampleSet, config: &KrigingConfig) -> Result<KrigedGrid> {
    tracing::info!(
        n_samples = samples.len(),
        field = %config.value_field,
        model = %config.variogram_model,
        "kriging samples"
    );

    let grid = GridDefinition::from_bounds(&samples.bounds(), config.resolution)?;
    let variogram = fit(samples, config.variogram_model, &config.fit)?;

    let out = GridInterpolator::new(config.interpolation).interpolate(samples, &variogram, &grid);

    tracing::info!(
        n_rows = grid.n_rows,
        n_cols = grid.n_cols,
        report = %out.report,
        "kriging completed"
    );

    Ok(out)
}
