use indicatif::{ParallelProgressIterator, ProgressIterator};
use nalgebra::Point2;
use ndarray::Array2;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::Result;
use crate::spatial_database::{GeoTransform, GridDefinition, SampleSet};
use crate::systems::ok_system::{KrigingEstimate, OrdinaryKrigingSystem};
use crate::variography::model_variograms::VariogramModel;

use super::{Execution, InterpolationParams, InterpolationReport};

/// Prediction and variance rasters of one run.
///
/// Both arrays have shape `grid.shape()`, row 0 is the max y edge. Cells whose kriging
/// system could not be solved hold NaN in both.
#[derive(Debug, Clone)]
pub struct KrigedGrid {
    pub prediction: Array2<f64>,
    pub variance: Array2<f64>,
    pub grid: GridDefinition,
    pub report: InterpolationReport,
}

impl KrigedGrid {
    pub fn geo_transform(&self) -> GeoTransform {
        self.grid.geo_transform()
    }
}

/// Ordinary kriging of every cell centre of a grid against the full sample set.
#[derive(Debug, Clone, Default)]
pub struct GridInterpolator {
    params: InterpolationParams,
}

impl GridInterpolator {
    pub fn new(params: InterpolationParams) -> Self {
        Self { params }
    }

    fn solve_all<F>(
        &self,
        system: &OrdinaryKrigingSystem,
        n_points: usize,
        location: F,
    ) -> Vec<Result<KrigingEstimate>>
    where
        F: Fn(usize) -> Point2<f64> + Sync,
    {
        let bar = self.params.progress_bar(n_points);

        let results = match self.params.execution {
            Execution::Sequential => {
                let (mut rhs, mut weights) = system.buffers();
                (0..n_points)
                    .progress_with(bar.clone())
                    .map(|i| system.solve_with_buffer(&location(i), &mut rhs, &mut weights))
                    .collect::<Vec<_>>()
            }
            Execution::Parallel => (0..n_points)
                .into_par_iter()
                .progress_with(bar.clone())
                .map_with(system.buffers(), |(rhs, weights), i| {
                    system.solve_with_buffer(&location(i), rhs, weights)
                })
                .collect::<Vec<_>>(),
        };

        bar.finish_and_clear();
        results
    }

    /// Krige every cell of `grid`.
    ///
    /// The kriging matrix is factored once. A singular system only marks the affected
    /// cells as failed, the run always completes and reports the failure count.
    pub fn interpolate(
        &self,
        samples: &SampleSet,
        variogram: &VariogramModel,
        grid: &GridDefinition,
    ) -> KrigedGrid {
        let (n_rows, n_cols) = grid.shape();
        tracing::info!(
            n_samples = samples.len(),
            n_rows,
            n_cols,
            execution = ?self.params.execution,
            "kriging grid"
        );

        let system = OrdinaryKrigingSystem::new(samples, variogram, self.params.solver);
        let results = self.solve_all(&system, grid.n_cells(), |i| grid.flat_cell_center(i));

        let report = summarize(&results);
        log_report(&report, &results);

        let cell = |r: usize, c: usize| results[r * n_cols + c].as_ref().ok();
        let prediction =
            Array2::from_shape_fn((n_rows, n_cols), |(r, c)| cell(r, c).map_or(f64::NAN, |e| e.estimate));
        let variance =
            Array2::from_shape_fn((n_rows, n_cols), |(r, c)| cell(r, c).map_or(f64::NAN, |e| e.variance));

        KrigedGrid {
            prediction,
            variance,
            grid: *grid,
            report,
        }
    }

    /// Krige arbitrary locations, one result per point in input order.
    pub fn interpolate_points(
        &self,
        samples: &SampleSet,
        variogram: &VariogramModel,
        points: &[Point2<f64>],
    ) -> Vec<Result<KrigingEstimate>> {
        let system = OrdinaryKrigingSystem::new(samples, variogram, self.params.solver);
        let results = self.solve_all(&system, points.len(), |i| points[i]);
        log_report(&summarize(&results), &results);
        results
    }
}

fn summarize(results: &[Result<KrigingEstimate>]) -> InterpolationReport {
    let mut report = InterpolationReport {
        total_cells: results.len(),
        ..Default::default()
    };

    for res in results {
        match res {
            Ok(est) if est.clamped => report.clamped_cells += 1,
            Ok(_) => {}
            Err(_) => report.failed_cells += 1,
        }
    }

    report
}

fn log_report(report: &InterpolationReport, results: &[Result<KrigingEstimate>]) {
    if let Some(e) = results.iter().find_map(|res| res.as_ref().err()) {
        tracing::warn!(
            failed = report.failed_cells,
            total = report.total_cells,
            first_error = %e,
            "{report}"
        );
    }
    if report.clamped_cells > 0 {
        tracing::warn!(
            clamped = report.clamped_cells,
            "negative kriging variances were clamped to zero"
        );
    }
    tracing::info!(
        total = report.total_cells,
        failed = report.failed_cells,
        "kriging finished"
    );
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::systems::SolverParams;
    use crate::variography::model_variograms::iso_fitter::{fit, FitParams};
    use crate::variography::model_variograms::VariogramKind;

    fn sequential() -> GridInterpolator {
        GridInterpolator::new(InterpolationParams {
            execution: Execution::Sequential,
            ..Default::default()
        })
    }

    fn corners() -> SampleSet {
        SampleSet::new(vec![
            (0.0, 0.0, 0.0),
            (10.0, 0.0, 10.0),
            (0.0, 10.0, 10.0),
            (10.0, 10.0, 20.0),
        ])
        .unwrap()
    }

    #[test]
    fn sequential_matches_parallel() {
        let mut rng = StdRng::seed_from_u64(9);
        let samples = SampleSet::new(
            (0..30)
                .map(|_| {
                    let x: f64 = rng.gen_range(0.0..60.0);
                    let y: f64 = rng.gen_range(0.0..40.0);
                    (x, y, (x / 10.0).sin() + y / 20.0)
                })
                .collect::<Vec<_>>(),
        )
        .unwrap();
        let vgram = VariogramModel::new(VariogramKind::Spherical, 0.05, 1.0, 30.0).unwrap();
        let grid = GridDefinition::from_bounds(&samples.bounds(), 2.5).unwrap();

        let seq = sequential().interpolate(&samples, &vgram, &grid);
        let par = GridInterpolator::new(InterpolationParams {
            execution: Execution::Parallel,
            ..Default::default()
        })
        .interpolate(&samples, &vgram, &grid);

        assert_eq!(seq.prediction.dim(), grid.shape());
        assert_eq!(seq.prediction, par.prediction);
        assert_eq!(seq.variance, par.variance);
        assert_eq!(seq.report, par.report);
        assert_eq!(seq.report.failed_cells, 0);
    }

    #[test]
    fn symmetric_corners_krige_to_mean() {
        let samples = corners();
        let vgram = fit(&samples, VariogramKind::Gaussian, &FitParams::default()).unwrap();

        // cell centres fall on integer coordinates 0..=10
        let grid = GridDefinition::new(-0.5, 10.5, 1.0, 11, 11).unwrap();
        let out = sequential().interpolate(&samples, &vgram, &grid);

        assert_eq!(out.report.failed_cells, 0);
        assert_relative_eq!(out.prediction[[5, 5]], 10.0, epsilon = 1e-6);
        assert!(out.variance[[5, 5]] > 0.0);

        // the nugget is pinned to zero, so samples are reproduced
        assert_abs_diff_eq!(out.prediction[[10, 0]], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out.prediction[[0, 10]], 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out.variance[[10, 0]], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn single_cell_reproduces_sample() {
        let samples = SampleSet::new(vec![
            (3.0, 4.0, 7.25),
            (9.0, 1.0, 2.0),
            (6.0, 9.0, 5.5),
            (1.0, 8.0, 3.0),
        ])
        .unwrap();
        let vgram = VariogramModel::new(VariogramKind::Exponential, 0.0, 4.0, 12.0).unwrap();
        let grid = GridDefinition::new(2.0, 5.0, 2.0, 1, 1).unwrap();

        let out = sequential().interpolate(&samples, &vgram, &grid);
        assert_relative_eq!(out.prediction[[0, 0]], 7.25, epsilon = 1e-9);
        assert_abs_diff_eq!(out.variance[[0, 0]], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn coincident_samples_fail_every_cell() {
        let samples = SampleSet::new(vec![
            (0.0, 0.0, 1.0),
            (4.0, 4.0, 2.0),
            (4.0, 4.0, 6.0),
            (8.0, 1.0, 3.0),
        ])
        .unwrap();
        let vgram = VariogramModel::new(VariogramKind::Spherical, 0.0, 2.0, 10.0).unwrap();
        let grid = GridDefinition::from_bounds(&samples.bounds(), 2.0).unwrap();

        let out = GridInterpolator::default().interpolate(&samples, &vgram, &grid);
        assert_eq!(out.report.total_cells, grid.n_cells());
        assert_eq!(out.report.failed_cells, grid.n_cells());
        assert!(out.prediction.iter().all(|v| v.is_nan()));
        assert!(out.variance.iter().all(|v| v.is_nan()));
        assert_eq!(
            out.report.to_string(),
            format!("{0} of {0} cells failed: singular system", grid.n_cells())
        );
    }

    #[test]
    fn report_counts_clamped_and_failed() {
        let ok = |variance: f64, clamped: bool| {
            Ok(KrigingEstimate {
                estimate: 1.0,
                variance,
                clamped,
            })
        };
        let results = vec![
            ok(0.5, false),
            ok(0.0, true),
            Err(crate::error::KrigingError::singular("test")),
            ok(0.0, true),
        ];

        let report = summarize(&results);
        assert_eq!(report.total_cells, 4);
        assert_eq!(report.clamped_cells, 2);
        assert_eq!(report.failed_cells, 1);
    }

    #[test]
    fn points_match_grid_cells() {
        let samples = corners();
        let vgram = VariogramModel::new(VariogramKind::Spherical, 1.0, 60.0, 20.0).unwrap();
        let grid = GridDefinition::new(0.0, 10.0, 2.5, 4, 4).unwrap();
        let interpolator = GridInterpolator::new(InterpolationParams {
            solver: SolverParams::default(),
            ..Default::default()
        });

        let out = interpolator.interpolate(&samples, &vgram, &grid);
        let points = (0..grid.n_cells())
            .map(|i| grid.flat_cell_center(i))
            .collect::<Vec<_>>();
        let estimates = interpolator.interpolate_points(&samples, &vgram, &points);

        assert_eq!(estimates.len(), grid.n_cells());
        for (i, est) in estimates.iter().enumerate() {
            let est = est.as_ref().unwrap();
            let (r, c) = (i / grid.n_cols, i % grid.n_cols);
            assert_eq!(est.estimate, out.prediction[[r, c]]);
            assert_eq!(est.variance, out.variance[[r, c]]);
        }
        assert_relative_eq!(out.geo_transform()[5], -2.5);
    }
}
