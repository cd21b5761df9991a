use std::fmt;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::systems::SolverParams;

pub mod ordinary_kriging;

/// How target points are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    Sequential,
    #[default]
    Parallel,
}

/// Parameters of a grid or point interpolation run.
/// # Members
/// * `execution` - sequential loop or rayon data parallel map
/// * `progress` - draw a progress bar on stderr
/// * `solver` - tolerances of every kriging solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationParams {
    pub execution: Execution,
    pub progress: bool,
    pub solver: SolverParams,
}

impl Default for InterpolationParams {
    fn default() -> Self {
        Self {
            execution: Execution::Parallel,
            progress: false,
            solver: SolverParams::default(),
        }
    }
}

impl InterpolationParams {
    pub(crate) fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} cells ({per_sec})",
        ) {
            bar.set_style(style);
        }
        bar
    }
}

/// Outcome counts of an interpolation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterpolationReport {
    pub total_cells: usize,
    pub failed_cells: usize,
    pub clamped_cells: usize,
}

impl InterpolationReport {
    pub fn has_failures(&self) -> bool {
        self.failed_cells > 0
    }
}

impl fmt::Display for InterpolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} cells failed: singular system",
            self.failed_cells, self.total_cells
        )
    }
}
