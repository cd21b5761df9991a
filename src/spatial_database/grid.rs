use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::{KrigingError, Result};

use super::sample_set::BoundingBox;

/// North-up affine transform in GDAL coefficient order:
/// `[origin_x, cell_size, 0, origin_y, 0, -cell_size]`.
pub type GeoTransform = [f64; 6];

/// Geometry of the target raster.
/// # Members
/// * `origin_x`, `origin_y` - top left corner of the grid (min x, max y)
/// * `cell_size` - side length of each square cell
/// * `n_cols`, `n_rows` - grid shape, row 0 is the max y edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridDefinition {
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_size: f64,
    pub n_cols: usize,
    pub n_rows: usize,
}

impl GridDefinition {
    pub fn new(
        origin_x: f64,
        origin_y: f64,
        cell_size: f64,
        n_cols: usize,
        n_rows: usize,
    ) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(KrigingError::InvalidGrid {
                reason: format!("cell size must be positive and finite, got {cell_size}"),
            });
        }
        if !(origin_x.is_finite() && origin_y.is_finite()) {
            return Err(KrigingError::InvalidGrid {
                reason: "grid origin must be finite".to_string(),
            });
        }
        if n_cols == 0 || n_rows == 0 {
            return Err(KrigingError::InvalidGrid {
                reason: format!("grid must have at least one cell, got {n_rows}x{n_cols}"),
            });
        }

        Ok(Self {
            origin_x,
            origin_y,
            cell_size,
            n_cols,
            n_rows,
        })
    }

    /// Grid covering `bounds` at the given resolution.
    ///
    /// Column and row counts follow half-open ranges `[min, max)` stepped by `cell_size`,
    /// with at least one cell along each axis.
    pub fn from_bounds(bounds: &BoundingBox, cell_size: f64) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(KrigingError::InvalidGrid {
                reason: format!("resolution must be positive and finite, got {cell_size}"),
            });
        }

        let count = |extent: f64| ((extent / cell_size).ceil() as usize).max(1);

        Self::new(
            bounds.min_x,
            bounds.max_y,
            cell_size,
            count(bounds.width()),
            count(bounds.height()),
        )
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    pub fn n_cells(&self) -> usize {
        self.n_rows * self.n_cols
    }

    /// Centre of cell `(row, col)`.
    #[inline(always)]
    pub fn cell_center(&self, row: usize, col: usize) -> Point2<f64> {
        Point2::new(
            self.origin_x + (col as f64 + 0.5) * self.cell_size,
            self.origin_y - (row as f64 + 0.5) * self.cell_size,
        )
    }

    /// Centre of the cell at row-major flat index `ind`.
    #[inline(always)]
    pub fn flat_cell_center(&self, ind: usize) -> Point2<f64> {
        self.cell_center(ind / self.n_cols, ind % self.n_cols)
    }

    pub fn geo_transform(&self) -> GeoTransform {
        [
            self.origin_x,
            self.cell_size,
            0.0,
            self.origin_y,
            0.0,
            -self.cell_size,
        ]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn shape_from_bounds() {
        let bounds = BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 10.0,
            max_y: 4.5,
        };
        let grid = GridDefinition::from_bounds(&bounds, 1.0).unwrap();
        assert_eq!(grid.shape(), (5, 10));
        assert_eq!(grid.origin_x, 0.0);
        assert_eq!(grid.origin_y, 4.5);
    }

    #[test]
    fn degenerate_extent_has_one_cell() {
        let bounds = BoundingBox {
            min_x: 2.0,
            min_y: 3.0,
            max_x: 2.0,
            max_y: 3.0,
        };
        let grid = GridDefinition::from_bounds(&bounds, 5.0).unwrap();
        assert_eq!(grid.shape(), (1, 1));
    }

    #[test]
    fn north_up_cell_centers() {
        let grid = GridDefinition::new(100.0, 50.0, 2.0, 3, 2).unwrap();

        let top_left = grid.cell_center(0, 0);
        assert_relative_eq!(top_left.x, 101.0);
        assert_relative_eq!(top_left.y, 49.0);

        let bottom_right = grid.flat_cell_center(5);
        assert_relative_eq!(bottom_right.x, 105.0);
        assert_relative_eq!(bottom_right.y, 47.0);

        assert_eq!(grid.geo_transform(), [100.0, 2.0, 0.0, 50.0, 0.0, -2.0]);
    }

    #[test]
    fn rejects_bad_resolution() {
        let bounds = BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 1.0,
            max_y: 1.0,
        };
        assert!(matches!(
            GridDefinition::from_bounds(&bounds, 0.0),
            Err(KrigingError::InvalidGrid { .. })
        ));
        assert!(GridDefinition::new(0.0, 0.0, 1.0, 0, 3).is_err());
    }
}
