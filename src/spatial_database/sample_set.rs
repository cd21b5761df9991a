use std::io::Read;
use std::path::Path;

use itertools::Itertools;
use nalgebra::Point2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{KrigingError, Result};

/// Minimum number of samples needed for a well posed variogram and kriging system.
pub const MIN_SAMPLES: usize = 3;

/// A single point measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    pub fn point(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

impl From<(f64, f64, f64)> for Sample {
    fn from((x, y, value): (f64, f64, f64)) -> Self {
        Self::new(x, y, value)
    }
}

/// Axis aligned extent of a sample set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Immutable, ordered set of conditioning samples.
///
/// The storage order is the row/column order of every kriging matrix built from the set.
#[derive(Debug, Clone)]
pub struct SampleSet {
    points: Vec<Point2<f64>>,
    values: Vec<f64>,
}

impl SampleSet {
    /// Build a sample set, rejecting fewer than [`MIN_SAMPLES`] samples and non-finite input.
    pub fn new<I>(samples: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Sample>,
    {
        let (points, values): (Vec<_>, Vec<_>) = samples
            .into_iter()
            .map(Into::into)
            .map(|s: Sample| (s.point(), s.value))
            .unzip();

        if points.len() < MIN_SAMPLES {
            return Err(KrigingError::InsufficientData {
                found: points.len(),
            });
        }

        if let Some(index) = points
            .iter()
            .zip(values.iter())
            .position(|(p, v)| !(p.x.is_finite() && p.y.is_finite() && v.is_finite()))
        {
            return Err(KrigingError::NonFiniteSample { index });
        }

        Ok(Self { points, values })
    }

    /// Read samples from a delimited table with a header row.
    ///
    /// # Arguments
    /// * `reader` - source of the table
    /// * `x_field`, `y_field` - names of the coordinate columns
    /// * `value_field` - name of the column to interpolate
    pub fn from_csv_reader<R: Read>(
        reader: R,
        x_field: &str,
        y_field: &str,
        value_field: &str,
    ) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| KrigingError::UnknownField(name.to_string()))
        };
        let columns = [column(x_field)?, column(y_field)?, column(value_field)?];
        let names = [x_field, y_field, value_field];

        let mut samples = Vec::new();
        for (record_ind, record) in rdr.records().enumerate() {
            let record = record?;

            let mut parsed = [0f64; 3];
            for (slot, (col, name)) in parsed.iter_mut().zip(columns.iter().zip(names)) {
                let raw = record.get(*col).unwrap_or_default().trim();
                *slot = raw.parse::<f64>().map_err(|_| KrigingError::ParseField {
                    field: name.to_string(),
                    record: record_ind,
                    value: raw.to_string(),
                })?;
            }

            samples.push(Sample::new(parsed[0], parsed[1], parsed[2]));
        }

        tracing::debug!(n_samples = samples.len(), value_field, "read samples from csv");

        Self::new(samples)
    }

    pub fn from_csv_path(
        path: impl AsRef<Path>,
        x_field: &str,
        y_field: &str,
        value_field: &str,
    ) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, x_field, y_field, value_field)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn coordinates(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.points
            .iter()
            .zip(self.values.iter())
            .map(|(p, v)| Sample::new(p.x, p.y, *v))
    }

    /// Euclidean distance between samples `i` and `j`.
    #[inline(always)]
    pub fn pairwise_distance(&self, i: usize, j: usize) -> f64 {
        nalgebra::distance(&self.points[i], &self.points[j])
    }

    /// Euclidean distance between sample `i` and an arbitrary location.
    #[inline(always)]
    pub fn distance_to(&self, i: usize, point: &Point2<f64>) -> f64 {
        nalgebra::distance(&self.points[i], point)
    }

    pub fn max_pairwise_distance(&self) -> f64 {
        (0..self.len())
            .tuple_combinations()
            .map(|(i, j)| OrderedFloat(self.pairwise_distance(i, j)))
            .max()
            .map_or(0.0, |d| d.0)
    }

    /// Population variance of the sample values.
    pub fn value_variance(&self) -> f64 {
        let n = self.values.len() as f64;
        let mean = self.values.iter().sum::<f64>() / n;
        self.values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
    }

    pub fn bounds(&self) -> BoundingBox {
        self.points.iter().fold(
            BoundingBox {
                min_x: f64::INFINITY,
                min_y: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                max_y: f64::NEG_INFINITY,
            },
            |acc, p| BoundingBox {
                min_x: acc.min_x.min(p.x),
                min_y: acc.min_y.min(p.y),
                max_x: acc.max_x.max(p.x),
                max_y: acc.max_y.max(p.y),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn square() -> SampleSet {
        SampleSet::new(vec![
            (0.0, 0.0, 0.0),
            (10.0, 0.0, 10.0),
            (0.0, 10.0, 10.0),
            (10.0, 10.0, 20.0),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_two_samples() {
        let res = SampleSet::new(vec![(0.0, 0.0, 1.0), (1.0, 1.0, 2.0)]);
        assert!(matches!(
            res,
            Err(KrigingError::InsufficientData { found: 2 })
        ));
    }

    #[test]
    fn rejects_non_finite() {
        let res = SampleSet::new(vec![
            (0.0, 0.0, 1.0),
            (1.0, f64::NAN, 2.0),
            (2.0, 0.0, 3.0),
        ]);
        assert!(matches!(res, Err(KrigingError::NonFiniteSample { index: 1 })));
    }

    #[test]
    fn distances_are_symmetric() {
        let set = square();
        for i in 0..set.len() {
            assert_eq!(set.pairwise_distance(i, i), 0.0);
            for j in 0..set.len() {
                assert_eq!(set.pairwise_distance(i, j), set.pairwise_distance(j, i));
            }
        }
        assert_relative_eq!(set.pairwise_distance(0, 3), 200f64.sqrt());
        assert_relative_eq!(set.max_pairwise_distance(), 200f64.sqrt());
    }

    #[test]
    fn keeps_duplicates_in_order() {
        let set = SampleSet::new(vec![
            (1.0, 1.0, 5.0),
            (1.0, 1.0, 7.0),
            (3.0, 2.0, 1.0),
        ])
        .unwrap();
        assert_eq!(set.values(), &[5.0, 7.0, 1.0]);
        assert_eq!(set.pairwise_distance(0, 1), 0.0);
    }

    #[test]
    fn bounds_and_variance() {
        let set = square();
        let bounds = set.bounds();
        assert_eq!(bounds.min_x, 0.0);
        assert_eq!(bounds.max_y, 10.0);
        assert_relative_eq!(set.value_variance(), 50.0);
    }

    #[test]
    fn csv_by_field_name() {
        let table = "id,X,Y,RESAKG\n1,0,0,3100.5\n2,5,0,2990\n3,0,5,3050\n";
        let set = SampleSet::from_csv_reader(table.as_bytes(), "X", "Y", "RESAKG").unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.values(), &[3100.5, 2990.0, 3050.0]);
        assert_eq!(set.coordinates()[1], Point2::new(5.0, 0.0));
    }

    #[test]
    fn csv_unknown_field() {
        let table = "X,Y,RESAKG\n0,0,1\n1,0,2\n0,1,3\n";
        let res = SampleSet::from_csv_reader(table.as_bytes(), "X", "Y", "YIELD");
        assert!(matches!(res, Err(KrigingError::UnknownField(f)) if f == "YIELD"));
    }

    #[test]
    fn csv_bad_value() {
        let table = "X,Y,V\n0,0,1\n1,0,abc\n0,1,3\n";
        let res = SampleSet::from_csv_reader(table.as_bytes(), "X", "Y", "V");
        assert!(matches!(
            res,
            Err(KrigingError::ParseField { record: 1, .. })
        ));
    }
}
