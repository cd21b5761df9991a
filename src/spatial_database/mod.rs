pub mod grid;
pub mod sample_set;

pub use grid::{GeoTransform, GridDefinition};
pub use sample_set::{BoundingBox, Sample, SampleSet};
