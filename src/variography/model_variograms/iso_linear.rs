use super::IsoVariogramModel;

/// Unbounded linear structure with slope `sill / range`.
///
/// `sill` is the semivariance reached at `range`; the model keeps growing past it.
#[derive(Debug, Clone, Default, Copy)]
pub struct IsoLinear {
    pub range: f64,
    pub sill: f64,
}

impl IsoLinear {
    pub fn new(range: f64, sill: f64) -> Self {
        Self { range, sill }
    }

    pub fn slope(&self) -> f64 {
        self.sill / self.range
    }
}

impl IsoVariogramModel for IsoLinear {
    fn c_0(&self) -> f64 {
        self.sill
    }

    fn variogram(&self, h: f64) -> f64 {
        self.slope() * h
    }
}
