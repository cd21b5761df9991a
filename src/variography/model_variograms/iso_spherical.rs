use super::IsoVariogramModel;

/// Spherical structure, reaches its sill exactly at `range`.
#[derive(Debug, Clone, Default, Copy)]
pub struct IsoSpherical {
    pub range: f64,
    pub sill: f64,
}

impl IsoSpherical {
    pub fn new(range: f64, sill: f64) -> Self {
        Self { range, sill }
    }
}

impl IsoVariogramModel for IsoSpherical {
    fn c_0(&self) -> f64 {
        self.sill
    }

    fn variogram(&self, h: f64) -> f64 {
        if h < self.range {
            let hr = h / self.range;
            return self.sill * (1.5 * hr - 0.5 * hr * hr * hr);
        }
        self.sill
    }
}
