use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use self::iso_exponential::IsoExponential;
use self::iso_fitter::FitError;
use self::iso_gaussian::IsoGaussian;
use self::iso_linear::IsoLinear;
use self::iso_spherical::IsoSpherical;

pub mod iso_exponential;
pub mod iso_fitter;
pub mod iso_gaussian;
pub mod iso_linear;
pub mod iso_spherical;

/// A single isotropic structure without nugget.
pub trait IsoVariogramModel {
    /// Contribution of the structure to the sill.
    fn c_0(&self) -> f64;
    fn variogram(&self, h: f64) -> f64;
    fn covariogram(&self, h: f64) -> f64 {
        self.c_0() - self.variogram(h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariogramKind {
    Linear,
    Gaussian,
    Spherical,
    Exponential,
}

impl VariogramKind {
    pub const ALL: [VariogramKind; 4] = [
        VariogramKind::Linear,
        VariogramKind::Gaussian,
        VariogramKind::Spherical,
        VariogramKind::Exponential,
    ];

    /// Whether the semivariance levels off at the sill.
    pub fn is_bounded(&self) -> bool {
        !matches!(self, VariogramKind::Linear)
    }

    /// Value of the nugget-free structure of this kind at distance `h`.
    #[inline(always)]
    pub fn structure(&self, range: f64, partial_sill: f64, h: f64) -> f64 {
        match self {
            VariogramKind::Linear => IsoLinear::new(range, partial_sill).variogram(h),
            VariogramKind::Gaussian => IsoGaussian::new(range, partial_sill).variogram(h),
            VariogramKind::Spherical => IsoSpherical::new(range, partial_sill).variogram(h),
            VariogramKind::Exponential => IsoExponential::new(range, partial_sill).variogram(h),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VariogramKind::Linear => "linear",
            VariogramKind::Gaussian => "gaussian",
            VariogramKind::Spherical => "spherical",
            VariogramKind::Exponential => "exponential",
        }
    }
}

impl fmt::Display for VariogramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VariogramKind {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VariogramKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FitError::UnknownKind(s.to_string()))
    }
}

/// Fitted isotropic variogram: a nugget plus one structure of the given kind.
///
/// `semivariance(0) == nugget`. Bounded kinds approach `sill` with distance, the linear
/// kind grows with slope `(sill - nugget) / range`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VariogramModel {
    kind: VariogramKind,
    nugget: f64,
    sill: f64,
    range: f64,
}

impl VariogramModel {
    /// Creates a model, enforcing `sill >= nugget >= 0` and `range > 0`.
    pub fn new(kind: VariogramKind, nugget: f64, sill: f64, range: f64) -> Result<Self, FitError> {
        let finite = nugget.is_finite() && sill.is_finite() && range.is_finite();
        if !finite || nugget < 0.0 || sill < nugget || range <= 0.0 {
            return Err(FitError::InvalidModel {
                nugget,
                sill,
                range,
            });
        }

        Ok(Self {
            kind,
            nugget,
            sill,
            range,
        })
    }

    pub fn kind(&self) -> VariogramKind {
        self.kind
    }

    pub fn nugget(&self) -> f64 {
        self.nugget
    }

    pub fn sill(&self) -> f64 {
        self.sill
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn partial_sill(&self) -> f64 {
        self.sill - self.nugget
    }

    #[inline(always)]
    pub fn semivariance(&self, h: f64) -> f64 {
        self.nugget + self.kind.structure(self.range, self.partial_sill(), h)
    }
}

impl fmt::Display for VariogramModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (nugget: {:.6}, sill: {:.6}, range: {:.6})",
            self.kind, self.nugget, self.sill, self.range
        )
    }
}
