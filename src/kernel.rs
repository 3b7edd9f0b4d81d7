use std::{f64::consts::PI, fmt, str::FromStr};

use crate::error::Error;

/// Smoothing kernels mapping a normalized distance to a non-negative weight
///
/// All kernels take their maximum 1 at distance 0. The compactly supported ones
/// vanish for distances greater than 1.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Kernel {
    Uniform,
    Triangular,
    #[default]
    Epanechnikov,
    Quartic,
    Triweight,
    Tricube,
    Gaussian,
    Cosine,
    /// exp(-|z|<sup>n</sup> / n)
    Exponential(u32),
}

impl Kernel {
    /// Weight of a sample at normalized distance `z`
    pub fn weight(&self, z: f64) -> f64 {
        let z = z.abs();
        let inside = z <= 1.0;
        match *self {
            Self::Gaussian => (-z * z / 2.0).exp(),
            Self::Exponential(n) => {
                let n = n as f64;
                (-z.powf(n) / n).exp()
            }
            _ if !inside => 0.0,
            Self::Uniform => 1.0,
            Self::Triangular => 1.0 - z,
            Self::Epanechnikov => 1.0 - z * z,
            Self::Quartic => (1.0 - z * z).powi(2),
            Self::Triweight => (1.0 - z * z).powi(3),
            Self::Tricube => (1.0 - z.powi(3)).powi(3),
            Self::Cosine => (z * PI / 2.0).cos(),
        }
    }
}

impl FromStr for Kernel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kernel = match s {
            "uniform" => Self::Uniform,
            "triangular" => Self::Triangular,
            "epanechnikov" => Self::Epanechnikov,
            "quartic" => Self::Quartic,
            "triweight" => Self::Triweight,
            "tricube" => Self::Tricube,
            "gaussian" => Self::Gaussian,
            "cosine" => Self::Cosine,
            _ => {
                return s
                    .strip_prefix("exp-")
                    .and_then(|n| n.parse::<u32>().ok())
                    .filter(|&n| n > 0)
                    .map(Self::Exponential)
                    .ok_or_else(|| Error::UnknownKernel(s.to_string()))
            }
        };
        Ok(kernel)
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform => write!(f, "uniform"),
            Self::Triangular => write!(f, "triangular"),
            Self::Epanechnikov => write!(f, "epanechnikov"),
            Self::Quartic => write!(f, "quartic"),
            Self::Triweight => write!(f, "triweight"),
            Self::Tricube => write!(f, "tricube"),
            Self::Gaussian => write!(f, "gaussian"),
            Self::Cosine => write!(f, "cosine"),
            Self::Exponential(n) => write!(f, "exp-{}", n),
        }
    }
}
