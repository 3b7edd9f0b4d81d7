use std::{fmt, str::FromStr};

use crate::error::Error;

/// Exploration bonus formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bonus {
    /// scale * sqrt(1/n) + (1 + beta) * v<sub>max</sub> / n, with n = beta + accumulated weight
    #[default]
    SimplifiedBernstein,
}

impl Bonus {
    /// Bonus for a (state, action) pair that accumulated `sum_weights` kernel mass
    pub fn compute(&self, sum_weights: f64, beta: f64, scale_factor: f64, v_max: f64) -> f64 {
        let n = beta + sum_weights;
        match self {
            Self::SimplifiedBernstein => scale_factor * (1.0 / n).sqrt() + (1.0 + beta) * v_max / n,
        }
    }
}

impl FromStr for Bonus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simplified_bernstein" => Ok(Self::SimplifiedBernstein),
            _ => Err(Error::UnknownBonus(s.to_string())),
        }
    }
}

impl fmt::Display for Bonus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SimplifiedBernstein => write!(f, "simplified_bernstein"),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn simplified_bernstein_functional() {
        let bonus = Bonus::SimplifiedBernstein.compute(3.0, 1.0, 2.0, 10.0);
        assert_relative_eq!(bonus, 2.0 * 0.5 + 2.0 * 10.0 / 4.0);
    }

    #[test]
    fn parse_bonus() {
        assert_eq!("simplified_bernstein".parse::<Bonus>(), Ok(Bonus::SimplifiedBernstein));
        assert_eq!(
            "hoeffding".parse::<Bonus>(),
            Err(Error::UnknownBonus("hoeffding".into()))
        );
    }

    proptest! {
        #[test]
        fn bonus_non_increasing(
            n1 in 0.0f64..1e4,
            extra in 0.0f64..1e4,
            beta in 1e-3f64..1.0,
            scale in 0.0f64..10.0,
            v_max in 0.0f64..100.0,
        ) {
            let b1 = Bonus::SimplifiedBernstein.compute(n1, beta, scale, v_max);
            let b2 = Bonus::SimplifiedBernstein.compute(n1 + extra, beta, scale, v_max);
            prop_assert!(b1 >= b2);
        }
    }
}
