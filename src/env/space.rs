/// A box in R<sup>d</sup> given by per-dimension lower and upper bounds
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpace {
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

impl BoxSpace {
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Self {
        Self { low, high }
    }

    /// A box with the same bounds `[low, high]` in every one of `dim` dimensions
    pub fn uniform(dim: usize, low: f64, high: f64) -> Self {
        Self::new(vec![low; dim], vec![high; dim])
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// True if no bound is infinite
    pub fn is_bounded(&self) -> bool {
        self.low.iter().chain(&self.high).all(|x| x.is_finite())
    }

    /// Per-dimension width `high - low`
    pub fn range(&self) -> Vec<f64> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(lo, hi)| hi - lo)
            .collect()
    }
}

/// A finite set of `n` actions, identified by the indices `0..n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discrete {
    pub n: usize,
}

impl Discrete {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_space_functional() {
        let space = BoxSpace::new(vec![-1.0, 0.0], vec![1.0, 4.0]);
        assert_eq!(space.dim(), 2);
        assert!(space.is_bounded());
        assert_eq!(space.range(), vec![2.0, 4.0]);

        let space = BoxSpace::new(vec![0.0, f64::NEG_INFINITY], vec![1.0, 0.0]);
        assert!(!space.is_bounded(), "Infinite bound detected");
    }
}
