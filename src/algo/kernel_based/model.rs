use ndarray::{s, Array2, Array3};

use crate::{ds::RepresentativeStates, kernel::Kernel};

use super::Bonus;

/// Smoothing and bonus parameters of a [`KernelModel`]
#[derive(Debug, Clone, PartialEq)]
pub struct KernelModelConfig {
    pub kernel: Kernel,
    /// Divisor applied to distances before evaluating the kernel
    pub bandwidth: f64,
    pub bonus: Bonus,
    pub bonus_scale_factor: f64,
    /// Regularization mass added to the accumulated weights
    pub beta: f64,
    /// Upper bound on the value function, used by the bonus
    pub v_max: f64,
}

/// Kernel-smoothed estimates of the transitions and rewards over a set of
/// representative states
///
/// All tables are allocated for the full capacity of representative states. Rows
/// beyond the number of active representatives are zero (or `v_max` for the bonus).
///
/// ### Tables
/// - `n_sa[s, a]` - accumulated kernel weight
/// - `b_sa[s, a]` - exploration bonus
/// - `r_hat[s, a]` - reward estimate
/// - `p_hat[s, a, s']` - transition estimate
#[derive(Debug, Clone)]
pub struct KernelModel {
    config: KernelModelConfig,
    n_sa: Array2<f64>,
    b_sa: Array2<f64>,
    r_hat: Array2<f64>,
    p_hat: Array3<f64>,
    weights: Vec<f64>,
}

impl KernelModel {
    /// Initialize an empty model for `capacity` representative states and `n_actions` actions
    pub fn new(capacity: usize, n_actions: usize, config: KernelModelConfig) -> Self {
        Self {
            n_sa: Array2::zeros((capacity, n_actions)),
            b_sa: Array2::from_elem((capacity, n_actions), config.v_max),
            r_hat: Array2::zeros((capacity, n_actions)),
            p_hat: Array3::zeros((capacity, n_actions, capacity)),
            weights: vec![0.0; capacity],
            config,
        }
    }

    pub fn config(&self) -> &KernelModelConfig {
        &self.config
    }

    /// Forget every observation
    pub fn reset(&mut self) {
        self.n_sa.fill(0.0);
        self.b_sa.fill(self.config.v_max);
        self.r_hat.fill(0.0);
        self.p_hat.fill(0.0);
        self.weights.fill(0.0);
    }

    /// Incorporate the transition `(repr_state, action) -> repr_next_state` with `reward`
    ///
    /// Every active representative `u` is updated with the kernel weight of its
    /// distance to `repr_state`, so a single observation informs all of its
    /// neighbours. Each estimate moves toward the observation in proportion to the
    /// new weight relative to the weight already accumulated. A pair without any
    /// accumulated weight takes the observation as its whole estimate, which keeps
    /// the transition rows normalized.
    ///
    /// **Panics** if an index is out of range
    pub fn update(
        &mut self,
        reprs: &RepresentativeStates,
        repr_state: usize,
        action: usize,
        repr_next_state: usize,
        reward: f64,
    ) {
        let m = reprs.len();
        assert!(
            repr_state < m && repr_next_state < m,
            "Representative states ({}, {}) must be active ({} active)",
            repr_state,
            repr_next_state,
            m
        );
        let KernelModelConfig {
            kernel,
            bandwidth,
            bonus,
            bonus_scale_factor,
            beta,
            v_max,
        } = self.config;

        for (u, w) in self.weights[..m].iter_mut().enumerate() {
            *w = kernel.weight(reprs.distance_between(repr_state, u) / bandwidth);
        }

        for u in 0..m {
            let weight = self.weights[u];
            let prev_n = self.n_sa[[u, action]];
            let prior_mass = if prev_n > 0.0 { beta + prev_n } else { 0.0 };
            let new_mass = prior_mass + weight;

            self.n_sa[[u, action]] += weight;

            if weight > 0.0 {
                let keep = prior_mass / new_mass;
                let mut row = self.p_hat.slice_mut(s![u, action, ..m]);
                row.mapv_inplace(|p| p * keep);
                row[repr_next_state] += weight / new_mass;

                let r = &mut self.r_hat[[u, action]];
                *r = (weight * reward + prior_mass * *r) / new_mass;
            }

            self.b_sa[[u, action]] =
                bonus.compute(self.n_sa[[u, action]], beta, bonus_scale_factor, v_max);
        }
    }

    /// Accumulated kernel weights `n_sa[s, a]`
    pub fn n_sa(&self) -> &Array2<f64> {
        &self.n_sa
    }

    /// Exploration bonuses `b_sa[s, a]`
    pub fn bonus(&self) -> &Array2<f64> {
        &self.b_sa
    }

    /// Reward estimates `r_hat[s, a]`
    pub fn rewards(&self) -> &Array2<f64> {
        &self.r_hat
    }

    /// Transition estimates `p_hat[s, a, s']`
    pub fn transitions(&self) -> &Array3<f64> {
        &self.p_hat
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    use super::*;

    fn config() -> KernelModelConfig {
        KernelModelConfig {
            kernel: Kernel::Epanechnikov,
            bandwidth: 0.5,
            bonus: Bonus::SimplifiedBernstein,
            bonus_scale_factor: 1.0,
            beta: 0.01,
            v_max: 5.0,
        }
    }

    /// Representatives at 0.0, 0.3 and 0.9 on a line
    fn line() -> RepresentativeStates {
        let mut reprs = RepresentativeStates::new(4, 2.0, vec![1.0], 0.1);
        for x in [0.0, 0.3, 0.9] {
            reprs.resolve(&[x], true);
        }
        reprs
    }

    #[test]
    fn update_functional() {
        let reprs = line();
        let mut model = KernelModel::new(4, 2, config());
        model.update(&reprs, 0, 1, 1, 0.8);

        let n = model.n_sa();
        assert_eq!(n[[0, 1]], 1.0, "Full weight on the visited state");
        assert_abs_diff_eq!(n[[1, 1]], 1.0 - 0.36, epsilon = 1e-12);
        assert_eq!(n[[2, 1]], 0.0, "Outside the bandwidth");
        assert_eq!(n[[0, 0]], 0.0, "Other actions untouched");

        let p = model.transitions();
        assert_eq!(p[[0, 1, 1]], 1.0);
        assert_eq!(p[[1, 1, 1]], 1.0, "Smoothed onto the neighbour");
        assert_eq!(p[[2, 1, 1]], 0.0);

        let r = model.rewards();
        assert_eq!(r[[0, 1]], 0.8);
        assert_abs_diff_eq!(r[[1, 1]], 0.8, epsilon = 1e-12);
        assert_eq!(r[[2, 1]], 0.0);

        let expected = Bonus::SimplifiedBernstein.compute(1.0, 0.01, 1.0, 5.0);
        assert_eq!(model.bonus()[[0, 1]], expected);
        assert_eq!(model.bonus()[[0, 0]], 5.0, "Unvisited pairs keep the optimistic bonus");
        assert_eq!(model.bonus()[[3, 1]], 5.0, "Inactive slots are untouched");
    }

    #[test]
    fn update_averages() {
        let reprs = line();
        let mut model = KernelModel::new(4, 2, config());
        model.update(&reprs, 0, 0, 0, 1.0);
        model.update(&reprs, 0, 0, 2, 0.0);

        // prior mass 1.01, new weight 1
        let p = model.transitions();
        assert_abs_diff_eq!(p[[0, 0, 0]], 1.01 / 2.01, epsilon = 1e-12);
        assert_abs_diff_eq!(p[[0, 0, 2]], 1.0 / 2.01, epsilon = 1e-12);
        assert_abs_diff_eq!(model.rewards()[[0, 0]], 1.01 / 2.01, epsilon = 1e-12);
        assert_eq!(model.n_sa()[[0, 0]], 2.0);
    }

    #[test]
    fn reset_functional() {
        let reprs = line();
        let mut model = KernelModel::new(4, 2, config());
        model.update(&reprs, 1, 0, 2, 1.0);
        model.reset();
        assert!(model.n_sa().iter().all(|&x| x == 0.0));
        assert!(model.transitions().iter().all(|&x| x == 0.0));
        assert!(model.bonus().iter().all(|&x| x == 5.0));
    }

    proptest! {
        #[test]
        fn transition_rows_stay_normalized(
            samples in prop::collection::vec((0.0f64..1.0, 0usize..2, 0.0f64..1.0, 0.0f64..1.0), 1..40),
        ) {
            let mut reprs = RepresentativeStates::new(16, 2.0, vec![1.0], 0.15);
            let mut model = KernelModel::new(16, 2, config());
            for (x, a, y, r) in samples {
                let s = reprs.resolve(&[x], true).unwrap();
                let ns = reprs.resolve(&[y], true).unwrap();
                model.update(&reprs, s, a, ns, r);
            }

            let m = reprs.len();
            for u in 0..m {
                for a in 0..2 {
                    if model.n_sa()[[u, a]] > 0.0 {
                        let row = model.transitions().slice(s![u, a, ..m]);
                        prop_assert!(row.iter().all(|&p| p >= 0.0));
                        prop_assert!((row.sum() - 1.0).abs() < 1e-9);
                        let r = model.rewards()[[u, a]];
                        prop_assert!((0.0..=1.0 + 1e-12).contains(&r));
                    }
                }
            }
        }
    }
}
