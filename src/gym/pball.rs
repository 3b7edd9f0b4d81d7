use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::{
    env::{BoxSpace, Discrete, Environment, Step},
    error::{Error, Result},
    metric::metric_lp,
};

const ORIGIN: [f64; 2] = [0.0, 0.0];
const UNIT: [f64; 2] = [1.0, 1.0];

/// Configuration for the [`PBall2D`] environment
#[derive(Debug, Clone, PartialEq)]
pub struct PBall2DConfig {
    /// The ball is the unit ball of the Lp norm with this `p`
    ///
    /// **Default**: `2.0`
    pub p: f64,
    /// Displacement applied by each action
    ///
    /// **Default**: `±0.05` along each axis
    pub actions: Vec<[f64; 2]>,
    /// Peak reward of each bump
    ///
    /// **Default**: `[1.0]`
    pub reward_amplitudes: Vec<f64>,
    /// Width of each bump
    ///
    /// **Default**: `[0.25]`
    pub reward_smoothness: Vec<f64>,
    /// Position of each bump
    ///
    /// **Default**: `[[0.5, 0.5]]`
    pub reward_centers: Vec<[f64; 2]>,
    /// Standard deviation of the transition noise
    ///
    /// **Default**: `0.01`
    pub sigma: f64,
    /// Standard deviation of the initial position around the origin
    ///
    /// **Default**: `0.001`
    pub sigma_init: f64,
    /// **Default**: `42`
    pub seed: u64,
}

impl Default for PBall2DConfig {
    fn default() -> Self {
        Self {
            p: 2.0,
            actions: vec![[0.05, 0.0], [-0.05, 0.0], [0.0, 0.05], [0.0, -0.05]],
            reward_amplitudes: vec![1.0],
            reward_smoothness: vec![0.25],
            reward_centers: vec![[0.5, 0.5]],
            sigma: 0.01,
            sigma_init: 0.001,
            seed: 42,
        }
    }
}

/// A point moving in the unit p-ball of the plane
///
/// Each action pushes the point by a fixed displacement, perturbed by Gaussian noise,
/// and the result is projected back onto the ball. The reward is a sum of Gaussian
/// bumps around configured centers.
#[derive(Debug, Clone)]
pub struct PBall2D {
    config: PBall2DConfig,
    space: BoxSpace,
    noise: Normal<f64>,
    init_noise: Normal<f64>,
    rng: StdRng,
    state: [f64; 2],
}

impl PBall2D {
    /// **Errors** if the reward description is inconsistent or a parameter is out of range
    pub fn new(config: PBall2DConfig) -> Result<Self> {
        let invalid = |name, reason: &str| Error::InvalidParameter {
            name,
            reason: reason.to_string(),
        };
        if config.p.is_nan() || config.p < 1.0 {
            return Err(invalid("p", "must be at least 1"));
        }
        if config.actions.is_empty() {
            return Err(invalid("actions", "must not be empty"));
        }
        let n_bumps = config.reward_centers.len();
        if config.reward_amplitudes.len() != n_bumps || config.reward_smoothness.len() != n_bumps {
            return Err(invalid(
                "reward_centers",
                "amplitudes, smoothness and centers must have the same length",
            ));
        }
        if config.reward_amplitudes.iter().any(|a| a.is_nan() || *a < 0.0) {
            return Err(invalid("reward_amplitudes", "must be non-negative"));
        }
        if config.reward_smoothness.iter().any(|s| s.is_nan() || *s <= 0.0) {
            return Err(invalid("reward_smoothness", "must be positive"));
        }
        if !config.sigma.is_finite() || config.sigma < 0.0 {
            return Err(invalid("sigma", "must be finite and non-negative"));
        }
        if !config.sigma_init.is_finite() || config.sigma_init < 0.0 {
            return Err(invalid("sigma_init", "must be finite and non-negative"));
        }
        let noise = Normal::new(0.0, config.sigma).map_err(|_| invalid("sigma", "must be finite"))?;
        let init_noise = Normal::new(0.0, config.sigma_init)
            .map_err(|_| invalid("sigma_init", "must be finite"))?;

        Ok(Self {
            space: BoxSpace::uniform(2, -1.0, 1.0),
            noise,
            init_noise,
            rng: StdRng::seed_from_u64(config.seed),
            state: ORIGIN,
            config,
        })
    }

    fn norm(&self, x: &[f64; 2]) -> f64 {
        metric_lp(x, &ORIGIN, self.config.p, &UNIT)
    }

    /// Project onto the unit ball by rescaling
    fn project(&self, x: [f64; 2]) -> [f64; 2] {
        let norm = self.norm(&x);
        if norm > 1.0 {
            x.map(|xi| xi / norm)
        } else {
            x
        }
    }

    /// Reward collected at position `x`
    pub fn reward_at(&self, x: &[f64; 2]) -> f64 {
        let PBall2DConfig {
            p,
            reward_amplitudes,
            reward_smoothness,
            reward_centers,
            ..
        } = &self.config;
        reward_centers
            .iter()
            .zip(reward_amplitudes)
            .zip(reward_smoothness)
            .map(|((center, amplitude), smoothness)| {
                let z = metric_lp(x, center, *p, &UNIT) / smoothness;
                amplitude * (-0.5 * z * z).exp()
            })
            .sum()
    }

    /// Current position
    pub fn state(&self) -> [f64; 2] {
        self.state
    }
}

impl Environment for PBall2D {
    type State = [f64; 2];

    fn observation_space(&self) -> &BoxSpace {
        &self.space
    }

    fn action_space(&self) -> Discrete {
        Discrete::new(self.config.actions.len())
    }

    fn reward_range(&self) -> (f64, f64) {
        (0.0, self.config.reward_amplitudes.iter().sum())
    }

    fn reset(&mut self) -> Self::State {
        let x = [
            self.init_noise.sample(&mut self.rng),
            self.init_noise.sample(&mut self.rng),
        ];
        self.state = self.project(x);
        self.state
    }

    fn step(&mut self, action: usize) -> Step<Self::State> {
        assert!(action < self.config.actions.len(), "Invalid action: {}", action);
        let [dx, dy] = self.config.actions[action];
        let x = [
            self.state[0] + dx + self.noise.sample(&mut self.rng),
            self.state[1] + dy + self.noise.sample(&mut self.rng),
        ];
        self.state = self.project(x);
        Step {
            next_state: self.state,
            reward: self.reward_at(&self.state),
            done: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn pball_functional() {
        let mut env = PBall2D::new(PBall2DConfig::default()).unwrap();
        assert_eq!(env.action_space(), Discrete::new(4));
        assert_eq!(env.observation_space().dim(), 2);
        assert_eq!(env.reward_range(), (0.0, 1.0));

        let state = env.reset();
        assert!(env.norm(&state) <= 1.0);

        let (lo, hi) = env.reward_range();
        for t in 0..200 {
            let Step {
                next_state, reward, ..
            } = env.step(t % 4);
            assert!(env.norm(&next_state) <= 1.0 + 1e-12, "Stays in the ball");
            assert!((lo..=hi).contains(&reward), "Reward in range");
        }
    }

    #[test]
    fn projection_onto_ball() {
        let mut env = PBall2D::new(PBall2DConfig {
            p: f64::INFINITY,
            sigma: 0.0,
            sigma_init: 0.0,
            ..Default::default()
        })
        .unwrap();
        env.reset();
        for _ in 0..40 {
            env.step(0);
        }
        assert_abs_diff_eq!(env.state()[0], 1.0, epsilon = 1e-12);
        assert_eq!(env.state()[1], 0.0);
    }

    #[test]
    fn reward_peaks_at_center() {
        let env = PBall2D::new(PBall2DConfig::default()).unwrap();
        assert_eq!(env.reward_at(&[0.5, 0.5]), 1.0);
        assert!(env.reward_at(&[0.0, 0.0]) < env.reward_at(&[0.4, 0.4]));
    }

    #[test]
    fn seeded_runs_repeat() {
        let run = || {
            let mut env = PBall2D::new(PBall2DConfig::default()).unwrap();
            env.reset();
            (0..10).map(|t| env.step(t % 4).next_state).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn invalid_config() {
        let config = PBall2DConfig {
            reward_smoothness: vec![],
            ..Default::default()
        };
        assert!(PBall2D::new(config).is_err());
    }

    #[test]
    fn invalid_noise() {
        for (sigma, sigma_init, name) in [
            (-1.0, 0.001, "sigma"),
            (f64::NAN, 0.001, "sigma"),
            (f64::INFINITY, 0.001, "sigma"),
            (0.01, -0.5, "sigma_init"),
            (0.01, f64::INFINITY, "sigma_init"),
        ] {
            let result = PBall2D::new(PBall2DConfig {
                sigma,
                sigma_init,
                ..Default::default()
            });
            assert!(
                matches!(result, Err(Error::InvalidParameter { name: n, .. }) if n == name),
                "{} = ({}, {}) is rejected",
                name,
                sigma,
                sigma_init
            );
        }
    }
}
