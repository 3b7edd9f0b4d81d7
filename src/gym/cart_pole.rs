use gym_rs::core::{ActionReward, Env};
use gym_rs::envs::classical_control::cartpole::{CartPoleEnv, CartPoleObservation};
use gym_rs::utils::renderer::RenderMode;

use crate::env::{BoxSpace, Discrete, Environment, Step};

const X_THRESHOLD: f64 = 2.4;
const THETA_THRESHOLD: f64 = 12.0 * 2.0 * std::f64::consts::PI / 360.0;

fn obs2arr(observation: CartPoleObservation) -> [f64; 4] {
    let v: Vec<f64> = Vec::from(observation);
    [v[0], v[1], v[2], v[3]]
}

/// The classic CartPole environment, seen as a continuous-state control problem
///
/// This implementation is a thin wrapper around [gym_rs](https://github.com/MathisWellmann/gym-rs).
/// Actions `0` and `1` push the cart left and right. The observation holds the cart
/// position and velocity and the pole angle and angular velocity. Velocities are unbounded.
#[derive(Debug, Clone)]
pub struct CartPole {
    gym_env: CartPoleEnv,
    space: BoxSpace,
}

impl CartPole {
    pub fn new(render_mode: RenderMode) -> Self {
        Self {
            gym_env: CartPoleEnv::new(render_mode),
            space: BoxSpace::new(
                vec![-2.0 * X_THRESHOLD, f64::NEG_INFINITY, -2.0 * THETA_THRESHOLD, f64::NEG_INFINITY],
                vec![2.0 * X_THRESHOLD, f64::INFINITY, 2.0 * THETA_THRESHOLD, f64::INFINITY],
            ),
        }
    }
}

impl Environment for CartPole {
    type State = [f64; 4];

    fn observation_space(&self) -> &BoxSpace {
        &self.space
    }

    fn action_space(&self) -> Discrete {
        Discrete::new(2)
    }

    fn reward_range(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn reset(&mut self) -> Self::State {
        obs2arr(self.gym_env.reset(None, false, None).0)
    }

    fn step(&mut self, action: usize) -> Step<Self::State> {
        assert!(action < 2, "Invalid action: {}", action);
        let ActionReward {
            observation,
            reward,
            done,
            ..
        } = self.gym_env.step(action);

        Step {
            next_state: obs2arr(observation),
            reward: *reward,
            done,
        }
    }
}
