use std::{
    marker::PhantomData,
    time::{Duration, Instant},
};

use log::{info, warn};
use ndarray::{s, Array2, Array3};

use crate::{
    algo::dynprog::{backward_induction, backward_induction_in_place},
    ds::RepresentativeStates,
    env::{Environment, Step},
    error::{Error, Result},
    kernel::Kernel,
    util::argmax,
};

use super::{Bonus, KernelModel, KernelModelConfig};

const AGENT_ID: &str = "RSKernelUCBVI";

/// Largest capacity derived when `max_repr` is `None`. The transition table holds
/// `capacity^2 * n_actions` entries.
const MAX_DEFAULT_REPR: usize = 10_000;

/// Configuration for the [`RSKernelUCBVIAgent`]
#[derive(Debug, Clone, PartialEq)]
pub struct RSKernelUCBVIAgentConfig {
    /// Number of episodes run by [`fit`](RSKernelUCBVIAgent::fit)
    ///
    /// **Default**: `1000`
    pub n_episodes: usize,
    /// Discount factor in `[0, 1]`. With `1.0` the objective is purely finite-horizon.
    ///
    /// **Default**: `0.95`
    pub gamma: f64,
    /// Episode length. When `None`, `gamma` must be smaller than 1 and the horizon is `ceil(1 / (1 - gamma))`.
    ///
    /// **Default**: `None`
    pub horizon: Option<usize>,
    /// Exponent `p` of the Lp metric on the state space, `f64::INFINITY` for the max norm
    ///
    /// **Default**: `2.0`
    pub lp_metric: f64,
    /// **Default**: [`Kernel::Epanechnikov`]
    pub kernel: Kernel,
    /// Per-dimension divisor applied to states before computing distances. When `None`,
    /// the width of the observation space if it is bounded, ones otherwise.
    ///
    /// **Default**: `None`
    pub scaling: Option<Vec<f64>>,
    /// **Default**: `0.05`
    pub bandwidth: f64,
    /// Minimum distance between two representative states
    ///
    /// **Default**: `0.1`
    pub min_dist: f64,
    /// Maximum number of representative states. When `None`, `(sqrt(d) / min_dist)^d`
    /// where `d` is the state dimension, which must not exceed 10 000.
    ///
    /// **Default**: `Some(1000)`
    pub max_repr: Option<usize>,
    /// Multiplier of the exploration bonus
    ///
    /// **Default**: `1.0`
    pub bonus_scale_factor: f64,
    /// Regularization constant
    ///
    /// **Default**: `0.01`
    pub beta: f64,
    /// **Default**: [`Bonus::SimplifiedBernstein`]
    pub bonus: Bonus,
    /// Progress logging cadence: 0 is silent, 1 logs every minute, up to every 5 seconds for 4 and above
    ///
    /// **Default**: `1`
    pub verbose: u8,
}

impl Default for RSKernelUCBVIAgentConfig {
    fn default() -> Self {
        Self {
            n_episodes: 1000,
            gamma: 0.95,
            horizon: None,
            lp_metric: 2.0,
            kernel: Kernel::Epanechnikov,
            scaling: None,
            bandwidth: 0.05,
            min_dist: 0.1,
            max_repr: Some(1000),
            bonus_scale_factor: 1.0,
            beta: 0.01,
            bonus: Bonus::SimplifiedBernstein,
            verbose: 1,
        }
    }
}

/// Summary of a call to [`fit`](RSKernelUCBVIAgent::fit)
#[derive(Debug, Clone, PartialEq)]
pub struct FitInfo {
    pub n_episodes: usize,
    /// Total reward of each episode
    pub episode_rewards: Vec<f64>,
    /// Running sum of `episode_rewards`
    pub cumulative_rewards: Vec<f64>,
}

/// Periodic progress reports
#[derive(Debug, Clone)]
struct Progress {
    interval: Option<Duration>,
    last_time: Instant,
    last_episode: usize,
}

impl Progress {
    fn new(verbose: u8) -> Self {
        let interval = match verbose {
            0 => None,
            1 => Some(60),
            2 => Some(30),
            3 => Some(15),
            _ => Some(5),
        };
        Self {
            interval: interval.map(Duration::from_secs),
            last_time: Instant::now(),
            last_episode: 0,
        }
    }

    /// Restart the reporting window at the beginning of a fit
    fn start(&mut self) {
        self.last_time = Instant::now();
        self.last_episode = 0;
    }

    /// Number of episodes since the last report and their mean reward
    fn window(&self, rewards: &[f64]) -> (usize, f64) {
        let start = self.last_episode.min(rewards.len());
        let count = (rewards.len() - start).max(1);
        (count, rewards[start..].iter().sum::<f64>() / count as f64)
    }

    /// `rewards` holds the rewards of every episode of the current fit
    fn tick(&mut self, episode: usize, n_episodes: usize, n_repr: usize, rewards: &[f64]) {
        let Some(interval) = self.interval else {
            return;
        };
        let elapsed = self.last_time.elapsed();
        if elapsed < interval {
            return;
        }

        let (count, reward_per_ep) = self.window(rewards);
        let time_per_ep = elapsed.as_secs_f64() * 1000.0 / count as f64;
        info!(
            "[{}] episode = {}/{} | representative states = {} | reward/ep = {:.2} | time/ep = {:.2} ms",
            AGENT_ID, episode, n_episodes, n_repr, reward_per_ep, time_per_ep
        );

        self.last_time = Instant::now();
        self.last_episode = rewards.len();
    }
}

/// Kernel-based UCBVI on representative states
///
/// Value iteration with exploration bonuses for continuous state spaces, combining
/// an online discretization with kernel smoothing:
/// - Representative states are allocated online as novel states are visited
/// - Transitions and rewards are estimated on the finite set of representative states
///   and actions, each observation being spread over nearby representatives by a kernel
/// - After every episode, optimistic Q values are recomputed by backward induction
///   with exploration bonuses added to the estimated rewards
///
/// The objective is finite-horizon with discount `gamma`. When `gamma < 1` only the
/// Q function at `h = 0` is used to act. The recommended policy is computed once
/// training ends, without exploration bonuses.
///
/// When the budget of representative states is exhausted, new states are mapped to
/// their nearest representative, however far away it is.
///
/// ### Generics
/// - `E` - The [`Environment`] in which the agent will learn
///
/// ### References
/// - Domingues et al., 2020. Regret Bounds for Kernel-Based Reinforcement Learning
/// - Domingues et al., 2020. A Kernel-Based Approach to Non-Stationary Reinforcement Learning in Metric Spaces
/// - Kveton & Theocharous, 2012. Kernel-Based Reinforcement Learning on Representative States
#[derive(Debug, Clone)]
pub struct RSKernelUCBVIAgent<E: Environment> {
    n_episodes: usize,
    gamma: f64,
    horizon: usize,
    v_max: f64,
    verbose: u8,
    reprs: RepresentativeStates,
    model: KernelModel,
    q: Array3<f64>,
    v: Array2<f64>,
    q_policy: Option<Array3<f64>>,
    v_policy: Option<Array2<f64>>,
    episode: usize,
    progress: Progress,
    env: PhantomData<fn() -> E>,
}

fn invalid(name: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

/// `ceil((sqrt(d) / min_dist)^d)`, the number of cells of side `min_dist` covering
/// the scaled unit cube
///
/// **Errors** if it exceeds [`MAX_DEFAULT_REPR`]
fn default_max_repr(dim: usize, min_dist: f64) -> Result<usize> {
    let count = ((dim as f64).sqrt() / min_dist).powf(dim as f64).ceil();
    if !count.is_finite() || count > MAX_DEFAULT_REPR as f64 {
        return Err(invalid(
            "max_repr",
            format!(
                "default capacity (sqrt({}) / {})^{} is above {}, set it explicitly",
                dim, min_dist, dim, MAX_DEFAULT_REPR
            ),
        ));
    }
    Ok((count as usize).max(1))
}

impl<E: Environment> RSKernelUCBVIAgent<E> {
    /// Initialize a new `RSKernelUCBVIAgent` for the spaces of `env`
    ///
    /// **Errors** if a parameter is out of range, the scaling vector does not match the
    /// state dimension, or the spaces of `env` are malformed
    pub fn new(env: &E, config: RSKernelUCBVIAgentConfig) -> Result<Self> {
        let RSKernelUCBVIAgentConfig {
            n_episodes,
            gamma,
            horizon,
            lp_metric,
            kernel,
            scaling,
            bandwidth,
            min_dist,
            max_repr,
            bonus_scale_factor,
            beta,
            bonus,
            verbose,
        } = config;

        if !(0.0..=1.0).contains(&gamma) {
            return Err(invalid("gamma", format!("must be in [0, 1], got {}", gamma)));
        }
        let horizon = match horizon {
            Some(0) => return Err(invalid("horizon", "must be positive")),
            Some(h) => h,
            None if gamma < 1.0 => (1.0 / (1.0 - gamma)).ceil() as usize,
            None => return Err(Error::MissingHorizon),
        };
        if lp_metric.is_nan() || lp_metric < 1.0 {
            return Err(invalid("lp_metric", format!("must be at least 1, got {}", lp_metric)));
        }
        if bandwidth.is_nan() || bandwidth <= 0.0 {
            return Err(invalid("bandwidth", format!("must be positive, got {}", bandwidth)));
        }
        if min_dist.is_nan() || min_dist <= 0.0 {
            return Err(invalid("min_dist", format!("must be positive, got {}", min_dist)));
        }
        if beta.is_nan() || beta < 0.0 {
            return Err(invalid("beta", format!("must be non-negative, got {}", beta)));
        }
        if bonus_scale_factor.is_nan() || bonus_scale_factor < 0.0 {
            return Err(invalid(
                "bonus_scale_factor",
                format!("must be non-negative, got {}", bonus_scale_factor),
            ));
        }

        let observation_space = env.observation_space();
        let dim = observation_space.dim();
        if dim == 0 || observation_space.high.len() != dim {
            return Err(Error::InvalidSpace(format!(
                "observation bounds have lengths {} and {}",
                dim,
                observation_space.high.len()
            )));
        }
        if observation_space
            .low
            .iter()
            .zip(&observation_space.high)
            .any(|(lo, hi)| lo.is_nan() || hi.is_nan() || lo > hi)
        {
            return Err(Error::InvalidSpace("observation lower bound above upper bound".into()));
        }
        let n_actions = env.action_space().n;
        if n_actions == 0 {
            return Err(Error::InvalidSpace("action space is empty".into()));
        }

        let scaling = match scaling {
            Some(scaling) if scaling.len() != dim => {
                return Err(Error::InvalidScaling(format!(
                    "expected {} entries, got {}",
                    dim,
                    scaling.len()
                )))
            }
            Some(scaling) => scaling,
            None if observation_space.is_bounded() => observation_space.range(),
            None => vec![1.0; dim],
        };
        if scaling.iter().any(|x| !x.is_finite() || *x <= 0.0) {
            return Err(Error::InvalidScaling(format!(
                "entries must be finite and positive, got {:?}",
                scaling
            )));
        }

        let (r_min, r_max) = env.reward_range();
        let mut r_range = r_max - r_min;
        if r_range.is_nan() || r_range < 0.0 {
            return Err(invalid(
                "reward_range",
                format!("({}, {}) is not an interval", r_min, r_max),
            ));
        }
        if r_range == f64::INFINITY {
            warn!("{}: Reward range is infinite. Clipping it to 1.", AGENT_ID);
            r_range = 1.0;
        }
        let v_max = if gamma == 1.0 {
            r_range * horizon as f64
        } else {
            r_range * (1.0 - gamma.powi(horizon as i32)) / (1.0 - gamma)
        };

        let max_repr = match max_repr {
            Some(0) => return Err(invalid("max_repr", "must be positive")),
            Some(m) => m,
            None => default_max_repr(dim, min_dist)?,
        };

        let model = KernelModel::new(
            max_repr,
            n_actions,
            KernelModelConfig {
                kernel,
                bandwidth,
                bonus,
                bonus_scale_factor,
                beta,
                v_max,
            },
        );

        Ok(Self {
            n_episodes,
            gamma,
            horizon,
            v_max,
            verbose,
            reprs: RepresentativeStates::new(max_repr, lp_metric, scaling, min_dist),
            model,
            q: Array3::zeros((horizon, max_repr, n_actions)),
            v: Array2::zeros((horizon, max_repr)),
            q_policy: None,
            v_policy: None,
            episode: 0,
            progress: Progress::new(verbose),
            env: PhantomData,
        })
    }

    /// Forget everything learned, keeping the configuration
    pub fn reset(&mut self) {
        self.reprs.clear();
        self.model.reset();
        self.q.fill(0.0);
        self.v.fill(0.0);
        self.q_policy = None;
        self.v_policy = None;
        self.episode = 0;
        self.progress = Progress::new(self.verbose);
    }

    /// Row of the Q tables used at step `hh`
    fn step_index(&self, hh: usize) -> usize {
        if self.gamma == 1.0 {
            hh
        } else {
            0
        }
    }

    /// Greedy action of table `q` at step `hh`, without allocating representative states
    fn greedy(&self, q: &Array3<f64>, state: &[f64], hh: usize) -> usize {
        let h = self.step_index(hh);
        self.reprs
            .nearest(state)
            .and_then(|(repr_state, _)| argmax(q.slice(s![h, repr_state, ..]).iter().copied()))
            .unwrap_or(0)
    }

    /// Choose an action with the optimistic Q function
    fn act(&self, state: &[f64], hh: usize) -> usize {
        self.greedy(&self.q, state, hh)
    }

    /// Learn from a single transition
    fn learn(&mut self, state: &[f64], action: usize, next_state: &[f64], reward: f64) {
        // the capacity is at least one, so both always resolve
        let (Some(repr_state), Some(repr_next_state)) = (
            self.reprs.resolve(state, true),
            self.reprs.resolve(next_state, true),
        ) else {
            return;
        };
        self.model
            .update(&self.reprs, repr_state, action, repr_next_state, reward);
    }

    /// Run one episode of `horizon` steps, then recompute the optimistic Q function
    ///
    /// Episodes always last the full horizon, whether or not the environment reports
    /// being done.
    ///
    /// **Returns** the total reward collected
    pub fn run_episode(&mut self, env: &mut E) -> f64 {
        let mut episode_reward = 0.0;
        let mut state = env.reset();
        for hh in 0..self.horizon {
            let action = self.act(state.as_ref(), hh);
            let Step {
                next_state, reward, ..
            } = env.step(action);
            self.learn(state.as_ref(), action, next_state.as_ref(), reward);
            state = next_state;
            episode_reward += reward;
        }

        let m = self.reprs.len();
        backward_induction_in_place(
            self.q.slice_mut(s![.., ..m, ..]),
            self.v.slice_mut(s![.., ..m]),
            self.model.rewards().slice(s![..m, ..]),
            Some(self.model.bonus().slice(s![..m, ..])),
            self.model.transitions().slice(s![..m, .., ..m]),
            self.gamma,
            self.v_max,
        );

        self.episode += 1;
        episode_reward
    }

    /// Compute the recommended policy from the current model, without exploration bonuses
    pub fn compute_recommended_policy(&mut self) {
        let m = self.reprs.len();
        let (q, v) = backward_induction(
            self.model.rewards().slice(s![..m, ..]),
            self.model.transitions().slice(s![..m, .., ..m]),
            self.horizon,
            self.gamma,
            self.v_max,
        );
        self.q_policy = Some(q);
        self.v_policy = Some(v);
    }

    /// Train the agent for the configured number of episodes, then compute the recommended policy
    pub fn fit(&mut self, env: &mut E) -> FitInfo {
        let mut episode_rewards = Vec::with_capacity(self.n_episodes);
        let mut cumulative_rewards = Vec::with_capacity(self.n_episodes);
        let mut total = 0.0;
        self.progress.start();
        for _ in 0..self.n_episodes {
            let reward = self.run_episode(env);
            total += reward;
            episode_rewards.push(reward);
            cumulative_rewards.push(total);
            self.progress.tick(
                self.episode,
                self.n_episodes,
                self.reprs.len(),
                &episode_rewards,
            );
        }

        self.compute_recommended_policy();
        if self.verbose > 0 {
            info!(
                "[{}] fit done: {} episodes, {} representative states",
                AGENT_ID,
                self.n_episodes,
                self.reprs.len()
            );
        }

        FitInfo {
            n_episodes: self.n_episodes,
            episode_rewards,
            cumulative_rewards,
        }
    }

    /// Action of the recommended policy in `state` at the first step
    ///
    /// **Errors** if the agent has not been fitted
    pub fn policy(&self, state: &[f64]) -> Result<usize> {
        self.policy_at(state, 0)
    }

    /// Action of the recommended policy in `state` at step `hh`
    ///
    /// The step only matters when `gamma` is 1.
    ///
    /// **Errors** if the agent has not been fitted
    ///
    /// **Panics** if `hh` is not smaller than the horizon
    pub fn policy_at(&self, state: &[f64], hh: usize) -> Result<usize> {
        assert!(
            hh < self.horizon,
            "Step {} is beyond the horizon {}",
            hh,
            self.horizon
        );
        let q = self.q_policy.as_ref().ok_or(Error::NotFitted)?;
        Ok(self.greedy(q, state, hh))
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Upper bound on state values
    pub fn v_max(&self) -> f64 {
        self.v_max
    }

    /// Number of episodes run since the last reset
    pub fn episode(&self) -> usize {
        self.episode
    }

    pub fn n_representatives(&self) -> usize {
        self.reprs.len()
    }

    pub fn representatives(&self) -> &RepresentativeStates {
        &self.reprs
    }

    pub fn model(&self) -> &KernelModel {
        &self.model
    }

    /// Optimistic Q function `q[h, s, a]`, valid for the active representative states
    pub fn q(&self) -> &Array3<f64> {
        &self.q
    }

    /// Optimistic value function `v[h, s]`, valid for the active representative states
    pub fn v(&self) -> &Array2<f64> {
        &self.v
    }

    /// Q function of the recommended policy, once fitted
    pub fn q_policy(&self) -> Option<&Array3<f64>> {
        self.q_policy.as_ref()
    }

    /// Value function of the recommended policy, once fitted
    pub fn v_policy(&self) -> Option<&Array2<f64>> {
        self.v_policy.as_ref()
    }
}
