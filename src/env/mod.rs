mod space;

pub use space::{BoxSpace, Discrete};

/// The outcome of a single environment step
#[derive(Debug, Clone, PartialEq)]
pub struct Step<S> {
    /// The state reached after the action
    pub next_state: S,
    /// The reward received for the transition
    pub reward: f64,
    /// Whether the environment considers the episode finished
    pub done: bool,
}

/// Represents a Markov decision process with a continuous state space and a finite
/// action space, defining the dynamics of an environment in which an agent can operate.
///
/// States are real vectors of fixed dimension described by [`BoxSpace`], actions are
/// indices in `[0, n)` described by [`Discrete`].
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State: AsRef<[f64]> + Clone;

    /// Per-dimension bounds of the state space, possibly infinite
    fn observation_space(&self) -> &BoxSpace;

    /// The finite set of actions
    fn action_space(&self) -> Discrete;

    /// Lower and upper bound of the rewards produced by [`step`](Environment::step)
    ///
    /// **Default**: unbounded
    fn reward_range(&self) -> (f64, f64) {
        (f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;

    /// Update the environment in response to an action taken by an agent
    fn step(&mut self, action: usize) -> Step<Self::State>;
}
