use thiserror::Error;

/// Errors raised while configuring or querying an agent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unknown kernel type: {0}")]
    UnknownKernel(String),

    #[error("Unknown bonus type: {0}")]
    UnknownBonus(String),

    /// Scaling vector of the wrong length or with non-positive entries
    #[error("Invalid scaling vector: {0}")]
    InvalidScaling(String),

    /// Observation or action space the agent cannot work with
    #[error("Invalid space: {0}")]
    InvalidSpace(String),

    #[error("Invalid value for `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("A horizon must be given when gamma is 1")]
    MissingHorizon,

    /// The recommended policy is only available after fitting
    #[error("The agent has not been fitted yet")]
    NotFitted,
}

pub type Result<T> = std::result::Result<T, Error>;
