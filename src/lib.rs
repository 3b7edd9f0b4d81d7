/// Implemented RL algorithms
pub mod algo;

/// Data structures
pub mod ds;

/// Environment
pub mod env;

/// Error types
pub mod error;

/// Smoothing kernels
pub mod kernel;

/// Distances on the state space
pub mod metric;

/// Testing environments
pub mod gym;

mod util;

pub use error::{Error, Result};
