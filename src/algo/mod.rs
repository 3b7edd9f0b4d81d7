/// Dynamic programming on finite MDPs
pub mod dynprog;

/// Kernel-based agents for continuous state spaces
pub mod kernel_based;
