mod bonus;
mod model;
mod rs_kernel_ucbvi;

pub use bonus::Bonus;
pub use model::{KernelModel, KernelModelConfig};
pub use rs_kernel_ucbvi::{FitInfo, RSKernelUCBVIAgent, RSKernelUCBVIAgentConfig};
