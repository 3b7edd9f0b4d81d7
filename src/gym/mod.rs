#[cfg(feature = "gym")]
pub mod cart_pole;
pub mod pball;

#[cfg(feature = "gym")]
pub use cart_pole::CartPole;
pub use pball::{PBall2D, PBall2DConfig};
