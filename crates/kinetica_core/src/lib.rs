pub mod body;
pub mod config;
pub mod constants;
pub mod delta;
pub mod store;

pub use body::{Body, PackedBody};
pub use config::{ConfigError, SimConfig};
pub use constants::*;
pub use delta::CollisionDelta;
pub use store::ParticleStore;
