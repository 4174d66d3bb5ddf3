use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_RESTITUTION;

/// Errors rejected at construction time. Fatal to that construction call
/// only; an engine that already exists is never invalidated by these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("arena dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },

    #[error("body count must be nonzero")]
    EmptyPopulation,

    #[error("restitution must lie in [0, 1], got {0}")]
    InvalidRestitution(f32),

    #[error("body {id} violates the positive mass/radius invariant (mass {mass}, radius {radius})")]
    InvalidBody { id: u32, mass: f32, radius: f32 },
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of bodies spawned at construction
    pub body_count: u32,
    /// Arena width in world units
    pub width: f32,
    /// Arena height in world units
    pub height: f32,
    /// Random seed for deterministic spawn
    pub seed: u64,
    /// Coefficient of restitution in [0, 1] (1 = perfectly elastic)
    pub restitution: f32,
    /// Worker threads for the parallel backend (0 = available parallelism)
    pub workers: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            body_count: 5_000,
            width: 4000.0,
            height: 3200.0,
            seed: 42,
            restitution: DEFAULT_RESTITUTION,
            workers: 0,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.body_count == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(ConfigError::InvalidRestitution(self.restitution));
        }
        Ok(())
    }
}
