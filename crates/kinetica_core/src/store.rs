use crate::body::{Body, PackedBody};
use crate::config::ConfigError;

/// The authoritative, ordered collection of body state.
///
/// Owned exclusively by the simulation engine; only the engine and the
/// active execution backend mutate it, and only at the substep
/// synchronization point. Snapshot order is store order and is stable for
/// the lifetime of the simulation.
#[derive(Debug, Clone)]
pub struct ParticleStore {
    bodies: Vec<Body>,
}

impl ParticleStore {
    /// Take ownership of `bodies`, rejecting any body that violates the
    /// positive mass/radius invariant.
    pub fn new(bodies: Vec<Body>) -> Result<Self, ConfigError> {
        validate_bodies(&bodies)?;
        Ok(Self { bodies })
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    /// Wholesale replacement (test fixtures, external reconfiguration).
    /// Backend-internal buffers must be re-derived afterwards.
    pub fn replace(&mut self, bodies: Vec<Body>) -> Result<(), ConfigError> {
        validate_bodies(&bodies)?;
        self.bodies = bodies;
        Ok(())
    }

    /// Largest radius in the population; 0.0 when empty. Drives the grid
    /// cell-size derivation.
    pub fn max_radius(&self) -> f32 {
        self.bodies.iter().map(|b| b.radius).fold(0.0, f32::max)
    }

    /// Flatten into the GPU buffer layout, in store order.
    pub fn pack(&self) -> Vec<PackedBody> {
        self.bodies.iter().map(PackedBody::from_body).collect()
    }

    /// Write positions and velocities back from a GPU readback. Mass, radius
    /// and id are immutable and the readback preserves store order, so only
    /// the mutable state is copied.
    pub fn unpack(&mut self, packed: &[PackedBody]) {
        debug_assert_eq!(packed.len(), self.bodies.len());
        for (body, p) in self.bodies.iter_mut().zip(packed) {
            body.x = p.position[0];
            body.y = p.position[1];
            body.vx = p.velocity[0];
            body.vy = p.velocity[1];
        }
    }
}

fn validate_bodies(bodies: &[Body]) -> Result<(), ConfigError> {
    for body in bodies {
        if !(body.mass > 0.0) || !(body.radius > 0.0) {
            return Err(ConfigError::InvalidBody {
                id: body.id,
                mass: body.mass,
                radius: body.radius,
            });
        }
    }
    Ok(())
}
