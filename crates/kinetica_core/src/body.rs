use bytemuck::{Pod, Zeroable};

use crate::constants::{MASS_MIN, RADIUS_BASE, RADIUS_PER_MASS};

/// A simulated circular body.
///
/// `id` is assigned at creation and never reused; with no removal in scope
/// the store index always equals the id. `ax`/`ay` accumulate forces for the
/// current substep only and are reset to zero by integration. Mass and radius
/// are strictly positive for the body's entire lifetime; radius is derived
/// from mass once at creation and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub ax: f32,
    pub ay: f32,
    pub mass: f32,
    pub radius: f32,
}

impl Body {
    /// Create a body at rest with the radius derived from its mass.
    pub fn new(id: u32, x: f32, y: f32, mass: f32) -> Self {
        Self {
            id,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            ax: 0.0,
            ay: 0.0,
            mass,
            radius: Self::radius_for_mass(mass),
        }
    }

    /// Affine mass→radius mapping shared by spawn and tests.
    pub fn radius_for_mass(mass: f32) -> f32 {
        RADIUS_BASE + (mass - MASS_MIN) * RADIUS_PER_MASS
    }
}

/// GPU-compatible body representation.
/// Must be repr(C) and Pod for GPU buffer upload; 32 bytes, 16-byte aligned.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PackedBody {
    /// Position (x, y) + mass and radius packed in z/w
    pub position: [f32; 4],
    /// Velocity (x, y) + id packed in z (exact below 2^24), w is padding
    pub velocity: [f32; 4],
}

impl PackedBody {
    pub fn from_body(body: &Body) -> Self {
        Self {
            position: [body.x, body.y, body.mass, body.radius],
            velocity: [body.vx, body.vy, body.id as f32, 0.0],
        }
    }

    /// Reconstruct a full body. The acceleration accumulator does not survive
    /// packing; it is only ever nonzero mid-substep.
    pub fn to_body(&self) -> Body {
        Body {
            id: self.id(),
            x: self.position[0],
            y: self.position[1],
            vx: self.velocity[0],
            vy: self.velocity[1],
            ax: 0.0,
            ay: 0.0,
            mass: self.mass(),
            radius: self.radius(),
        }
    }

    pub fn id(&self) -> u32 {
        self.velocity[2] as u32
    }

    pub fn mass(&self) -> f32 {
        self.position[2]
    }

    pub fn radius(&self) -> f32 {
        self.position[3]
    }
}
