use crate::body::Body;

/// A deferred per-body mutation record.
///
/// Backends that must not write the store in place (worker-parallel, GPU
/// readback merge) emit these instead. `None` fields mean "no change on this
/// quantity". Each id may receive at most one delta per substep; producing
/// two is a partitioning bug, and merge code is expected to detect it rather
/// than combine them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionDelta {
    pub id: u32,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub vx: Option<f32>,
    pub vy: Option<f32>,
}

impl CollisionDelta {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// True when the delta would actually change something.
    pub fn is_effective(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.vx.is_some() || self.vy.is_some()
    }

    /// Record the full post-resolution state of `body`.
    pub fn from_state(body: &Body) -> Self {
        Self {
            id: body.id,
            x: Some(body.x),
            y: Some(body.y),
            vx: Some(body.vx),
            vy: Some(body.vy),
        }
    }

    pub fn apply_to(&self, body: &mut Body) {
        if let Some(x) = self.x {
            body.x = x;
        }
        if let Some(y) = self.y {
            body.y = y;
        }
        if let Some(vx) = self.vx {
            body.vx = vx;
        }
        if let Some(vy) = self.vy {
            body.vy = vy;
        }
    }
}
