use kinetica_core::Body;

/// Semi-implicit Euler step: velocity first, then position from the updated
/// velocity. The acceleration accumulator is consumed and reset so forces
/// never leak across substeps.
pub fn integrate(bodies: &mut [Body], dt: f32) {
    for body in bodies {
        body.vx += body.ax * dt;
        body.vy += body.ay * dt;
        body.x += body.vx * dt;
        body.y += body.vy * dt;
        body.ax = 0.0;
        body.ay = 0.0;
    }
}
