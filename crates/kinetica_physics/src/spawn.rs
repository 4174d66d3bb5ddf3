use kinetica_core::{Body, SimConfig, MASS_MIN, MASS_SPAN, SPAWN_SPEED};
use rand::Rng;

/// Generate the initial population: positions uniform over the arena, mass
/// uniform in its spawn range with the radius derived from it, and a random
/// initial velocity. Ids are assigned sequentially and never reused.
pub fn generate_bodies(config: &SimConfig, rng: &mut impl Rng) -> Vec<Body> {
    let mut bodies = Vec::with_capacity(config.body_count as usize);

    for id in 0..config.body_count {
        let mass = MASS_MIN + rng.gen_range(0.0..MASS_SPAN);
        let mut body = Body::new(
            id,
            rng.gen_range(0.0..config.width),
            rng.gen_range(0.0..config.height),
            mass,
        );
        body.vx = rng.gen_range(-0.5..0.5f32) * SPAWN_SPEED;
        body.vy = rng.gen_range(-0.5..0.5f32) * SPAWN_SPEED;
        bodies.push(body);
    }

    bodies
}
