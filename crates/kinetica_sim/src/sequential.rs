use kinetica_core::{ParticleStore, SimConfig};
use kinetica_physics::{integrate, resolve_boundary, resolve_pair_in_place, SpatialGrid};

use crate::backend::{ExecutionBackend, PassError};

/// Single-threaded reference backend.
///
/// Traversal order is fixed (row-major over cells, intra-cell pairs by
/// ascending store index, then the forward neighbor stencil) and results
/// are applied in place as they are produced, so the whole pass is
/// deterministic. The other backends are validated against this one.
pub struct SequentialBackend {
    width: f32,
    height: f32,
    restitution: f32,
    grid: SpatialGrid,
}

impl SequentialBackend {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            restitution: config.restitution,
            grid: SpatialGrid::new(),
        }
    }
}

impl ExecutionBackend for SequentialBackend {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn run_substep(&mut self, store: &mut ParticleStore, dt: f32) -> Result<(), PassError> {
        integrate(store.bodies_mut(), dt);

        let cell_size = SpatialGrid::cell_size_for(store.max_radius());
        self.grid.rebuild(store.bodies(), self.width, self.height, cell_size);

        let bodies = store.bodies_mut();
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                let cell = self.grid.cell(col, row);

                for (k, &i) in cell.iter().enumerate() {
                    for &j in &cell[k + 1..] {
                        resolve_pair_in_place(bodies, i as usize, j as usize, self.restitution);
                    }
                }

                for (ncol, nrow) in self.grid.forward_neighbors(col, row) {
                    for &i in cell {
                        for &j in self.grid.cell(ncol, nrow) {
                            resolve_pair_in_place(bodies, i as usize, j as usize, self.restitution);
                        }
                    }
                }
            }
        }

        // Boundary resolution once per body, independent of grid traversal.
        for index in 0..bodies.len() {
            if let Some(delta) = resolve_boundary(&bodies[index], self.width, self.height, self.restitution) {
                delta.apply_to(&mut bodies[index]);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinetica_core::Body;

    fn store_with(bodies: Vec<Body>) -> ParticleStore {
        ParticleStore::new(bodies).unwrap()
    }

    fn config() -> SimConfig {
        SimConfig {
            width: 800.0,
            height: 600.0,
            restitution: 1.0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn resolves_overlapping_pair_in_one_substep() {
        let mut a = Body::new(0, 100.0, 100.0, 1.0);
        let mut b = Body::new(1, 102.0, 100.0, 1.0);
        a.radius = 1.5;
        b.radius = 1.5;
        a.vx = 2.0;
        b.vx = -2.0;

        let mut store = store_with(vec![a, b]);
        let mut backend = SequentialBackend::new(&config());
        // dt = 0 keeps the fixture positions; only resolution runs.
        backend.run_substep(&mut store, 0.0).unwrap();

        let bodies = store.bodies();
        assert!((bodies[0].vx + 2.0).abs() < 1e-6);
        assert!((bodies[1].vx - 2.0).abs() < 1e-6);
        let distance = (bodies[1].x - bodies[0].x).hypot(bodies[1].y - bodies[0].y);
        assert!((distance - 3.0).abs() < 1e-5);
    }

    #[test]
    fn finds_pairs_across_cell_borders() {
        // Straddle a cell boundary at x = 20 (minimum cell size): the pair
        // sits in adjacent cells and is only found via the forward stencil.
        let mut a = Body::new(0, 18.0, 50.0, 1.0);
        let mut b = Body::new(1, 24.0, 50.0, 1.0);
        a.radius = 4.0;
        b.radius = 4.0;

        let mut store = store_with(vec![a, b]);
        let mut backend = SequentialBackend::new(&config());
        backend.run_substep(&mut store, 0.0).unwrap();

        let bodies = store.bodies();
        let distance = (bodies[1].x - bodies[0].x).hypot(bodies[1].y - bodies[0].y);
        assert!((distance - 8.0).abs() < 1e-5, "pair was not separated: {distance}");
    }

    #[test]
    fn escaped_body_is_pulled_back_inside() {
        let mut runaway = Body::new(0, 900.0, 300.0, 1.0);
        runaway.vx = 40.0;

        let mut store = store_with(vec![runaway]);
        let mut backend = SequentialBackend::new(&config());
        backend.run_substep(&mut store, 0.0).unwrap();

        let body = &store.bodies()[0];
        assert_eq!(body.x, 800.0 - body.radius);
        assert_eq!(body.vx, -40.0);
    }
}
