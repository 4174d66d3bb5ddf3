use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use kinetica_core::{Body, CollisionDelta, ParticleStore, SimConfig};
use kinetica_physics::{integrate, resolve_boundary, resolve_pair, SpatialGrid};
use rayon::prelude::*;

use crate::backend::{merge_deltas, ExecutionBackend, PassError};

/// Backend that fans a pass out across a fixed pool of worker threads.
///
/// The store is immutable input for the duration of a fan-out: every worker
/// reads the same snapshot and emits deferred deltas, which the coordinator
/// merges after the join. Cell ownership (`cell_index % workers`) combined
/// with the forward stencil gives every unordered pair exactly one owner, so
/// no two workers ever resolve the same pair.
pub struct WorkerParallelBackend {
    width: f32,
    height: f32,
    restitution: f32,
    workers: usize,
    pool: rayon::ThreadPool,
    grid: SpatialGrid,
    touched: Vec<bool>,
}

impl WorkerParallelBackend {
    pub fn new(config: &SimConfig) -> Result<Self, rayon::ThreadPoolBuildError> {
        let workers = if config.workers > 0 {
            config.workers
        } else {
            std::thread::available_parallelism().map_or(4, |n| n.get())
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("kinetica-worker-{i}"))
            .build()?;

        Ok(Self {
            width: config.width,
            height: config.height,
            restitution: config.restitution,
            workers,
            pool,
            grid: SpatialGrid::new(),
            touched: Vec::new(),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl ExecutionBackend for WorkerParallelBackend {
    fn name(&self) -> &'static str {
        "worker-parallel"
    }

    fn run_substep(&mut self, store: &mut ParticleStore, dt: f32) -> Result<(), PassError> {
        // Integration stays with the single writer.
        integrate(store.bodies_mut(), dt);

        let cell_size = SpatialGrid::cell_size_for(store.max_radius());
        self.grid.rebuild(store.bodies(), self.width, self.height, cell_size);

        let workers = self.workers;
        let restitution = self.restitution;

        // Pair phase. A worker panic abandons the whole pass: nothing has
        // been merged yet, so the store is never left partially updated.
        let pair_lists = {
            let bodies = store.bodies();
            let grid = &self.grid;
            catch_unwind(AssertUnwindSafe(|| {
                self.pool.install(|| {
                    (0..workers)
                        .into_par_iter()
                        .map(|worker| pair_pass(bodies, grid, restitution, worker, workers))
                        .collect::<Vec<_>>()
                })
            }))
            .map_err(|_| PassError::WorkerPass)?
        };
        merge_deltas(store, &pair_lists, &mut self.touched);

        // Boundary phase, partitioned by body-index range over the merged
        // state. Disjoint ranges make one-delta-per-body structural here.
        let boundary_lists = {
            let bodies = store.bodies();
            let (width, height) = (self.width, self.height);
            let chunk = bodies.len().div_ceil(workers).max(1);
            catch_unwind(AssertUnwindSafe(|| {
                self.pool.install(|| {
                    bodies
                        .par_chunks(chunk)
                        .map(|range| {
                            range
                                .iter()
                                .filter_map(|body| resolve_boundary(body, width, height, restitution))
                                .collect::<Vec<_>>()
                        })
                        .collect::<Vec<_>>()
                })
            }))
            .map_err(|_| PassError::WorkerPass)?
        };
        merge_deltas(store, &boundary_lists, &mut self.touched);

        Ok(())
    }
}

/// Resolve every pair owned by `worker`, in the same traversal order the
/// sequential backend uses over those cells.
///
/// Repeated contacts of one body compose through a local overlay of working
/// copies, so the worker emits at most one delta per body it touched and a
/// later pair observes the body's post-resolution state, exactly as the
/// in-place reference does.
fn pair_pass(
    bodies: &[Body],
    grid: &SpatialGrid,
    restitution: f32,
    worker: usize,
    workers: usize,
) -> Vec<CollisionDelta> {
    let mut overlay: HashMap<u32, Body> = HashMap::new();

    let resolve = |overlay: &mut HashMap<u32, Body>, i: u32, j: u32| {
        let a = overlay.get(&i).copied().unwrap_or(bodies[i as usize]);
        let b = overlay.get(&j).copied().unwrap_or(bodies[j as usize]);
        if let Some((delta_a, delta_b)) = resolve_pair(&a, &b, restitution) {
            let mut a = a;
            let mut b = b;
            delta_a.apply_to(&mut a);
            delta_b.apply_to(&mut b);
            overlay.insert(i, a);
            overlay.insert(j, b);
        }
    };

    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let cell_index = row * grid.cols() + col;
            if cell_index % workers != worker {
                continue;
            }

            let cell = grid.cell(col, row);
            for (k, &i) in cell.iter().enumerate() {
                for &j in &cell[k + 1..] {
                    resolve(&mut overlay, i, j);
                }
            }
            for (ncol, nrow) in grid.forward_neighbors(col, row) {
                for &i in cell {
                    for &j in grid.cell(ncol, nrow) {
                        resolve(&mut overlay, i, j);
                    }
                }
            }
        }
    }

    let mut deltas: Vec<CollisionDelta> = overlay
        .values()
        .map(CollisionDelta::from_state)
        .collect();
    // Stable merge order regardless of hash iteration.
    deltas.sort_unstable_by_key(|delta| delta.id);
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_config(workers: usize) -> SimConfig {
        SimConfig {
            width: 800.0,
            height: 600.0,
            restitution: 0.9,
            workers,
            ..SimConfig::default()
        }
    }

    #[test]
    fn pool_size_follows_config() {
        let backend = WorkerParallelBackend::new(&fixture_config(3)).unwrap();
        assert_eq!(backend.workers(), 3);
    }

    #[test]
    fn same_cell_collision_matches_reference_values() {
        // Two unit-mass bodies of radius 1 overlapping by 0.5, closing at
        // +2 / -1 with restitution 0.9 resolve to -0.85 / 1.85.
        let mut a = Body::new(0, 100.0, 100.0, 1.0);
        let mut b = Body::new(1, 101.5, 100.0, 1.0);
        a.radius = 1.0;
        b.radius = 1.0;
        a.vx = 2.0;
        b.vx = -1.0;

        let mut store = ParticleStore::new(vec![a, b]).unwrap();
        let mut backend = WorkerParallelBackend::new(&fixture_config(2)).unwrap();
        backend.run_substep(&mut store, 0.0).unwrap();

        let bodies = store.bodies();
        assert!((bodies[0].vx + 0.85).abs() < 1e-6, "got {}", bodies[0].vx);
        assert!((bodies[1].vx - 1.85).abs() < 1e-6, "got {}", bodies[1].vx);
    }

    #[test]
    fn chained_contacts_compose_within_a_worker() {
        // Three bodies in one cell, outer two overlapping the middle one.
        // A single worker owns the cell, so both resolutions compose through
        // the overlay instead of emitting two deltas for the middle body.
        let mut left = Body::new(0, 100.0, 100.0, 1.0);
        let mut mid = Body::new(1, 101.6, 100.0, 1.0);
        let mut right = Body::new(2, 103.2, 100.0, 1.0);
        for body in [&mut left, &mut mid, &mut right] {
            body.radius = 1.0;
        }

        let mut store = ParticleStore::new(vec![left, mid, right]).unwrap();
        let mut backend = WorkerParallelBackend::new(&fixture_config(2)).unwrap();
        backend.run_substep(&mut store, 0.0).unwrap();

        // Pair (0,1) separates both by 0.2; pair (1,2) then sees the middle
        // body at its overlay position 101.8 and pushes 0.3 more each way.
        let bodies = store.bodies();
        assert!((bodies[0].x - 99.8).abs() < 1e-5, "got {}", bodies[0].x);
        assert!((bodies[1].x - 101.5).abs() < 1e-5, "got {}", bodies[1].x);
        assert!((bodies[2].x - 103.5).abs() < 1e-5, "got {}", bodies[2].x);
    }
}
