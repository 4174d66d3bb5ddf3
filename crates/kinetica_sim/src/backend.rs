use kinetica_core::{CollisionDelta, ParticleStore};
use thiserror::Error;

/// A failed collision pass. Fatal to that pass only: the engine discards the
/// pass, logs, and proceeds to the next substep's integration.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("worker pass failed; collision pass discarded")]
    WorkerPass,

    #[error(transparent)]
    Gpu(#[from] kinetica_gpu::GpuError),
}

/// One substep's worth of collision work, behind a common interface so the
/// engine never cares how the work is partitioned.
///
/// Exactly one pass is ever in flight per engine: `run_substep` returns only
/// after all of its writes (direct or merged) have landed in the store, so
/// the next substep's integration can never observe a torn pass.
pub trait ExecutionBackend {
    fn name(&self) -> &'static str;

    /// Advance one substep: semi-implicit Euler integration of every body,
    /// then resolution of all particle-particle and particle-boundary
    /// collisions at the post-integration positions.
    fn run_substep(&mut self, store: &mut ParticleStore, dt: f32) -> Result<(), PassError>;

    /// Flush device-resident state back into the store. CPU backends keep
    /// the store authoritative and need do nothing.
    fn sync_store(&mut self, store: &mut ParticleStore) -> Result<(), PassError> {
        let _ = store;
        Ok(())
    }

    /// Re-derive internal buffers after the store was replaced wholesale.
    fn reload(&mut self, store: &ParticleStore) {
        let _ = store;
    }
}

/// Merge per-worker delta lists into the store.
///
/// Ownership partitioning guarantees each body id at most one delta per
/// phase; a duplicate means the partitioning is broken, so it trips a debug
/// assertion rather than being silently combined. In release the later delta
/// wins, with a warning.
pub fn merge_deltas(store: &mut ParticleStore, lists: &[Vec<CollisionDelta>], touched: &mut Vec<bool>) {
    touched.clear();
    touched.resize(store.len(), false);

    let bodies = store.bodies_mut();
    for delta in lists.iter().flatten() {
        let index = delta.id as usize;
        if touched[index] {
            debug_assert!(false, "duplicate delta for body {}", delta.id);
            log::warn!("duplicate delta for body {}; keeping the later one", delta.id);
        }
        touched[index] = true;
        delta.apply_to(&mut bodies[index]);
    }
}
