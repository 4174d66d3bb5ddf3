use kinetica_core::{Body, ConfigError, ParticleStore, SimConfig, SUBSTEPS};
use kinetica_physics::generate_bodies;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;

use crate::backend::ExecutionBackend;
use crate::gpu::GpuBackend;
use crate::parallel::WorkerParallelBackend;
use crate::sequential::SequentialBackend;

/// Which execution backend to drive the collision passes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sequential,
    WorkerParallel,
    GpuCompute,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Per-body state handed to the transport layer once per frame. Emitted in
/// stable store order; the wire format is the transport's concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodySnapshot {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// A full frame as served to viewers: the arena dimensions plus every body
/// in stable store order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub width: f32,
    pub height: f32,
    pub bodies: Vec<BodySnapshot>,
}

/// Owns the particle store and one execution backend, and runs the
/// fixed-substep integration loop.
pub struct SimulationEngine {
    config: SimConfig,
    store: ParticleStore,
    backend: Box<dyn ExecutionBackend>,
    failed_passes: u64,
}

impl SimulationEngine {
    /// Build an engine with a freshly spawned population on the sequential
    /// backend. Configuration errors are fatal to this call only.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let store = ParticleStore::new(generate_bodies(&config, &mut rng))?;
        let backend = Box::new(SequentialBackend::new(&config));

        Ok(Self {
            config,
            store,
            backend,
            failed_passes: 0,
        })
    }

    /// Build an engine on a specific backend. Requesting `GpuCompute` falls
    /// back to sequential when no device can be acquired; requesting
    /// `WorkerParallel` fails the construction if the pool cannot be built.
    pub fn with_backend(config: SimConfig, kind: BackendKind) -> Result<Self, EngineError> {
        let mut engine = Self::new(config)?;
        match kind {
            BackendKind::Sequential => {}
            BackendKind::WorkerParallel => {
                engine.backend = Box::new(WorkerParallelBackend::new(&engine.config)?);
            }
            BackendKind::GpuCompute => {
                engine.use_gpu();
            }
        }
        Ok(engine)
    }

    /// Try to switch to the GPU backend. Returns whether the switch
    /// happened; on failure the current backend stays active and the engine
    /// behaves exactly as before, only slower. Callers never need capability
    /// detection of their own.
    pub fn use_gpu(&mut self) -> bool {
        // The store must be current before it seeds the device buffers.
        self.sync();
        match GpuBackend::acquire(&self.config, &self.store) {
            Ok(backend) => {
                self.backend = Box::new(backend);
                log::info!("gpu-compute backend active");
                true
            }
            Err(err) => {
                log::warn!("GPU unavailable ({err}); staying on {}", self.backend.name());
                false
            }
        }
    }

    /// Advance one frame, split into a fixed number of substeps. Each
    /// substep integrates and then resolves collisions once, bounding
    /// penetration depth for fast movers. A failed pass is discarded whole
    /// and the frame proceeds; the next substep visually self-corrects.
    pub fn step(&mut self, frame_dt: f32) {
        let dt = frame_dt / SUBSTEPS as f32;
        for _ in 0..SUBSTEPS {
            if let Err(err) = self.backend.run_substep(&mut self.store, dt) {
                self.failed_passes += 1;
                log::warn!("collision pass discarded: {err}");
            }
        }
    }

    /// Current `(x, y, radius)` of every body, in stable store order.
    pub fn snapshot(&mut self) -> Vec<BodySnapshot> {
        self.sync();
        self.store
            .bodies()
            .iter()
            .map(|body| BodySnapshot {
                x: body.x,
                y: body.y,
                radius: body.radius,
            })
            .collect()
    }

    /// The frame as a transport-ready unit: arena dimensions plus the body
    /// snapshot.
    pub fn frame_snapshot(&mut self) -> FrameSnapshot {
        FrameSnapshot {
            width: self.config.width,
            height: self.config.height,
            bodies: self.snapshot(),
        }
    }

    /// Replace the whole body set (test fixtures, external
    /// reconfiguration). Backend-internal buffers are re-derived before the
    /// next `step`.
    pub fn set_bodies(&mut self, bodies: Vec<Body>) -> Result<(), ConfigError> {
        self.store.replace(bodies)?;
        self.backend.reload(&self.store);
        Ok(())
    }

    /// Host-side view of the bodies, synchronized with the device if the
    /// active backend keeps state there.
    pub fn bodies(&mut self) -> &[Body] {
        self.sync();
        self.store.bodies()
    }

    fn sync(&mut self) {
        if let Err(err) = self.backend.sync_store(&mut self.store) {
            self.failed_passes += 1;
            log::warn!("state readback failed: {err}; serving last host copy");
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Passes discarded so far, the caller-visible degradation signal.
    pub fn failed_passes(&self) -> u64 {
        self.failed_passes
    }

    pub fn body_count(&self) -> usize {
        self.store.len()
    }

    pub fn width(&self) -> f32 {
        self.config.width
    }

    pub fn height(&self) -> f32 {
        self.config.height
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
