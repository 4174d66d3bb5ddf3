use kinetica_core::{ParticleStore, SimConfig};
use kinetica_gpu::{dispatch_substep, GpuContext, GpuError, ReadbackBuffer, SimParams};
use kinetica_physics::SpatialGrid;

use crate::backend::{ExecutionBackend, PassError};

/// Backend that keeps body state device-resident and expresses each substep
/// as three ordered compute dispatches.
///
/// The store is only refreshed when someone actually needs host-side state
/// (snapshots, tests); between those points the authoritative copy lives on
/// the GPU and `sync_store` tracks whether the host mirror is stale.
pub struct GpuBackend {
    ctx: GpuContext,
    staging: ReadbackBuffer,
    params: SimParams,
    host_current: bool,
}

impl GpuBackend {
    /// Attempt to acquire a device and upload the current store. Failure is
    /// recoverable: the caller keeps whatever backend it already had.
    pub fn acquire(config: &SimConfig, store: &ParticleStore) -> Result<Self, GpuError> {
        let params = derive_params(config, store);
        let ctx = GpuContext::acquire(&store.pack(), &params)?;
        let staging = ReadbackBuffer::new(&ctx.device, store.len());

        Ok(Self {
            ctx,
            staging,
            params,
            host_current: true,
        })
    }
}

impl ExecutionBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "gpu-compute"
    }

    fn run_substep(&mut self, _store: &mut ParticleStore, dt: f32) -> Result<(), PassError> {
        // Params are rewritten only between passes; dt is the one field that
        // varies frame to frame.
        self.params.dt = dt;
        dispatch_substep(&self.ctx, &self.params);
        self.host_current = false;
        Ok(())
    }

    fn sync_store(&mut self, store: &mut ParticleStore) -> Result<(), PassError> {
        if !self.host_current {
            let packed = self.staging.read_back(&self.ctx)?;
            store.unpack(&packed);
            self.host_current = true;
        }
        Ok(())
    }

    fn reload(&mut self, store: &ParticleStore) {
        // Radii may have changed, so the grid dimensioning is re-derived
        // along with the buffers.
        self.params = SimParams {
            dt: self.params.dt,
            ..derive_params_from(self.params.width, self.params.height, self.params.restitution, store)
        };
        if store.len() as u32 == self.ctx.body_count && self.params.cell_count() == self.ctx.cell_count {
            // Same buffer shapes: overwrite the authoritative copy in place.
            self.ctx.upload(&store.pack());
        } else {
            self.ctx.reconfigure(&store.pack(), &self.params);
            self.staging = ReadbackBuffer::new(&self.ctx.device, store.len());
        }
        self.host_current = true;
    }
}

fn derive_params(config: &SimConfig, store: &ParticleStore) -> SimParams {
    derive_params_from(config.width, config.height, config.restitution, store)
}

fn derive_params_from(width: f32, height: f32, restitution: f32, store: &ParticleStore) -> SimParams {
    let cell_size = SpatialGrid::cell_size_for(store.max_radius());
    SimParams {
        width,
        height,
        dt: 0.0,
        restitution,
        cell_size,
        cols: (width / cell_size).ceil().max(1.0) as u32,
        rows: (height / cell_size).ceil().max(1.0) as u32,
        body_count: store.len() as u32,
    }
}
