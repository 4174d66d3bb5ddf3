use kinetica_core::WORKGROUP_SIZE;

use crate::context::{GpuContext, SimParams};

/// Dispatch one collision substep: clear the grid counters, integrate and
/// bin every body, then resolve collisions.
///
/// All three stages go into a single command submission so no host-side
/// synchronization sits between them. Clear and integrate share one compute
/// pass; resolve runs in its own pass after the binning writes are visible,
/// since it depends on the completed position update and the populated grid.
pub fn dispatch_substep(ctx: &GpuContext, params: &SimParams) {
    ctx.queue
        .write_buffer(&ctx.params_buffer, 0, bytemuck::bytes_of(params));

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("collide_encoder"),
        });

    let body_groups = ctx.body_count.div_ceil(WORKGROUP_SIZE);
    let cell_groups = ctx.cell_count.div_ceil(WORKGROUP_SIZE);

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("integrate_pass"),
            timestamp_writes: None,
        });
        pass.set_bind_group(0, &ctx.bind_group_integrate, &[]);

        pass.set_pipeline(&ctx.clear_pipeline);
        pass.dispatch_workgroups(cell_groups, 1, 1);

        pass.set_pipeline(&ctx.integrate_pipeline);
        pass.dispatch_workgroups(body_groups, 1, 1);
    }

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("resolve_pass"),
            timestamp_writes: None,
        });
        pass.set_bind_group(0, &ctx.bind_group_resolve, &[]);
        pass.set_pipeline(&ctx.resolve_pipeline);
        pass.dispatch_workgroups(body_groups, 1, 1);
    }

    ctx.queue.submit(std::iter::once(encoder.finish()));
}
