use kinetica_core::PackedBody;

use crate::context::{GpuContext, GpuError};

/// Staging buffer for reading bodies back from GPU to CPU.
pub struct ReadbackBuffer {
    pub staging: wgpu::Buffer,
    pub size: u64,
}

impl ReadbackBuffer {
    pub fn new(device: &wgpu::Device, body_count: usize) -> Self {
        let size = (std::mem::size_of::<PackedBody>() * body_count) as u64;
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback_staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { staging, size }
    }

    /// Synchronously copy the authoritative body buffer to the host. The
    /// only place the engine blocks on the device; everything else stays
    /// device-resident across frames.
    pub fn read_back(&self, ctx: &GpuContext) -> Result<Vec<PackedBody>, GpuError> {
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback_encoder"),
            });
        encoder.copy_buffer_to_buffer(&ctx.body_buffer_a, 0, &self.staging, 0, self.size);
        ctx.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = ctx.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| GpuError::Readback)?
            .map_err(|_| GpuError::Readback)?;

        let bodies = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, PackedBody>(&data).to_vec()
        };
        self.staging.unmap();

        Ok(bodies)
    }
}
