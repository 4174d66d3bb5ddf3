use std::sync::Arc;

use kinetica_core::{PackedBody, GRID_CELL_CAPACITY};
use thiserror::Error;
use wgpu::util::DeviceExt;

/// Errors from GPU acquisition or readback. Acquisition failure is a
/// recovered condition at the engine level (fallback to the sequential
/// backend), never a failure of `step`.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    AdapterRequest,

    #[error("failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("buffer readback failed")]
    Readback,
}

/// Simulation parameters sent to the GPU as a uniform buffer.
/// Read-only on the device for the duration of a pass; rewritten by the
/// host only between passes.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimParams {
    pub width: f32,
    pub height: f32,
    pub dt: f32,
    pub restitution: f32,
    pub cell_size: f32,
    pub cols: u32,
    pub rows: u32,
    pub body_count: u32,
}

impl SimParams {
    pub fn cell_count(&self) -> u32 {
        self.cols * self.rows
    }
}

/// Holds all GPU resources for the collision compute pipeline.
///
/// Body state lives in two storage buffers: each substep integrates A into B
/// and resolves B back into A, so A is always the authoritative copy between
/// substeps and no dispatch ever reads a buffer it is writing.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub clear_pipeline: wgpu::ComputePipeline,
    pub integrate_pipeline: wgpu::ComputePipeline,
    pub resolve_pipeline: wgpu::ComputePipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub body_buffer_a: wgpu::Buffer,
    pub body_buffer_b: wgpu::Buffer,
    pub params_buffer: wgpu::Buffer,
    pub grid_counts_buffer: wgpu::Buffer,
    pub grid_cells_buffer: wgpu::Buffer,
    pub bind_group_integrate: wgpu::BindGroup,
    pub bind_group_resolve: wgpu::BindGroup,
    pub body_count: u32,
    pub cell_count: u32,
}

impl GpuContext {
    /// Attempt to acquire a compute-capable device and build the full
    /// pipeline around `bodies`. Every failure path is an `Err`, so callers
    /// can treat GPU availability as a simple capability query.
    pub fn acquire(bodies: &[PackedBody], params: &SimParams) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::AdapterRequest)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("kinetica_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        log::info!(
            "acquired GPU adapter: {} ({:?})",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        Ok(Self::new(Arc::new(device), Arc::new(queue), bodies, params))
    }

    /// Build pipelines, buffers and bind groups on an already-acquired
    /// device.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        bodies: &[PackedBody],
        params: &SimParams,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("collide_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/collide.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("collide_bind_group_layout"),
            entries: &[
                // bodies_in (read)
                storage_entry(0, true),
                // bodies_out (read_write)
                storage_entry(1, false),
                // params (uniform)
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // grid cell counters (atomic)
                storage_entry(3, false),
                // grid cell contents
                storage_entry(4, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("collide_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let compute_pipeline = |label, entry_point| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        };
        let clear_pipeline = compute_pipeline("clear_grid_pipeline", "clear_grid");
        let integrate_pipeline = compute_pipeline("integrate_pipeline", "integrate");
        let resolve_pipeline = compute_pipeline("resolve_pipeline", "resolve");

        let body_count = bodies.len() as u32;
        let cell_count = params.cell_count();
        let body_bytes: &[u8] = bytemuck::cast_slice(bodies);

        let body_buffer_a = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bodies_a"),
            contents: body_bytes,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
        });
        let body_buffer_b = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bodies_b"),
            contents: body_bytes,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
        });

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sim_params"),
            contents: bytemuck::bytes_of(params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let grid_counts_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grid_counts"),
            size: cell_count as u64 * 4,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });
        let grid_cells_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grid_cells"),
            size: cell_count as u64 * GRID_CELL_CAPACITY as u64 * 4,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        // Two fixed bind groups: integrate reads A and writes B, resolve
        // reads the integrated B and writes the result back into A.
        let make_bind_group = |label, input: &wgpu::Buffer, output: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: input.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: output.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: params_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: grid_counts_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: grid_cells_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        let bind_group_integrate = make_bind_group("collide_bind_group_ab", &body_buffer_a, &body_buffer_b);
        let bind_group_resolve = make_bind_group("collide_bind_group_ba", &body_buffer_b, &body_buffer_a);

        Self {
            device,
            queue,
            clear_pipeline,
            integrate_pipeline,
            resolve_pipeline,
            bind_group_layout,
            body_buffer_a,
            body_buffer_b,
            params_buffer,
            grid_counts_buffer,
            grid_cells_buffer,
            bind_group_integrate,
            bind_group_resolve,
            body_count,
            cell_count,
        }
    }

    /// Rebuild the body and grid buffers around a replacement body set,
    /// keeping the device, queue and pipelines. Used by the engine's bulk
    /// setter.
    pub fn reconfigure(&mut self, bodies: &[PackedBody], params: &SimParams) {
        let device = self.device.clone();
        let queue = self.queue.clone();
        *self = Self::new(device, queue, bodies, params);
    }

    /// Overwrite the authoritative body buffer with host state.
    pub fn upload(&self, bodies: &[PackedBody]) {
        debug_assert_eq!(bodies.len() as u32, self.body_count);
        self.queue
            .write_buffer(&self.body_buffer_a, 0, bytemuck::cast_slice(bodies));
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
