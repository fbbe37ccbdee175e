// renderer/uniforms.rs

use std::mem;

use crate::renderer::pipeline::ScenePipelines;
use crate::renderer::shader::{DepthUniforms, PhongUniforms, UniformBlock};

/// Dynamic uniform offsets must be multiples of this.
pub const UNIFORM_SLOT_ALIGNMENT: u64 = 256;

const INITIAL_ARENA_SIZE: u64 = 16 * 1024;

pub fn slot_stride(size: u64) -> u64 {
    size.div_ceil(UNIFORM_SLOT_ALIGNMENT) * UNIFORM_SLOT_ALIGNMENT
}

/// Per-frame CPU copy of every uniform block, one aligned slot per upload.
#[derive(Debug, Default)]
pub struct UniformStaging {
    bytes: Vec<u8>,
}

impl UniformStaging {
    /// Appends `block` in a fresh slot and returns its dynamic offset.
    pub fn push(&mut self, block: &UniformBlock) -> u32 {
        let offset = self.bytes.len();
        let data = block.as_bytes();
        let stride = slot_stride(data.len() as u64) as usize;
        self.bytes.resize(offset + stride, 0);
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        offset as u32
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// GPU side of the staging area plus the two dynamic-offset bind groups that
/// view it.
pub struct UniformArena {
    buffer: wgpu::Buffer,
    capacity: u64,
    pub depth_bind_group: wgpu::BindGroup,
    pub phong_bind_group: wgpu::BindGroup,
}

impl UniformArena {
    pub fn new(device: &wgpu::Device, pipelines: &ScenePipelines) -> Self {
        Self::with_capacity(device, pipelines, INITIAL_ARENA_SIZE)
    }

    fn with_capacity(device: &wgpu::Device, pipelines: &ScenePipelines, capacity: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("UniformArena"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = |label, layout, size: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(size as u64),
                    }),
                }],
            })
        };
        let depth_bind_group = bind_group(
            "DepthUniformBindGroup",
            &pipelines.depth_uniform_layout,
            mem::size_of::<DepthUniforms>(),
        );
        let phong_bind_group = bind_group(
            "PhongUniformBindGroup",
            &pipelines.phong_uniform_layout,
            mem::size_of::<PhongUniforms>(),
        );

        Self {
            buffer,
            capacity,
            depth_bind_group,
            phong_bind_group,
        }
    }

    /// Writes the staged blocks, reallocating first if they no longer fit.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipelines: &ScenePipelines,
        staging: &UniformStaging,
    ) {
        if staging.is_empty() {
            return;
        }
        let required = staging.len();
        if required > self.capacity {
            let new_capacity = required.max(self.capacity * 2);
            log::info!(
                "Growing uniform arena: {} -> {} bytes",
                self.capacity,
                new_capacity
            );
            *self = Self::with_capacity(device, pipelines, new_capacity);
        }
        queue.write_buffer(&self.buffer, 0, staging.as_bytes());
    }
}
