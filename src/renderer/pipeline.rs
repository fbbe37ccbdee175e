// src/renderer/pipeline.rs

use std::collections::HashMap;
use std::mem;

use crate::renderer::backend::{CullFace, RenderTarget, TextureUnit};
use crate::renderer::depth::SCREEN_DEPTH_FORMAT;
use crate::renderer::shader::{DepthUniforms, PhongUniforms, ShaderProgram};
use crate::renderer::shadow_map::SHADOW_MAP_FORMAT;
use crate::renderer::vertex::Vertex;

/// Builder for creating render pipelines with sensible defaults
pub struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    label: Option<&'a str>,
    layout: &'a wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    vertex_entry: &'a str,
    fragment_entry: Option<&'a str>,
    vertex_buffers: Vec<wgpu::VertexBufferLayout<'a>>,
    color_targets: Vec<Option<wgpu::ColorTargetState>>,
    depth_stencil: Option<wgpu::DepthStencilState>,
    primitive: wgpu::PrimitiveState,
    multisample: wgpu::MultisampleState,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(
        device: &'a wgpu::Device,
        layout: &'a wgpu::PipelineLayout,
        shader: &'a wgpu::ShaderModule,
    ) -> Self {
        Self {
            device,
            label: None,
            layout,
            shader,
            vertex_entry: "vs_main",
            fragment_entry: Some("fs_main"),
            vertex_buffers: Vec::new(),
            color_targets: Vec::new(),
            depth_stencil: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
        }
    }

    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_fragment_entry(mut self, entry: &'a str) -> Self {
        self.fragment_entry = Some(entry);
        self
    }

    /// Create a depth-only pipeline (no fragment shader)
    pub fn depth_only(mut self) -> Self {
        self.fragment_entry = None;
        self
    }

    pub fn with_vertex_buffer(mut self, layout: wgpu::VertexBufferLayout<'a>) -> Self {
        self.vertex_buffers.push(layout);
        self
    }

    pub fn with_color_target(
        mut self,
        format: wgpu::TextureFormat,
        blend: Option<wgpu::BlendState>,
    ) -> Self {
        self.color_targets.push(Some(wgpu::ColorTargetState {
            format,
            blend,
            write_mask: wgpu::ColorWrites::ALL,
        }));
        self
    }

    pub fn with_depth_stencil(
        mut self,
        format: wgpu::TextureFormat,
        depth_write: bool,
        depth_compare: wgpu::CompareFunction,
    ) -> Self {
        self.depth_stencil = Some(wgpu::DepthStencilState {
            format,
            depth_write_enabled: depth_write,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });
        self
    }

    /// Set MSAA sample count
    pub fn with_multisample(mut self, sample_count: u32) -> Self {
        self.multisample.count = sample_count;
        self
    }

    pub fn with_cull(mut self, face: CullFace) -> Self {
        self.primitive.cull_mode = Some(face.to_wgpu());
        self
    }

    pub fn build(self) -> wgpu::RenderPipeline {
        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: self.label,
            layout: Some(self.layout),
            vertex: wgpu::VertexState {
                module: self.shader,
                entry_point: Some(self.vertex_entry),
                buffers: &self.vertex_buffers,
                compilation_options: Default::default(),
            },
            fragment: self.fragment_entry.map(|entry| wgpu::FragmentState {
                module: self.shader,
                entry_point: Some(entry),
                targets: &self.color_targets,
                compilation_options: Default::default(),
            }),
            primitive: self.primitive,
            depth_stencil: self.depth_stencil,
            multisample: self.multisample,
            multiview: None,
            cache: None,
        })
    }
}

/// Identifies one pipeline variant. Programs only exist for the target they
/// were built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub program: ShaderProgram,
    pub cull: CullFace,
    pub target: RenderTarget,
}

impl PipelineKey {
    /// Every combination the renderer builds.
    pub fn all() -> Vec<PipelineKey> {
        let mut keys = Vec::new();
        for cull in [CullFace::Front, CullFace::Back] {
            keys.push(PipelineKey {
                program: ShaderProgram::Colour,
                cull,
                target: RenderTarget::ShadowMap,
            });
            for program in ShaderProgram::PHONG_VARIANTS {
                keys.push(PipelineKey {
                    program,
                    cull,
                    target: RenderTarget::Screen,
                });
            }
        }
        keys
    }
}

fn uniform_layout_entry<T>(visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: wgpu::BufferSize::new(mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

fn material_layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    let texture = |unit: TextureUnit, sample_type, view_dimension| wgpu::BindGroupLayoutEntry {
        binding: unit.texture_binding(),
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension,
            multisampled: false,
        },
        count: None,
    };
    let sampler = |unit: TextureUnit, kind| wgpu::BindGroupLayoutEntry {
        binding: unit.sampler_binding(),
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(kind),
        count: None,
    };

    vec![
        texture(
            TextureUnit::ShadowMap,
            wgpu::TextureSampleType::Depth,
            wgpu::TextureViewDimension::D2,
        ),
        sampler(TextureUnit::ShadowMap, wgpu::SamplerBindingType::Comparison),
        texture(
            TextureUnit::Gloss,
            wgpu::TextureSampleType::Float { filterable: true },
            wgpu::TextureViewDimension::D2,
        ),
        sampler(TextureUnit::Gloss, wgpu::SamplerBindingType::Filtering),
        texture(
            TextureUnit::Environment,
            wgpu::TextureSampleType::Float { filterable: true },
            wgpu::TextureViewDimension::Cube,
        ),
        sampler(TextureUnit::Environment, wgpu::SamplerBindingType::Filtering),
    ]
}

/// Bind group layouts and every pipeline the two passes use.
pub struct ScenePipelines {
    pub depth_uniform_layout: wgpu::BindGroupLayout,
    pub phong_uniform_layout: wgpu::BindGroupLayout,
    pub material_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl ScenePipelines {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let depth_uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Depth Uniform Layout"),
            entries: &[uniform_layout_entry::<DepthUniforms>(wgpu::ShaderStages::VERTEX)],
        });
        let phong_uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Phong Uniform Layout"),
            entries: &[uniform_layout_entry::<PhongUniforms>(
                wgpu::ShaderStages::VERTEX_FRAGMENT,
            )],
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Layout"),
            entries: &material_layout_entries(),
        });

        let colour_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Colour Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader/colour.wgsl").into()),
        });
        let phong_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Phong Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader/phong.wgsl").into()),
        });

        let depth_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Depth Pipeline Layout"),
            bind_group_layouts: &[&depth_uniform_layout],
            push_constant_ranges: &[],
        });
        let phong_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Phong Pipeline Layout"),
            bind_group_layouts: &[&phong_uniform_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let mut pipelines = HashMap::new();
        for key in PipelineKey::all() {
            let label = format!("{} {:?}", key.program.name(), key.cull);
            let pipeline = match key.program.fragment_entry() {
                None => PipelineBuilder::new(device, &depth_layout, &colour_shader)
                    .with_label(&label)
                    .depth_only()
                    .with_vertex_buffer(Vertex::layout())
                    .with_depth_stencil(SHADOW_MAP_FORMAT, true, wgpu::CompareFunction::LessEqual)
                    .with_cull(key.cull)
                    .build(),
                Some(entry) => PipelineBuilder::new(device, &phong_layout, &phong_shader)
                    .with_label(&label)
                    .with_fragment_entry(entry)
                    .with_vertex_buffer(Vertex::layout())
                    .with_color_target(surface_format, Some(wgpu::BlendState::REPLACE))
                    .with_depth_stencil(SCREEN_DEPTH_FORMAT, true, wgpu::CompareFunction::LessEqual)
                    .with_multisample(sample_count)
                    .with_cull(key.cull)
                    .build(),
            };
            pipelines.insert(key, pipeline);
        }

        log::info!(
            "Built {} pipelines ({}x MSAA, surface {:?})",
            pipelines.len(),
            sample_count,
            surface_format
        );

        Self {
            depth_uniform_layout,
            phong_uniform_layout,
            material_layout,
            pipelines,
        }
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }
}
