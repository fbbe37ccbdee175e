// renderer/gpu.rs

use std::sync::Arc;

use winit::{dpi::PhysicalSize, window::Window};

use crate::error::{RenderError, ViewerError};
use crate::renderer::assets::SceneAssets;
use crate::renderer::backend::{
    ClearFlags, CullFace, Extent, GraphicsBackend, RenderTarget, TextureUnit, Viewport,
};
use crate::renderer::depth::{Depth, MultisampleTarget};
use crate::renderer::pipeline::{PipelineKey, ScenePipelines};
use crate::renderer::recorder::FrameRecorder;
use crate::renderer::shader::{ShaderProgram, UniformBlock, UniformLayout};
use crate::renderer::texture::Texture;
use crate::renderer::uniforms::UniformArena;
use crate::scene::MeshId;
use crate::settings::ViewerSettings;

pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    sample_count: u32,
    clear_color: wgpu::Color,

    depth: Depth,
    msaa: Option<MultisampleTarget>,
    pipelines: ScenePipelines,
    uniforms: UniformArena,
    assets: SceneAssets,
    shadow: Option<Texture>,
    material_bind_group: Option<wgpu::BindGroup>,
    recorder: FrameRecorder,
}

impl WgpuBackend {
    pub async fn new(window: Arc<Window>, settings: &ViewerSettings) -> Result<Self, ViewerError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: settings.present_mode(&surface_caps.present_modes),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let sample_count = settings.sample_count;
        let depth = Depth::new(&device, size, sample_count);
        let msaa = MultisampleTarget::new(&device, size, format, sample_count);
        let pipelines = ScenePipelines::new(&device, format, sample_count);
        let uniforms = UniformArena::new(&device, &pipelines);
        let assets = SceneAssets::load(&device, &queue, &settings.asset_root)?;
        let recorder = FrameRecorder::new(PipelineKey::all(), Extent::new(config.width, config.height));

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            clear_color: settings.clear_color(),
            depth,
            msaa,
            pipelines,
            uniforms,
            assets,
            shadow: None,
            material_bind_group: None,
            recorder,
        })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = Depth::new(&self.device, new_size, self.sample_count);
        self.msaa = MultisampleTarget::new(&self.device, new_size, self.config.format, self.sample_count);
        self.recorder
            .set_surface(Extent::new(new_size.width, new_size.height));
        log::debug!("Surface resized to {}x{}", new_size.width, new_size.height);
    }

    fn build_material_bind_group(&self, shadow: &Texture) -> wgpu::BindGroup {
        let entries = [
            (TextureUnit::ShadowMap, shadow),
            (TextureUnit::Gloss, &self.assets.gloss),
            (TextureUnit::Environment, &self.assets.environment),
        ];
        let entries: Vec<wgpu::BindGroupEntry> = entries
            .iter()
            .flat_map(|(unit, texture)| {
                [
                    wgpu::BindGroupEntry {
                        binding: unit.texture_binding(),
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: unit.sampler_binding(),
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ]
            })
            .collect();

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("MaterialBindGroup"),
            layout: &self.pipelines.material_layout,
            entries: &entries,
        })
    }

    fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
    ) -> Result<(), RenderError> {
        for pass in self.recorder.passes() {
            let depth_load = if pass.clear.contains(ClearFlags::DEPTH) {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };

            let mut rpass = match pass.target {
                RenderTarget::ShadowMap => {
                    let shadow = self
                        .shadow
                        .as_ref()
                        .ok_or(RenderError::MissingShadowTarget(RenderTarget::ShadowMap))?;
                    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("ShadowPass"),
                        color_attachments: &[],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: &shadow.view,
                            depth_ops: Some(wgpu::Operations {
                                load: depth_load,
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        }),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    })
                }
                RenderTarget::Screen => {
                    let color_load = if pass.clear.contains(ClearFlags::COLOR) {
                        wgpu::LoadOp::Clear(self.clear_color)
                    } else {
                        wgpu::LoadOp::Load
                    };
                    let (view, resolve_target) = match &self.msaa {
                        Some(msaa) => (&msaa.view, Some(surface_view)),
                        None => (surface_view, None),
                    };
                    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("MainPass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view,
                            depth_slice: None,
                            resolve_target,
                            ops: wgpu::Operations {
                                load: color_load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: &self.depth.view,
                            depth_ops: Some(wgpu::Operations {
                                load: depth_load,
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        }),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    })
                }
            };

            for draw in &pass.draws {
                let pipeline = self
                    .pipelines
                    .get(&draw.key)
                    .ok_or(RenderError::MissingPipeline {
                        program: draw.key.program,
                        cull: draw.key.cull,
                        target: draw.key.target,
                    })?;
                let vp = draw.viewport;
                rpass.set_viewport(vp.x, vp.y, vp.width, vp.height, 0.0, 1.0);
                rpass.set_pipeline(pipeline);

                match draw.key.program.layout() {
                    UniformLayout::Depth => {
                        rpass.set_bind_group(0, &self.uniforms.depth_bind_group, &[draw.uniform_offset]);
                    }
                    UniformLayout::Phong => {
                        let material = self
                            .material_bind_group
                            .as_ref()
                            .ok_or(RenderError::MissingTexture(TextureUnit::ShadowMap))?;
                        rpass.set_bind_group(0, &self.uniforms.phong_bind_group, &[draw.uniform_offset]);
                        rpass.set_bind_group(1, material, &[]);
                    }
                }

                let mesh = self.assets.mesh(draw.mesh);
                rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
        Ok(())
    }
}

impl GraphicsBackend for WgpuBackend {
    fn create_shadow_target(&mut self, extent: Extent) -> Result<(), RenderError> {
        let shadow = Texture::shadow_depth(&self.device, extent);
        self.material_bind_group = Some(self.build_material_bind_group(&shadow));
        self.shadow = Some(shadow);
        self.recorder.mark_shadow_target();
        Ok(())
    }

    fn bind_target(&mut self, target: RenderTarget) -> Result<(), RenderError> {
        self.recorder.bind_target(target)
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        self.recorder.set_viewport(viewport)
    }

    fn set_color_writes(&mut self, enabled: bool) -> Result<(), RenderError> {
        self.recorder.set_color_writes(enabled);
        Ok(())
    }

    fn set_cull_face(&mut self, face: CullFace) -> Result<(), RenderError> {
        self.recorder.set_cull_face(face);
        Ok(())
    }

    fn clear(&mut self, flags: ClearFlags) -> Result<(), RenderError> {
        self.recorder.clear(flags)
    }

    fn bind_texture(&mut self, unit: TextureUnit) -> Result<(), RenderError> {
        self.recorder.bind_texture(unit)
    }

    fn use_program(&mut self, program: ShaderProgram) -> Result<(), RenderError> {
        self.recorder.use_program(program);
        Ok(())
    }

    fn upload_uniforms(&mut self, block: UniformBlock) -> Result<(), RenderError> {
        self.recorder.upload_uniforms(block)
    }

    fn draw(&mut self, mesh: MeshId) -> Result<(), RenderError> {
        self.recorder.draw(mesh)
    }

    fn finish_frame(&mut self) -> Result<(), RenderError> {
        if self.recorder.is_empty() {
            return Ok(());
        }

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring and skipping frame");
                self.surface.configure(&self.device, &self.config);
                self.recorder.discard();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("Surface acquire timed out, skipping frame");
                self.recorder.discard();
                return Ok(());
            }
            Err(err) => {
                self.recorder.discard();
                return Err(RenderError::Surface(err));
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.uniforms
            .upload(&self.device, &self.queue, &self.pipelines, self.recorder.staging());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("FrameEncoder"),
            });
        let encoded = self.encode(&mut encoder, &view);
        self.recorder.discard();
        encoded?;

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn abandon_frame(&mut self) {
        if !self.recorder.is_empty() {
            log::debug!("Abandoning {} recorded pass(es)", self.recorder.passes().len());
        }
        self.recorder.discard();
    }
}
