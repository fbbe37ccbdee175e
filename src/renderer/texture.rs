// renderer/texture.rs (with mipmaps)

use std::path::{Path, PathBuf};

use crate::error::ViewerError;
use crate::renderer::backend::Extent;
use crate::renderer::shadow_map::SHADOW_MAP_FORMAT;

/// Cube faces in layer order.
pub const CUBE_FACES: [&str; 6] = ["posx", "negx", "posy", "negy", "posz", "negz"];

struct RgbaTextureSource<'a> {
    layers: Vec<&'a [u8]>,
    width: u32,
    height: u32,
    texture_format: wgpu::TextureFormat,
    view_format: Option<wgpu::TextureFormat>,
    label: Option<&'a str>,
}

#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// Calculate the number of mip levels for a given texture size
    pub(crate) fn calculate_mip_levels(width: u32, height: u32) -> u32 {
        let max_dimension = width.max(height).max(1);
        u32::BITS - max_dimension.leading_zeros()
    }

    fn open_rgba(path: &Path) -> Result<image::RgbaImage, ViewerError> {
        log::info!("Loading texture: {:?}", path);
        let img = image::open(path).map_err(|source| ViewerError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(img.to_rgba8())
    }

    /// 2D texture with a full mip chain and repeat addressing.
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
        is_srgb: bool,
    ) -> Result<Self, ViewerError> {
        let path = path.as_ref();
        let rgba = Self::open_rgba(path)?;
        let (width, height) = rgba.dimensions();
        let (texture_format, view_format) = Self::formats_for_color_space(is_srgb);

        let source = RgbaTextureSource {
            layers: vec![rgba.as_raw().as_slice()],
            width,
            height,
            texture_format,
            view_format,
            label: path.to_str(),
        };
        let (texture, view) = Self::upload_rgba8(device, queue, &source, wgpu::TextureViewDimension::D2);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Gloss Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    /// Six-layer cube map from `<dir>/<face>.<extension>` images, ordered
    /// +X, -X, +Y, -Y, +Z, -Z.
    pub fn cube_from_faces(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        dir: impl AsRef<Path>,
        extension: &str,
    ) -> Result<Self, ViewerError> {
        let dir = dir.as_ref();
        let mut faces = Vec::with_capacity(CUBE_FACES.len());
        for face in CUBE_FACES {
            let path = dir.join(format!("{face}.{extension}"));
            let rgba = Self::open_rgba(&path)?;
            faces.push((path, rgba));
        }

        let sizes: Vec<(PathBuf, (u32, u32))> = faces
            .iter()
            .map(|(path, rgba)| (path.clone(), rgba.dimensions()))
            .collect();
        let (width, height) = Self::common_face_size(&sizes)?;

        let (texture_format, view_format) = Self::formats_for_color_space(true);
        let source = RgbaTextureSource {
            layers: faces.iter().map(|(_, rgba)| rgba.as_raw().as_slice()).collect(),
            width,
            height,
            texture_format,
            view_format,
            label: Some("Environment Cube"),
        };
        let (texture, view) =
            Self::upload_rgba8(device, queue, &source, wgpu::TextureViewDimension::Cube);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Environment Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            anisotropy_clamp: 16,
            ..Default::default()
        });

        log::info!("Environment cube map uploaded: {}x{} per face", width, height);

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    /// Depth texture the light pass renders into and the shaded pass samples
    /// with a `LessEqual` comparison.
    pub fn shadow_depth(device: &wgpu::Device, extent: Extent) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_MAP_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    fn common_face_size(faces: &[(PathBuf, (u32, u32))]) -> Result<(u32, u32), ViewerError> {
        let Some((_, expected)) = faces.first() else {
            return Ok((1, 1));
        };
        for (path, found) in faces {
            if found != expected {
                return Err(ViewerError::CubeFaceSize {
                    path: path.clone(),
                    expected: *expected,
                    found: *found,
                });
            }
        }
        Ok(*expected)
    }

    /// Uploads every layer to mip 0 and fills the rest of the chain.
    fn upload_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &RgbaTextureSource<'_>,
        dimension: wgpu::TextureViewDimension,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let mip_level_count = Self::calculate_mip_levels(source.width, source.height);
        let layer_count = source.layers.len() as u32;

        let layer_size = wgpu::Extent3d {
            width: source.width,
            height: source.height,
            depth_or_array_layers: 1,
        };

        let mut view_formats = Vec::new();
        if let Some(format) = source.view_format {
            view_formats.push(format);
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: source.label,
            size: wgpu::Extent3d {
                depth_or_array_layers: layer_count,
                ..layer_size
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: source.texture_format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT, // Needed for mipmap generation
            view_formats: &view_formats,
        });

        for (layer, data) in source.layers.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * source.width),
                    rows_per_image: Some(source.height),
                },
                layer_size,
            );
        }

        Self::generate_mipmaps(
            device,
            queue,
            &texture,
            mip_level_count,
            layer_count,
            source.texture_format,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            format: source.view_format.or(Some(source.texture_format)),
            dimension: Some(dimension),
            ..Default::default()
        });

        (texture, view)
    }

    /// Generate mipmaps using GPU rendering, one chain per array layer
    fn generate_mipmaps(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        mip_level_count: u32,
        layer_count: u32,
        format: wgpu::TextureFormat,
    ) {
        if mip_level_count <= 1 {
            return;
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader/blit.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blit Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Mip Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Mipmap Generator"),
        });

        for layer in 0..layer_count {
            for target_mip in 1..mip_level_count {
                let mip_view = |mip: u32, usage: wgpu::TextureUsages, label: &str| {
                    texture.create_view(&wgpu::TextureViewDescriptor {
                        label: Some(label),
                        format: Some(format),
                        dimension: Some(wgpu::TextureViewDimension::D2),
                        aspect: wgpu::TextureAspect::All,
                        base_mip_level: mip,
                        mip_level_count: Some(1),
                        base_array_layer: layer,
                        array_layer_count: Some(1),
                        usage: Some(usage),
                    })
                };
                let src_view = mip_view(
                    target_mip - 1,
                    wgpu::TextureUsages::TEXTURE_BINDING,
                    "Mip Source",
                );
                let dst_view = mip_view(
                    target_mip,
                    wgpu::TextureUsages::RENDER_ATTACHMENT,
                    "Mip Destination",
                );

                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Mip Bind Group"),
                    layout: &bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&src_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                });

                let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Mipmap Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &dst_view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                rpass.set_pipeline(&pipeline);
                rpass.set_bind_group(0, &bind_group, &[]);
                rpass.draw(0..3, 0..1); // Fullscreen triangle
            }
        }

        queue.submit(Some(encoder.finish()));
    }

    /// Determine the texture and view formats used for a colour texture.
    fn formats_for_color_space(
        is_srgb: bool,
    ) -> (wgpu::TextureFormat, Option<wgpu::TextureFormat>) {
        if is_srgb {
            (
                wgpu::TextureFormat::Rgba8Unorm,
                Some(wgpu::TextureFormat::Rgba8UnormSrgb),
            )
        } else {
            (wgpu::TextureFormat::Rgba8Unorm, None)
        }
    }
}
