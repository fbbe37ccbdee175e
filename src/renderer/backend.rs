//! The narrow command surface the frame orchestrator drives.
//!
//! The orchestrator issues GL-style state commands (bind a target, set the
//! cull face, clear, draw). The wgpu backend folds them into render passes;
//! tests substitute a recorder to inspect the exact command order.

use bitflags::bitflags;

use crate::error::RenderError;
use crate::renderer::shader::{ShaderProgram, UniformBlock};
use crate::scene::MeshId;

/// Where draw calls land.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The depth-only offscreen target owned by the shadow framebuffer.
    ShadowMap,
    /// The window-system provided surface.
    Screen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CullFace {
    Front,
    Back,
}

impl CullFace {
    pub fn to_wgpu(self) -> wgpu::Face {
        match self {
            CullFace::Front => wgpu::Face::Front,
            CullFace::Back => wgpu::Face::Back,
        }
    }
}

/// Texture units the shaders sample from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureUnit {
    ShadowMap = 0,
    Gloss = 1,
    Environment = 2,
}

impl TextureUnit {
    pub const ALL: [TextureUnit; 3] = [
        TextureUnit::ShadowMap,
        TextureUnit::Gloss,
        TextureUnit::Environment,
    ];

    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Binding slot of the texture view in the material bind group.
    pub const fn texture_binding(self) -> u32 {
        self.index() * 2
    }

    /// Binding slot of the sampler paired with the texture.
    pub const fn sampler_binding(self) -> u32 {
        self.index() * 2 + 1
    }

    pub const fn bit(self) -> u32 {
        1 << self.index()
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct ClearFlags: u8 {
        const COLOR = 0b01;
        const DEPTH = 0b10;
    }
}

/// Viewport rectangle in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
        }
    }
}

/// Dimensions of a texture or surface in texels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Commands a frame is built from. Calls are expected in issue order; each
/// one takes effect for everything that follows it.
pub trait GraphicsBackend {
    /// Allocates the depth-only shadow texture and its render target.
    fn create_shadow_target(&mut self, extent: Extent) -> Result<(), RenderError>;

    fn bind_target(&mut self, target: RenderTarget) -> Result<(), RenderError>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError>;

    fn set_color_writes(&mut self, enabled: bool) -> Result<(), RenderError>;

    fn set_cull_face(&mut self, face: CullFace) -> Result<(), RenderError>;

    fn clear(&mut self, flags: ClearFlags) -> Result<(), RenderError>;

    fn bind_texture(&mut self, unit: TextureUnit) -> Result<(), RenderError>;

    fn use_program(&mut self, program: ShaderProgram) -> Result<(), RenderError>;

    fn upload_uniforms(&mut self, block: UniformBlock) -> Result<(), RenderError>;

    fn draw(&mut self, mesh: MeshId) -> Result<(), RenderError>;

    /// Submits everything recorded since the previous frame.
    fn finish_frame(&mut self) -> Result<(), RenderError>;

    /// Drops everything recorded since the previous frame without submitting.
    fn abandon_frame(&mut self);
}
