//! Depth-only offscreen target rendered from the light.

use crate::error::RenderError;
use crate::renderer::backend::{Extent, GraphicsBackend, RenderTarget, TextureUnit, Viewport};

pub const SHADOW_MAP_EXTENT: Extent = Extent::new(1024, 768);
pub const SHADOW_MAP_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Tracks whether the shadow map is the active render target so it is never
/// sampled while being written.
#[derive(Debug)]
pub struct ShadowFramebuffer {
    extent: Extent,
    write_bound: bool,
}

impl ShadowFramebuffer {
    pub fn create<B: GraphicsBackend>(backend: &mut B) -> Result<Self, RenderError> {
        backend.create_shadow_target(SHADOW_MAP_EXTENT)?;
        log::info!(
            "Shadow map created: {}x{} {:?}",
            SHADOW_MAP_EXTENT.width,
            SHADOW_MAP_EXTENT.height,
            SHADOW_MAP_FORMAT
        );
        Ok(Self {
            extent: SHADOW_MAP_EXTENT,
            write_bound: false,
        })
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn is_write_bound(&self) -> bool {
        self.write_bound
    }

    pub fn bind_for_write<B: GraphicsBackend>(&mut self, backend: &mut B) -> Result<(), RenderError> {
        backend.bind_target(RenderTarget::ShadowMap)?;
        backend.set_viewport(Viewport::from_size(self.extent.width, self.extent.height))?;
        self.write_bound = true;
        Ok(())
    }

    /// Back to the window surface. `window` is in physical pixels.
    pub fn bind_default<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        window: Extent,
    ) -> Result<(), RenderError> {
        backend.bind_target(RenderTarget::Screen)?;
        backend.set_viewport(Viewport::from_size(window.width, window.height))?;
        self.write_bound = false;
        Ok(())
    }

    /// Binds the depth texture on its fixed unit for the shaded pass.
    pub fn bind_for_sampling<B: GraphicsBackend>(&self, backend: &mut B) -> Result<(), RenderError> {
        if self.write_bound {
            return Err(RenderError::ShadowMapHazard);
        }
        backend.bind_texture(TextureUnit::ShadowMap)
    }

    /// Drops the write-bound mark after a failed frame.
    pub fn reset(&mut self) {
        self.write_bound = false;
    }
}
