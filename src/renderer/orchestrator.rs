//! Two-pass frame: depth from the light, then the shaded view that samples it.

use crate::error::RenderError;
use crate::renderer::backend::{ClearFlags, CullFace, Extent, GraphicsBackend};
use crate::renderer::shader::UniformBinder;
use crate::renderer::shadow_map::ShadowFramebuffer;
use crate::scene::{CameraPair, FrameTransforms, Light, MeshId, PARTS, PLANE_PROGRAM};

/// Which pass the next call must be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePhase {
    DepthPass,
    ShadePass,
}

/// Everything one frame reads. Sampled once before the frame starts.
#[derive(Clone, Copy, Debug)]
pub struct FrameInputs<'a> {
    pub cameras: &'a CameraPair,
    pub light: &'a Light,
    pub transforms: FrameTransforms,
    /// Window size in physical pixels.
    pub window: Extent,
}

#[derive(Debug)]
pub struct ShadowRenderer {
    shadow: ShadowFramebuffer,
    phase: FramePhase,
}

impl ShadowRenderer {
    pub fn new<B: GraphicsBackend>(backend: &mut B) -> Result<Self, RenderError> {
        Ok(Self {
            shadow: ShadowFramebuffer::create(backend)?,
            phase: FramePhase::DepthPass,
        })
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn shadow_map(&self) -> &ShadowFramebuffer {
        &self.shadow
    }

    pub fn render_frame<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        inputs: &FrameInputs<'_>,
    ) -> Result<(), RenderError> {
        self.depth_pass(backend, inputs)?;
        self.shade_pass(backend, inputs)?;
        let finished = backend.finish_frame();
        self.settle(backend, finished)
    }

    /// Renders every mesh into the shadow map from the light's point of view.
    pub fn depth_pass<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        inputs: &FrameInputs<'_>,
    ) -> Result<(), RenderError> {
        self.check_phase(backend, FramePhase::DepthPass)?;
        let result = self.record_depth(backend, inputs);
        if result.is_ok() {
            self.phase = FramePhase::ShadePass;
        }
        self.settle(backend, result)
    }

    /// Renders the scene from the observer, sampling the shadow map.
    pub fn shade_pass<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        inputs: &FrameInputs<'_>,
    ) -> Result<(), RenderError> {
        self.check_phase(backend, FramePhase::ShadePass)?;
        let result = self.record_shade(backend, inputs);
        if result.is_ok() {
            self.phase = FramePhase::DepthPass;
        }
        self.settle(backend, result)
    }

    fn record_depth<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        inputs: &FrameInputs<'_>,
    ) -> Result<(), RenderError> {
        let binder = UniformBinder::new(inputs.cameras, inputs.light);

        self.shadow.bind_for_write(backend)?;
        backend.set_color_writes(false)?;
        backend.set_cull_face(CullFace::Front)?;
        backend.clear(ClearFlags::DEPTH)?;

        for part in PARTS {
            binder.bind_depth(backend, inputs.transforms.part)?;
            backend.draw(part.mesh)?;
        }
        binder.bind_depth(backend, inputs.transforms.plane)?;
        backend.draw(MeshId::Plane)
    }

    fn record_shade<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        inputs: &FrameInputs<'_>,
    ) -> Result<(), RenderError> {
        let binder = UniformBinder::new(inputs.cameras, inputs.light);

        self.shadow.bind_default(backend, inputs.window)?;
        backend.set_color_writes(true)?;
        backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH)?;
        self.shadow.bind_for_sampling(backend)?;
        backend.set_cull_face(CullFace::Back)?;

        for part in PARTS {
            binder.bind_phong(backend, part.program, inputs.transforms.part)?;
            backend.draw(part.mesh)?;
        }
        binder.bind_phong(backend, PLANE_PROGRAM, inputs.transforms.plane)?;
        backend.draw(MeshId::Plane)
    }

    fn check_phase<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        found: FramePhase,
    ) -> Result<(), RenderError> {
        if self.phase == found {
            return Ok(());
        }
        let expected = self.phase;
        self.settle(backend, Err(RenderError::PhaseOrder { expected, found }))
    }

    /// Any failure abandons the frame in the backend and rewinds to the depth
    /// pass.
    fn settle<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        result: Result<(), RenderError>,
    ) -> Result<(), RenderError> {
        if result.is_err() {
            backend.abandon_frame();
            self.phase = FramePhase::DepthPass;
            self.shadow.reset();
        }
        result
    }
}
