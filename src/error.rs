use std::path::PathBuf;

use thiserror::Error;

use crate::renderer::backend::{CullFace, RenderTarget, TextureUnit};
use crate::renderer::orchestrator::FramePhase;
use crate::renderer::shader::{ShaderProgram, UniformLayout};

/// Failures raised while starting the viewer or loading its assets.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to load image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to load mesh {path:?}: {source}")]
    Mesh {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("mesh {path:?} contains no triangles")]
    EmptyMesh { path: PathBuf },
    #[error("cube map face {path:?} is {found:?}, expected {expected:?}")]
    CubeFaceSize {
        path: PathBuf,
        expected: (u32, u32),
        found: (u32, u32),
    },
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to open graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Violations of the per-frame render pipeline contract.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{found:?} issued while the frame expects {expected:?}")]
    PhaseOrder {
        expected: FramePhase,
        found: FramePhase,
    },
    #[error("shadow map sampled while it is bound as the render target")]
    ShadowMapHazard,
    #[error("{layout:?} uniforms uploaded while {program:?} is in use")]
    UniformMismatch {
        program: ShaderProgram,
        layout: UniformLayout,
    },
    #[error("draw issued before any program was bound")]
    NoProgram,
    #[error("draw issued before uniforms were uploaded for {0:?}")]
    NoUniforms(ShaderProgram),
    #[error("command issued before a render target was bound")]
    NoTarget,
    #[error("{0:?} used before the shadow target was created")]
    MissingShadowTarget(RenderTarget),
    #[error("texture unit {0:?} is not bound")]
    MissingTexture(TextureUnit),
    #[error("clear issued after draws on {0:?}")]
    LateClear(RenderTarget),
    #[error("colour writes are disabled on {0:?}")]
    ColorWritesDisabled(RenderTarget),
    #[error("no pipeline for {program:?} with {cull:?} culling on {target:?}")]
    MissingPipeline {
        program: ShaderProgram,
        cull: CullFace,
        target: RenderTarget,
    },
    #[error("surface unavailable: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
