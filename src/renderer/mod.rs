pub mod assets;
pub mod backend;
pub mod depth;
pub mod gpu;
pub mod mesh;
pub mod orchestrator;
pub mod pipeline;
pub mod primitives;
pub mod recorder;
pub mod shader;
pub mod shadow_map;
pub mod texture;
pub mod uniforms;
pub mod vertex;

pub use backend::{ClearFlags, CullFace, Extent, GraphicsBackend, RenderTarget, TextureUnit, Viewport};
pub use gpu::WgpuBackend;
pub use orchestrator::{FrameInputs, FramePhase, ShadowRenderer};
pub use shader::{ShaderProgram, UniformBinder, UniformBlock, UniformLayout};
pub use shadow_map::{ShadowFramebuffer, SHADOW_MAP_EXTENT};
pub use vertex::Vertex;
