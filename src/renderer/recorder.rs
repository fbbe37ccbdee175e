//! Device-free bookkeeping behind the wgpu backend.
//!
//! State commands are checked and folded into passes here; the backend only
//! turns the finished passes into render passes at submit time.

use crate::error::RenderError;
use crate::renderer::backend::{ClearFlags, CullFace, Extent, RenderTarget, TextureUnit, Viewport};
use crate::renderer::pipeline::PipelineKey;
use crate::renderer::shader::{ShaderProgram, UniformBlock, UniformLayout};
use crate::renderer::uniforms::UniformStaging;
use crate::scene::MeshId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    pub key: PipelineKey,
    pub mesh: MeshId,
    pub viewport: Viewport,
    pub uniform_offset: u32,
}

/// One target binding; becomes one render pass at submit time.
#[derive(Debug)]
pub struct RecordedPass {
    pub target: RenderTarget,
    pub clear: ClearFlags,
    pub draws: Vec<DrawCall>,
}

/// Fixed-function state as the last commands left it.
#[derive(Clone, Copy, Debug)]
struct CommandState {
    target: Option<RenderTarget>,
    viewport: Option<Viewport>,
    color_writes: bool,
    cull: CullFace,
    program: Option<ShaderProgram>,
    uniform_offset: Option<u32>,
    bound_textures: u32,
}

impl Default for CommandState {
    fn default() -> Self {
        Self {
            target: None,
            viewport: None,
            color_writes: true,
            cull: CullFace::Back,
            program: None,
            uniform_offset: None,
            bound_textures: 0,
        }
    }
}

#[derive(Debug)]
pub struct FrameRecorder {
    pipelines: Vec<PipelineKey>,
    surface: Extent,
    shadow_target: bool,
    state: CommandState,
    passes: Vec<RecordedPass>,
    staging: UniformStaging,
}

impl FrameRecorder {
    /// `surface` is the default viewport for draws issued without one.
    pub fn new(pipelines: Vec<PipelineKey>, surface: Extent) -> Self {
        Self {
            pipelines,
            surface,
            shadow_target: false,
            state: CommandState::default(),
            passes: Vec::new(),
            staging: UniformStaging::default(),
        }
    }

    pub fn set_surface(&mut self, surface: Extent) {
        self.surface = surface;
    }

    pub fn mark_shadow_target(&mut self) {
        self.shadow_target = true;
    }

    pub fn passes(&self) -> &[RecordedPass] {
        &self.passes
    }

    pub fn staging(&self) -> &UniformStaging {
        &self.staging
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Forgets the frame in progress, including its uniforms and state.
    pub fn discard(&mut self) {
        self.passes.clear();
        self.staging.clear();
        self.state = CommandState::default();
    }

    fn current_pass(&mut self) -> Result<&mut RecordedPass, RenderError> {
        self.passes.last_mut().ok_or(RenderError::NoTarget)
    }

    pub fn bind_target(&mut self, target: RenderTarget) -> Result<(), RenderError> {
        if target == RenderTarget::ShadowMap {
            if !self.shadow_target {
                return Err(RenderError::MissingShadowTarget(target));
            }
            // A texture cannot be sampled and rendered to in the same pass.
            self.state.bound_textures &= !TextureUnit::ShadowMap.bit();
        }
        self.state.target = Some(target);
        self.state.viewport = None;
        self.passes.push(RecordedPass {
            target,
            clear: ClearFlags::empty(),
            draws: Vec::new(),
        });
        Ok(())
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        if self.state.target.is_none() {
            return Err(RenderError::NoTarget);
        }
        self.state.viewport = Some(viewport);
        Ok(())
    }

    pub fn set_color_writes(&mut self, enabled: bool) {
        self.state.color_writes = enabled;
    }

    pub fn set_cull_face(&mut self, face: CullFace) {
        self.state.cull = face;
    }

    pub fn clear(&mut self, flags: ClearFlags) -> Result<(), RenderError> {
        let pass = self.current_pass()?;
        if !pass.draws.is_empty() {
            return Err(RenderError::LateClear(pass.target));
        }
        pass.clear |= flags;
        Ok(())
    }

    pub fn bind_texture(&mut self, unit: TextureUnit) -> Result<(), RenderError> {
        if unit == TextureUnit::ShadowMap {
            if !self.shadow_target {
                return Err(RenderError::MissingShadowTarget(RenderTarget::ShadowMap));
            }
            if self.state.target == Some(RenderTarget::ShadowMap) {
                return Err(RenderError::ShadowMapHazard);
            }
        }
        self.state.bound_textures |= unit.bit();
        Ok(())
    }

    pub fn use_program(&mut self, program: ShaderProgram) {
        if self.state.program != Some(program) {
            self.state.uniform_offset = None;
        }
        self.state.program = Some(program);
    }

    pub fn upload_uniforms(&mut self, block: UniformBlock) -> Result<(), RenderError> {
        let program = self.state.program.ok_or(RenderError::NoProgram)?;
        if program.layout() != block.layout() {
            return Err(RenderError::UniformMismatch {
                program,
                layout: block.layout(),
            });
        }
        self.state.uniform_offset = Some(self.staging.push(&block));
        Ok(())
    }

    pub fn draw(&mut self, mesh: MeshId) -> Result<(), RenderError> {
        let state = self.state;
        let target = state.target.ok_or(RenderError::NoTarget)?;
        let program = state.program.ok_or(RenderError::NoProgram)?;
        let uniform_offset = state.uniform_offset.ok_or(RenderError::NoUniforms(program))?;

        if target == RenderTarget::Screen && !state.color_writes {
            return Err(RenderError::ColorWritesDisabled(target));
        }
        if program.layout() == UniformLayout::Phong {
            if let Some(unit) = TextureUnit::ALL
                .into_iter()
                .find(|unit| state.bound_textures & unit.bit() == 0)
            {
                return Err(RenderError::MissingTexture(unit));
            }
        }

        let key = PipelineKey {
            program,
            cull: state.cull,
            target,
        };
        if !self.pipelines.contains(&key) {
            return Err(RenderError::MissingPipeline {
                program,
                cull: state.cull,
                target,
            });
        }

        let viewport = state
            .viewport
            .unwrap_or_else(|| Viewport::from_size(self.surface.width, self.surface.height));
        self.current_pass()?.draws.push(DrawCall {
            key,
            mesh,
            viewport,
            uniform_offset,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::shader::{DepthUniforms, PhongUniforms};
    use bytemuck::Zeroable;

    fn recorder() -> FrameRecorder {
        let mut recorder = FrameRecorder::new(PipelineKey::all(), Extent::new(720, 576));
        recorder.mark_shadow_target();
        recorder
    }

    fn depth_block() -> UniformBlock {
        UniformBlock::Depth(DepthUniforms::zeroed())
    }

    fn phong_block() -> UniformBlock {
        UniformBlock::Phong(PhongUniforms::zeroed())
    }

    /// Screen bound with every texture unit and phong uniforms in place.
    fn ready_for_phong(recorder: &mut FrameRecorder) {
        recorder.bind_target(RenderTarget::Screen).unwrap();
        for unit in TextureUnit::ALL {
            recorder.bind_texture(unit).unwrap();
        }
        recorder.use_program(ShaderProgram::Body);
        recorder.upload_uniforms(phong_block()).unwrap();
    }

    #[test]
    fn depth_block_under_phong_program_is_a_mismatch() {
        let mut recorder = recorder();
        recorder.bind_target(RenderTarget::Screen).unwrap();
        recorder.use_program(ShaderProgram::Body);
        assert!(matches!(
            recorder.upload_uniforms(depth_block()),
            Err(RenderError::UniformMismatch {
                program: ShaderProgram::Body,
                layout: UniformLayout::Depth,
            })
        ));
    }

    #[test]
    fn upload_without_program_is_rejected() {
        let mut recorder = recorder();
        assert!(matches!(
            recorder.upload_uniforms(phong_block()),
            Err(RenderError::NoProgram)
        ));
    }

    #[test]
    fn clear_after_a_draw_is_late() {
        let mut recorder = recorder();
        ready_for_phong(&mut recorder);
        recorder.clear(ClearFlags::COLOR | ClearFlags::DEPTH).unwrap();
        recorder.draw(MeshId::Body).unwrap();
        assert!(matches!(
            recorder.clear(ClearFlags::DEPTH),
            Err(RenderError::LateClear(RenderTarget::Screen))
        ));
    }

    #[test]
    fn clear_without_target_is_rejected() {
        let mut recorder = recorder();
        assert!(matches!(recorder.clear(ClearFlags::DEPTH), Err(RenderError::NoTarget)));
    }

    #[test]
    fn screen_draw_needs_color_writes() {
        let mut recorder = recorder();
        ready_for_phong(&mut recorder);
        recorder.set_color_writes(false);
        assert!(matches!(
            recorder.draw(MeshId::Body),
            Err(RenderError::ColorWritesDisabled(RenderTarget::Screen))
        ));
    }

    #[test]
    fn phong_draw_without_gloss_is_missing_a_texture() {
        let mut recorder = recorder();
        recorder.bind_target(RenderTarget::Screen).unwrap();
        recorder.bind_texture(TextureUnit::ShadowMap).unwrap();
        recorder.bind_texture(TextureUnit::Environment).unwrap();
        recorder.use_program(ShaderProgram::Top);
        recorder.upload_uniforms(phong_block()).unwrap();
        assert!(matches!(
            recorder.draw(MeshId::Top),
            Err(RenderError::MissingTexture(TextureUnit::Gloss))
        ));
    }

    #[test]
    fn switching_program_requires_fresh_uniforms() {
        let mut recorder = recorder();
        ready_for_phong(&mut recorder);
        recorder.use_program(ShaderProgram::Lead);
        assert!(matches!(
            recorder.draw(MeshId::Lead),
            Err(RenderError::NoUniforms(ShaderProgram::Lead))
        ));

        // Re-selecting the same program keeps its uniforms.
        recorder.upload_uniforms(phong_block()).unwrap();
        recorder.use_program(ShaderProgram::Lead);
        recorder.draw(MeshId::Lead).unwrap();
    }

    #[test]
    fn sampling_the_bound_shadow_target_is_a_hazard() {
        let mut recorder = recorder();
        recorder.bind_target(RenderTarget::ShadowMap).unwrap();
        assert!(matches!(
            recorder.bind_texture(TextureUnit::ShadowMap),
            Err(RenderError::ShadowMapHazard)
        ));
    }

    #[test]
    fn rebinding_the_shadow_target_unbinds_its_texture() {
        let mut recorder = recorder();
        ready_for_phong(&mut recorder);
        recorder.bind_target(RenderTarget::ShadowMap).unwrap();
        recorder.bind_target(RenderTarget::Screen).unwrap();
        recorder.use_program(ShaderProgram::Body);
        recorder.upload_uniforms(phong_block()).unwrap();
        assert!(matches!(
            recorder.draw(MeshId::Body),
            Err(RenderError::MissingTexture(TextureUnit::ShadowMap))
        ));
    }

    #[test]
    fn shadow_target_must_exist_before_use() {
        let mut recorder = FrameRecorder::new(PipelineKey::all(), Extent::new(720, 576));
        assert!(matches!(
            recorder.bind_target(RenderTarget::ShadowMap),
            Err(RenderError::MissingShadowTarget(RenderTarget::ShadowMap))
        ));
        assert!(matches!(
            recorder.bind_texture(TextureUnit::ShadowMap),
            Err(RenderError::MissingShadowTarget(RenderTarget::ShadowMap))
        ));
    }

    #[test]
    fn depth_program_on_screen_has_no_pipeline() {
        let mut recorder = recorder();
        recorder.bind_target(RenderTarget::Screen).unwrap();
        recorder.use_program(ShaderProgram::Colour);
        recorder.upload_uniforms(depth_block()).unwrap();
        assert!(matches!(
            recorder.draw(MeshId::Plane),
            Err(RenderError::MissingPipeline {
                program: ShaderProgram::Colour,
                target: RenderTarget::Screen,
                ..
            })
        ));
    }

    #[test]
    fn draws_land_in_the_pass_of_their_target() {
        let mut recorder = recorder();
        recorder.bind_target(RenderTarget::ShadowMap).unwrap();
        recorder.set_viewport(Viewport::from_size(1024, 768)).unwrap();
        recorder.set_cull_face(CullFace::Front);
        recorder.clear(ClearFlags::DEPTH).unwrap();
        recorder.use_program(ShaderProgram::Colour);
        recorder.upload_uniforms(depth_block()).unwrap();
        recorder.draw(MeshId::Body).unwrap();
        recorder.upload_uniforms(depth_block()).unwrap();
        recorder.draw(MeshId::Plane).unwrap();

        recorder.set_cull_face(CullFace::Back);
        ready_for_phong(&mut recorder);
        recorder.draw(MeshId::Body).unwrap();

        let passes = recorder.passes();
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0].target, RenderTarget::ShadowMap);
        assert_eq!(passes[0].clear, ClearFlags::DEPTH);
        assert_eq!(passes[0].draws.len(), 2);
        assert_eq!(passes[0].draws[0].viewport, Viewport::from_size(1024, 768));
        assert_eq!(passes[0].draws[0].key.cull, CullFace::Front);
        assert_eq!(passes[0].draws[1].uniform_offset, 256);

        // No viewport was set on the screen pass, so the surface size applies.
        assert_eq!(passes[1].draws[0].viewport, Viewport::from_size(720, 576));
        assert_eq!(passes[1].draws[0].key.program, ShaderProgram::Body);
    }

    #[test]
    fn discard_drops_the_frame_in_progress() {
        let mut recorder = recorder();
        ready_for_phong(&mut recorder);
        recorder.draw(MeshId::Body).unwrap();
        assert!(!recorder.is_empty());

        recorder.discard();
        assert!(recorder.is_empty());
        assert!(recorder.staging().is_empty());
        // State is reset too: a draw now has no target.
        assert!(matches!(recorder.draw(MeshId::Body), Err(RenderError::NoTarget)));
    }
}
