//! Shader programs, their uniform blocks and the code that fills them.
//!
//! Every program owns exactly one uniform block layout. Backends reject a block
//! of the wrong layout.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3, Vec4};

use crate::error::RenderError;
use crate::renderer::backend::{GraphicsBackend, TextureUnit};
use crate::scene::camera::CameraPair;
use crate::scene::Light;

/// Remaps OpenGL clip depth ([-1, 1]) to the [0, 1] range wgpu rasterises.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderProgram {
    /// Position-only program used for the light's depth pass.
    Colour,
    Body,
    Top,
    Sharpened,
    Lead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformLayout {
    Depth,
    Phong,
}

impl ShaderProgram {
    pub const PHONG_VARIANTS: [ShaderProgram; 4] = [
        ShaderProgram::Body,
        ShaderProgram::Top,
        ShaderProgram::Sharpened,
        ShaderProgram::Lead,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShaderProgram::Colour => "Colour",
            ShaderProgram::Body => "bodyShader",
            ShaderProgram::Top => "topShader",
            ShaderProgram::Sharpened => "sharpenedShader",
            ShaderProgram::Lead => "leadShader",
        }
    }

    pub fn layout(self) -> UniformLayout {
        match self {
            ShaderProgram::Colour => UniformLayout::Depth,
            _ => UniformLayout::Phong,
        }
    }

    /// Fragment entry point in `phong.wgsl`; the depth program has none.
    pub fn fragment_entry(self) -> Option<&'static str> {
        match self {
            ShaderProgram::Colour => None,
            ShaderProgram::Body => Some("fs_body"),
            ShaderProgram::Top => Some("fs_top"),
            ShaderProgram::Sharpened => Some("fs_sharpened"),
            ShaderProgram::Lead => Some("fs_lead"),
        }
    }
}

/// Uniform block of the `Colour` program. Matches `DepthUniforms` in
/// `colour.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct DepthUniforms {
    pub mvp: [[f32; 4]; 4],
}

/// Uniform block shared by the four phong variants. Matches `PhongUniforms`
/// in `phong.wgsl`; `mat3x3<f32>` columns are padded to 16 bytes.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct PhongUniforms {
    pub mv: [[f32; 4]; 4],
    pub mvp: [[f32; 4]; 4],
    pub texture_matrix: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 3],
    pub light_position: [f32; 4],
    pub in_colour: [f32; 4],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformBlock {
    Depth(DepthUniforms),
    Phong(PhongUniforms),
}

impl UniformBlock {
    pub fn layout(&self) -> UniformLayout {
        match self {
            UniformBlock::Depth(_) => UniformLayout::Depth,
            UniformBlock::Phong(_) => UniformLayout::Phong,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformBlock::Depth(block) => bytemuck::bytes_of(block),
            UniformBlock::Phong(block) => bytemuck::bytes_of(block),
        }
    }
}

/// Remaps clip space [-1, 1] to texture space [0, 1]: scale by 0.5, then
/// translate by 0.5.
pub fn bias_matrix() -> Mat4 {
    Mat4::from_translation(Vec3::splat(0.5)) * Mat4::from_scale(Vec3::splat(0.5))
}

/// `Model × LightView × LightProjection × Bias`, written in column-vector
/// order.
pub fn texture_matrix(model: Mat4, light_view: Mat4, light_projection: Mat4) -> Mat4 {
    bias_matrix() * light_projection * light_view * model
}

/// Inverse of the upper 3x3 of `mv`. Not transposed; the shader multiplies
/// the normal from the left.
pub fn normal_matrix(mv: Mat4) -> Mat3 {
    let normal = Mat3::from_mat4(mv).inverse();
    if !normal.is_finite() {
        log::debug!("model-view matrix is singular, normal matrix is not finite");
    }
    normal
}

fn padded_mat3(m: Mat3) -> [[f32; 4]; 3] {
    [
        m.x_axis.extend(0.0).to_array(),
        m.y_axis.extend(0.0).to_array(),
        m.z_axis.extend(0.0).to_array(),
    ]
}

/// Computes and uploads per-draw uniforms from the camera pair and light.
pub struct UniformBinder<'a> {
    cameras: &'a CameraPair,
    light: &'a Light,
}

impl<'a> UniformBinder<'a> {
    pub fn new(cameras: &'a CameraPair, light: &'a Light) -> Self {
        Self { cameras, light }
    }

    /// `MVP = Model × LightViewProjection`, remapped to wgpu clip space.
    pub fn depth_uniforms(&self, model: Mat4) -> DepthUniforms {
        let mvp = OPENGL_TO_WGPU_MATRIX * self.cameras.light.vp_matrix() * model;
        DepthUniforms {
            mvp: mvp.to_cols_array_2d(),
        }
    }

    pub fn phong_uniforms(&self, model: Mat4) -> PhongUniforms {
        let view = &self.cameras.view;
        let light = &self.cameras.light;

        let mv = view.view_matrix() * model;
        let mvp = OPENGL_TO_WGPU_MATRIX * view.vp_matrix() * model;
        let texture_matrix = texture_matrix(model, light.view_matrix(), light.projection_matrix());

        PhongUniforms {
            mv: mv.to_cols_array_2d(),
            mvp: mvp.to_cols_array_2d(),
            texture_matrix: texture_matrix.to_cols_array_2d(),
            normal_matrix: padded_mat3(normal_matrix(mv)),
            light_position: self.light.position.extend(1.0).to_array(),
            in_colour: Vec4::ONE.to_array(),
        }
    }

    pub fn bind_depth<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        model: Mat4,
    ) -> Result<(), RenderError> {
        backend.use_program(ShaderProgram::Colour)?;
        backend.upload_uniforms(UniformBlock::Depth(self.depth_uniforms(model)))
    }

    pub fn bind_phong<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        program: ShaderProgram,
        model: Mat4,
    ) -> Result<(), RenderError> {
        backend.use_program(program)?;
        backend.bind_texture(TextureUnit::Gloss)?;
        backend.bind_texture(TextureUnit::Environment)?;
        backend.upload_uniforms(UniformBlock::Phong(self.phong_uniforms(model)))
    }
}
