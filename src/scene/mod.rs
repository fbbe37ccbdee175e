// scene/mod.rs

pub mod camera;
pub mod controls;
pub mod transform;

use glam::{Mat4, Vec3};

use crate::renderer::shader::ShaderProgram;

pub use camera::{Camera, CameraPair};
pub use controls::MouseControls;
pub use transform::{mouse_transform, Transform};

/// Every mesh the scene draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshId {
    Body,
    Top,
    Sharpened,
    Lead,
    Plane,
}

impl MeshId {
    pub const ALL: [MeshId; 5] = [
        MeshId::Body,
        MeshId::Top,
        MeshId::Sharpened,
        MeshId::Lead,
        MeshId::Plane,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One of the four pen parts and the program it is shaded with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScenePart {
    pub mesh: MeshId,
    pub program: ShaderProgram,
    /// OBJ file under the asset root.
    pub path: &'static str,
}

pub const PARTS: [ScenePart; 4] = [
    ScenePart {
        mesh: MeshId::Body,
        program: ShaderProgram::Body,
        path: "data/body.obj",
    },
    ScenePart {
        mesh: MeshId::Top,
        program: ShaderProgram::Top,
        path: "data/top.obj",
    },
    ScenePart {
        mesh: MeshId::Sharpened,
        program: ShaderProgram::Sharpened,
        path: "data/sharpened.obj",
    },
    ScenePart {
        mesh: MeshId::Lead,
        program: ShaderProgram::Lead,
        path: "data/lead.obj",
    },
];

/// The plane is shaded with the body program.
pub const PLANE_PROGRAM: ShaderProgram = ShaderProgram::Body;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub position: Vec3,
}

impl Light {
    pub fn new(position: Vec3) -> Self {
        Self { position }
    }
}

/// Model matrices for one frame, sampled from the controls once.
#[derive(Clone, Copy, Debug)]
pub struct FrameTransforms {
    pub part: Mat4,
    pub plane: Mat4,
}

impl FrameTransforms {
    pub fn from_controls(controls: &MouseControls) -> Self {
        Self {
            part: controls.matrix() * Transform::part().matrix(),
            plane: Transform::plane().matrix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_indices_are_dense() {
        for (i, mesh) in MeshId::ALL.iter().enumerate() {
            assert_eq!(mesh.index(), i);
        }
    }

    #[test]
    fn parts_are_in_mesh_order() {
        for (i, part) in PARTS.iter().enumerate() {
            assert_eq!(part.mesh.index(), i);
        }
        assert_eq!(MeshId::Plane.index(), PARTS.len());
    }

    #[test]
    fn every_part_has_its_own_phong_variant() {
        let programs: Vec<_> = PARTS.iter().map(|p| p.program).collect();
        assert_eq!(programs, ShaderProgram::PHONG_VARIANTS.to_vec());
    }

    #[test]
    fn plane_ignores_the_mouse() {
        let mut controls = MouseControls::default();
        controls.spin_y = 45.0;
        controls.model_pos = Vec3::new(1.0, 2.0, 3.0);
        let frame = FrameTransforms::from_controls(&controls);
        assert!(frame
            .plane
            .abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, -0.5, 0.0)), 1e-6));
        assert!(!frame.part.abs_diff_eq(Transform::part().matrix(), 1e-3));
    }
}
