use glam::{Mat4, Quat, Vec3};

#[derive(Clone, Copy, Debug)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_trs(t: Vec3, r: Quat, s: Vec3) -> Self {
        Self {
            translation: t,
            rotation: r,
            scale: s,
        }
    }

    /// Shared by the four pen parts: scaled up and lowered onto the plane.
    pub fn part() -> Self {
        Self::from_trs(Vec3::new(0.0, -0.5, 0.0), Quat::IDENTITY, Vec3::splat(5.0))
    }

    pub fn plane() -> Self {
        Self::from_trs(Vec3::new(0.0, -0.5, 0.0), Quat::IDENTITY, Vec3::ONE)
    }
}

/// Rotation about Y by `spin_y`, then about X by `spin_x`, then translation
/// by `model_pos`. Angles in degrees.
pub fn mouse_transform(spin_x: f32, spin_y: f32, model_pos: Vec3) -> Mat4 {
    Mat4::from_translation(model_pos)
        * Mat4::from_rotation_x(spin_x.to_radians())
        * Mat4::from_rotation_y(spin_y.to_radians())
}
