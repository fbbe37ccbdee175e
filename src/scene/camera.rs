use glam::{Mat4, Vec3};

use crate::renderer::backend::Extent;
use crate::renderer::shadow_map::SHADOW_MAP_EXTENT;

pub const FIELD_OF_VIEW_DEGREES: f32 = 45.0;

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    view: Mat4,
    projection: Mat4,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let mut camera = Self {
            eye,
            target,
            up,
            fov_y_degrees: FIELD_OF_VIEW_DEGREES,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.set(eye, target, up);
        camera.set_shape(FIELD_OF_VIEW_DEGREES, 1.0, 0.1, 100.0);
        camera
    }

    /// Right-handed look-at from `from` towards `to`.
    pub fn set(&mut self, from: Vec3, to: Vec3, up: Vec3) {
        self.eye = from;
        self.target = to;
        self.up = up;
        self.view = Mat4::look_at_rh(from, to, up);
    }

    /// OpenGL-style perspective; clip z lands in [-1, 1].
    pub fn set_shape(&mut self, fov_y_degrees: f32, aspect: f32, near: f32, far: f32) {
        debug_assert!(near > 0.0, "near plane must be positive");
        debug_assert!(far > near, "far plane must lie beyond the near plane");
        debug_assert!(aspect > 0.0, "aspect must be positive");
        self.fov_y_degrees = fov_y_degrees;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self.projection = Mat4::perspective_rh_gl(fov_y_degrees.to_radians(), aspect, near, far);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// View applied first, then projection.
    pub fn vp_matrix(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// The observer's camera and the camera looking out from the light.
#[derive(Clone, Copy, Debug)]
pub struct CameraPair {
    pub view: Camera,
    pub light: Camera,
}

impl CameraPair {
    pub fn new(eye: Vec3, light_position: Vec3, window: Extent) -> Self {
        let mut view = Camera::new(eye, Vec3::ZERO, Vec3::Y);
        view.set_shape(FIELD_OF_VIEW_DEGREES, window.aspect(), 0.1, 100.0);

        let mut light = Camera::new(light_position, Vec3::ZERO, Vec3::Y);
        light.set_shape(FIELD_OF_VIEW_DEGREES, SHADOW_MAP_EXTENT.aspect(), 0.1, 100.0);

        Self { view, light }
    }

    /// Only the observer follows the window; the light keeps the shadow map's
    /// aspect.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let aspect = width as f32 / height as f32;
        self.view.set_shape(FIELD_OF_VIEW_DEGREES, aspect, 0.05, 350.0);
    }
}
