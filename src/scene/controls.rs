use glam::{Mat4, Vec2, Vec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

use super::transform::mouse_transform;

const ROTATION_INCREMENT: f32 = 0.5;
const TRANSLATE_INCREMENT: f32 = 0.01;
const ZOOM: f32 = 0.1;

/// Mouse-driven spin and translation of the model. Owned and written by the
/// event loop, read once per frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct MouseControls {
    pub spin_x: f32,
    pub spin_y: f32,
    pub model_pos: Vec3,
    rotate: bool,
    translate: bool,
    last_cursor: Option<Vec2>,
}

impl MouseControls {
    pub fn button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.rotate = pressed,
            MouseButton::Right => self.translate = pressed,
            _ => {}
        }
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        let position = Vec2::new(x as f32, y as f32);
        if let Some(last) = self.last_cursor {
            let delta = position - last;
            if self.rotate {
                self.spin_y += ROTATION_INCREMENT * delta.x;
                self.spin_x += ROTATION_INCREMENT * delta.y;
            } else if self.translate {
                self.model_pos.x += TRANSLATE_INCREMENT * delta.x;
                self.model_pos.y -= TRANSLATE_INCREMENT * delta.y;
            }
        }
        self.last_cursor = Some(position);
    }

    pub fn cursor_left(&mut self) {
        self.last_cursor = None;
    }

    /// One zoom step per notch, in the direction of the scroll.
    pub fn wheel(&mut self, delta: MouseScrollDelta) {
        let amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => p.y as f32,
        };
        if amount > 0.0 {
            self.model_pos.z += ZOOM;
        } else if amount < 0.0 {
            self.model_pos.z -= ZOOM;
        }
    }

    pub fn matrix(&self) -> Mat4 {
        mouse_transform(self.spin_x, self.spin_y, self.model_pos)
    }
}
