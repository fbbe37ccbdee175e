// app.rs
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::error::ViewerError;
use crate::renderer::{Extent, FrameInputs, ShadowRenderer, WgpuBackend};
use crate::scene::{CameraPair, FrameTransforms, Light, MouseControls};
use crate::settings::ViewerSettings;

pub const WINDOW_TITLE: &str = "Rendering";

/// What a key press asks the window to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Exit,
    Fullscreen,
    Windowed,
}

impl KeyAction {
    pub fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::Named(NamedKey::Escape) => Some(KeyAction::Exit),
            Key::Character(c) if c.eq_ignore_ascii_case("f") => Some(KeyAction::Fullscreen),
            Key::Character(c) if c.eq_ignore_ascii_case("n") => Some(KeyAction::Windowed),
            _ => None,
        }
    }
}

/// Everything that exists once the window is up. Fields drop in declaration
/// order, so GPU resources go before the window.
struct Viewer {
    renderer: ShadowRenderer,
    backend: WgpuBackend,
    cameras: CameraPair,
    light: Light,
    window: Arc<Window>,
}

impl Viewer {
    fn new(event_loop: &ActiveEventLoop, settings: &ViewerSettings) -> Result<Self, ViewerError> {
        let resolution = &settings.resolution;
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title(WINDOW_TITLE)
                    .with_inner_size(LogicalSize::new(resolution.width, resolution.height)),
            )?,
        );

        let mut backend = pollster::block_on(WgpuBackend::new(window.clone(), settings))?;
        let renderer = ShadowRenderer::new(&mut backend)?;

        let light = Light::new(settings.light_position());
        let cameras = CameraPair::new(
            settings.camera_eye(),
            light.position,
            Extent::new(resolution.width, resolution.height),
        );

        Ok(Self {
            renderer,
            backend,
            cameras,
            light,
            window,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(winit::dpi::PhysicalSize::new(width, height));
        self.cameras.resize(width, height);
    }

    fn render(&mut self, controls: &MouseControls) {
        let size = self.backend.size();
        let inputs = FrameInputs {
            cameras: &self.cameras,
            light: &self.light,
            transforms: FrameTransforms::from_controls(controls),
            window: Extent::new(size.width, size.height),
        };
        if let Err(err) = self.renderer.render_frame(&mut self.backend, &inputs) {
            log::error!("Frame dropped: {}", err);
        }
    }
}

pub struct App {
    settings: ViewerSettings,
    viewer: Option<Viewer>,
    controls: MouseControls,
    error: Option<ViewerError>,
}

impl App {
    pub fn new(settings: ViewerSettings) -> Self {
        Self {
            settings,
            viewer: None,
            controls: MouseControls::default(),
            error: None,
        }
    }

    /// The startup failure that ended the event loop, if any.
    pub fn take_error(&mut self) -> Option<ViewerError> {
        self.error.take()
    }

    fn apply_key(&mut self, event_loop: &ActiveEventLoop, action: KeyAction) {
        match action {
            KeyAction::Exit => event_loop.exit(),
            KeyAction::Fullscreen => {
                if let Some(viewer) = &self.viewer {
                    viewer
                        .window
                        .set_fullscreen(Some(Fullscreen::Borderless(None)));
                }
            }
            KeyAction::Windowed => {
                if let Some(viewer) = &self.viewer {
                    viewer.window.set_fullscreen(None);
                }
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        match Viewer::new(event_loop, &self.settings) {
            Ok(viewer) => {
                log::info!("Viewer ready");
                viewer.window.request_redraw();
                self.viewer = Some(viewer);
            }
            Err(err) => {
                log::error!("Failed to start viewer: {}", err);
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if viewer.window.id() != id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                viewer.resize(size.width, size.height);
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = viewer.window.inner_size();
                viewer.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                viewer.render(&self.controls);
                viewer.window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(action) = KeyAction::from_key(&logical_key) {
                    self.apply_key(event_loop, action);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.controls.button(button, state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.controls.cursor_moved(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => {
                self.controls.cursor_left();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.controls.wheel(delta);
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("Shutting down viewer");
        self.viewer = None;
    }
}
