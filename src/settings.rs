use std::path::PathBuf;

use glam::Vec3;
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerSettings {
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "ViewerSettings::default_sample_count")]
    pub sample_count: u32,
    #[serde(default)]
    pub present_mode: PresentModeSetting,
    #[serde(default = "ViewerSettings::default_asset_root")]
    pub asset_root: PathBuf,
    #[serde(default = "ViewerSettings::default_light_position")]
    pub light_position: [f32; 3],
    #[serde(default = "ViewerSettings::default_camera_eye")]
    pub camera_eye: [f32; 3],
    #[serde(default = "ViewerSettings::default_clear_color")]
    pub clear_color: [f64; 4],
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            sample_count: Self::default_sample_count(),
            present_mode: PresentModeSetting::default(),
            asset_root: Self::default_asset_root(),
            light_position: Self::default_light_position(),
            camera_eye: Self::default_camera_eye(),
            clear_color: Self::default_clear_color(),
        }
    }
}

impl ViewerSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<ViewerSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded viewer settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default viewer settings.",
                        path, err
                    );
                    ViewerSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Viewer settings file {:?} not found. Using default settings.",
                    path
                );
                ViewerSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default viewer settings.",
                    path, err
                );
                ViewerSettings::default()
            }
        }
    }

    fn validate(mut self) -> Self {
        if !matches!(self.sample_count, 1 | 4) {
            warn!(
                "Sample count {} is not supported (1 or 4). Using {} instead.",
                self.sample_count,
                Self::default_sample_count()
            );
            self.sample_count = Self::default_sample_count();
        }

        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        if !can_look_at_origin(self.light_position()) {
            warn!(
                "Light position {:?} cannot look at the origin with +Y up. Using default position.",
                self.light_position
            );
            self.light_position = Self::default_light_position();
        }

        if !can_look_at_origin(self.camera_eye()) {
            warn!(
                "Camera eye {:?} cannot look at the origin with +Y up. Using default eye.",
                self.camera_eye
            );
            self.camera_eye = Self::default_camera_eye();
        }

        if !self
            .clear_color
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
        {
            warn!("Clear colour components must lie in [0, 1]. Using default grey.");
            self.clear_color = Self::default_clear_color();
        }

        self
    }

    pub fn present_mode(&self, available: &[wgpu::PresentMode]) -> wgpu::PresentMode {
        let desired = self.present_mode.to_wgpu();
        if available.contains(&desired) {
            return desired;
        }

        warn!(
            "Requested present mode {:?} is not supported. Falling back to FIFO.",
            desired
        );

        if available.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            available
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        }
    }

    pub fn light_position(&self) -> Vec3 {
        Vec3::from(self.light_position)
    }

    pub fn camera_eye(&self) -> Vec3 {
        Vec3::from(self.camera_eye)
    }

    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }

    const fn default_sample_count() -> u32 {
        4
    }

    fn default_asset_root() -> PathBuf {
        PathBuf::from(".")
    }

    const fn default_light_position() -> [f32; 3] {
        [8.0, 4.0, 8.0]
    }

    const fn default_camera_eye() -> [f32; 3] {
        [0.0, 2.0, 6.0]
    }

    const fn default_clear_color() -> [f64; 4] {
        [0.4, 0.4, 0.4, 1.0]
    }
}

/// Both cameras look at the origin with +Y up. A position on the Y axis (or at
/// the origin) leaves `look_at_rh` without a basis.
fn can_look_at_origin(position: Vec3) -> bool {
    if !position.is_finite() {
        return false;
    }
    let forward = (Vec3::ZERO - position).normalize_or_zero();
    forward != Vec3::ZERO && forward.cross(Vec3::Y).length_squared() >= 1e-6
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 720,
            height: 576,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentModeSetting {
    #[default]
    Fifo,
    FifoRelaxed,
    Immediate,
    Mailbox,
    AutoVsync,
    AutoNoVsync,
}

impl PresentModeSetting {
    fn to_wgpu(&self) -> wgpu::PresentMode {
        match self {
            PresentModeSetting::Fifo => wgpu::PresentMode::Fifo,
            PresentModeSetting::FifoRelaxed => wgpu::PresentMode::FifoRelaxed,
            PresentModeSetting::Immediate => wgpu::PresentMode::Immediate,
            PresentModeSetting::Mailbox => wgpu::PresentMode::Mailbox,
            PresentModeSetting::AutoVsync => wgpu::PresentMode::AutoVsync,
            PresentModeSetting::AutoNoVsync => wgpu::PresentMode::AutoNoVsync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_settings() -> ViewerSettings {
        ViewerSettings {
            resolution: Resolution {
                width: 0,
                height: 0,
            },
            sample_count: 8,
            light_position: [f32::NAN, 0.0, 0.0],
            camera_eye: [0.0, 0.0, 0.0],
            clear_color: [2.0, 0.0, 0.0, 1.0],
            ..ViewerSettings::default()
        }
    }

    #[test]
    fn defaults_match_the_original_scene() {
        let settings = ViewerSettings::default();
        assert_eq!(settings.resolution.width, 720);
        assert_eq!(settings.resolution.height, 576);
        assert_eq!(settings.sample_count, 4);
        assert_eq!(settings.light_position(), Vec3::new(8.0, 4.0, 8.0));
        assert_eq!(settings.camera_eye(), Vec3::new(0.0, 2.0, 6.0));
        assert_eq!(settings.clear_color().r, 0.4);
    }

    #[test]
    fn validate_replaces_invalid_values_with_defaults() {
        let validated = invalid_settings().validate();
        let defaults = ViewerSettings::default();

        assert_eq!(validated.sample_count, defaults.sample_count);
        assert_eq!(validated.resolution.width, defaults.resolution.width);
        assert_eq!(validated.resolution.height, defaults.resolution.height);
        assert_eq!(validated.light_position, defaults.light_position);
        assert_eq!(validated.camera_eye, defaults.camera_eye);
        assert_eq!(validated.clear_color, defaults.clear_color);
    }

    #[test]
    fn validate_preserves_valid_values() {
        let valid = ViewerSettings {
            sample_count: 1,
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            light_position: [-3.0, 6.0, 2.0],
            ..ViewerSettings::default()
        };

        let validated = valid.clone().validate();

        assert_eq!(validated.sample_count, 1);
        assert_eq!(validated.resolution.width, 1920);
        assert_eq!(validated.light_position, valid.light_position);
    }

    #[test]
    fn validate_rejects_positions_straight_above_or_below() {
        let settings: ViewerSettings = serde_json::from_str(
            r#"{ "light_position": [0.0, 10.0, 0.0], "camera_eye": [0.0, -6.0, 0.0] }"#,
        )
        .expect("valid settings json");

        let validated = settings.validate();
        let defaults = ViewerSettings::default();
        assert_eq!(validated.light_position, defaults.light_position);
        assert_eq!(validated.camera_eye, defaults.camera_eye);

        let cameras = crate::scene::CameraPair::new(
            validated.camera_eye(),
            validated.light_position(),
            crate::renderer::Extent::new(720, 576),
        );
        assert!(cameras.light.view_matrix().is_finite());
        assert!(cameras.view.view_matrix().is_finite());
    }

    #[test]
    fn validate_keeps_positions_slightly_off_the_y_axis() {
        let valid = ViewerSettings {
            light_position: [0.5, 10.0, 0.0],
            camera_eye: [0.0, 6.0, 1.0],
            ..ViewerSettings::default()
        };
        let validated = valid.clone().validate();
        assert_eq!(validated.light_position, valid.light_position);
        assert_eq!(validated.camera_eye, valid.camera_eye);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: ViewerSettings =
            serde_json::from_str(r#"{ "sample_count": 1, "present_mode": "mailbox" }"#)
                .expect("valid settings json");
        assert_eq!(settings.sample_count, 1);
        assert!(matches!(settings.present_mode, PresentModeSetting::Mailbox));
        assert_eq!(settings.asset_root, PathBuf::from("."));
        assert_eq!(settings.resolution.width, 720);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let settings = ViewerSettings::load_from_path("definitely/not/here/settings.json");
        assert_eq!(settings.sample_count, 4);
    }

    #[test]
    fn present_mode_returns_desired_when_available() {
        let settings = ViewerSettings {
            present_mode: PresentModeSetting::Mailbox,
            ..ViewerSettings::default()
        };

        let available = [
            wgpu::PresentMode::Fifo,
            wgpu::PresentMode::Mailbox,
            wgpu::PresentMode::Immediate,
        ];

        assert_eq!(
            settings.present_mode(&available),
            wgpu::PresentMode::Mailbox
        );
    }

    #[test]
    fn present_mode_falls_back_to_fifo_when_desired_missing() {
        let settings = ViewerSettings {
            present_mode: PresentModeSetting::Mailbox,
            ..ViewerSettings::default()
        };

        let available = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate];

        assert_eq!(settings.present_mode(&available), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn present_mode_uses_first_available_when_fifo_missing() {
        let settings = ViewerSettings {
            present_mode: PresentModeSetting::Mailbox,
            ..ViewerSettings::default()
        };

        let available = [wgpu::PresentMode::Immediate];

        assert_eq!(
            settings.present_mode(&available),
            wgpu::PresentMode::Immediate
        );
    }
}
