use std::path::PathBuf;

use glam::{Vec2, Vec3};

use crate::camera::arcball::ArcballSettings;
use crate::rendering::backend::{LightingParams, PrimitiveKind};
use crate::rendering::config::RenderConfig;

pub const ASSET_ROOT_VAR: &str = "TABLETOP_ASSETS";

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub distance: f32,
    pub target: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub arcball: ArcballSettings,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 5.0,
            target: Vec3::ZERO,
            fov_y_degrees: 40.0,
            near: 0.1,
            far: 1000.0,
            arcball: ArcballSettings::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window_title: String,
    pub window_size: (u32, u32),
    pub asset_root: PathBuf,
    /// Relative to the asset root.
    pub layout_file: PathBuf,
    /// Relative to the asset root.
    pub skybox_folder: PathBuf,
    pub shader_folder: PathBuf,
    pub camera: CameraConfig,
    pub render: RenderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_title: "Tabletop".to_string(),
            window_size: (1280, 720),
            asset_root: PathBuf::from("assets"),
            layout_file: PathBuf::from("scene.json"),
            skybox_folder: PathBuf::from("img/skyboxes/skybox10"),
            shader_folder: PathBuf::from("assets/shaders"),
            camera: CameraConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, with the asset root taken from `TABLETOP_ASSETS` when it is set.
    pub fn from_env() -> Self {
        Self::default().with_asset_root(std::env::var_os(ASSET_ROOT_VAR).map(PathBuf::from))
    }

    fn with_asset_root(mut self, asset_root: Option<PathBuf>) -> Self {
        if let Some(asset_root) = asset_root.filter(|root| !root.as_os_str().is_empty()) {
            self.asset_root = asset_root;
        }
        self
    }

    pub fn asset_path(&self, relative: impl Into<PathBuf>) -> PathBuf {
        self.asset_root.join(relative.into())
    }

    pub fn layout_path(&self) -> PathBuf {
        self.asset_path(&self.layout_file)
    }

    pub fn skybox_path(&self) -> PathBuf {
        self.asset_path(&self.skybox_folder)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Filled,
    Wireframe,
}

impl RenderMode {
    pub fn primitive(self) -> PrimitiveKind {
        match self {
            RenderMode::Filled => PrimitiveKind::Triangles,
            RenderMode::Wireframe => PrimitiveKind::Wireframe,
        }
    }
}

/// Runtime tweakables, edited through the parameter panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelParams {
    pub render_mode: RenderMode,
    pub show_color_map: bool,
    pub show_specular_map: bool,
    pub show_normal_map: bool,
    /// The light sits at `(x, y, LIGHT_HEIGHT)`.
    pub light_position: Vec2,
    pub ambient_color: Vec3,
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
    pub specular_intensity: f32,
    pub light_intensity: f32,
}

pub const LIGHT_HEIGHT: f32 = 25.0;

impl Default for PanelParams {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::Filled,
            show_color_map: true,
            show_specular_map: true,
            show_normal_map: true,
            light_position: Vec2::new(15.0, 25.0),
            ambient_color: Vec3::splat(0.3),
            diffuse_color: Vec3::ONE,
            specular_color: Vec3::ONE,
            specular_intensity: 1000.0,
            light_intensity: 1.0,
        }
    }
}

impl PanelParams {
    pub fn lighting(&self, camera_position: Vec3) -> LightingParams {
        LightingParams {
            camera_position,
            light_position: self.light_position.extend(LIGHT_HEIGHT),
            ambient_color: self.ambient_color,
            diffuse_color: self.diffuse_color,
            specular_color: self.specular_color,
            specular_intensity: self.specular_intensity,
            light_intensity: self.light_intensity,
        }
    }
}
