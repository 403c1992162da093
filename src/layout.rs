use std::path::Path;

use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use log::info;
use serde::{Deserialize, Serialize};

use crate::asset_pipeline::primitives;
use crate::math::trs;
use crate::scene_graph::geometry::MeshData;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Xyz {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }
}

impl From<Xyz> for Vec3 {
    fn from(value: Xyz) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

/// Where one copy of a model is drawn. Rotation is in Euler degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceTransform {
    pub position: Xyz,
    pub rotation: Xyz,
    pub scale: Xyz,
}

impl InstanceTransform {
    pub const fn new(position: Xyz, rotation: Xyz, scale: f32) -> Self {
        Self {
            position,
            rotation,
            scale: Xyz::splat(scale),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation =
            trs::quat_from_euler_degrees(self.rotation.x, self.rotation.y, self.rotation.z);
        trs::compose(self.position.into(), rotation, self.scale.into())
    }
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self::new(Xyz::splat(0.0), Xyz::splat(0.0), 1.0)
    }
}

/// A generated mesh drawn instead of an imported file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PrimitiveShape {
    Cube { size: f32 },
    UvSphere { divisions: u32 },
    Icosphere { subdivisions: u32 },
    Disk { divisions: u32 },
    Quad,
}

impl PrimitiveShape {
    pub fn mesh(&self) -> MeshData {
        match *self {
            PrimitiveShape::Cube { size } => primitives::cube(size),
            PrimitiveShape::UvSphere { divisions } => primitives::uv_sphere(divisions),
            PrimitiveShape::Icosphere { subdivisions } => primitives::icosphere(subdivisions),
            PrimitiveShape::Disk { divisions } => primitives::disk(divisions),
            PrimitiveShape::Quad => primitives::quad(),
        }
    }
}

/// Circles the model's first child around its root. Speeds are in radians per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitSettings {
    pub distance: f32,
    pub orbit_speed: f32,
    #[serde(default)]
    pub rotation_speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutModel {
    pub name: String,
    /// The converted model description first, then any companion files of the source.
    #[serde(default)]
    pub files: Vec<String>,
    pub instances: Vec<InstanceTransform>,
    /// Rolls the model in place every frame.
    #[serde(default)]
    pub spin: bool,
    /// Used when `files` is empty.
    #[serde(default)]
    pub primitive: Option<PrimitiveShape>,
    #[serde(default)]
    pub orbit: Option<OrbitSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLayout {
    pub models: Vec<LayoutModel>,
}

impl SceneLayout {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse scene layout")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene layout {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Reads the layout at `path`, falling back to the built-in tabletop when it doesn't
    /// exist.
    pub fn load_or_tabletop(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading scene layout from {}", path.display());
            Self::load(path)
        } else {
            info!("No scene layout at {}, using the built-in tabletop", path.display());
            Ok(Self::tabletop())
        }
    }

    pub fn tabletop() -> Self {
        fn model(name: &str, files: &[&str], instances: Vec<InstanceTransform>) -> LayoutModel {
            LayoutModel {
                name: name.to_string(),
                files: files.iter().map(|file| file.to_string()).collect(),
                instances,
                spin: false,
                primitive: None,
                orbit: None,
            }
        }

        fn at(position: [f32; 3], rotation: [f32; 3], scale: f32) -> InstanceTransform {
            InstanceTransform::new(
                Xyz::new(position[0], position[1], position[2]),
                Xyz::new(rotation[0], rotation[1], rotation[2]),
                scale,
            )
        }

        const DIE: &[&str] = &["model/d20/Dice20.fbx.assjson"];
        const CARD_SCALE: f32 = 0.02;
        const DIE_SCALE: f32 = 0.00001;

        let mut rolling_die = model(
            "rolling die",
            DIE,
            vec![at([-0.05, 0.74, 0.34], [40.0, 0.0, 180.0], DIE_SCALE)],
        );
        rolling_die.spin = true;

        Self {
            models: vec![
                model(
                    "chair",
                    &["model/chair/chair.obj.assjson", "model/chair/chair.mtl"],
                    vec![
                        at([0.2, 0.0, 0.5], [0.0, 20.0, 0.0], 0.2),
                        at([0.2, 0.0, -0.9], [0.0, 220.0, 0.0], 0.2),
                        at([-0.5, 0.0, 0.5], [0.0, -10.0, 0.0], 0.2),
                    ],
                ),
                model(
                    "table",
                    &["model/table/table.obj.assjson", "model/table/table.mtl"],
                    vec![at([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1.0)],
                ),
                model(
                    "die",
                    DIE,
                    vec![
                        at([-0.2, 0.74, -0.35], [85.0, 0.0, 0.0], DIE_SCALE),
                        at([0.14, 0.74, 0.23], [40.0, 0.0, 180.0], DIE_SCALE),
                    ],
                ),
                rolling_die,
                model(
                    "deck",
                    &["model/cartes/deck.obj.assjson", "model/cartes/deck.mtl"],
                    vec![
                        at([-0.21, 0.74, -0.27], [0.0, 178.0, 0.0], CARD_SCALE),
                        at([0.2, 0.74, 0.25], [0.0, 6.0, 0.0], CARD_SCALE),
                    ],
                ),
                model(
                    "hand",
                    &["model/cartes/hand.obj.assjson", "model/cartes/hand.mtl"],
                    vec![
                        at([0.0, 0.8, -0.56], [-95.0, 15.0, 180.0], CARD_SCALE),
                        at([0.0, 0.8, 0.54], [87.0, 10.0, 0.0], CARD_SCALE),
                    ],
                ),
                model(
                    "forest",
                    &["model/cartes/forest.obj.assjson", "model/cartes/forest.mtl"],
                    vec![
                        at([0.0, 0.731, 0.44], [0.0, -90.0, 0.0], CARD_SCALE),
                        at([0.04, 0.7302, 0.44], [0.0, 8.0, 0.0], CARD_SCALE),
                        at([0.08, 0.7304, 0.44], [0.0, 0.0, 0.0], CARD_SCALE),
                        at([0.0, 0.73, -0.43], [0.0, 180.0, 0.0], CARD_SCALE),
                        at([0.04, 0.7302, -0.43], [0.0, 184.0, 0.0], CARD_SCALE),
                        at([0.08, 0.7306, -0.432], [0.0, 90.0, 0.0], CARD_SCALE),
                        at([0.21, 0.73, 0.35], [0.0, 0.0, 0.0], CARD_SCALE),
                    ],
                ),
                model(
                    "chandra",
                    &[
                        "model/cartes/chandra_default.obj.assjson",
                        "model/cartes/chandra_default.mtl",
                    ],
                    vec![
                        at([-0.1, 0.73, 0.34], [0.0, -2.0, 0.0], CARD_SCALE),
                        at([-0.21, 0.73, 0.3], [0.0, -1.0, 180.0], CARD_SCALE),
                        at([0.04, 0.73, -0.32], [180.0, 3.0, 0.0], CARD_SCALE),
                        at([0.15, 0.73, -0.28], [180.0, 2.0, 180.0], CARD_SCALE),
                    ],
                ),
                model(
                    "floor",
                    &["model/floor/floor.obj.assjson", "model/floor/floor.mtl"],
                    vec![at([0.0, -8.05, 0.0], [0.0, 0.0, 0.0], 0.4)],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn instance_matrix_is_trs_from_euler_degrees() {
        let instance = at_chair();
        let expected = Mat4::from_translation(Vec3::new(0.2, 0.0, 0.5))
            * Mat4::from_quat(Quat::from_rotation_y(20f32.to_radians()))
            * Mat4::from_scale(Vec3::splat(0.2));

        assert!(instance.matrix().abs_diff_eq(expected, 1e-6));
    }

    fn at_chair() -> InstanceTransform {
        SceneLayout::tabletop().models[0].instances[0]
    }

    #[test]
    fn tabletop_places_every_piece() {
        let layout = SceneLayout::tabletop();
        let instances: usize = layout.models.iter().map(|model| model.instances.len()).sum();

        assert_eq!(layout.models.len(), 9);
        assert_eq!(instances, 23);
        assert_eq!(layout.models.iter().filter(|model| model.spin).count(), 1);
        assert!(layout
            .models
            .iter()
            .all(|model| model.files[0].ends_with(".assjson")));
    }

    #[test]
    fn layouts_roundtrip_through_json() {
        let layout = SceneLayout::tabletop();
        let json = serde_json::to_string(&layout).unwrap();
        assert_eq!(SceneLayout::from_json(&json).unwrap(), layout);
    }

    #[test]
    fn spin_defaults_to_off() {
        let layout = SceneLayout::from_json(
            r#"{ "models": [{ "name": "cube", "files": ["cube.assjson"], "instances": [
                { "position": { "x": 1, "y": 2, "z": 3 },
                  "rotation": { "x": 0, "y": 0, "z": 0 },
                  "scale": { "x": 1, "y": 1, "z": 1 } }
            ] }] }"#,
        )
        .unwrap();

        assert!(!layout.models[0].spin);
        assert_eq!(
            layout.models[0].instances[0].matrix(),
            Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn primitive_entries_need_no_files() {
        let layout = SceneLayout::from_json(
            r#"{ "models": [{ "name": "marble",
                "primitive": { "shape": "icosphere", "subdivisions": 2 },
                "orbit": { "distance": 0.3, "orbit_speed": 1.5 },
                "instances": [] }] }"#,
        )
        .unwrap();

        let marble = &layout.models[0];
        assert!(marble.files.is_empty());
        assert_eq!(
            marble.primitive,
            Some(PrimitiveShape::Icosphere { subdivisions: 2 })
        );
        assert_eq!(
            marble.orbit,
            Some(OrbitSettings {
                distance: 0.3,
                orbit_speed: 1.5,
                rotation_speed: 0.0
            })
        );
    }

    #[test]
    fn primitive_shapes_build_their_meshes() {
        let quad = PrimitiveShape::Quad.mesh();
        assert_eq!(quad.indices.len(), 6);

        let cube = PrimitiveShape::Cube { size: 2.0 }.mesh();
        assert_eq!(cube.indices.len(), 36);
    }

    #[test]
    fn missing_layout_files_fall_back_to_the_tabletop() {
        let layout = SceneLayout::load_or_tabletop(Path::new("/nonexistent/scene.json")).unwrap();
        assert_eq!(layout, SceneLayout::tabletop());
    }
}
