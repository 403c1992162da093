use std::time::Instant;

use anyhow::Context;
use log::{error, info, warn};
use rayon::prelude::*;

use crate::{
    animation::{Orbit, Spin},
    asset_pipeline::{import_model, materials::Material, ModelSource},
    camera::{arcball::ArcballCamera, input::InputState},
    config::{AppConfig, PanelParams},
    error::ImportError,
    layout::{LayoutModel, SceneLayout},
    rendering::backend::RenderBackend,
    scene_graph::{Model, Scene, SceneModel},
};

pub struct DemoState {
    pub config: AppConfig,
    pub layout: SceneLayout,
    pub arcball: ArcballCamera,
    pub input: InputState,
    pub params: PanelParams,
    pub scene: Scene,
    pub start_time: Instant,
}

impl DemoState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let layout = SceneLayout::load_or_tabletop(&config.layout_path())
            .context("Failed to load the scene layout")?;

        let camera = &config.camera;
        let arcball = ArcballCamera::looking_at(
            camera.distance,
            camera.target,
            camera.fov_y_degrees.to_radians(),
            config.window_size,
            camera.near,
            camera.far,
            camera.arcball,
        );

        Ok(Self {
            config,
            layout,
            arcball,
            input: InputState::default(),
            params: PanelParams::default(),
            scene: Scene::new(),
            start_time: Instant::now(),
        })
    }

    /// Milliseconds since start, the clock every per-frame tick runs on.
    pub fn now_ms(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() * 1000.0
    }

    /// Imports every layout model on the rayon pool, then uploads the ones that
    /// succeeded and adds them to the scene. Returns how many were added.
    pub fn load_models(&mut self, backend: &mut dyn RenderBackend) -> usize {
        let started = Instant::now();
        let imported = import_layout_models(&self.layout, &self.config);

        let mut loaded = 0;
        for (layout_model, result) in imported {
            match result {
                Ok(model) => {
                    self.scene
                        .add_model(into_scene_model(model, layout_model, backend));
                    loaded += 1;
                }
                Err(e) => error!("Failed to load model {}: {}", layout_model.name, e),
            }
        }

        info!(
            "Loaded {} of {} models in {:.2?}",
            loaded,
            self.layout.models.len(),
            started.elapsed()
        );
        loaded
    }
}

fn import_layout_models<'a>(
    layout: &'a SceneLayout,
    config: &AppConfig,
) -> Vec<(&'a LayoutModel, Result<Model, ImportError>)> {
    layout
        .models
        .par_iter()
        .map(|layout_model| {
            let result = match (layout_model.files.first(), layout_model.primitive) {
                (Some(description), _) => import_model(&ModelSource::new(
                    layout_model.name.clone(),
                    config.asset_path(description),
                )),
                (None, Some(shape)) => Ok(Model::from_mesh(
                    layout_model.name.clone(),
                    shape.mesh(),
                    Material::new(layout_model.name.clone()),
                )),
                (None, None) => Err(ImportError::Io {
                    path: config.asset_root.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "layout entry lists no files",
                    ),
                }),
            };
            (layout_model, result)
        })
        .collect()
}

fn into_scene_model(
    mut model: Model,
    layout_model: &LayoutModel,
    backend: &mut dyn RenderBackend,
) -> SceneModel {
    model.upload(backend);

    let orbit = layout_model.orbit.and_then(|settings| {
        let root = model.root();
        let node = *model.children(root).first()?;
        Orbit::attach(
            &mut model,
            root,
            node,
            settings.distance,
            settings.orbit_speed,
            settings.rotation_speed,
        )
        .map_err(|e| warn!("Model {} can't orbit: {}", layout_model.name, e))
        .ok()
    });

    let mut scene_model = SceneModel::new(model, layout_model.instances.clone());
    if layout_model.spin {
        scene_model = scene_model.with_spin(Spin::default());
    }
    if let Some(orbit) = orbit {
        scene_model = scene_model.with_orbit(orbit);
    }
    scene_model
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;
    use crate::layout::{InstanceTransform, OrbitSettings, PrimitiveShape};
    use crate::rendering::backend::testing::RecordingBackend;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tabletop-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn triangle_description() -> String {
        json!({
            "rootnode": { "name": "root", "meshes": [0] },
            "meshes": [{
                "name": "triangle",
                "materialindex": 0,
                "vertices": [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                "normals": [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
                "faces": [[0, 1, 2]]
            }],
            "materials": [{ "properties": [
                { "key": "?mat.name", "semantic": 0, "index": 0, "type": 3, "value": "paper" }
            ]}]
        })
        .to_string()
    }

    fn layout_model(name: &str, file: &str, spin: bool) -> LayoutModel {
        LayoutModel {
            name: name.to_string(),
            files: vec![file.to_string()],
            instances: vec![InstanceTransform::default(), InstanceTransform::default()],
            spin,
            primitive: None,
            orbit: None,
        }
    }

    #[test]
    fn failed_models_are_skipped_and_the_rest_are_uploaded() {
        let dir = fixture_dir("load");
        std::fs::write(dir.join("card.obj.assjson"), triangle_description()).unwrap();

        let mut config = AppConfig::default();
        config.asset_root = dir.clone();
        config.layout_file = PathBuf::from("missing-layout.json");

        let mut demo = DemoState::new(config).unwrap();
        demo.layout = SceneLayout {
            models: vec![
                layout_model("card", "card.obj.assjson", false),
                layout_model("broken", "nowhere.obj.assjson", false),
                layout_model("die", "card.obj.assjson", true),
            ],
        };

        let mut backend = RecordingBackend::new();
        assert_eq!(demo.load_models(&mut backend), 2);

        let card = demo.scene.get_model_by_name("card").unwrap();
        assert_eq!(card.instances.len(), 2);
        assert!(card.spin.is_none());
        assert!(demo.scene.get_model_by_name("die").unwrap().spin.is_some());
        assert!(demo.scene.get_model_by_name("broken").is_none());
        assert!(!backend.live_buffers.is_empty());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn primitive_entries_are_generated_and_can_orbit() {
        let mut config = AppConfig::default();
        config.layout_file = PathBuf::from("/nonexistent/scene.json");

        let mut demo = DemoState::new(config).unwrap();
        demo.layout = SceneLayout {
            models: vec![LayoutModel {
                name: "marble".to_string(),
                files: Vec::new(),
                instances: vec![InstanceTransform::default()],
                spin: false,
                primitive: Some(PrimitiveShape::Icosphere { subdivisions: 1 }),
                orbit: Some(OrbitSettings {
                    distance: 2.0,
                    orbit_speed: 1.0,
                    rotation_speed: 0.0,
                }),
            }],
        };

        let mut backend = RecordingBackend::new();
        assert_eq!(demo.load_models(&mut backend), 1);

        demo.scene.early_update(0.0);
        demo.scene.late_update();

        let marble = &demo.scene.get_model_by_name("marble").unwrap().model;
        let (leaf, _) = marble.mesh_nodes().next().unwrap();
        let position = marble.world_matrix(leaf).w_axis.truncate();
        assert!(position.abs_diff_eq(glam::Vec3::new(2.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn entries_without_files_or_shape_fail() {
        let mut config = AppConfig::default();
        config.layout_file = PathBuf::from("/nonexistent/scene.json");

        let mut demo = DemoState::new(config).unwrap();
        let mut empty = layout_model("nothing", "unused", false);
        empty.files.clear();
        demo.layout = SceneLayout {
            models: vec![empty],
        };

        assert_eq!(demo.load_models(&mut RecordingBackend::new()), 0);
        assert_eq!(demo.scene.model_count(), 0);
    }
}
