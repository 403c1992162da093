use log::info;

use crate::rendering::backend::RenderBackend;
use crate::scene_graph::scene_model::SceneModel;

/// Everything the draw pass renders, in insertion order.
#[derive(Default)]
pub struct Scene {
    models: Vec<SceneModel>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of an already uploaded model.
    pub fn add_model(&mut self, model: SceneModel) {
        info!(
            "Added model {} with {} instance(s)",
            model.name(),
            model.instances.len()
        );
        self.models.push(model);
    }

    pub fn models(&self) -> &[SceneModel] {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut [SceneModel] {
        &mut self.models
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn get_model_by_name(&self, name: &str) -> Option<&SceneModel> {
        self.models.iter().find(|model| model.name() == name)
    }

    /// Removes a model and frees its GPU resources. Returns false if no model had that name.
    pub fn unload_model(&mut self, name: &str, backend: &mut dyn RenderBackend) -> bool {
        let Some(index) = self.models.iter().position(|model| model.name() == name) else {
            return false;
        };

        let mut scene_model = self.models.remove(index);
        scene_model.model.release(backend);
        info!("Unloaded model {}", name);
        true
    }

    pub fn unload_all(&mut self, backend: &mut dyn RenderBackend) {
        for mut scene_model in self.models.drain(..) {
            scene_model.model.release(backend);
        }
    }

    /// Advances per-frame animations.
    pub fn early_update(&mut self, now_ms: f64) {
        for scene_model in &mut self.models {
            scene_model.animate(now_ms);
        }
    }

    /// Brings every cached world matrix up to date.
    pub fn late_update(&mut self) {
        for scene_model in &self.models {
            scene_model.model.update_transforms();
        }
    }
}
