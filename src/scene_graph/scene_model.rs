use glam::Mat4;

use crate::animation::{Orbit, Spin};
use crate::layout::InstanceTransform;
use crate::scene_graph::model::Model;

/// A loaded model and the places it is drawn at.
pub struct SceneModel {
    pub model: Model,
    pub instances: Vec<InstanceTransform>,
    pub spin: Option<Spin>,
    pub orbit: Option<Orbit>,
}

impl SceneModel {
    pub fn new(model: Model, instances: Vec<InstanceTransform>) -> Self {
        Self {
            model,
            instances,
            spin: None,
            orbit: None,
        }
    }

    pub fn with_spin(mut self, spin: Spin) -> Self {
        self.spin = Some(spin);
        self
    }

    pub fn with_orbit(mut self, orbit: Orbit) -> Self {
        self.orbit = Some(orbit);
        self
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn instance_matrices(&self) -> impl Iterator<Item = Mat4> + '_ {
        self.instances.iter().map(InstanceTransform::matrix)
    }

    pub(crate) fn animate(&mut self, now_ms: f64) {
        if let Some(spin) = self.spin {
            let root = self.model.root();
            spin.step(&mut self.model, root);
        }
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.tick(&mut self.model, now_ms);
        }
    }
}
