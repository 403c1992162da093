use std::f32::consts::{PI, TAU};

use anyhow::Result;
use glam::{Quat, Vec3};

use crate::scene_graph::model::Model;
use crate::scene_graph::node::NodeId;

/// Rotates a node by fixed increments every frame (Y, then Z, then X).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    /// Radians per frame around each axis.
    pub increments: Vec3,
}

impl Default for Spin {
    /// The rolling die.
    fn default() -> Self {
        Self {
            increments: Vec3::new(PI / 170.0, PI / 100.0, PI / 150.0),
        }
    }
}

impl Spin {
    pub fn step(&self, model: &mut Model, node: NodeId) {
        model.rotate(node, Quat::from_rotation_y(self.increments.y));
        model.rotate(node, Quat::from_rotation_z(self.increments.z));
        model.rotate(node, Quat::from_rotation_x(self.increments.x));
        model.update_model_matrix(node);
    }
}

/// Moves a node on a horizontal circle around its anchor while spinning it around Y.
#[derive(Debug, Clone)]
pub struct Orbit {
    pub node: NodeId,
    pub distance: f32,
    /// Radians per second.
    pub orbit_speed: f32,
    /// Radians per second.
    pub rotation_speed: f32,
    angle: f32,
    last_frame_ms: Option<f64>,
}

impl Orbit {
    /// Parents `node` to `anchor`, so the circle follows the anchor around.
    pub fn attach(
        model: &mut Model,
        anchor: NodeId,
        node: NodeId,
        distance: f32,
        orbit_speed: f32,
        rotation_speed: f32,
    ) -> Result<Self> {
        model.set_node_parent(node, anchor)?;

        Ok(Self {
            node,
            distance,
            orbit_speed,
            rotation_speed,
            angle: 0.0,
            last_frame_ms: None,
        })
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn tick(&mut self, model: &mut Model, now_ms: f64) {
        let elapsed = match self.last_frame_ms {
            Some(last) => ((now_ms - last) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);

        self.angle += self.orbit_speed * elapsed;
        if self.angle >= TAU {
            self.angle -= TAU;
        }
        if self.angle <= -TAU {
            self.angle += TAU;
        }

        let height = model
            .node(self.node)
            .map(|node| node.transform().translation().y)
            .unwrap_or_default();
        let position = Vec3::new(
            self.distance * self.angle.cos(),
            height,
            self.distance * self.angle.sin(),
        );

        model.rotate(self.node, Quat::from_rotation_y(self.rotation_speed * elapsed));
        model.set_position(self.node, position);
        model.update_model_matrix(self.node);
    }
}
