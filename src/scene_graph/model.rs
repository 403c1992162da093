use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;
use log::debug;

use crate::asset_pipeline::materials::{Material, TEXTURE_KINDS};
use crate::asset_pipeline::texture::DecodedTexture;
use crate::rendering::backend::{RenderBackend, TextureHandle, TextureKind};
use crate::scene_graph::geometry::{Geometry, MeshData};
use crate::scene_graph::node::{NodeId, SceneNode};
use crate::scene_graph::transform::Transform;

/// Index into [`Model::materials`]. Nodes of one model share materials through it.
pub type MaterialId = usize;

/// One loaded asset: a tree of nodes with a geometry-less root, and its materials.
pub struct Model {
    name: String,
    nodes: Arena<SceneNode>,
    root: NodeId,
    materials: Vec<Material>,
    textures: Vec<TextureHandle>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut nodes = Arena::new();
        let root = nodes.alloc(SceneNode::new(name.clone()));

        Self {
            name,
            nodes,
            root,
            materials: Vec::new(),
            textures: Vec::new(),
        }
    }

    /// A model with a single leaf holding `mesh`.
    pub fn from_mesh(name: impl Into<String>, mesh: MeshData, material: Material) -> Self {
        let mut model = Self::new(name);
        let material_id = model.add_material(material);
        let leaf = SceneNode::new(model.name.clone())
            .with_geometry(Geometry::new(model.name.clone(), mesh), Some(material_id));
        model.add_node(model.root, leaf);
        model.update_transforms();
        model
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Allocates `node` and appends it to the children of `parent`.
    pub fn add_node(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let id = self.nodes.alloc(node);
        self.link(id, parent);
        id
    }

    fn link(&mut self, child_id: NodeId, parent_id: NodeId) {
        if let Some(child) = self.nodes.get_mut(child_id) {
            child.parent_id = Some(parent_id);
        }
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.child_ids.push(child_id);
        }
        self.invalidate_hierarchy(child_id);
    }

    /// Moves `child_id` under `new_parent_id`, keeping its local transform.
    pub fn set_node_parent(&mut self, child_id: NodeId, new_parent_id: NodeId) -> Result<()> {
        if child_id == self.root {
            bail!("The root of model {} cannot be reparented", self.name);
        }
        if self.is_ancestor_or_self(child_id, new_parent_id) {
            bail!("Reparenting would create a cycle in model {}", self.name);
        }

        if let Some(old_parent_id) = self.nodes.get(child_id).and_then(|child| child.parent_id) {
            if let Some(old_parent) = self.nodes.get_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        self.link(child_id, new_parent_id);
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes.get(node).and_then(|node| node.parent_id) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.child_ids.as_slice())
            .unwrap_or(&[])
    }

    /// All node ids, depth first, parents before children, children in insertion order.
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }

        order
    }

    /// Nodes that carry geometry, in traversal order.
    pub fn mesh_nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> + '_ {
        self.traverse()
            .into_iter()
            .filter_map(|id| self.nodes.get(id).map(|node| (id, node)))
            .filter(|(_, node)| node.geometry.is_some())
    }

    pub fn invalidate_hierarchy(&self, id: NodeId) {
        if let Some(node) = self.nodes.get(id) {
            node.transform.invalidate_world();

            for &child_id in &node.child_ids {
                self.invalidate_hierarchy(child_id);
            }
        }
    }

    fn with_transform(&mut self, id: NodeId, update: impl FnOnce(&mut Transform)) {
        if let Some(node) = self.nodes.get_mut(id) {
            update(&mut node.transform);
        }
        self.invalidate_hierarchy(id);
    }

    pub fn set_position(&mut self, id: NodeId, position: Vec3) {
        self.with_transform(id, |transform| transform.set_translation(position));
    }

    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat) {
        self.with_transform(id, |transform| transform.set_rotation(rotation));
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Vec3) {
        self.with_transform(id, |transform| transform.set_scale(scale));
    }

    pub fn set_transform(&mut self, id: NodeId, position: Vec3, rotation: Quat, scale: Vec3) {
        self.with_transform(id, |transform| {
            transform.set_transform(position, rotation, scale)
        });
    }

    /// Post-multiplies the node's rotation by `rotation`.
    pub fn rotate(&mut self, id: NodeId, rotation: Quat) {
        self.with_transform(id, |transform| transform.rotate(rotation));
    }

    /// Sets the node's transform so that its world matrix becomes `world`.
    pub fn set_world_matrix(&mut self, id: NodeId, world: Mat4) {
        let parent_world = self
            .nodes
            .get(id)
            .and_then(|node| node.parent_id)
            .map(|parent_id| self.compute_world_matrix(parent_id))
            .unwrap_or(Mat4::IDENTITY);

        let local = parent_world.inverse() * world;
        self.with_transform(id, |transform| transform.set_from_matrix(&local));
    }

    pub fn local_matrix(&self, id: NodeId) -> Mat4 {
        self.nodes
            .get(id)
            .map(|node| *node.transform.get_local_matrix())
            .unwrap_or(Mat4::IDENTITY)
    }

    /// The world matrix cached by the last propagation.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        self.nodes
            .get(id)
            .map(|node| *node.transform.get_world_matrix())
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Walks the ancestors of `id` and multiplies their local matrices, ignoring caches.
    pub fn compute_world_matrix(&self, id: NodeId) -> Mat4 {
        let mut world = Mat4::IDENTITY;
        let mut current = Some(id);

        while let Some(node) = current.and_then(|id| self.nodes.get(id)) {
            world = *node.transform.get_local_matrix() * world;
            current = node.parent_id;
        }

        world
    }

    /// Recomputes the world matrix of `id` and of every descendant, dirty or not.
    pub fn update_model_matrix(&self, id: NodeId) {
        let parent_world = self
            .nodes
            .get(id)
            .and_then(|node| node.parent_id)
            .map(|parent_id| self.world_matrix(parent_id))
            .unwrap_or(Mat4::IDENTITY);

        self.update_model_matrix_recursive(id, parent_world);
    }

    fn update_model_matrix_recursive(&self, id: NodeId, parent_world: Mat4) {
        if let Some(node) = self.nodes.get(id) {
            let world = parent_world * *node.transform.get_local_matrix();
            node.transform.set_world_matrix(world);

            for &child_id in &node.child_ids {
                self.update_model_matrix_recursive(child_id, world);
            }
        }
    }

    /// Refreshes the world matrices of dirty subtrees, starting from the root.
    pub fn update_transforms(&self) {
        self.update_transform_recursive(self.root, Mat4::IDENTITY, false);
    }

    fn update_transform_recursive(&self, id: NodeId, parent_world: Mat4, parent_changed: bool) {
        if let Some(node) = self.nodes.get(id) {
            let changed = parent_changed || node.transform.is_world_dirty();
            if changed {
                let world = parent_world * *node.transform.get_local_matrix();
                node.transform.set_world_matrix(world);
            }

            let world = *node.transform.get_world_matrix();
            for &child_id in &node.child_ids {
                self.update_transform_recursive(child_id, world, changed);
            }
        }
    }

    /// Creates every buffer and texture the model needs. Already uploaded data is kept.
    ///
    /// Slots sharing one decoded texture share one backend texture.
    pub fn upload(&mut self, backend: &mut dyn RenderBackend) {
        for (_, node) in self.nodes.iter_mut() {
            if let Some(geometry) = node.geometry.as_mut() {
                geometry.upload(backend);
            }
        }

        let mut uploaded: HashMap<(*const DecodedTexture, TextureKind), TextureHandle> =
            HashMap::new();

        for material in &mut self.materials {
            for kind in TEXTURE_KINDS {
                let slot = material.slot_mut(kind);
                if slot.handle().is_some() {
                    continue;
                }
                let Some(texture) = slot.texture().cloned() else {
                    continue;
                };

                let handle = *uploaded
                    .entry((Arc::as_ptr(&texture), kind))
                    .or_insert_with(|| {
                        let label = format!("{} ({:?})", material.name, kind);
                        let handle = backend.create_texture(&label, kind, &texture);
                        self.textures.push(handle);
                        handle
                    });

                material.slot_mut(kind).set_handle(Some(handle));
            }
        }

        debug!(
            "Uploaded model {}: {} nodes, {} textures",
            self.name,
            self.nodes.len(),
            self.textures.len()
        );
    }

    /// Releases every buffer and texture owned by the model.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        for (_, node) in self.nodes.iter_mut() {
            if let Some(geometry) = node.geometry.as_mut() {
                geometry.release(backend);
            }
        }

        for handle in self.textures.drain(..) {
            backend.release_texture(handle);
        }

        for material in &mut self.materials {
            for kind in TEXTURE_KINDS {
                material.slot_mut(kind).set_handle(None);
            }
        }
    }
}
