use id_arena::Id;

use crate::scene_graph::geometry::Geometry;
use crate::scene_graph::model::{MaterialId, Model};
use crate::scene_graph::transform::Transform;

pub type NodeId = Id<SceneNode>;

pub struct SceneNode {
    pub name: String,
    pub(crate) transform: Transform,
    pub(crate) geometry: Option<Geometry>,
    pub material: Option<MaterialId>,
    pub(crate) parent_id: Option<NodeId>,
    pub(crate) child_ids: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry, material: Option<MaterialId>) -> Self {
        self.geometry = Some(geometry);
        self.material = material;
        self
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    pub fn child_ids(&self) -> &[NodeId] {
        &self.child_ids
    }

    pub fn parent<'a>(&self, model: &'a Model) -> Option<&'a SceneNode> {
        self.parent_id.and_then(|id| model.node(id))
    }

    pub fn children<'a, 'b>(&'a self, model: &'b Model) -> impl Iterator<Item = &'b SceneNode> + 'b
    where
        'a: 'b,
    {
        self.child_ids.iter().filter_map(move |id| model.node(*id))
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::default(),
            geometry: None,
            material: None,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
