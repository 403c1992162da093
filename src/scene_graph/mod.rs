pub mod geometry;
pub mod model;
pub mod node;
pub mod scene;
pub mod scene_model;
pub mod transform;

pub use model::{MaterialId, Model};
pub use node::{NodeId, SceneNode};
pub use scene::Scene;
pub use scene_model::SceneModel;
pub use transform::Transform;
