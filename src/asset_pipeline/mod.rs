pub mod description;
pub mod generate_tangents;
pub mod importer;
pub mod materials;
pub mod primitives;
pub mod texture;

pub use importer::{import_model, ModelSource};
