use std::path::PathBuf;

use thiserror::Error;

/// A model description that cannot be turned into a scene. Fails the whole model.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read model description {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed model description")]
    Json(#[from] serde_json::Error),

    #[error("node `{node}` references mesh {index}, but the description has {count} meshes")]
    MeshIndexOutOfRange {
        node: String,
        index: usize,
        count: usize,
    },

    #[error("mesh `{mesh}` references material {index}, but the description has {count} materials")]
    MaterialIndexOutOfRange {
        mesh: String,
        index: usize,
        count: usize,
    },

    #[error("material `{material}` references embedded texture {index}, but only {count} are embedded")]
    EmbeddedTextureOutOfRange {
        material: String,
        index: usize,
        count: usize,
    },

    #[error("material `{material}` uses unknown texture semantic {semantic}")]
    InvalidTextureSemantic { material: String, semantic: i64 },

    #[error("mesh `{mesh}`: {attribute} has {actual} values, expected {expected}")]
    AttributeLength {
        mesh: String,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("mesh `{mesh}`: face {face} has {count} indices, only triangles are supported")]
    NonTriangleFace {
        mesh: String,
        face: usize,
        count: usize,
    },

    #[error("mesh `{mesh}`: face {face} references vertex {index}, but the mesh has {count}")]
    FaceIndexOutOfRange {
        mesh: String,
        face: usize,
        index: u32,
        count: usize,
    },
}

/// A texture that could not be read or decoded. Recovered with a placeholder.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read texture {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode texture {origin}")]
    Image {
        origin: String,
        #[source]
        source: image::ImageError,
    },

    #[error("embedded texture {index} is not valid base64")]
    Base64 {
        index: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("embedded texture {index} holds {actual} bytes, expected {expected} for {width}x{height} texels")]
    TexelCount {
        index: usize,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A triangle whose UV mapping cannot be inverted, so it has no defined tangent.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("triangle {triangle} has a singular UV mapping (determinant {determinant})")]
pub struct DegenerateTriangle {
    pub triangle: usize,
    pub determinant: f32,
}
