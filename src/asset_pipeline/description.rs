//! Serde model of the assimp JSON scene description (`assimp export -f assjson`).

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct SceneDescription {
    pub rootnode: NodeDescription,
    #[serde(default)]
    pub meshes: Vec<MeshDescription>,
    #[serde(default)]
    pub materials: Vec<MaterialDescription>,
    #[serde(default)]
    pub textures: Vec<EmbeddedTextureDescription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeDescription {
    #[serde(default)]
    pub name: String,
    /// Row-major.
    #[serde(default = "identity_row_major")]
    pub transformation: [f32; 16],
    #[serde(default)]
    pub meshes: Vec<usize>,
    #[serde(default)]
    pub children: Vec<NodeDescription>,
}

fn identity_row_major() -> [f32; 16] {
    glam::Mat4::IDENTITY.to_cols_array()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeshDescription {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub materialindex: usize,
    pub vertices: Vec<f32>,
    #[serde(default)]
    pub normals: Vec<f32>,
    /// Number of components per UV channel; assimp writes 2 or 3.
    #[serde(default)]
    pub numuvcomponents: Vec<usize>,
    #[serde(default)]
    pub texturecoords: Vec<Vec<f32>>,
    #[serde(default)]
    pub colors: Vec<Vec<f32>>,
    #[serde(default)]
    pub faces: Vec<Vec<u32>>,
}

impl MeshDescription {
    pub fn display_name(&self, index: usize) -> String {
        if self.name.is_empty() {
            format!("mesh {index}")
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialDescription {
    #[serde(default)]
    pub properties: Vec<MaterialProperty>,
}

pub const MATERIAL_NAME_KEY: &str = "?mat.name";
pub const DIFFUSE_COLOR_KEY: &str = "$clr.diffuse";
pub const TEXTURE_FILE_KEY: &str = "$tex.file";

impl MaterialDescription {
    pub fn property(&self, key: &str) -> Option<&MaterialProperty> {
        self.properties.iter().find(|property| property.key == key)
    }

    pub fn name(&self) -> Option<&str> {
        self.property(MATERIAL_NAME_KEY)
            .and_then(|property| property.value.as_str())
    }

    /// The first three components of the diffuse color, if present.
    pub fn diffuse_color(&self) -> Option<[f32; 3]> {
        let values = self.property(DIFFUSE_COLOR_KEY)?.value.as_array()?;
        let mut color = [0.0; 3];
        for (component, value) in color.iter_mut().zip(values.iter()) {
            *component = value.as_f64()? as f32;
        }
        (values.len() >= 3).then_some(color)
    }

    pub fn texture_references(&self) -> impl Iterator<Item = (i64, &str)> {
        self.properties
            .iter()
            .filter(|property| property.key == TEXTURE_FILE_KEY)
            .filter_map(|property| Some((property.semantic, property.value.as_str()?)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialProperty {
    pub key: String,
    #[serde(default)]
    pub semantic: i64,
    #[serde(default)]
    pub index: i64,
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedTextureDescription {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub formathint: String,
    pub data: String,
}

/// A reference from a material to a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureReference<'a> {
    Embedded(usize),
    File(&'a str),
}

impl<'a> TextureReference<'a> {
    /// `*N` refers to the N-th embedded texture, anything else is a path.
    pub fn parse(value: &'a str) -> Self {
        match value.strip_prefix('*').map(str::parse::<usize>) {
            Some(Ok(index)) => Self::Embedded(index),
            _ => Self::File(value),
        }
    }
}
