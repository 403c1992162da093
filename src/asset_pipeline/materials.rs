use std::sync::Arc;

use glam::Vec3;

use crate::asset_pipeline::texture::DecodedTexture;
use crate::rendering::backend::{DrawMaterial, TextureHandle, TextureKind};

/// One texture slot of a material. An empty slot samples the backend's placeholder.
#[derive(Debug, Clone, Default)]
pub struct TextureSlot {
    texture: Option<Arc<DecodedTexture>>,
    handle: Option<TextureHandle>,
}

impl TextureSlot {
    pub fn new(texture: Arc<DecodedTexture>) -> Self {
        Self {
            texture: Some(texture),
            handle: None,
        }
    }

    pub fn texture(&self) -> Option<&Arc<DecodedTexture>> {
        self.texture.as_ref()
    }

    pub fn handle(&self) -> Option<TextureHandle> {
        self.handle
    }

    pub fn is_empty(&self) -> bool {
        self.texture.is_none()
    }

    pub(crate) fn set_handle(&mut self, handle: Option<TextureHandle>) {
        self.handle = handle;
    }
}

#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub diffuse_color: Vec3,
    pub color_map: TextureSlot,
    pub specular_map: TextureSlot,
    pub normal_map: TextureSlot,
    pub height_map: TextureSlot,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse_color: Vec3::ONE,
            color_map: TextureSlot::default(),
            specular_map: TextureSlot::default(),
            normal_map: TextureSlot::default(),
            height_map: TextureSlot::default(),
        }
    }

    pub fn slot(&self, kind: TextureKind) -> &TextureSlot {
        match kind {
            TextureKind::Color => &self.color_map,
            TextureKind::Specular => &self.specular_map,
            TextureKind::Normal => &self.normal_map,
            TextureKind::Height => &self.height_map,
        }
    }

    pub fn slot_mut(&mut self, kind: TextureKind) -> &mut TextureSlot {
        match kind {
            TextureKind::Color => &mut self.color_map,
            TextureKind::Specular => &mut self.specular_map,
            TextureKind::Normal => &mut self.normal_map,
            TextureKind::Height => &mut self.height_map,
        }
    }

    pub fn draw_material(&self) -> DrawMaterial {
        DrawMaterial {
            diffuse_color: self.diffuse_color,
            color_map: self.color_map.handle(),
            specular_map: self.specular_map.handle(),
            normal_map: self.normal_map.handle(),
            height_map: self.height_map.handle(),
            specular_scale: 1.0,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default")
    }
}

pub const TEXTURE_KINDS: [TextureKind; 4] = [
    TextureKind::Color,
    TextureKind::Specular,
    TextureKind::Normal,
    TextureKind::Height,
];

/// The largest texture semantic assimp defines (`aiTextureType_TRANSMISSION`).
const MAX_KNOWN_SEMANTIC: i64 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticMapping {
    Slot(TextureKind),
    Ignored,
    Unknown,
}

/// Maps an assimp texture semantic onto the slot it fills.
pub fn map_texture_semantic(semantic: i64) -> SemanticMapping {
    match semantic {
        1 => SemanticMapping::Slot(TextureKind::Color),
        2 => SemanticMapping::Slot(TextureKind::Specular),
        5 => SemanticMapping::Slot(TextureKind::Height),
        6 => SemanticMapping::Slot(TextureKind::Normal),
        0..=MAX_KNOWN_SEMANTIC => SemanticMapping::Ignored,
        _ => SemanticMapping::Unknown,
    }
}
