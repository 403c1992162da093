use std::path::Path;

use base64::Engine;

use crate::error::DecodeError;
use crate::rendering::backend::TextureKind;

/// An RGBA8 image in CPU memory, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedTexture {
    /// A 1x1 texture of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    /// The texture sampled when a slot has no map, or its map failed to decode.
    pub fn placeholder(kind: TextureKind) -> Self {
        match kind {
            TextureKind::Color => Self::solid([255, 255, 255, 255]),
            TextureKind::Specular => Self::solid([255, 255, 255, 255]),
            TextureKind::Normal => Self::solid([127, 127, 255, 0]),
            TextureKind::Height => Self::solid([0, 0, 0, 0]),
        }
    }

    pub fn from_bytes(bytes: &[u8], origin: &str) -> Result<Self, DecodeError> {
        let image = image::load_from_memory(bytes).map_err(|source| DecodeError::Image {
            origin: origin.to_string(),
            source,
        })?;
        let rgba = image.to_rgba8();

        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, DecodeError> {
        let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_bytes(&bytes, &path.display().to_string())
    }

    /// Decodes an embedded texture from the model description.
    ///
    /// A height of zero means `data` is a compressed image file (png, jpg, ...).
    /// Otherwise `data` holds `width * height` raw BGRA texels.
    pub fn from_embedded(
        index: usize,
        width: u32,
        height: u32,
        data: &str,
    ) -> Result<Self, DecodeError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|source| DecodeError::Base64 { index, source })?;

        if height == 0 {
            return Self::from_bytes(&bytes, &format!("embedded texture {index}"));
        }

        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(DecodeError::TexelCount {
                index,
                width,
                height,
                expected,
                actual: bytes.len(),
            });
        }

        let mut pixels = bytes;
        for texel in pixels.chunks_exact_mut(4) {
            texel.swap(0, 2);
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}
