use std::path::Path;

use log::warn;

use crate::asset_pipeline::texture::DecodedTexture;
use crate::rendering::backend::TextureKind;

pub struct Texture {
    _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

impl Texture {
    pub fn from_wgpu_texture(
        texture: wgpu::Texture,
        dimension: wgpu::TextureViewDimension,
    ) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(dimension),
            ..Default::default()
        });

        Self {
            _texture: texture,
            view,
        }
    }

    pub fn format_for(kind: TextureKind) -> wgpu::TextureFormat {
        match kind {
            TextureKind::Color => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureKind::Specular | TextureKind::Normal | TextureKind::Height => {
                wgpu::TextureFormat::Rgba8Unorm
            }
        }
    }

    /// Uploads a decoded image as a 2D texture. Color maps are sampled as sRGB.
    pub fn from_decoded(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        kind: TextureKind,
        decoded: &DecodedTexture,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: decoded.width.max(1),
            height: decoded.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::format_for(kind),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        write_layer(queue, &texture, 0, decoded, size);

        Self::from_wgpu_texture(texture, wgpu::TextureViewDimension::D2)
    }

    /// Builds a cube map from six equally sized faces, ordered +X, -X, +Y, -Y, +Z, -Z.
    pub fn cubemap(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        faces: &[DecodedTexture; 6],
    ) -> Self {
        let size = wgpu::Extent3d {
            width: faces[0].width.max(1),
            height: faces[0].height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                depth_or_array_layers: 6,
                ..size
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in faces.iter().enumerate() {
            write_layer(queue, &texture, layer as u32, face, size);
        }

        Self::from_wgpu_texture(texture, wgpu::TextureViewDimension::Cube)
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

fn write_layer(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    layer: u32,
    decoded: &DecodedTexture,
    size: wgpu::Extent3d,
) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        &decoded.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * size.width),
            rows_per_image: Some(size.height),
        },
        size,
    );
}

/// Reads the six skybox faces from `folder`.
///
/// A face that fails to decode, or that doesn't match the size of the first face, makes
/// the whole cube map fall back to a single black texel per face.
pub fn load_cubemap_faces(folder: &Path, names: &[&str; 6]) -> [DecodedTexture; 6] {
    let black = || DecodedTexture::solid([0, 0, 0, 255]);

    let mut faces = Vec::with_capacity(6);
    for name in names {
        match DecodedTexture::from_file(&folder.join(name)) {
            Ok(face) => faces.push(face),
            Err(e) => {
                warn!("Skybox face {} unavailable, using a black sky: {}", name, e);
                return std::array::from_fn(|_| black());
            }
        }
    }

    let (width, height) = (faces[0].width, faces[0].height);
    if faces
        .iter()
        .any(|face| face.width != width || face.height != height)
    {
        warn!("Skybox faces in {} differ in size, using a black sky", folder.display());
        return std::array::from_fn(|_| black());
    }

    match faces.try_into() {
        Ok(faces) => faces,
        Err(_) => std::array::from_fn(|_| black()),
    }
}

pub struct DepthTexture {
    texture: Texture,
    label: String,
}

impl DepthTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(device: &wgpu::Device, width: u32, height: u32, label: impl Into<String>) -> Self {
        let label: String = label.into();
        let texture = Self::create_wgpu_texture(device, width, height, &label);

        DepthTexture {
            texture: Texture::from_wgpu_texture(texture, wgpu::TextureViewDimension::D2),
            label,
        }
    }

    fn create_wgpu_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        label: &str,
    ) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };

        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.texture = Texture::from_wgpu_texture(
            Self::create_wgpu_texture(device, width, height, &self.label),
            wgpu::TextureViewDimension::D2,
        );
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.texture.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_faces_fall_back_to_black() {
        let faces = load_cubemap_faces(Path::new("/nonexistent/skybox"), &[
            "a.png", "b.png", "c.png", "d.png", "e.png", "f.png",
        ]);

        for face in &faces {
            assert_eq!(face.pixels, vec![0, 0, 0, 255]);
        }
    }

    #[test]
    fn only_color_maps_are_srgb() {
        assert!(Texture::format_for(TextureKind::Color).is_srgb());
        assert!(!Texture::format_for(TextureKind::Normal).is_srgb());
        assert!(!Texture::format_for(TextureKind::Specular).is_srgb());
    }
}
