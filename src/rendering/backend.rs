//! The narrow interface between the scene and the GPU command layer.

use glam::{Mat4, Vec3};

use crate::asset_pipeline::texture::DecodedTexture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(u64);

impl BufferHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Triangles,
    Wireframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixUniform {
    Model,
    View,
    Projection,
    Normal,
}

/// What a texture is sampled as. Color maps are sRGB, everything else is linear data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Color,
    Specular,
    Normal,
    Height,
}

/// Buffers of one indexed mesh. Absent UVs or tangents are substituted by the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawBuffers {
    pub positions: BufferHandle,
    pub normals: BufferHandle,
    pub uvs: Option<BufferHandle>,
    pub colors: BufferHandle,
    pub tangents: Option<BufferHandle>,
    pub indices: BufferHandle,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// Per-draw material inputs. `None` maps fall back to the backend's default textures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawMaterial {
    pub diffuse_color: Vec3,
    pub color_map: Option<TextureHandle>,
    pub specular_map: Option<TextureHandle>,
    pub normal_map: Option<TextureHandle>,
    pub height_map: Option<TextureHandle>,
    /// Multiplies the specular map sample; zero turns specular highlights off.
    pub specular_scale: f32,
}

impl Default for DrawMaterial {
    fn default() -> Self {
        Self {
            diffuse_color: Vec3::ONE,
            color_map: None,
            specular_map: None,
            normal_map: None,
            height_map: None,
            specular_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingParams {
    pub camera_position: Vec3,
    pub light_position: Vec3,
    pub ambient_color: Vec3,
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
    pub specular_intensity: f32,
    pub light_intensity: f32,
}

pub trait RenderBackend {
    fn create_buffer(&mut self, label: &str, usage: BufferUsage, contents: &[u8]) -> BufferHandle;

    fn release_buffer(&mut self, handle: BufferHandle);

    fn create_texture(
        &mut self,
        label: &str,
        kind: TextureKind,
        texture: &DecodedTexture,
    ) -> TextureHandle;

    fn release_texture(&mut self, handle: TextureHandle);

    fn set_uniform_matrix4(&mut self, uniform: MatrixUniform, matrix: Mat4);

    fn set_lighting(&mut self, lighting: &LightingParams);

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveKind,
        buffers: &DrawBuffers,
        material: &DrawMaterial,
    );
}

#[cfg(test)]
pub mod testing {
    use std::collections::{HashMap, HashSet};

    use super::*;

    #[derive(Debug, Clone)]
    pub struct RecordedDraw {
        pub primitive: PrimitiveKind,
        pub buffers: DrawBuffers,
        pub material: DrawMaterial,
        pub model: Mat4,
        pub view: Mat4,
        pub projection: Mat4,
        pub normal: Mat4,
    }

    /// Keeps track of live resources and records every draw, for tests.
    #[derive(Default)]
    pub struct RecordingBackend {
        next_id: u64,
        pub live_buffers: HashMap<BufferHandle, (String, usize)>,
        pub live_textures: HashSet<TextureHandle>,
        pub released_buffers: Vec<BufferHandle>,
        pub created_buffers: usize,
        pub created_textures: usize,
        pub matrices: HashMap<&'static str, Mat4>,
        pub lighting: Option<LightingParams>,
        pub draws: Vec<RecordedDraw>,
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self::default()
        }

        fn matrix(&self, name: &'static str) -> Mat4 {
            self.matrices.get(name).copied().unwrap_or(Mat4::IDENTITY)
        }
    }

    fn uniform_name(uniform: MatrixUniform) -> &'static str {
        match uniform {
            MatrixUniform::Model => "model",
            MatrixUniform::View => "view",
            MatrixUniform::Projection => "projection",
            MatrixUniform::Normal => "normal",
        }
    }

    impl RenderBackend for RecordingBackend {
        fn create_buffer(
            &mut self,
            label: &str,
            _usage: BufferUsage,
            contents: &[u8],
        ) -> BufferHandle {
            self.next_id += 1;
            let handle = BufferHandle::from_raw(self.next_id);
            self.live_buffers
                .insert(handle, (label.to_string(), contents.len()));
            self.created_buffers += 1;
            handle
        }

        fn release_buffer(&mut self, handle: BufferHandle) {
            assert!(
                self.live_buffers.remove(&handle).is_some(),
                "released a buffer that is not live: {handle:?}"
            );
            self.released_buffers.push(handle);
        }

        fn create_texture(
            &mut self,
            _label: &str,
            _kind: TextureKind,
            _texture: &DecodedTexture,
        ) -> TextureHandle {
            self.next_id += 1;
            let handle = TextureHandle::from_raw(self.next_id);
            self.live_textures.insert(handle);
            self.created_textures += 1;
            handle
        }

        fn release_texture(&mut self, handle: TextureHandle) {
            assert!(
                self.live_textures.remove(&handle),
                "released a texture that is not live: {handle:?}"
            );
        }

        fn set_uniform_matrix4(&mut self, uniform: MatrixUniform, matrix: Mat4) {
            self.matrices.insert(uniform_name(uniform), matrix);
        }

        fn set_lighting(&mut self, lighting: &LightingParams) {
            self.lighting = Some(*lighting);
        }

        fn draw_indexed(
            &mut self,
            primitive: PrimitiveKind,
            buffers: &DrawBuffers,
            material: &DrawMaterial,
        ) {
            self.draws.push(RecordedDraw {
                primitive,
                buffers: *buffers,
                material: *material,
                model: self.matrix("model"),
                view: self.matrix("view"),
                projection: self.matrix("projection"),
                normal: self.matrix("normal"),
            });
        }
    }
}
