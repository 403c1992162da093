use bytemuck::Pod;
use glam::{Vec2, Vec3, Vec4};

use crate::rendering::backend::{BufferHandle, BufferUsage, DrawBuffers, RenderBackend};

/// CPU-side mesh data, as produced by the importer and the primitive generators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Option<Vec<Vec2>>,
    pub colors: Vec<Vec4>,
    pub tangents: Option<Vec<Vec3>>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// One attribute array and the GPU buffer created from it.
#[derive(Debug)]
pub struct VertexAttribute<T: Pod> {
    data: Vec<T>,
    buffer: Option<BufferHandle>,
}

impl<T: Pod> VertexAttribute<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data, buffer: None }
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    fn upload(&mut self, backend: &mut dyn RenderBackend, label: &str, usage: BufferUsage) {
        self.release(backend);
        self.buffer = Some(backend.create_buffer(label, usage, bytemuck::cast_slice(&self.data)));
    }

    fn upload_if_missing(
        &mut self,
        backend: &mut dyn RenderBackend,
        label: &str,
        usage: BufferUsage,
    ) {
        if self.buffer.is_none() {
            self.upload(backend, label, usage);
        }
    }

    fn replace(
        &mut self,
        backend: &mut dyn RenderBackend,
        label: &str,
        usage: BufferUsage,
        data: Vec<T>,
    ) {
        self.data = data;
        self.upload(backend, label, usage);
    }

    fn release(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(buffer) = self.buffer.take() {
            backend.release_buffer(buffer);
        }
    }
}

/// Geometry owned by a scene node. Each array owns exactly one buffer once uploaded.
///
/// Not `Clone`: copies would share buffer handles. Build a second geometry from the
/// same [`MeshData`] instead.
#[derive(Debug)]
pub struct Geometry {
    name: String,
    positions: VertexAttribute<Vec3>,
    normals: VertexAttribute<Vec3>,
    uvs: Option<VertexAttribute<Vec2>>,
    colors: VertexAttribute<Vec4>,
    tangents: Option<VertexAttribute<Vec3>>,
    indices: VertexAttribute<u32>,
}

impl Geometry {
    pub fn new(name: impl Into<String>, mesh: MeshData) -> Self {
        Self {
            name: name.into(),
            positions: VertexAttribute::new(mesh.positions),
            normals: VertexAttribute::new(mesh.normals),
            uvs: mesh.uvs.map(VertexAttribute::new),
            colors: VertexAttribute::new(mesh.colors),
            tangents: mesh.tangents.map(VertexAttribute::new),
            indices: VertexAttribute::new(mesh.indices),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positions(&self) -> &[Vec3] {
        self.positions.data()
    }

    pub fn normals(&self) -> &[Vec3] {
        self.normals.data()
    }

    pub fn uvs(&self) -> Option<&[Vec2]> {
        self.uvs.as_ref().map(VertexAttribute::data)
    }

    pub fn colors(&self) -> &[Vec4] {
        self.colors.data()
    }

    pub fn tangents(&self) -> Option<&[Vec3]> {
        self.tangents.as_ref().map(VertexAttribute::data)
    }

    pub fn indices(&self) -> &[u32] {
        self.indices.data()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn label(&self, attribute: &str) -> String {
        format!("{} ({})", self.name, attribute)
    }

    /// Creates buffers for every array that does not have one yet.
    pub fn upload(&mut self, backend: &mut dyn RenderBackend) {
        let label = self.label("positions");
        self.positions
            .upload_if_missing(backend, &label, BufferUsage::Vertex);
        let label = self.label("normals");
        self.normals.upload_if_missing(backend, &label, BufferUsage::Vertex);
        let label = self.label("colors");
        self.colors.upload_if_missing(backend, &label, BufferUsage::Vertex);
        let label = self.label("indices");
        self.indices.upload_if_missing(backend, &label, BufferUsage::Index);

        if let Some(uvs) = &mut self.uvs {
            uvs.upload_if_missing(backend, &format!("{} (uvs)", self.name), BufferUsage::Vertex);
        }

        if let Some(tangents) = &mut self.tangents {
            tangents.upload_if_missing(
                backend,
                &format!("{} (tangents)", self.name),
                BufferUsage::Vertex,
            );
        }
    }

    pub fn set_positions(&mut self, backend: &mut dyn RenderBackend, positions: Vec<Vec3>) {
        let label = self.label("positions");
        self.positions
            .replace(backend, &label, BufferUsage::Vertex, positions);
    }

    pub fn set_normals(&mut self, backend: &mut dyn RenderBackend, normals: Vec<Vec3>) {
        let label = self.label("normals");
        self.normals
            .replace(backend, &label, BufferUsage::Vertex, normals);
    }

    pub fn set_colors(&mut self, backend: &mut dyn RenderBackend, colors: Vec<Vec4>) {
        let label = self.label("colors");
        self.colors.replace(backend, &label, BufferUsage::Vertex, colors);
    }

    pub fn set_indices(&mut self, backend: &mut dyn RenderBackend, indices: Vec<u32>) {
        let label = self.label("indices");
        self.indices.replace(backend, &label, BufferUsage::Index, indices);
    }

    pub fn set_uvs(&mut self, backend: &mut dyn RenderBackend, uvs: Vec<Vec2>) {
        let label = self.label("uvs");
        self.uvs
            .get_or_insert_with(|| VertexAttribute::new(Vec::new()))
            .replace(backend, &label, BufferUsage::Vertex, uvs);
    }

    pub fn set_tangents(&mut self, backend: &mut dyn RenderBackend, tangents: Vec<Vec3>) {
        let label = self.label("tangents");
        self.tangents
            .get_or_insert_with(|| VertexAttribute::new(Vec::new()))
            .replace(backend, &label, BufferUsage::Vertex, tangents);
    }

    /// Releases every buffer. The CPU data stays, so the geometry can be uploaded again.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        self.positions.release(backend);
        self.normals.release(backend);
        self.colors.release(backend);
        self.indices.release(backend);

        if let Some(uvs) = &mut self.uvs {
            uvs.release(backend);
        }

        if let Some(tangents) = &mut self.tangents {
            tangents.release(backend);
        }
    }

    /// The buffers to draw with, or `None` while any required buffer is missing.
    pub fn draw_buffers(&self) -> Option<DrawBuffers> {
        Some(DrawBuffers {
            positions: self.positions.buffer()?,
            normals: self.normals.buffer()?,
            uvs: self.uvs.as_ref().and_then(VertexAttribute::buffer),
            colors: self.colors.buffer()?,
            tangents: self.tangents.as_ref().and_then(VertexAttribute::buffer),
            indices: self.indices.buffer()?,
            vertex_count: self.positions.len() as u32,
            index_count: self.indices.len() as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::backend::testing::RecordingBackend;

    fn triangle() -> MeshData {
        MeshData {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z; 3],
            uvs: None,
            colors: vec![Vec4::ONE; 3],
            tangents: None,
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn draw_buffers_require_an_upload() {
        let mut backend = RecordingBackend::new();
        let mut geometry = Geometry::new("triangle", triangle());
        assert!(geometry.draw_buffers().is_none());

        geometry.upload(&mut backend);
        let buffers = geometry.draw_buffers().expect("uploaded");
        assert_eq!(buffers.index_count, 3);
        assert_eq!(buffers.vertex_count, 3);
        assert!(buffers.uvs.is_none());
        assert!(buffers.tangents.is_none());
        assert_eq!(backend.live_buffers.len(), 4);
    }

    #[test]
    fn reassigning_an_array_releases_the_old_buffer_first() {
        let mut backend = RecordingBackend::new();
        let mut geometry = Geometry::new("triangle", triangle());
        geometry.upload(&mut backend);

        let old = geometry.draw_buffers().unwrap().positions;
        geometry.set_positions(&mut backend, vec![Vec3::ZERO, Vec3::Y, Vec3::Z]);
        let new = geometry.draw_buffers().unwrap().positions;

        assert_ne!(old, new);
        assert_eq!(backend.released_buffers, vec![old]);
        assert_eq!(backend.live_buffers.len(), 4);
        assert_eq!(geometry.positions()[2], Vec3::Z);
    }

    #[test]
    fn setting_tangents_adds_a_buffer() {
        let mut backend = RecordingBackend::new();
        let mut geometry = Geometry::new("triangle", triangle());
        geometry.upload(&mut backend);

        geometry.set_tangents(&mut backend, vec![Vec3::X; 3]);
        assert!(geometry.draw_buffers().unwrap().tangents.is_some());
        assert_eq!(backend.live_buffers.len(), 5);
    }

    #[test]
    fn every_array_can_be_reassigned() {
        let mut backend = RecordingBackend::new();
        let mut geometry = Geometry::new("triangle", triangle());
        geometry.upload(&mut backend);

        geometry.set_normals(&mut backend, vec![-Vec3::Z; 3]);
        geometry.set_colors(&mut backend, vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 3]);
        geometry.set_indices(&mut backend, vec![0, 2, 1]);
        geometry.set_uvs(&mut backend, vec![Vec2::ZERO, Vec2::X, Vec2::Y]);

        assert_eq!(backend.released_buffers.len(), 3);
        assert_eq!(backend.live_buffers.len(), 5);
        assert_eq!(geometry.indices(), &[0, 2, 1]);
        assert_eq!(geometry.normals()[0], -Vec3::Z);
        assert_eq!(geometry.colors()[1].y, 0.0);
        assert!(geometry.draw_buffers().unwrap().uvs.is_some());
    }

    #[test]
    fn geometries_from_one_mesh_own_separate_buffers() {
        let mut backend = RecordingBackend::new();
        let mesh = triangle();
        let mut first = Geometry::new("first", mesh.clone());
        let mut second = Geometry::new("second", mesh);
        first.upload(&mut backend);
        second.upload(&mut backend);

        first.release(&mut backend);

        assert_eq!(backend.live_buffers.len(), 4);
        assert!(second.draw_buffers().is_some());
        assert!(first.draw_buffers().is_none());
    }

    #[test]
    fn release_frees_everything() {
        let mut backend = RecordingBackend::new();
        let mut mesh = triangle();
        mesh.uvs = Some(vec![Vec2::ZERO; 3]);
        mesh.tangents = Some(vec![Vec3::X; 3]);
        let mut geometry = Geometry::new("triangle", mesh);

        geometry.upload(&mut backend);
        assert_eq!(backend.live_buffers.len(), 6);

        geometry.release(&mut backend);
        assert!(backend.live_buffers.is_empty());
        assert!(geometry.draw_buffers().is_none());
    }
}
