use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::asset_pipeline::description::{
    MaterialDescription, MeshDescription, NodeDescription, SceneDescription, TextureReference,
};
use crate::asset_pipeline::generate_tangents::generate_tangents;
use crate::asset_pipeline::materials::{
    map_texture_semantic, Material, SemanticMapping, TextureSlot,
};
use crate::asset_pipeline::texture::DecodedTexture;
use crate::error::ImportError;
use crate::math::trs;
use crate::rendering::backend::TextureKind;
use crate::scene_graph::geometry::{Geometry, MeshData};
use crate::scene_graph::model::{MaterialId, Model};
use crate::scene_graph::node::SceneNode;

/// The file format the description was converted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Obj,
    Fbx,
    Other,
}

impl SourceFormat {
    /// Reads the format from `chair.obj.assjson` style names, or from the extension itself.
    pub fn from_path(path: &Path) -> Self {
        let extension = |path: &Path| {
            path.extension()
                .and_then(|extension| extension.to_str())
                .map(str::to_ascii_lowercase)
        };

        let mut format = extension(path);
        if matches!(format.as_deref(), Some("json" | "assjson")) {
            format = path
                .file_stem()
                .map(Path::new)
                .and_then(|stem| extension(stem));
        }

        match format.as_deref() {
            Some("obj") => Self::Obj,
            Some("fbx") => Self::Fbx,
            _ => Self::Other,
        }
    }
}

/// Where a model comes from.
#[derive(Debug, Clone)]
pub struct ModelSource {
    pub name: String,
    pub description_path: PathBuf,
    pub format: SourceFormat,
}

impl ModelSource {
    pub fn new(name: impl Into<String>, description_path: impl Into<PathBuf>) -> Self {
        let description_path = description_path.into();
        Self {
            name: name.into(),
            format: SourceFormat::from_path(&description_path),
            description_path,
        }
    }

    /// Texture paths in the description are relative to this directory.
    pub fn directory(&self) -> &Path {
        self.description_path.parent().unwrap_or(Path::new("."))
    }
}

/// Runs every CPU stage of the import. The result still has to be uploaded.
pub fn import_model(source: &ModelSource) -> Result<Model, ImportError> {
    info!(
        "Loading model {} from {}",
        source.name,
        source.description_path.display()
    );

    let description = read_description(&source.description_path)?;
    let model = build_model(source, &description)?;

    info!(
        "Loaded model {}: {} nodes, {} materials",
        source.name,
        model.node_count(),
        model.materials().len()
    );

    Ok(model)
}

pub fn read_description(path: &Path) -> Result<SceneDescription, ImportError> {
    let json = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_description(&json)
}

pub fn parse_description(json: &str) -> Result<SceneDescription, ImportError> {
    Ok(serde_json::from_str(json)?)
}

pub fn build_model(
    source: &ModelSource,
    description: &SceneDescription,
) -> Result<Model, ImportError> {
    let embedded = decode_embedded_textures(description);
    let materials = resolve_materials(description, &embedded, source)?;
    let mut meshes = convert_meshes(description)?;
    generate_mesh_tangents(&mut meshes);
    build_node_tree(&source.name, description, materials, &meshes)
}

/// Decodes every embedded texture once. Failures are logged and leave `None`.
pub fn decode_embedded_textures(
    description: &SceneDescription,
) -> Vec<Option<Arc<DecodedTexture>>> {
    description
        .textures
        .par_iter()
        .enumerate()
        .map(|(index, texture)| {
            match DecodedTexture::from_embedded(index, texture.width, texture.height, &texture.data)
            {
                Ok(decoded) => Some(Arc::new(decoded)),
                Err(err) => {
                    warn!("Using a placeholder for embedded texture {index}: {err}");
                    None
                }
            }
        })
        .collect()
}

enum PendingTexture {
    Ready(Option<Arc<DecodedTexture>>),
    File(PathBuf),
}

/// Resolves materials in description order. Unnamed materials resolve to `None`.
pub fn resolve_materials(
    description: &SceneDescription,
    embedded: &[Option<Arc<DecodedTexture>>],
    source: &ModelSource,
) -> Result<Vec<Option<Material>>, ImportError> {
    let mut pending = Vec::with_capacity(description.materials.len());

    for (index, material) in description.materials.iter().enumerate() {
        let Some(name) = material.name() else {
            debug!("Skipping unnamed material {index} of {}", source.name);
            pending.push(None);
            continue;
        };

        let slots = collect_texture_slots(name, material, embedded, source)?;
        pending.push(Some((name, material, slots)));
    }

    // External files are decoded independently per reference.
    let resolved: Vec<Option<Material>> = pending
        .into_par_iter()
        .map(|entry| {
            entry.map(|(name, properties, slots)| {
                let mut material = Material::new(name);
                if let Some([r, g, b]) = properties.diffuse_color() {
                    material.diffuse_color = Vec3::new(r, g, b);
                }

                for (kind, texture) in slots {
                    let texture = match texture {
                        PendingTexture::Ready(texture) => texture,
                        PendingTexture::File(path) => match DecodedTexture::from_file(&path) {
                            Ok(decoded) => Some(Arc::new(decoded)),
                            Err(err) => {
                                warn!("Using a placeholder {kind:?} map for {name}: {err}");
                                None
                            }
                        },
                    };

                    if let Some(texture) = texture {
                        *material.slot_mut(kind) = TextureSlot::new(texture);
                    }
                }

                if source.format == SourceFormat::Obj
                    && material.normal_map.is_empty()
                    && !material.height_map.is_empty()
                {
                    // OBJ exporters write normal maps as bump maps.
                    material.normal_map = material.height_map.clone();
                }

                material
            })
        })
        .collect();

    Ok(resolved)
}

fn collect_texture_slots(
    name: &str,
    material: &MaterialDescription,
    embedded: &[Option<Arc<DecodedTexture>>],
    source: &ModelSource,
) -> Result<Vec<(TextureKind, PendingTexture)>, ImportError> {
    let mut slots: Vec<(TextureKind, PendingTexture)> = Vec::new();

    for (semantic, value) in material.texture_references() {
        let kind = match map_texture_semantic(semantic) {
            SemanticMapping::Slot(kind) => kind,
            SemanticMapping::Ignored => {
                debug!("Material {name}: ignoring texture {value} with semantic {semantic}");
                continue;
            }
            SemanticMapping::Unknown => {
                return Err(ImportError::InvalidTextureSemantic {
                    material: name.to_string(),
                    semantic,
                })
            }
        };

        if slots.iter().any(|(existing, _)| *existing == kind) {
            debug!("Material {name}: {kind:?} map already set, ignoring {value}");
            continue;
        }

        let pending = match TextureReference::parse(value) {
            TextureReference::Embedded(index) => {
                let texture = embedded.get(index).ok_or_else(|| {
                    ImportError::EmbeddedTextureOutOfRange {
                        material: name.to_string(),
                        index,
                        count: embedded.len(),
                    }
                })?;
                PendingTexture::Ready(texture.clone())
            }
            TextureReference::File(path) => PendingTexture::File(source.directory().join(path)),
        };

        slots.push((kind, pending));
    }

    Ok(slots)
}

/// Validates and converts every mesh of the description, in parallel.
pub fn convert_meshes(description: &SceneDescription) -> Result<Vec<MeshData>, ImportError> {
    let material_count = description.materials.len();

    description
        .meshes
        .par_iter()
        .enumerate()
        .map(|(index, mesh)| convert_mesh(index, mesh, material_count))
        .collect()
}

fn convert_mesh(
    index: usize,
    mesh: &MeshDescription,
    material_count: usize,
) -> Result<MeshData, ImportError> {
    let name = mesh.display_name(index);

    if mesh.materialindex >= material_count {
        return Err(ImportError::MaterialIndexOutOfRange {
            mesh: name,
            index: mesh.materialindex,
            count: material_count,
        });
    }

    let positions = read_vec3s(&name, "vertices", &mesh.vertices, None)?;
    let vertex_count = positions.len();

    let mut indices = Vec::with_capacity(mesh.faces.len() * 3);
    for (face_index, face) in mesh.faces.iter().enumerate() {
        if face.len() != 3 {
            return Err(ImportError::NonTriangleFace {
                mesh: name,
                face: face_index,
                count: face.len(),
            });
        }
        if let Some(&bad) = face.iter().find(|&&index| index as usize >= vertex_count) {
            return Err(ImportError::FaceIndexOutOfRange {
                mesh: name,
                face: face_index,
                index: bad,
                count: vertex_count,
            });
        }
        indices.extend_from_slice(face);
    }

    let normals = if mesh.normals.is_empty() {
        debug!("Mesh {name} has no normals, generating smooth ones");
        smooth_normals(&positions, &indices)
    } else {
        read_vec3s(&name, "normals", &mesh.normals, Some(vertex_count))?
    };

    let uvs = match mesh.texturecoords.first().filter(|set| !set.is_empty()) {
        Some(set) => {
            let components = mesh.numuvcomponents.first().copied().unwrap_or(2).max(2);
            check_length(&name, "texturecoords", vertex_count * components, set.len())?;
            Some(
                set.chunks_exact(components)
                    .map(|uv| Vec2::new(uv[0], uv[1]))
                    .collect(),
            )
        }
        None => None,
    };

    let colors = match mesh.colors.first().filter(|set| !set.is_empty()) {
        Some(set) => {
            check_length(&name, "colors", vertex_count * 4, set.len())?;
            set.chunks_exact(4).map(Vec4::from_slice).collect()
        }
        None => vec![Vec4::ONE; vertex_count],
    };

    Ok(MeshData {
        positions,
        normals,
        uvs,
        colors,
        tangents: None,
        indices,
    })
}

fn check_length(
    mesh: &str,
    attribute: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), ImportError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ImportError::AttributeLength {
            mesh: mesh.to_string(),
            attribute,
            expected,
            actual,
        })
    }
}

fn read_vec3s(
    mesh: &str,
    attribute: &'static str,
    values: &[f32],
    vertex_count: Option<usize>,
) -> Result<Vec<Vec3>, ImportError> {
    let expected = vertex_count.map_or(values.len() - values.len() % 3, |count| count * 3);
    check_length(mesh, attribute, expected, values.len())?;
    Ok(values.chunks_exact(3).map(Vec3::from_slice).collect())
}

fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for face in indices.chunks_exact(3) {
        let [a, b, c] = [face[0] as usize, face[1] as usize, face[2] as usize];
        let normal = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += normal;
        normals[b] += normal;
        normals[c] += normal;
    }
    normals
        .into_iter()
        .map(|normal| normal.try_normalize().unwrap_or(Vec3::Z))
        .collect()
}

/// Fills in tangents for every mesh that has texture coordinates.
pub fn generate_mesh_tangents(meshes: &mut [MeshData]) {
    meshes.par_iter_mut().for_each(|mesh| {
        if let Some(uvs) = &mesh.uvs {
            let output = generate_tangents(&mesh.positions, uvs, &mesh.indices);
            mesh.tangents = Some(output.tangents);
        }
    });
}

/// Creates one leaf under the model root per (description node, mesh) pair.
pub fn build_node_tree(
    name: &str,
    description: &SceneDescription,
    materials: Vec<Option<Material>>,
    meshes: &[MeshData],
) -> Result<Model, ImportError> {
    let mut model = Model::new(name);

    let material_ids: Vec<Option<MaterialId>> = materials
        .into_iter()
        .map(|material| material.map(|material| model.add_material(material)))
        .collect();

    let mut builder = TreeBuilder {
        model: &mut model,
        description,
        material_ids: &material_ids,
        meshes,
    };
    builder.visit(&description.rootnode, Mat4::IDENTITY)?;

    model.update_transforms();
    Ok(model)
}

struct TreeBuilder<'a> {
    model: &'a mut Model,
    description: &'a SceneDescription,
    material_ids: &'a [Option<MaterialId>],
    meshes: &'a [MeshData],
}

impl TreeBuilder<'_> {
    fn visit(&mut self, node: &NodeDescription, parent: Mat4) -> Result<(), ImportError> {
        let accumulated = parent * trs::mat4_from_row_major(&node.transformation);

        for &mesh_index in &node.meshes {
            let (Some(mesh), Some(data)) = (
                self.description.meshes.get(mesh_index),
                self.meshes.get(mesh_index),
            ) else {
                return Err(ImportError::MeshIndexOutOfRange {
                    node: node.name.clone(),
                    index: mesh_index,
                    count: self.description.meshes.len(),
                });
            };

            let mesh_name = mesh.display_name(mesh_index);
            let material = self.material_ids.get(mesh.materialindex).copied().flatten();
            let leaf = SceneNode::new(mesh_name.clone())
                .with_geometry(Geometry::new(mesh_name, data.clone()), material);

            let root = self.model.root();
            let leaf_id = self.model.add_node(root, leaf);
            self.model.set_world_matrix(leaf_id, accumulated);
        }

        for child in &node.children {
            self.visit(child, accumulated)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_pipeline::texture::tests::tiny_png_base64;
    use serde_json::{json, Value};

    fn cube_mesh(material: usize) -> Value {
        let vertices: Vec<f32> = (0..8)
            .flat_map(|i| {
                [
                    if i & 1 == 0 { -1.0 } else { 1.0 },
                    if i & 2 == 0 { -1.0 } else { 1.0 },
                    if i & 4 == 0 { -1.0 } else { 1.0 },
                ]
            })
            .collect();
        let normals: Vec<f32> = vertices
            .chunks(3)
            .flat_map(|v| {
                let n = Vec3::from_slice(v).normalize();
                [n.x, n.y, n.z]
            })
            .collect();
        let uvs: Vec<f32> = (0..8)
            .flat_map(|i| {
                let v = ((i >> 1) & 1) as f32 * 0.5 + ((i >> 2) & 1) as f32 * 0.25;
                [(i & 1) as f32, v]
            })
            .collect();
        let faces = json!([
            [0, 2, 1], [1, 2, 3], [4, 5, 6], [5, 7, 6],
            [0, 1, 4], [1, 5, 4], [2, 6, 3], [3, 6, 7],
            [0, 4, 2], [2, 4, 6], [1, 3, 5], [3, 7, 5]
        ]);

        json!({
            "name": "cube",
            "materialindex": material,
            "vertices": vertices,
            "normals": normals,
            "numuvcomponents": [2],
            "texturecoords": [uvs],
            "faces": faces
        })
    }

    fn material(name: &str, extra: Value) -> Value {
        let mut properties = vec![
            json!({ "key": "?mat.name", "semantic": 0, "index": 0, "type": 3, "value": name }),
            json!({ "key": "$clr.diffuse", "semantic": 0, "index": 0, "type": 1, "value": [0.8, 0.4, 0.2] }),
        ];
        if let Value::Array(extra) = extra {
            properties.extend(extra);
        }
        json!({ "properties": properties })
    }

    fn texture_property(semantic: i64, value: &str) -> Value {
        json!({ "key": "$tex.file", "semantic": semantic, "index": 0, "type": 3, "value": value })
    }

    fn identity() -> Vec<f32> {
        Mat4::IDENTITY.to_cols_array().to_vec()
    }

    fn import(description: Value, path: &str) -> Result<Model, ImportError> {
        let description = parse_description(&description.to_string())?;
        build_model(&ModelSource::new("test", path), &description)
    }

    #[test]
    fn cube_imports_to_one_leaf() {
        let model = import(
            json!({
                "rootnode": { "name": "root", "transformation": identity(), "meshes": [0] },
                "meshes": [cube_mesh(0)],
                "materials": [material("box", json!([]))]
            }),
            "cube.fbx.assjson",
        )
        .unwrap();

        let root = model.root();
        assert_eq!(model.children(root).len(), 1);

        let leaf = model.node(model.children(root)[0]).unwrap();
        let geometry = leaf.geometry().unwrap();
        assert_eq!(geometry.indices().len(), 36);
        assert_eq!(geometry.vertex_count(), 8);

        let tangents = geometry.tangents().unwrap();
        assert_eq!(tangents.len(), 8);
        assert!(tangents.iter().all(|t| (t.length() - 1.0).abs() < 1e-4));
        assert!(geometry.colors().iter().all(|c| *c == Vec4::ONE));

        let material = model.material(leaf.material.unwrap()).unwrap();
        assert!(material.diffuse_color.abs_diff_eq(Vec3::new(0.8, 0.4, 0.2), 1e-6));
        assert!(model
            .world_matrix(model.children(root)[0])
            .abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn mirrored_node_transforms_survive_import() {
        let mirrored = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0))
            * Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0));
        let model = import(
            json!({
                "rootnode": {
                    "name": "root",
                    "transformation": mirrored.transpose().to_cols_array(),
                    "meshes": [0]
                },
                "meshes": [cube_mesh(0)],
                "materials": [material("box", json!([]))]
            }),
            "mirror.fbx.assjson",
        )
        .unwrap();

        let leaf = model.children(model.root())[0];
        assert!(model.world_matrix(leaf).abs_diff_eq(mirrored, 1e-5));
        assert!(model.world_matrix(leaf).determinant() < 0.0);
    }

    #[test]
    fn meshes_of_one_node_become_siblings_with_the_same_transform() {
        let offset = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let model = import(
            json!({
                "rootnode": {
                    "name": "root",
                    "transformation": offset.transpose().to_cols_array(),
                    "children": [{
                        "name": "pair",
                        "transformation":
                            Mat4::from_rotation_y(0.5).transpose().to_cols_array(),
                        "meshes": [0, 1]
                    }]
                },
                "meshes": [cube_mesh(0), cube_mesh(0)],
                "materials": [material("box", json!([]))]
            }),
            "pair.obj.assjson",
        )
        .unwrap();

        let leaves = model.children(model.root());
        assert_eq!(leaves.len(), 2);

        let expected = offset * Mat4::from_rotation_y(0.5);
        for leaf in leaves {
            assert!(model.world_matrix(*leaf).abs_diff_eq(expected, 1e-5));
            assert_eq!(model.node(*leaf).unwrap().parent_id(), Some(model.root()));
        }
        // Both leaves share the one material.
        assert_eq!(
            model.node(leaves[0]).unwrap().material,
            model.node(leaves[1]).unwrap().material
        );
    }

    #[test]
    fn leaves_follow_depth_first_order() {
        let model = import(
            json!({
                "rootnode": {
                    "name": "root",
                    "children": [
                        { "name": "a", "meshes": [0], "children": [{ "name": "a1", "meshes": [1] }] },
                        { "name": "b", "meshes": [2] }
                    ]
                },
                "meshes": [
                    { "name": "m0", "vertices": [], "faces": [] },
                    { "name": "m1", "vertices": [], "faces": [] },
                    { "name": "m2", "vertices": [], "faces": [] }
                ],
                "materials": [material("x", json!([]))]
            }),
            "order.assjson",
        )
        .unwrap();

        let names: Vec<&str> = model
            .children(model.root())
            .iter()
            .map(|id| model.node(*id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn out_of_range_indices_fail_the_whole_model() {
        let bad_mesh = import(
            json!({
                "rootnode": { "name": "root", "meshes": [3] },
                "meshes": [cube_mesh(0)],
                "materials": [material("box", json!([]))]
            }),
            "bad.assjson",
        );
        assert!(matches!(bad_mesh, Err(ImportError::MeshIndexOutOfRange { index: 3, .. })));

        let bad_material = import(
            json!({
                "rootnode": { "name": "root", "meshes": [0] },
                "meshes": [cube_mesh(4)],
                "materials": [material("box", json!([]))]
            }),
            "bad.assjson",
        );
        assert!(matches!(
            bad_material,
            Err(ImportError::MaterialIndexOutOfRange { index: 4, count: 1, .. })
        ));

        let bad_face = import(
            json!({
                "rootnode": { "name": "root", "meshes": [0] },
                "meshes": [{ "vertices": [0, 0, 0, 1, 0, 0], "faces": [[0, 1, 2]] }],
                "materials": [material("box", json!([]))]
            }),
            "bad.assjson",
        );
        assert!(matches!(bad_face, Err(ImportError::FaceIndexOutOfRange { index: 2, .. })));

        let bad_embedded = import(
            json!({
                "rootnode": { "name": "root" },
                "materials": [material("box", json!([texture_property(1, "*1")]))]
            }),
            "bad.assjson",
        );
        assert!(matches!(
            bad_embedded,
            Err(ImportError::EmbeddedTextureOutOfRange { index: 1, count: 0, .. })
        ));
    }

    #[test]
    fn unknown_semantics_fail_and_known_ones_are_skipped() {
        let unknown = import(
            json!({
                "rootnode": { "name": "root" },
                "materials": [material("box", json!([texture_property(42, "a.png")]))]
            }),
            "bad.assjson",
        );
        assert!(matches!(
            unknown,
            Err(ImportError::InvalidTextureSemantic { semantic: 42, .. })
        ));

        let skipped = import(
            json!({
                "rootnode": { "name": "root" },
                "materials": [material("box", json!([texture_property(3, "ambient.png")]))]
            }),
            "ok.assjson",
        )
        .unwrap();
        assert!(skipped.materials()[0].color_map.is_empty());
    }

    #[test]
    fn embedded_textures_are_decoded_once_and_shared() {
        let model = import(
            json!({
                "rootnode": { "name": "root" },
                "materials": [
                    material("a", json!([texture_property(1, "*0")])),
                    material("b", json!([texture_property(1, "*0"), texture_property(2, "*0")]))
                ],
                "textures": [{ "width": 0, "height": 0, "formathint": "png", "data": tiny_png_base64() }]
            }),
            "shared.fbx.assjson",
        )
        .unwrap();

        let a = model.materials()[0].color_map.texture().unwrap();
        let b = model.materials()[1].color_map.texture().unwrap();
        let b_specular = model.materials()[1].specular_map.texture().unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert!(Arc::ptr_eq(a, b_specular));
    }

    #[test]
    fn missing_texture_files_degrade_to_placeholders() {
        let model = import(
            json!({
                "rootnode": { "name": "root" },
                "materials": [material("box", json!([texture_property(1, "no/such/file.png")]))]
            }),
            "/nonexistent/model/box.obj.assjson",
        )
        .unwrap();

        assert!(model.materials()[0].color_map.is_empty());
    }

    #[test]
    fn obj_height_maps_double_as_normal_maps() {
        let description = json!({
            "rootnode": { "name": "root" },
            "materials": [material("bumpy", json!([texture_property(5, "*0")]))],
            "textures": [{ "width": 0, "height": 0, "formathint": "png", "data": tiny_png_base64() }]
        });

        let obj = import(description.clone(), "bumpy.obj.assjson").unwrap();
        let material = &obj.materials()[0];
        assert!(Arc::ptr_eq(
            material.normal_map.texture().unwrap(),
            material.height_map.texture().unwrap()
        ));

        let fbx = import(description, "bumpy.fbx.assjson").unwrap();
        assert!(fbx.materials()[0].normal_map.is_empty());
    }

    #[test]
    fn meshes_without_uvs_get_no_tangents() {
        let model = import(
            json!({
                "rootnode": { "name": "root", "meshes": [0] },
                "meshes": [{
                    "name": "flat",
                    "vertices": [0, 0, 0, 1, 0, 0, 0, 1, 0],
                    "faces": [[0, 1, 2]],
                    "colors": [[1, 0, 0, 1, 0, 1, 0, 1, 0, 0, 1, 1]]
                }],
                "materials": [{ "properties": [] }]
            }),
            "flat.assjson",
        )
        .unwrap();

        let leaf = model.node(model.children(model.root())[0]).unwrap();
        let geometry = leaf.geometry().unwrap();
        assert!(geometry.tangents().is_none());
        assert!(geometry.normals().iter().all(|n| n.abs_diff_eq(Vec3::Z, 1e-6)));
        assert_eq!(geometry.colors()[1], Vec4::new(0.0, 1.0, 0.0, 1.0));
        // The only material has no name, so the leaf renders with the default one.
        assert_eq!(leaf.material, None);
    }

    #[test]
    fn source_format_comes_from_the_converted_file_name() {
        assert_eq!(SourceFormat::from_path(Path::new("a/chair.obj.assjson")), SourceFormat::Obj);
        assert_eq!(SourceFormat::from_path(Path::new("D20.FBX.json")), SourceFormat::Fbx);
        assert_eq!(SourceFormat::from_path(Path::new("table.obj")), SourceFormat::Obj);
        assert_eq!(SourceFormat::from_path(Path::new("scene.assjson")), SourceFormat::Other);
    }
}
