use glam::Mat4;
use log::trace;

use crate::camera::Camera;
use crate::config::PanelParams;
use crate::rendering::backend::{DrawMaterial, MatrixUniform, RenderBackend};
use crate::scene_graph::Scene;

/// The matrix that takes normals to view space for a given model-view.
pub fn normal_matrix(view: Mat4, model: Mat4) -> Mat4 {
    (view * model).inverse().transpose()
}

/// Applies the panel's map toggles. Disabled maps fall back to the backend defaults,
/// except specular which goes black.
pub fn apply_map_toggles(material: &mut DrawMaterial, params: &PanelParams) {
    if !params.show_color_map {
        material.color_map = None;
    }
    if !params.show_specular_map {
        material.specular_map = None;
        material.specular_scale = 0.0;
    }
    if !params.show_normal_map {
        material.normal_map = None;
    }
}

/// Issues one draw per (mesh node, instance) of every model. Returns the draw count.
///
/// Nodes whose geometry has not been uploaded are skipped.
pub fn draw_scene(
    scene: &Scene,
    camera: &Camera,
    params: &PanelParams,
    backend: &mut dyn RenderBackend,
) -> usize {
    let view = camera.view_matrix;
    backend.set_uniform_matrix4(MatrixUniform::View, view);
    backend.set_uniform_matrix4(MatrixUniform::Projection, camera.projection_matrix);
    backend.set_lighting(&params.lighting(camera.position));

    let primitive = params.render_mode.primitive();
    let mut draws = 0;

    for scene_model in scene.models() {
        let model = &scene_model.model;
        let instances: Vec<Mat4> = scene_model.instance_matrices().collect();

        for (id, node) in model.mesh_nodes() {
            let Some(buffers) = node.geometry().and_then(|geometry| geometry.draw_buffers())
            else {
                trace!("Skipping {} in {}: not uploaded", node.name, model.name());
                continue;
            };

            let mut material = node
                .material
                .and_then(|material_id| model.material(material_id))
                .map(|material| material.draw_material())
                .unwrap_or_default();
            apply_map_toggles(&mut material, params);

            let world = model.world_matrix(id);

            for instance in &instances {
                let model_matrix = *instance * world;
                backend.set_uniform_matrix4(MatrixUniform::Model, model_matrix);
                backend.set_uniform_matrix4(
                    MatrixUniform::Normal,
                    normal_matrix(view, model_matrix),
                );
                backend.draw_indexed(primitive, &buffers, &material);
                draws += 1;
            }
        }
    }

    draws
}
