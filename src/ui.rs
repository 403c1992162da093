use glam::{Mat4, Vec3};
use imgui::Condition;
use itertools::Itertools;

use crate::{config::RenderMode, demo::DemoState};

const HELP: &str = "\
Left drag: rotate around the target
Right drag: pan
Wheel: zoom
W/S: forward/back, A/D: left/right, R/F: up/down";

fn format_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

/// Rows of a matrix, one line each.
fn format_matrix(matrix: &Mat4) -> String {
    (0..4)
        .map(|row| {
            matrix
                .row(row)
                .to_array()
                .iter()
                .map(|value| format!("{:8.3}", value))
                .join(" ")
        })
        .join("\n")
}

fn color_edit(ui: &imgui::Ui, label: &str, color: &mut Vec3) {
    let mut rgb = color.to_array();
    if ui.color_edit3(label, &mut rgb) {
        *color = Vec3::from_array(rgb);
    }
}

/// The parameter panel. Edits go straight into `state.params`.
pub fn draw_panel(ui: &imgui::Ui, state: &mut DemoState, draw_count: usize) {
    ui.window("Parameters")
        .size([360.0, 440.0], Condition::FirstUseEver)
        .position([10.0, 10.0], Condition::FirstUseEver)
        .build(|| {
            let Some(_tab_bar) = ui.tab_bar("parameter tabs") else {
                return;
            };

            if let Some(_tab) = ui.tab_item("3D Object") {
                let params = &mut state.params;

                ui.text("Render mode");
                ui.radio_button("Filled", &mut params.render_mode, RenderMode::Filled);
                ui.same_line();
                ui.radio_button("Wireframe", &mut params.render_mode, RenderMode::Wireframe);

                ui.separator();
                ui.checkbox("Color map", &mut params.show_color_map);
                ui.checkbox("Specular map", &mut params.show_specular_map);
                ui.checkbox("Normal map", &mut params.show_normal_map);

                ui.separator();
                let arcball = &state.arcball;
                ui.text(format!("Camera position {}", format_vec3(arcball.position())));
                ui.text(format!("Target          {}", format_vec3(arcball.target())));
                ui.text(format!("Distance        {:.2}", arcball.camera.distance()));
                ui.text(format!(
                    "{} models, {} draws, {:.0} fps",
                    state.scene.model_count(),
                    draw_count,
                    ui.io().framerate
                ));

                if ui.collapsing_header("Camera matrix", imgui::TreeNodeFlags::empty()) {
                    ui.text(format_matrix(&arcball.model_matrix()));
                }

                ui.separator();
                ui.text_wrapped(HELP);
            }

            if let Some(_tab) = ui.tab_item("Lighting") {
                let params = &mut state.params;

                ui.slider("Light X", -50.0, 50.0, &mut params.light_position.x);
                ui.slider("Light Y", -50.0, 50.0, &mut params.light_position.y);
                ui.slider("Light intensity", 0.0, 5.0, &mut params.light_intensity);
                ui.slider("Specular exponent", 1.0, 2000.0, &mut params.specular_intensity);

                color_edit(ui, "Ambient", &mut params.ambient_color);
                color_edit(ui, "Diffuse", &mut params.diffuse_color);
                color_edit(ui, "Specular", &mut params.specular_color);
            }
        });
}
