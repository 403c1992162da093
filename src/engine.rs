use crate::{demo::DemoState, rendering::renderer::Renderer, ui};

/// One frame of simulation: animations, camera, world matrices, then the panel.
pub fn update(
    state: &mut DemoState,
    renderer: &mut Renderer,
    ui: &mut imgui::Ui,
) -> anyhow::Result<()> {
    let now = state.now_ms();

    state.scene.early_update(now);
    state.arcball.update(now, &state.input);
    state.scene.late_update();

    ui::draw_panel(ui, state, renderer.last_draw_count());

    Ok(())
}
