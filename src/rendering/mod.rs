pub mod backend;
pub mod config;
pub mod draw_pass;
pub mod imgui_renderer;
pub mod passes;
pub mod render_common;
pub mod renderer;
pub mod shader_loader;
pub mod texture;
pub mod wgpu_backend;
