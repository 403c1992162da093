use std::{sync::Arc, time::Instant};

use anyhow::Context;
use glam::Vec2;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, Event, MouseScrollDelta, WindowEvent},
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::Window,
};

use crate::{config::AppConfig, demo::DemoState, engine, rendering::renderer::Renderer};

/// Pixels of trackpad scrolling that count as one wheel notch.
const PIXELS_PER_LINE: f64 = 40.0;

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct App {
    renderer: Option<Renderer>,
    demo_state: DemoState,
    imgui: Option<ImguiState>,
    last_frame: Instant,
}

impl App {
    fn from_demo_state(demo_state: DemoState) -> Self {
        Self {
            renderer: None,
            demo_state,
            imgui: None,
            last_frame: Instant::now(),
        }
    }

    fn setup_imgui(&mut self, window: &Window) {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = 14.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        // The published imgui-rs can't be trusted with the ini file.
        context.set_ini_filename(None);

        self.imgui = Some(ImguiState { context, platform });
    }

    fn create_renderer(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
    ) -> anyhow::Result<()> {
        let config = &self.demo_state.config;
        let (width, height) = config.window_size;
        let window_attributes = Window::default_attributes()
            .with_title(config.window_title.clone())
            .with_inner_size(PhysicalSize::new(width, height));
        let window = event_loop
            .create_window(window_attributes)
            .context("Failed to create window")?;

        self.setup_imgui(&window);
        let imgui = self
            .imgui
            .as_mut()
            .context("imgui was not initialized")?;

        let mut renderer = pollster::block_on(Renderer::new(
            Arc::new(window),
            &self.demo_state.config,
            &mut imgui.context,
        ))?;

        let size = renderer.size;
        self.demo_state.arcball.set_viewport(size.width, size.height);
        self.demo_state.load_models(renderer.backend_mut());
        renderer.window.request_redraw();

        self.renderer = Some(renderer);
        Ok(())
    }

    /// Routes input to the camera unless imgui is using it.
    fn handle_input(&mut self, event: &WindowEvent) {
        let Some(imgui) = self.imgui.as_ref() else {
            return;
        };
        let io = imgui.context.io();
        let state = &mut self.demo_state;

        match event {
            WindowEvent::KeyboardInput { event, .. } if !io.want_capture_keyboard => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => state.input.key_down(key),
                    ElementState::Released => state.input.key_up(key),
                };
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button,
                ..
            } if !io.want_capture_mouse => state.input.mouse_down(*button),
            // Releases always go through so a drag never gets stuck.
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button,
                ..
            } => state.input.mouse_up(*button),
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if io.want_capture_mouse {
                    state.input.last_cursor = Some(position);
                } else {
                    state.input.cursor_moved(position, &mut state.arcball);
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !io.want_capture_mouse => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_LINE) as f32,
                };
                state.arcball.zoom(notches);
            }
            WindowEvent::Focused(false) => state.input.on_focus_lost(),
            _ => (),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        if let Err(e) = self.create_renderer(event_loop) {
            error!("Failed to start renderer: {:?}", e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        self.handle_input(&event);

        let (Some(imgui), Some(renderer)) = (self.imgui.as_mut(), self.renderer.as_mut()) else {
            return;
        };

        match &event {
            WindowEvent::CloseRequested => {
                info!("Closing");
                self.demo_state.scene.unload_all(renderer.backend_mut());
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                renderer.resize(*new_size);
                self.demo_state
                    .arcball
                    .set_viewport(new_size.width, new_size.height);
            }
            WindowEvent::RedrawRequested => {
                let delta_time = self.last_frame.elapsed();
                self.last_frame = Instant::now();
                imgui.context.io_mut().update_delta_time(delta_time);

                renderer.window.request_redraw();

                if let Err(e) = imgui
                    .platform
                    .prepare_frame(imgui.context.io_mut(), &renderer.window)
                {
                    warn!("Failed to prepare imgui frame: {}", e);
                    return;
                }

                let ui = imgui.context.new_frame();

                if let Err(e) = engine::update(&mut self.demo_state, renderer, ui) {
                    error!("Error during engine::update: {:?}", e);
                }

                imgui.platform.prepare_render(ui, &renderer.window);

                match renderer.render(&self.demo_state) {
                    Ok(frame) => {
                        renderer.finish_frame(frame, &mut imgui.context);
                    }
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.resize(renderer.size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("Out of memory");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        warn!("Timeout");
                    }
                    Err(other) => {
                        error!("Unexpected error: {:?}", other);
                    }
                }
            }
            _ => (),
        }

        imgui.platform.handle_event::<()>(
            imgui.context.io_mut(),
            &renderer.window,
            &Event::WindowEvent { window_id, event },
        );
    }
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let demo_state = DemoState::new(config).context("Failed to create demo state")?;
    let mut app = App::from_demo_state(demo_state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
