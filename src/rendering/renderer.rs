use std::sync::Arc;

use anyhow::Context;
use log::{error, info};
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    config::AppConfig,
    demo::DemoState,
    rendering::{
        draw_pass::draw_scene,
        imgui_renderer::ImguiRenderer,
        passes::{
            mesh_pass::MeshPass, skybox_pass::SkyboxPass, Pass, PassCreationContext,
            PassTextureViews,
        },
        render_common::RenderCommon,
        shader_loader::{PipelineCacheBuilder, ShaderLoader},
        texture::DepthTexture,
        wgpu_backend::WgpuBackend,
    },
};

/// A frame whose scene passes are encoded but which has not been presented yet.
pub struct PendingFrame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    backend: WgpuBackend,

    shader_loader: ShaderLoader,
    imgui_renderer: ImguiRenderer,

    skybox_pass: SkyboxPass,
    mesh_pass: MeshPass,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        config: &AppConfig,
        imgui_context: &mut imgui::Context,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;

        info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let common = Arc::new(RenderCommon::new(
            &device,
            &adapter,
            &surface,
            (size.width, size.height),
            &config.render,
        )?);

        let depth_texture = DepthTexture::new(&device, size.width, size.height, "Depth Texture");
        let backend = WgpuBackend::new(&device, &queue);

        let mut cache_builder = PipelineCacheBuilder::new();
        let (skybox_pass, mesh_pass) = {
            let context = PassCreationContext {
                device: &device,
                queue: &queue,
                common: common.clone(),
                backend: &backend,
                config,
            };
            (
                SkyboxPass::create(&context, &mut cache_builder)?,
                MeshPass::create(&context, &mut cache_builder)?,
            )
        };

        let shader_loader =
            ShaderLoader::new(device.clone(), &config.shader_folder, cache_builder)?;

        let imgui_renderer =
            ImguiRenderer::new(&device, &queue, common.surface_format(), imgui_context);

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            depth_texture,
            backend,
            shader_loader,
            imgui_renderer,
            skybox_pass,
            mesh_pass,
        })
    }

    /// The backend models upload their buffers and textures through.
    pub fn backend_mut(&mut self) -> &mut WgpuBackend {
        &mut self.backend
    }

    pub fn last_draw_count(&self) -> usize {
        self.backend.draw_count()
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        let Ok(mut config) = self.common.output_surface_config.write() else {
            error!("Surface configuration lock poisoned");
            return;
        };

        self.size = new_size;
        config.width = new_size.width;
        config.height = new_size.height;
        self.depth_texture
            .resize(&self.device, new_size.width, new_size.height);
        self.surface.configure(&self.device, &config);
    }

    /// Records and encodes the scene. The frame is finished by [`Renderer::finish_frame`].
    pub fn render(&mut self, demo_state: &DemoState) -> Result<PendingFrame, wgpu::SurfaceError> {
        self.shader_loader.load_pending_shaders();

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.backend.begin_frame();
        draw_scene(
            &demo_state.scene,
            &demo_state.arcball.camera,
            &demo_state.params,
            &mut self.backend,
        );
        self.backend.prepare();

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let texture_views = PassTextureViews {
            color: &view,
            depth: self.depth_texture.view(),
        };
        let pipeline_cache = &self.shader_loader.cache;

        self.skybox_pass
            .render(&texture_views, &mut encoder, pipeline_cache, &self.backend);
        self.mesh_pass
            .render(&texture_views, &mut encoder, pipeline_cache, &self.backend);

        Ok(PendingFrame {
            output,
            view,
            encoder,
        })
    }

    /// Draws the panel over the scene, submits and presents.
    pub fn finish_frame(&mut self, frame: PendingFrame, imgui_context: &mut imgui::Context) {
        let PendingFrame {
            output,
            view,
            mut encoder,
        } = frame;

        if let Err(e) = self.imgui_renderer.render(
            &view,
            imgui_context,
            &self.device,
            &self.queue,
            &mut encoder,
        ) {
            error!("{:?}", e);
        }

        self.queue.submit([encoder.finish()]);
        output.present();
    }
}
