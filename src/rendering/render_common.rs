use std::sync::RwLock;

use wgpu::SurfaceConfiguration;

use crate::rendering::config::RenderConfig;

/// Surface state shared by every pass.
pub struct RenderCommon {
    pub output_surface_config: RwLock<SurfaceConfiguration>,
    surface_format: wgpu::TextureFormat,
}

impl RenderCommon {
    pub fn new(
        device: &wgpu::Device,
        adapter: &wgpu::Adapter,
        surface: &wgpu::Surface,
        (width, height): (u32, u32),
        config: &RenderConfig,
    ) -> anyhow::Result<Self> {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Surface reports no supported formats"))?;

        let present_mode = if config.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let output_surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(device, &output_surface_config);

        Ok(Self {
            output_surface_config: RwLock::new(output_surface_config),
            surface_format,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }
}
