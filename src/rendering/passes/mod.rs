pub mod mesh_pass;
pub mod skybox_pass;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::rendering::render_common::RenderCommon;
use crate::rendering::shader_loader::{PipelineCache, PipelineCacheBuilder};
use crate::rendering::wgpu_backend::WgpuBackend;

pub struct PassCreationContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub common: Arc<RenderCommon>,
    pub backend: &'a WgpuBackend,
    pub config: &'a AppConfig,
}

pub struct PassTextureViews<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
}

pub(crate) trait Pass {
    fn create(
        context: &PassCreationContext,
        cache_builder: &mut PipelineCacheBuilder,
    ) -> anyhow::Result<Self>
    where
        Self: Sized;

    fn render(
        &self,
        texture_views: &PassTextureViews,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        backend: &WgpuBackend,
    );
}
