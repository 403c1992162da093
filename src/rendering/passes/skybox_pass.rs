use log::info;
use wgpu::{
    DepthBiasState, Device, MultisampleState, PipelineCompilationOptions, RenderPassDescriptor,
    ShaderSource, StencilState,
};

use crate::rendering::{
    passes::{Pass, PassCreationContext, PassTextureViews},
    shader_loader::{PipelineCache, PipelineCacheBuilder, PipelineId, ShaderDefinition},
    texture::{load_cubemap_faces, DepthTexture, Texture},
    wgpu_backend::WgpuBackend,
};

const SKYBOX_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Skybox",
    path: "skybox.wgsl",
};

/// Clears the frame and fills it with the cube map, behind everything else.
pub struct SkyboxPass {
    pipeline_id: PipelineId,
    clear_color: wgpu::Color,
    _cubemap: Texture,
    cubemap_bind_group: wgpu::BindGroup,
}

impl Pass for SkyboxPass {
    fn create(
        context: &PassCreationContext,
        cache_builder: &mut PipelineCacheBuilder,
    ) -> anyhow::Result<Self> {
        let device = context.device;
        let folder = context.config.skybox_path();
        let faces = load_cubemap_faces(&folder, &context.config.render.skybox_faces);
        info!(
            "Skybox from {} ({}x{})",
            folder.display(),
            faces[0].width,
            faces[0].height
        );
        let cubemap = Texture::cubemap(device, context.queue, "Skybox cube map", &faces);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Skybox sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let cubemap_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Skybox bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let cubemap_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox bind group"),
            layout: &cubemap_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(cubemap.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Skybox pipeline layout"),
            bind_group_layouts: &[context.backend.frame_layout(), &cubemap_layout],
            push_constant_ranges: &[],
        });

        let surface_format = context.common.surface_format();

        let pipeline_id = cache_builder.add_shader(
            SKYBOX_SHADER,
            Box::new(
                move |device: &Device, shader_def: &ShaderDefinition, source: &str| {
                    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(shader_def.name),
                        source: ShaderSource::Wgsl(source.into()),
                    });

                    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Skybox pipeline"),
                        layout: Some(&pipeline_layout),
                        vertex: wgpu::VertexState {
                            module: &shader,
                            entry_point: Some("vs_main"),
                            buffers: &[],
                            compilation_options: PipelineCompilationOptions::default(),
                        },
                        fragment: Some(wgpu::FragmentState {
                            module: &shader,
                            entry_point: Some("fs_main"),
                            targets: &[Some(wgpu::ColorTargetState {
                                format: surface_format,
                                blend: Some(wgpu::BlendState::REPLACE),
                                write_mask: wgpu::ColorWrites::ALL,
                            })],
                            compilation_options: PipelineCompilationOptions::default(),
                        }),
                        primitive: wgpu::PrimitiveState {
                            topology: wgpu::PrimitiveTopology::TriangleList,
                            cull_mode: None,
                            ..Default::default()
                        },
                        // Drawn at the far plane, so anything closer replaces it.
                        depth_stencil: Some(wgpu::DepthStencilState {
                            format: DepthTexture::DEPTH_FORMAT,
                            depth_write_enabled: false,
                            depth_compare: wgpu::CompareFunction::LessEqual,
                            stencil: StencilState::default(),
                            bias: DepthBiasState::default(),
                        }),
                        multisample: MultisampleState::default(),
                        multiview: None,
                        cache: None,
                    });

                    Ok(pipeline)
                },
            ),
        );

        Ok(Self {
            pipeline_id,
            clear_color: context.config.render.clear_color,
            _cubemap: cubemap,
            cubemap_bind_group,
        })
    }

    fn render(
        &self,
        texture_views: &PassTextureViews,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        backend: &WgpuBackend,
    ) {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Skybox Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: texture_views.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: texture_views.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let Some(pipeline) = pipeline_cache.get(self.pipeline_id) else {
            return;
        };

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, backend.frame_bind_group(), &[]);
        render_pass.set_bind_group(1, &self.cubemap_bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}
