use wgpu::{
    DepthBiasState, Device, MultisampleState, PipelineCompilationOptions, RenderPassDescriptor,
    ShaderSource, StencilState,
};

use crate::rendering::{
    passes::{Pass, PassCreationContext, PassTextureViews},
    shader_loader::{PipelineCache, PipelineCacheBuilder, PipelineId, ShaderDefinition},
    texture::DepthTexture,
    wgpu_backend::{WgpuBackend, MESH_VERTEX_LAYOUTS},
};

const MESH_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Mesh",
    path: "mesh.wgsl",
};

/// Replays the draws recorded by the backend: filled triangles or the index buffer read
/// as a line list.
pub struct MeshPass {
    filled_pipeline_id: PipelineId,
    lines_pipeline_id: PipelineId,
}

fn add_mesh_pipeline(
    context: &PassCreationContext,
    cache_builder: &mut PipelineCacheBuilder,
    topology: wgpu::PrimitiveTopology,
) -> PipelineId {
    let pipeline_layout = context
        .device
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh pipeline layout"),
            bind_group_layouts: &[
                context.backend.frame_layout(),
                context.backend.draw_layout(),
                context.backend.material_layout(),
            ],
            push_constant_ranges: &[],
        });

    let surface_format = context.common.surface_format();

    cache_builder.add_shader(
        MESH_SHADER,
        Box::new(
            move |device: &Device, shader_def: &ShaderDefinition, source: &str| {
                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(shader_def.name),
                    source: ShaderSource::Wgsl(source.into()),
                });

                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(match topology {
                        wgpu::PrimitiveTopology::LineList => "Mesh pipeline (lines)",
                        _ => "Mesh pipeline",
                    }),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        buffers: &MESH_VERTEX_LAYOUTS,
                        compilation_options: PipelineCompilationOptions::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_main"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: surface_format,
                            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: PipelineCompilationOptions::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: None,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        unclipped_depth: false,
                        conservative: false,
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DepthTexture::DEPTH_FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Less,
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
    )
}

impl Pass for MeshPass {
    fn create(
        context: &PassCreationContext,
        cache_builder: &mut PipelineCacheBuilder,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            filled_pipeline_id: add_mesh_pipeline(
                context,
                cache_builder,
                wgpu::PrimitiveTopology::TriangleList,
            ),
            lines_pipeline_id: add_mesh_pipeline(
                context,
                cache_builder,
                wgpu::PrimitiveTopology::LineList,
            ),
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
            label: Some("Mesh Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: texture_views.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: texture_views.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        backend.replay(
            &mut render_pass,
            pipeline_cache,
            self.filled_pipeline_id,
            self.lines_pipeline_id,
        );
    }
}
