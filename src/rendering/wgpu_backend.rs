use std::collections::HashMap;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use log::{debug, warn};
use wgpu::util::DeviceExt;

use crate::asset_pipeline::texture::DecodedTexture;
use crate::camera::sky_view_projection_inverse;
use crate::rendering::backend::{
    BufferHandle, BufferUsage, DrawBuffers, DrawMaterial, LightingParams, MatrixUniform,
    PrimitiveKind, RenderBackend, TextureHandle, TextureKind,
};
use crate::rendering::shader_loader::{PipelineCache, PipelineId};
use crate::rendering::texture::Texture;

/// Dynamic uniform offsets must be multiples of this on every adapter.
const DRAW_UNIFORM_STRIDE: u64 = 256;

const ZERO_BUFFER_MIN_SIZE: u64 = 4096;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameUniform {
    view: Mat4,
    projection: Mat4,
    sky_view_proj_inverse: Mat4,
    camera_position: Vec4,
    light_position: Vec4,
    ambient_color: Vec4,
    diffuse_color: Vec4,
    specular_color: Vec4,
    /// x: specular exponent, y: light intensity.
    light_params: Vec4,
}

impl FrameUniform {
    pub fn new(view: Mat4, projection: Mat4, lighting: &LightingParams) -> Self {
        Self {
            view,
            projection,
            sky_view_proj_inverse: sky_view_projection_inverse(view, projection),
            camera_position: lighting.camera_position.extend(1.0),
            light_position: lighting.light_position.extend(1.0),
            ambient_color: lighting.ambient_color.extend(0.0),
            diffuse_color: lighting.diffuse_color.extend(0.0),
            specular_color: lighting.specular_color.extend(0.0),
            light_params: Vec4::new(
                lighting.specular_intensity,
                lighting.light_intensity,
                0.0,
                0.0,
            ),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DrawUniform {
    model: Mat4,
    normal: Mat4,
    /// rgb: material diffuse color, a: specular scale.
    diffuse_color: Vec4,
}

const DRAW_UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniform>() as u64;

/// One vertex stream per attribute: position, normal, uv, color, tangent.
pub const MESH_VERTEX_LAYOUTS: [wgpu::VertexBufferLayout<'static>; 5] = [
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
    },
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![1 => Float32x3],
    },
    wgpu::VertexBufferLayout {
        array_stride: 8,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![2 => Float32x2],
    },
    wgpu::VertexBufferLayout {
        array_stride: 16,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![3 => Float32x4],
    },
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![4 => Float32x3],
    },
];

struct DrawCommand {
    primitive: PrimitiveKind,
    uniform_offset: u32,
    vertex_buffers: [(wgpu::Buffer, u64); 5],
    index_buffer: wgpu::Buffer,
    index_count: u32,
    material: wgpu::BindGroup,
}

struct DefaultTextures {
    color: Texture,
    specular: Texture,
    normal: Texture,
    height: Texture,
}

impl DefaultTextures {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let create = |kind: TextureKind| {
            Texture::from_decoded(
                device,
                queue,
                &format!("Default {:?} map", kind),
                kind,
                &DecodedTexture::placeholder(kind),
            )
        };

        Self {
            color: create(TextureKind::Color),
            specular: create(TextureKind::Specular),
            normal: create(TextureKind::Normal),
            height: create(TextureKind::Height),
        }
    }

    fn get(&self, kind: TextureKind) -> &Texture {
        match kind {
            TextureKind::Color => &self.color,
            TextureKind::Specular => &self.specular,
            TextureKind::Normal => &self.normal,
            TextureKind::Height => &self.height,
        }
    }
}

/// The wgpu implementation of [`RenderBackend`].
///
/// Draws are recorded with their uniforms during the frame and replayed by the mesh pass.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    next_id: u64,

    buffers: HashMap<BufferHandle, wgpu::Buffer>,
    textures: HashMap<TextureHandle, Texture>,
    default_textures: DefaultTextures,
    zero_buffer: wgpu::Buffer,

    sampler: wgpu::Sampler,
    material_layout: wgpu::BindGroupLayout,
    material_bind_groups: HashMap<[Option<TextureHandle>; 4], wgpu::BindGroup>,

    view: Mat4,
    projection: Mat4,
    model: Mat4,
    normal: Mat4,
    lighting: Option<LightingParams>,

    frame_layout: wgpu::BindGroupLayout,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,

    draw_layout: wgpu::BindGroupLayout,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_data: Vec<u8>,
    commands: Vec<DrawCommand>,
}

impl WgpuBackend {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame uniform buffer"),
            contents: bytemuck::cast_slice(&[FrameUniform::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame bind group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(DRAW_UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let draw_buffer = Self::create_draw_buffer(device, DRAW_UNIFORM_STRIDE * 64);
        let draw_bind_group = Self::create_draw_bind_group(device, &draw_layout, &draw_buffer);

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material bind group layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            device: device.clone(),
            queue: queue.clone(),
            next_id: 0,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            default_textures: DefaultTextures::new(device, queue),
            zero_buffer: Self::create_zero_buffer(device, ZERO_BUFFER_MIN_SIZE),
            sampler,
            material_layout,
            material_bind_groups: HashMap::new(),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            normal: Mat4::IDENTITY,
            lighting: None,
            frame_layout,
            frame_buffer,
            frame_bind_group,
            draw_layout,
            draw_buffer,
            draw_bind_group,
            draw_data: Vec::new(),
            commands: Vec::new(),
        }
    }

    fn create_draw_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw uniform buffer"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_draw_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(DRAW_UNIFORM_SIZE),
                }),
            }],
        })
    }

    // wgpu zero-initializes new buffers.
    fn create_zero_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Zero vertex buffer"),
            size,
            usage: wgpu::BufferUsages::VERTEX,
            mapped_at_creation: false,
        })
    }

    pub fn frame_layout(&self) -> &wgpu::BindGroupLayout {
        &self.frame_layout
    }

    pub fn draw_layout(&self) -> &wgpu::BindGroupLayout {
        &self.draw_layout
    }

    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    pub fn frame_bind_group(&self) -> &wgpu::BindGroup {
        &self.frame_bind_group
    }

    pub fn draw_count(&self) -> usize {
        self.commands.len()
    }

    /// Forgets the draws of the previous frame.
    pub fn begin_frame(&mut self) {
        self.commands.clear();
        self.draw_data.clear();
    }

    /// Writes the frame and per-draw uniforms. Call after the draw pass, before replaying.
    pub fn prepare(&mut self) {
        let lighting = self.lighting.unwrap_or(LightingParams {
            camera_position: glam::Vec3::ZERO,
            light_position: glam::Vec3::ZERO,
            ambient_color: glam::Vec3::ONE,
            diffuse_color: glam::Vec3::ZERO,
            specular_color: glam::Vec3::ZERO,
            specular_intensity: 1.0,
            light_intensity: 0.0,
        });
        let frame = FrameUniform::new(self.view, self.projection, &lighting);
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::cast_slice(&[frame]));

        if self.draw_data.is_empty() {
            return;
        }

        let required = self.draw_data.len() as u64;
        if required > self.draw_buffer.size() {
            let size = required.next_power_of_two();
            debug!("Growing draw uniform buffer to {} bytes", size);
            self.draw_buffer = Self::create_draw_buffer(&self.device, size);
            self.draw_bind_group =
                Self::create_draw_bind_group(&self.device, &self.draw_layout, &self.draw_buffer);
        }

        self.queue.write_buffer(&self.draw_buffer, 0, &self.draw_data);
    }

    /// Issues the recorded draws into a pass that already has its attachments set up.
    pub fn replay(
        &self,
        render_pass: &mut wgpu::RenderPass,
        pipeline_cache: &PipelineCache,
        filled: PipelineId,
        lines: PipelineId,
    ) {
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

        for command in &self.commands {
            let pipeline_id = match command.primitive {
                PrimitiveKind::Triangles => filled,
                PrimitiveKind::Wireframe => lines,
            };
            let Some(pipeline) = pipeline_cache.get(pipeline_id) else {
                continue;
            };

            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(1, &self.draw_bind_group, &[command.uniform_offset]);
            render_pass.set_bind_group(2, &command.material, &[]);

            for (slot, (buffer, size)) in command.vertex_buffers.iter().enumerate() {
                render_pass.set_vertex_buffer(slot as u32, buffer.slice(..*size));
            }
            render_pass.set_index_buffer(command.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..command.index_count, 0, 0..1);
        }
    }

    fn vertex_buffer(&self, handle: BufferHandle) -> Option<(wgpu::Buffer, u64)> {
        self.buffers
            .get(&handle)
            .map(|buffer| (buffer.clone(), buffer.size()))
    }

    /// A live buffer, or a run of zeros long enough for `vertex_count` elements of `stride`.
    fn optional_vertex_buffer(
        &mut self,
        handle: Option<BufferHandle>,
        vertex_count: u32,
        stride: u64,
    ) -> Option<(wgpu::Buffer, u64)> {
        if let Some(handle) = handle {
            return self.vertex_buffer(handle);
        }

        let size = vertex_count as u64 * stride;
        if size > self.zero_buffer.size() {
            self.zero_buffer = Self::create_zero_buffer(&self.device, size.next_power_of_two());
        }
        Some((self.zero_buffer.clone(), size))
    }

    fn material_bind_group(&mut self, material: &DrawMaterial) -> wgpu::BindGroup {
        let key = [
            material.color_map,
            material.specular_map,
            material.normal_map,
            material.height_map,
        ];

        if let Some(bind_group) = self.material_bind_groups.get(&key) {
            return bind_group.clone();
        }

        let kinds = [
            TextureKind::Color,
            TextureKind::Specular,
            TextureKind::Normal,
            TextureKind::Height,
        ];
        let views: Vec<&wgpu::TextureView> = key
            .iter()
            .zip(kinds)
            .map(|(handle, kind)| {
                handle
                    .and_then(|handle| self.textures.get(&handle))
                    .unwrap_or_else(|| self.default_textures.get(kind))
                    .view()
            })
            .collect();

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material bind group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(views[0]),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(views[1]),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(views[2]),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(views[3]),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        self.material_bind_groups.insert(key, bind_group.clone());
        bind_group
    }
}

impl RenderBackend for WgpuBackend {
    fn create_buffer(&mut self, label: &str, usage: BufferUsage, contents: &[u8]) -> BufferHandle {
        let usage = match usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
        } | wgpu::BufferUsages::COPY_DST;

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });

        self.next_id += 1;
        let handle = BufferHandle::from_raw(self.next_id);
        self.buffers.insert(handle, buffer);
        handle
    }

    fn release_buffer(&mut self, handle: BufferHandle) {
        match self.buffers.remove(&handle) {
            Some(buffer) => buffer.destroy(),
            None => warn!("Released unknown buffer {:?}", handle),
        }
    }

    fn create_texture(
        &mut self,
        label: &str,
        kind: TextureKind,
        texture: &DecodedTexture,
    ) -> TextureHandle {
        let texture = Texture::from_decoded(&self.device, &self.queue, label, kind, texture);

        self.next_id += 1;
        let handle = TextureHandle::from_raw(self.next_id);
        self.textures.insert(handle, texture);
        handle
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if self.textures.remove(&handle).is_none() {
            warn!("Released unknown texture {:?}", handle);
        }
        self.material_bind_groups
            .retain(|key, _| !key.contains(&Some(handle)));
    }

    fn set_uniform_matrix4(&mut self, uniform: MatrixUniform, matrix: Mat4) {
        match uniform {
            MatrixUniform::Model => self.model = matrix,
            MatrixUniform::View => self.view = matrix,
            MatrixUniform::Projection => self.projection = matrix,
            MatrixUniform::Normal => self.normal = matrix,
        }
    }

    fn set_lighting(&mut self, lighting: &LightingParams) {
        self.lighting = Some(*lighting);
    }

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveKind,
        buffers: &DrawBuffers,
        material: &DrawMaterial,
    ) {
        // Line lists consume indices in pairs.
        let index_count = match primitive {
            PrimitiveKind::Triangles => buffers.index_count,
            PrimitiveKind::Wireframe => buffers.index_count & !1,
        };
        if index_count == 0 || buffers.vertex_count == 0 {
            return;
        }

        let vertex_buffers = (
            self.vertex_buffer(buffers.positions),
            self.vertex_buffer(buffers.normals),
            self.optional_vertex_buffer(buffers.uvs, buffers.vertex_count, 8),
            self.vertex_buffer(buffers.colors),
            self.optional_vertex_buffer(buffers.tangents, buffers.vertex_count, 12),
        );
        let (Some(positions), Some(normals), Some(uvs), Some(colors), Some(tangents)) =
            vertex_buffers
        else {
            debug!("Skipping a draw that references released buffers");
            return;
        };
        let Some(index_buffer) = self.buffers.get(&buffers.indices).cloned() else {
            debug!("Skipping a draw that references a released index buffer");
            return;
        };

        let uniform_offset = self.draw_data.len() as u64;
        let uniform = DrawUniform {
            model: self.model,
            normal: self.normal,
            diffuse_color: material.diffuse_color.extend(material.specular_scale),
        };
        self.draw_data.extend_from_slice(bytemuck::bytes_of(&uniform));
        self.draw_data
            .resize((uniform_offset + DRAW_UNIFORM_STRIDE) as usize, 0);

        let material = self.material_bind_group(material);

        self.commands.push(DrawCommand {
            primitive,
            uniform_offset: uniform_offset as u32,
            vertex_buffers: [positions, normals, uvs, colors, tangents],
            index_buffer,
            index_count,
            material,
        });
    }
}
