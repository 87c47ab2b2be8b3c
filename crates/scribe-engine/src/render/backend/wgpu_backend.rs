use std::borrow::Cow;

use crate::device::Gpu;
use crate::paint::Color;
use crate::render::shader::{ProgramLayout, ShaderError};
use crate::render::transform::TransformUniform;
use crate::render::vertex::Vertex;

use super::{DrawCall, ProgramDesc, ProgramHandle, RenderBackend, TextureDesc, TextureHandle};

/// Initial stream buffer size: one full default batch, four times over.
const STREAM_INITIAL_BYTES: u64 = 4 * 30_000 * Vertex::STRIDE;

// ── blend ─────────────────────────────────────────────────────────────────

fn straight_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── resources ─────────────────────────────────────────────────────────────

struct Program {
    pipeline: wgpu::RenderPipeline,
    transform_ubo: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
    samples_texture: bool,
}

struct Texture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct FrameTarget {
    encoder: wgpu::CommandEncoder,
    view: wgpu::TextureView,
}

/// Per-frame vertex arena.
///
/// Every flush in a frame writes to a fresh range, so earlier draws recorded
/// into the same encoder keep their data. When the arena runs out a larger
/// buffer replaces it; the old one is parked until the next frame.
struct StreamBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    cursor: u64,
    retired: Vec<wgpu::Buffer>,
}

impl StreamBuffer {
    fn new(device: &wgpu::Device, capacity: u64) -> Self {
        Self {
            buffer: create_stream_buffer(device, capacity),
            capacity,
            cursor: 0,
            retired: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.retired.clear();
    }

    /// Copies `bytes` into the arena and returns their offset.
    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) -> u64 {
        let len = bytes.len() as u64;
        if self.cursor + len > self.capacity {
            let capacity = (self.cursor + len).max(self.capacity * 2).next_power_of_two();
            log::debug!("stream buffer grown: {} -> {} bytes", self.capacity, capacity);
            let old = std::mem::replace(&mut self.buffer, create_stream_buffer(device, capacity));
            self.retired.push(old);
            self.capacity = capacity;
            self.cursor = 0;
        }
        let offset = self.cursor;
        queue.write_buffer(&self.buffer, offset, bytes);
        self.cursor += len;
        offset
    }
}

fn create_stream_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("scribe stream vbo"),
        size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

// ── backend ───────────────────────────────────────────────────────────────

/// wgpu implementation of [`RenderBackend`].
///
/// Shader files are GLSL; each stage is compiled through wgpu's GLSL front-end
/// inside a validation error scope so failures come back as logs rather than
/// as an uncaptured-error panic.
///
/// Draws are only recorded between [`begin_frame`](Self::begin_frame) and
/// [`finish_frame`](Self::finish_frame).
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,

    transform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    programs: Vec<Program>,
    textures: Vec<Texture>,
    // bound when a textured program is drawn with no texture
    fallback_texture: Texture,

    stream: StreamBuffer,
    frame: Option<FrameTarget>,
    warned_no_frame: bool,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, surface_format: wgpu::TextureFormat) -> Self {
        let transform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scribe transform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<TransformUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scribe texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
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

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scribe atlas sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let fallback_texture = upload_r8(
            &device,
            &queue,
            &texture_layout,
            &sampler,
            &TextureDesc { label: "scribe fallback texture", width: 1, height: 1, pixels: &[0xFF] },
        );

        let stream = StreamBuffer::new(&device, STREAM_INITIAL_BYTES);

        Self {
            device,
            queue,
            surface_format,
            transform_layout,
            texture_layout,
            sampler,
            programs: Vec::new(),
            textures: Vec::new(),
            fallback_texture,
            stream,
            frame: None,
            warned_no_frame: false,
        }
    }

    /// Shares the device and queue of an initialised [`Gpu`].
    pub fn from_gpu(gpu: &Gpu<'_>) -> Self {
        Self::new(gpu.device().clone(), gpu.queue().clone(), gpu.surface_format())
    }

    /// Starts recording a frame that renders into `view`.
    pub fn begin_frame(&mut self, view: wgpu::TextureView) {
        if self.frame.is_some() {
            log::warn!("WgpuBackend::begin_frame: previous frame was never finished; discarding it");
        }
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scribe frame encoder"),
            });
        self.stream.reset();
        self.frame = Some(FrameTarget { encoder, view });
    }

    /// Ends the frame and returns its commands, ready for submission.
    pub fn finish_frame(&mut self) -> Option<wgpu::CommandBuffer> {
        self.frame.take().map(|frame| frame.encoder.finish())
    }

    fn compile_stage(
        &self,
        label: &str,
        source: &str,
        stage: wgpu::naga::ShaderStage,
    ) -> (wgpu::ShaderModule, String) {
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Glsl {
                shader: Cow::Owned(source.to_string()),
                stage,
                defines: Default::default(),
            },
        });
        let log = pollster::block_on(scope.pop())
            .map(|err| err.to_string())
            .unwrap_or_default();
        (module, log)
    }
}

impl RenderBackend for WgpuBackend {
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, ShaderError> {
        let (vertex_module, vertex_log) = self.compile_stage(
            &format!("{} vertex", desc.label),
            desc.vertex_source,
            wgpu::naga::ShaderStage::Vertex,
        );
        let (fragment_module, fragment_log) = self.compile_stage(
            &format!("{} fragment", desc.label),
            desc.fragment_source,
            wgpu::naga::ShaderStage::Fragment,
        );

        let mut bind_group_layouts = vec![&self.transform_layout];
        if desc.layout.has_texture {
            bind_group_layouts.push(&self.texture_layout);
        }

        let attributes = vertex_attributes(desc.layout);

        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(desc.label),
                bind_group_layouts: &bind_group_layouts,
                immediate_size: 0,
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: Vertex::STRIDE,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_format,
                        blend: Some(straight_alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        let program_log = pollster::block_on(scope.pop())
            .map(|err| err.to_string())
            .unwrap_or_default();

        if !vertex_log.is_empty() || !fragment_log.is_empty() || !program_log.is_empty() {
            return Err(ShaderError {
                label: desc.label.to_string(),
                vertex_log,
                fragment_log,
                program_log,
            });
        }

        let transform_ubo = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scribe transform ubo"),
            size: std::mem::size_of::<TransformUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let transform_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scribe transform bind group"),
            layout: &self.transform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_ubo.as_entire_binding(),
            }],
        });

        self.programs.push(Program {
            pipeline,
            transform_ubo,
            transform_bind_group,
            samples_texture: desc.layout.has_texture,
        });
        Ok(ProgramHandle(self.programs.len() as u32 - 1))
    }

    fn create_texture_r8(&mut self, desc: &TextureDesc<'_>) -> TextureHandle {
        let texture = upload_r8(&self.device, &self.queue, &self.texture_layout, &self.sampler, desc);
        self.textures.push(texture);
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn set_transform(&mut self, program: ProgramHandle, transform: &TransformUniform) {
        let Some(program) = self.programs.get(program.0 as usize) else {
            log::warn!("WgpuBackend: set_transform on unknown {program:?}");
            return;
        };
        self.queue
            .write_buffer(&program.transform_ubo, 0, bytemuck::bytes_of(transform));
    }

    fn clear(&mut self, color: Color) {
        let Some(frame) = self.frame.as_mut() else { return };
        let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scribe clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: color.r as f64,
                        g: color.g as f64,
                        b: color.b as f64,
                        a: color.a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        if call.vertices.is_empty() {
            return;
        }
        let Some(frame) = self.frame.as_mut() else {
            if !self.warned_no_frame {
                log::warn!("WgpuBackend: draw outside begin_frame/finish_frame; ignored");
                self.warned_no_frame = true;
            }
            return;
        };
        let Some(program) = self.programs.get(call.program.0 as usize) else {
            log::warn!("WgpuBackend: draw with unknown {:?}", call.program);
            return;
        };

        let bytes: &[u8] = bytemuck::cast_slice(call.vertices);
        let offset = self.stream.write(&self.device, &self.queue, bytes);
        let end = offset + bytes.len() as u64;

        let texture = call
            .texture
            .and_then(|t| self.textures.get(t.0 as usize))
            .unwrap_or(&self.fallback_texture);

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scribe immediate pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&program.pipeline);
        rpass.set_bind_group(0, &program.transform_bind_group, &[]);
        if program.samples_texture {
            rpass.set_bind_group(1, &texture.bind_group, &[]);
        }
        rpass.set_vertex_buffer(0, self.stream.buffer.slice(offset..end));
        rpass.draw(0..call.vertices.len() as u32, 0..1);
    }
}

/// Wires only the attributes the program consumes.
fn vertex_attributes(layout: &ProgramLayout) -> Vec<wgpu::VertexAttribute> {
    let locations = layout.attributes;
    [
        (locations.position, wgpu::VertexFormat::Float32x2, Vertex::POSITION_OFFSET),
        (locations.color, wgpu::VertexFormat::Float32x4, Vertex::COLOR_OFFSET),
        (locations.uv, wgpu::VertexFormat::Float32x2, Vertex::UV_OFFSET),
    ]
    .into_iter()
    .filter_map(|(location, format, offset)| {
        location.map(|shader_location| wgpu::VertexAttribute {
            format,
            offset,
            shader_location,
        })
    })
    .collect()
}

fn upload_r8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    desc: &TextureDesc<'_>,
) -> Texture {
    let size = wgpu::Extent3d {
        width: desc.width.max(1),
        height: desc.height.max(1),
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(desc.label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    if desc.width > 0 && desc.height > 0 {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            desc.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(desc.width),
                rows_per_image: Some(desc.height),
            },
            size,
        );
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(desc.label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    Texture {
        _texture: texture,
        bind_group,
    }
}
