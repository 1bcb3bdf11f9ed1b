use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::paint::{Texture, TextureId};
use crate::render::{RenderCtx, RenderTarget};

use super::batch::{BatchVertex, QuadBatch};
use super::common::{
    logical_clip_to_scissor, premul_alpha_blend, viewport_ubo_min_binding_size, ViewportUniform,
};

/// Uploaded copy of a CPU texture.
struct GpuTexture {
    /// Tracks the CPU handle; the upload is dropped once every handle is gone.
    source: Weak<Texture>,
    bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

/// Renders a [`QuadBatch`] through wgpu.
///
/// One pipeline with premultiplied-alpha blending, one bind group per texture
/// and a scissor rectangle per draw call. Draw calls without a texture use a
/// cached 1×1 opaque white texture.
pub struct QuadRenderer {
    // pipeline
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,

    // shared bindings
    viewport_ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
    white: Option<GpuTexture>,
    white_source: Option<Rc<Texture>>,

    // textures keyed by CPU identity
    textures: HashMap<TextureId, GpuTexture>,
    /// Textures over the device size limit; drawn white and reported once.
    rejected: HashMap<TextureId, Weak<Texture>>,

    // geometry
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_capacity: usize,
}

impl Default for QuadRenderer {
    fn default() -> Self {
        Self {
            pipeline_format: None,
            pipeline: None,
            bind_group_layout: None,
            viewport_ubo: None,
            sampler: None,
            white: None,
            white_source: None,
            textures: HashMap::new(),
            rejected: HashMap::new(),
            vertex_buffer: None,
            vertex_capacity: 0,
        }
    }
}

impl QuadRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of textures currently resident on the GPU (white excluded).
    pub fn resident_textures(&self) -> usize {
        self.textures.len()
    }

    /// Draws every call in `batch` on top of the target's current contents.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, batch: &QuadBatch) {
        self.ensure_pipeline(ctx);
        self.ensure_sampler(ctx);
        self.ensure_viewport_ubo(ctx);
        self.ensure_white(ctx);
        self.release_dead_textures();

        if batch.vertices().is_empty() {
            return;
        }

        for call in batch.calls() {
            if let Some(texture) = &call.texture {
                self.ensure_texture(ctx, texture);
            }
        }

        self.write_viewport_uniform(ctx);
        self.ensure_vertex_capacity(ctx, batch.vertices().len());

        let Some(vertex_buffer) = self.vertex_buffer.as_ref() else { return; };
        ctx.queue.write_buffer(vertex_buffer, 0, bytemuck::cast_slice(batch.vertices()));

        let Some(pipeline) = self.pipeline.as_ref() else { return; };
        let Some(white) = self.white.as_ref() else { return; };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lustre quad pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
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

        rpass.set_pipeline(pipeline);
        rpass.set_vertex_buffer(0, vertex_buffer.slice(..));

        for call in batch.calls() {
            let Some((sx, sy, sw, sh)) =
                logical_clip_to_scissor(call.clip, ctx.viewport, ctx.scale_factor)
            else {
                continue;
            };

            let bind_group = call
                .texture
                .as_ref()
                .and_then(|t| self.textures.get(&t.id()))
                .map_or(&white.bind_group, |g| &g.bind_group);

            rpass.set_scissor_rect(sx, sy, sw, sh);
            rpass.set_bind_group(0, bind_group, &[]);
            rpass.draw(call.vertices.clone(), 0..1);
        }
    }

    // ── textures ───────────────────────────────────────────────────────────

    fn ensure_texture(&mut self, ctx: &RenderCtx<'_>, texture: &Rc<Texture>) {
        let id = texture.id();
        if self.textures.contains_key(&id) || self.rejected.contains_key(&id) {
            return;
        }
        let limit = ctx.device.limits().max_texture_dimension_2d;
        if texture.width() > limit || texture.height() > limit {
            if self.note_rejected(texture) {
                log::warn!(
                    "QuadRenderer: {}x{} texture exceeds the {limit}px device limit; drawing white instead",
                    texture.width(),
                    texture.height()
                );
            }
            return;
        }
        if let Some(gpu) = self.upload(ctx, texture) {
            self.textures.insert(id, gpu);
        }
    }

    /// Records `texture` as not uploadable. True the first time it is seen.
    fn note_rejected(&mut self, texture: &Rc<Texture>) -> bool {
        self.rejected
            .insert(texture.id(), Rc::downgrade(texture))
            .is_none()
    }

    fn upload(&self, ctx: &RenderCtx<'_>, source: &Rc<Texture>) -> Option<GpuTexture> {
        let bgl = self.bind_group_layout.as_ref()?;
        let sampler = self.sampler.as_ref()?;
        let ubo = self.viewport_ubo.as_ref()?;

        let size = wgpu::Extent3d {
            width: source.width(),
            height: source.height(),
            depth_or_array_layers: 1,
        };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lustre quad texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            source.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * source.width()),
                rows_per_image: Some(source.height()),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lustre quad bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        Some(GpuTexture {
            source: Rc::downgrade(source),
            bind_group,
            _texture: texture,
        })
    }

    fn release_dead_textures(&mut self) {
        self.textures.retain(|_, gpu| gpu.source.strong_count() > 0);
        self.rejected.retain(|_, source| source.strong_count() > 0);
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lustre quad shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/quad.wgsl").into()),
        });

        let bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lustre quad bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: viewport_ubo_min_binding_size(),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lustre quad pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lustre quad pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[BatchVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(premul_alpha_blend()),
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

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bgl);

        // Bind groups reference the old layout.
        self.textures.clear();
        self.white = None;
    }

    fn ensure_sampler(&mut self, ctx: &RenderCtx<'_>) {
        if self.sampler.is_some() {
            return;
        }
        self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lustre quad sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        }));
    }

    fn ensure_viewport_ubo(&mut self, ctx: &RenderCtx<'_>) {
        if self.viewport_ubo.is_some() {
            return;
        }
        self.viewport_ubo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lustre quad viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
    }

    fn ensure_white(&mut self, ctx: &RenderCtx<'_>) {
        if self.white.is_some() {
            return;
        }
        let source = match &self.white_source {
            Some(source) => source.clone(),
            None => {
                let Some(source) = Texture::from_rgba_premul(1, 1, vec![255; 4]) else { return; };
                self.white_source = Some(source.clone());
                source
            }
        };
        self.white = self.upload(ctx, &source);
    }

    fn write_viewport_uniform(&mut self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.viewport_ubo.as_ref() else { return; };
        let w = ctx.viewport.width.max(1.0);
        let h = ctx.viewport.height.max(1.0);
        ctx.queue.write_buffer(
            ubo,
            0,
            bytemuck::bytes_of(&ViewportUniform { viewport: [w, h], _pad: [0.0; 2] }),
        );
    }

    fn ensure_vertex_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.vertex_capacity && self.vertex_buffer.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(1024);
        self.vertex_buffer = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lustre quad vbo"),
            size: (new_cap * std::mem::size_of::<BatchVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vertex_capacity = new_cap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_textures_are_reported_once_while_alive() {
        let mut renderer = QuadRenderer::new();
        let big = Texture::from_rgba_premul(2, 1, vec![255; 8]).unwrap();
        let other = Texture::from_rgba_premul(1, 1, vec![255; 4]).unwrap();

        assert!(renderer.note_rejected(&big));
        assert!(!renderer.note_rejected(&big));
        assert!(renderer.note_rejected(&other));

        drop(big);
        renderer.release_dead_textures();
        assert_eq!(renderer.rejected.len(), 1);
        assert!(renderer.rejected.contains_key(&other.id()));
        assert_eq!(renderer.resident_textures(), 0);
    }
}
