//! wgpu implementation of [`GpuBackend`]
//!
//! Resources are kept in generational registries keyed by the handle types
//! from [`crate::hal`]. All encoding of one frame goes into a single command
//! encoder that is created lazily and finished by [`GpuBackend::submit`].

mod conv;
mod device;
mod surface;

pub use device::DeviceManager;
pub use surface::SurfaceManager;

use std::borrow::Cow;

use slotmap::SlotMap;
use tracing::{debug, trace, warn};
use wgpu::{Backends, Extent3d, Surface, SurfaceError, SurfaceTexture};

use crate::enums::{LoadOp, PowerPreference, TextureFormat};
use crate::error::{GpuError, GpuResult};
use crate::hal::{
    check_buffer_write, BindGroupEntry, BindGroupId, BindingResource, BufferDescriptor, BufferId, DrawCall,
    GpuBackend, ImageDataLayout, PipelineLayout, RenderPassDescriptor, RenderPipelineDescriptor,
    RenderPipelineId, SamplerDescriptor, SamplerId, ShaderModuleId, TextureCopyLocation,
    TextureDescriptor, TextureId, TextureViewDescriptor, TextureViewId,
};

use conv::*;

enum TextureSlot {
    Owned(wgpu::Texture),
    /// Stands for the swapchain texture of the current frame
    Surface,
}

/// A view remembers its texture so destroying the texture drops it too
struct ViewSlot {
    texture: TextureId,
    view: wgpu::TextureView,
}

struct SurfaceFrame {
    texture: TextureId,
    view: TextureViewId,
    output: Option<SurfaceTexture>,
}

enum Presentation {
    Window(SurfaceManager),
    /// Offscreen target used instead of a window surface
    Headless {
        texture: wgpu::Texture,
        format: TextureFormat,
        size: (u32, u32),
    },
}

pub struct WgpuBackend {
    device: DeviceManager,
    presentation: Presentation,

    buffers: SlotMap<BufferId, wgpu::Buffer>,
    textures: SlotMap<TextureId, TextureSlot>,
    views: SlotMap<TextureViewId, ViewSlot>,
    samplers: SlotMap<SamplerId, wgpu::Sampler>,
    shaders: SlotMap<ShaderModuleId, wgpu::ShaderModule>,
    pipelines: SlotMap<RenderPipelineId, wgpu::RenderPipeline>,
    bind_groups: SlotMap<BindGroupId, wgpu::BindGroup>,

    encoder: Option<wgpu::CommandEncoder>,
    frame: Option<SurfaceFrame>,
}

impl WgpuBackend {
    /// Backend presenting to a window surface
    pub async fn with_surface(
        instance: wgpu::Instance,
        surface: Surface<'static>,
        width: u32,
        height: u32,
        power: PowerPreference,
        vsync: bool,
    ) -> GpuResult<Self> {
        let device = DeviceManager::with_instance(instance, Some(&surface), power)
            .await
            .map_err(|e| GpuError::Backend(e.to_string()))?;
        let surface = SurfaceManager::new(
            surface,
            device.device(),
            device.adapter(),
            width,
            height,
            vsync,
        )
        .map_err(|e| GpuError::Surface(e.to_string()))?;
        Ok(Self::from_parts(device, Presentation::Window(surface)))
    }

    /// Backend rendering into an offscreen texture of the given size
    pub async fn headless(
        width: u32,
        height: u32,
        format: TextureFormat,
        power: PowerPreference,
    ) -> GpuResult<Self> {
        let device = DeviceManager::new(Backends::all(), power)
            .await
            .map_err(|e| GpuError::Backend(e.to_string()))?;
        let texture = create_offscreen(device.device(), width, height, format);
        Ok(Self::from_parts(
            device,
            Presentation::Headless {
                texture,
                format,
                size: (width.max(1), height.max(1)),
            },
        ))
    }

    fn from_parts(device: DeviceManager, presentation: Presentation) -> Self {
        Self {
            device,
            presentation,
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            views: SlotMap::with_key(),
            samplers: SlotMap::with_key(),
            shaders: SlotMap::with_key(),
            pipelines: SlotMap::with_key(),
            bind_groups: SlotMap::with_key(),
            encoder: None,
            frame: None,
        }
    }

    pub fn device_manager(&self) -> &DeviceManager {
        &self.device
    }

    /// Resize the presentation target
    pub fn resize(&mut self, width: u32, height: u32) -> GpuResult<()> {
        match &mut self.presentation {
            Presentation::Window(surface) => surface
                .resize(width, height, self.device.device())
                .map_err(|e| GpuError::Surface(e.to_string())),
            Presentation::Headless {
                texture,
                format,
                size,
            } => {
                surface::validate_dimensions(width, height)
                    .map_err(|e| GpuError::Surface(e.to_string()))?;
                *texture = create_offscreen(self.device.device(), width, height, *format);
                *size = (width, height);
                Ok(())
            }
        }
    }

    fn ensure_encoder(&mut self) {
        if self.encoder.is_none() {
            self.encoder = Some(self.device.device().create_command_encoder(
                &wgpu::CommandEncoderDescriptor {
                    label: Some("Tessel Frame Encoder"),
                },
            ));
        }
    }

    fn texture(&self, id: TextureId) -> GpuResult<&wgpu::Texture> {
        match self.textures.get(id) {
            Some(TextureSlot::Owned(texture)) => Ok(texture),
            Some(TextureSlot::Surface) => self.surface_texture(),
            None => Err(GpuError::UnknownResource { kind: "texture" }),
        }
    }

    fn surface_texture(&self) -> GpuResult<&wgpu::Texture> {
        match (&self.presentation, &self.frame) {
            (_, Some(SurfaceFrame { output: Some(output), .. })) => Ok(&output.texture),
            (Presentation::Headless { texture, .. }, _) => Ok(texture),
            _ => Err(GpuError::Surface("no surface frame acquired".to_string())),
        }
    }

    fn acquire_frame(&mut self) -> GpuResult<&SurfaceFrame> {
        if self.frame.is_none() {
            let output = match &mut self.presentation {
                Presentation::Window(surface) => Some(acquire(surface, self.device.device())?),
                Presentation::Headless { .. } => None,
            };
            let view = {
                let texture = match &output {
                    Some(output) => &output.texture,
                    None => match &self.presentation {
                        Presentation::Headless { texture, .. } => texture,
                        Presentation::Window(_) => {
                            return Err(GpuError::Surface("surface frame missing".to_string()))
                        }
                    },
                };
                texture.create_view(&wgpu::TextureViewDescriptor::default())
            };
            let texture = self.textures.insert(TextureSlot::Surface);
            let view = self.views.insert(ViewSlot { texture, view });
            self.frame = Some(SurfaceFrame {
                texture,
                view,
                output,
            });
        }
        self.frame
            .as_ref()
            .ok_or_else(|| GpuError::Surface("surface frame missing".to_string()))
    }

    fn copy_location(&self, location: &TextureCopyLocation) -> GpuResult<wgpu::ImageCopyTexture<'_>> {
        Ok(wgpu::ImageCopyTexture {
            texture: self.texture(location.texture)?,
            mip_level: location.mip_level,
            origin: location.origin,
            aspect: wgpu::TextureAspect::All,
        })
    }
}

fn acquire(surface: &mut SurfaceManager, device: &wgpu::Device) -> GpuResult<SurfaceTexture> {
    match surface.get_current_texture() {
        Ok(output) => Ok(output),
        Err(SurfaceError::Lost | SurfaceError::Outdated) => {
            warn!(target: "tessel::gpu", "surface lost, reconfiguring");
            surface.reconfigure(device);
            surface
                .get_current_texture()
                .map_err(|e| GpuError::Surface(e.to_string()))
        }
        Err(e) => Err(GpuError::Surface(e.to_string())),
    }
}

fn create_offscreen(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: TextureFormat,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Tessel Offscreen Surface"),
        size: Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: map_texture_format(format),
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

impl GpuBackend for WgpuBackend {
    fn create_buffer(&mut self, desc: &BufferDescriptor) -> GpuResult<BufferId> {
        let buffer = self.device.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some(&desc.label),
            size: desc.size,
            usage: desc.usage,
            mapped_at_creation: false,
        });
        Ok(self.buffers.insert(buffer))
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> GpuResult<()> {
        let buffer = self
            .buffers
            .get(buffer)
            .ok_or(GpuError::UnknownResource { kind: "buffer" })?;
        check_buffer_write(offset, data.len())?;
        self.device.queue().write_buffer(buffer, offset, data);
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferId) -> GpuResult<()> {
        let buffer = self
            .buffers
            .remove(buffer)
            .ok_or(GpuError::UnknownResource { kind: "buffer" })?;
        buffer.destroy();
        Ok(())
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> GpuResult<TextureId> {
        desc.validate()?;
        let texture = self.device.device().create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.label),
            size: desc.size,
            mip_level_count: desc.mip_level_count,
            sample_count: desc.sample_count,
            dimension: map_texture_dimension(desc.dimension),
            format: map_texture_format(desc.format),
            usage: desc.usage,
            view_formats: &[],
        });
        Ok(self.textures.insert(TextureSlot::Owned(texture)))
    }

    fn destroy_texture(&mut self, texture: TextureId) -> GpuResult<()> {
        match self.textures.get(texture) {
            Some(TextureSlot::Owned(_)) => {}
            Some(TextureSlot::Surface) => {
                return Err(GpuError::Surface(
                    "the surface texture cannot be destroyed".to_string(),
                ))
            }
            None => return Err(GpuError::UnknownResource { kind: "texture" }),
        }
        self.views.retain(|_, slot| slot.texture != texture);
        if let Some(TextureSlot::Owned(texture)) = self.textures.remove(texture) {
            texture.destroy();
        }
        Ok(())
    }

    fn create_view(
        &mut self,
        texture: TextureId,
        desc: &TextureViewDescriptor,
    ) -> GpuResult<TextureViewId> {
        let view = self.texture(texture)?.create_view(&wgpu::TextureViewDescriptor {
            label: desc.label.as_deref(),
            format: None,
            dimension: desc.dimension.map(map_view_dimension),
            aspect: map_aspect(desc.aspect),
            base_mip_level: desc.base_mip_level,
            mip_level_count: desc.mip_level_count,
            base_array_layer: desc.base_array_layer,
            array_layer_count: desc.array_layer_count,
        });
        Ok(self.views.insert(ViewSlot { texture, view }))
    }

    fn destroy_view(&mut self, view: TextureViewId) -> GpuResult<()> {
        self.views
            .remove(view)
            .map(|_| ())
            .ok_or(GpuError::UnknownResource { kind: "texture view" })
    }

    fn write_texture(
        &mut self,
        dst: TextureCopyLocation,
        data: &[u8],
        layout: ImageDataLayout,
        size: Extent3d,
    ) -> GpuResult<()> {
        let target = self.copy_location(&dst)?;
        self.device.queue().write_texture(
            target,
            data,
            wgpu::ImageDataLayout {
                offset: layout.offset,
                bytes_per_row: Some(layout.bytes_per_row),
                rows_per_image: Some(layout.rows_per_image),
            },
            size,
        );
        Ok(())
    }

    fn copy_texture_to_texture(
        &mut self,
        src: TextureCopyLocation,
        dst: TextureCopyLocation,
        size: Extent3d,
    ) -> GpuResult<()> {
        self.ensure_encoder();
        let mut encoder = self
            .encoder
            .take()
            .ok_or_else(|| GpuError::Backend("no command encoder".to_string()))?;
        let result = self.copy_location(&src).and_then(|src| {
            let dst = self.copy_location(&dst)?;
            encoder.copy_texture_to_texture(src, dst, size);
            Ok(())
        });
        self.encoder = Some(encoder);
        result
    }

    fn create_shader_module(&mut self, label: &str, wgsl: &str) -> GpuResult<ShaderModuleId> {
        let module = self
            .device
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(Cow::Owned(wgsl.to_string())),
            });
        Ok(self.shaders.insert(module))
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> GpuResult<RenderPipelineId> {
        let module = self
            .shaders
            .get(desc.shader)
            .ok_or(GpuError::UnknownResource { kind: "shader module" })?;

        let attributes: Vec<Vec<wgpu::VertexAttribute>> = desc
            .vertex_buffers
            .iter()
            .map(|layout| {
                layout
                    .attributes
                    .iter()
                    .map(|a| wgpu::VertexAttribute {
                        format: map_vertex_format(a.format),
                        offset: a.offset,
                        shader_location: a.shader_location,
                    })
                    .collect()
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = desc
            .vertex_buffers
            .iter()
            .zip(&attributes)
            .map(|(layout, attributes)| wgpu::VertexBufferLayout {
                array_stride: layout.array_stride,
                step_mode: map_step_mode(layout.step_mode),
                attributes,
            })
            .collect();
        let targets: Vec<Option<wgpu::ColorTargetState>> = desc
            .color_targets
            .iter()
            .map(|t| {
                Some(wgpu::ColorTargetState {
                    format: map_texture_format(t.format),
                    blend: t.blend.map(map_blend_state),
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let layout = match &desc.layout {
            PipelineLayout::Auto => None,
            PipelineLayout::Explicit(groups) => {
                let device = self.device.device();
                let group_layouts: Vec<wgpu::BindGroupLayout> = groups
                    .iter()
                    .enumerate()
                    .map(|(index, entries)| {
                        let entries: Vec<wgpu::BindGroupLayoutEntry> =
                            entries.iter().map(map_layout_entry).collect();
                        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                            label: Some(&format!("{} group {}", desc.label, index)),
                            entries: &entries,
                        })
                    })
                    .collect();
                let group_refs: Vec<&wgpu::BindGroupLayout> = group_layouts.iter().collect();
                Some(device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(&desc.label),
                    bind_group_layouts: &group_refs,
                    push_constant_ranges: &[],
                }))
            }
        };

        let pipeline =
            self.device
                .device()
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(&desc.label),
                    layout: layout.as_ref(),
                    vertex: wgpu::VertexState {
                        module,
                        entry_point: &desc.vertex_entry,
                        buffers: &buffers,
                        compilation_options: Default::default(),
                    },
                    fragment: desc.fragment_entry.as_deref().map(|entry| wgpu::FragmentState {
                        module,
                        entry_point: entry,
                        targets: &targets,
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: map_topology(desc.topology),
                        strip_index_format: None,
                        front_face: map_front_face(desc.front_face),
                        cull_mode: map_cull_mode(desc.cull_mode),
                        unclipped_depth: false,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        conservative: false,
                    },
                    depth_stencil: desc.depth_stencil.map(|d| wgpu::DepthStencilState {
                        format: map_texture_format(d.format),
                        depth_write_enabled: d.depth_write_enabled,
                        depth_compare: map_compare_function(d.depth_compare),
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState {
                        count: desc.sample_count,
                        mask: !0,
                        alpha_to_coverage_enabled: false,
                    },
                    multiview: None,
                });
        debug!(target: "tessel::gpu", label = %desc.label, "created render pipeline");
        Ok(self.pipelines.insert(pipeline))
    }

    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> GpuResult<SamplerId> {
        let sampler = self.device.device().create_sampler(&wgpu::SamplerDescriptor {
            label: desc.label.as_deref(),
            address_mode_u: map_address_mode(desc.address_mode_u),
            address_mode_v: map_address_mode(desc.address_mode_v),
            address_mode_w: map_address_mode(desc.address_mode_w),
            mag_filter: map_filter_mode(desc.mag_filter),
            min_filter: map_filter_mode(desc.min_filter),
            mipmap_filter: map_mipmap_filter_mode(desc.mipmap_filter),
            compare: desc.compare.map(map_compare_function),
            ..Default::default()
        });
        Ok(self.samplers.insert(sampler))
    }

    fn create_bind_group(
        &mut self,
        pipeline: RenderPipelineId,
        group: u32,
        entries: &[BindGroupEntry],
    ) -> GpuResult<BindGroupId> {
        let pipeline = self
            .pipelines
            .get(pipeline)
            .ok_or(GpuError::UnknownResource { kind: "render pipeline" })?;
        let layout = pipeline.get_bind_group_layout(group);

        let mut wgpu_entries = Vec::with_capacity(entries.len());
        for entry in entries {
            let resource = match entry.resource {
                BindingResource::TextureView(view) => wgpu::BindingResource::TextureView(
                    self.views
                        .get(view)
                        .map(|slot| &slot.view)
                        .ok_or(GpuError::UnknownResource { kind: "texture view" })?,
                ),
                BindingResource::Sampler(sampler) => wgpu::BindingResource::Sampler(
                    self.samplers
                        .get(sampler)
                        .ok_or(GpuError::UnknownResource { kind: "sampler" })?,
                ),
                BindingResource::Buffer(buffer) => self
                    .buffers
                    .get(buffer)
                    .ok_or(GpuError::UnknownResource { kind: "buffer" })?
                    .as_entire_binding(),
            };
            wgpu_entries.push(wgpu::BindGroupEntry {
                binding: entry.binding,
                resource,
            });
        }

        let bind_group = self
            .device
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: None,
                layout: &layout,
                entries: &wgpu_entries,
            });
        Ok(self.bind_groups.insert(bind_group))
    }

    fn destroy_bind_group(&mut self, group: BindGroupId) -> GpuResult<()> {
        self.bind_groups
            .remove(group)
            .map(|_| ())
            .ok_or(GpuError::UnknownResource { kind: "bind group" })
    }

    fn encode_render_pass(
        &mut self,
        desc: &RenderPassDescriptor,
        draws: &[DrawCall],
    ) -> GpuResult<()> {
        self.ensure_encoder();
        let Self {
            encoder,
            views,
            pipelines,
            bind_groups,
            buffers,
            ..
        } = self;
        let encoder = encoder
            .as_mut()
            .ok_or_else(|| GpuError::Backend("no command encoder".to_string()))?;
        let (views, pipelines, bind_groups, buffers) =
            (&*views, &*pipelines, &*bind_groups, &*buffers);
        let view = |id: TextureViewId| {
            views
                .get(id)
                .map(|slot| &slot.view)
                .ok_or(GpuError::UnknownResource { kind: "texture view" })
        };

        let mut color_attachments = Vec::with_capacity(desc.color_attachments.len());
        for attachment in &desc.color_attachments {
            let load = match (attachment.load, attachment.clear_value) {
                (LoadOp::Clear, Some(color)) => wgpu::LoadOp::Clear(color),
                (LoadOp::Clear, None) => wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                (LoadOp::Load, _) => wgpu::LoadOp::Load,
            };
            color_attachments.push(Some(wgpu::RenderPassColorAttachment {
                view: view(attachment.view)?,
                resolve_target: attachment.resolve_target.map(view).transpose()?,
                ops: wgpu::Operations {
                    load,
                    store: map_store_op(attachment.store),
                },
            }));
        }
        let depth_stencil_attachment = match &desc.depth_attachment {
            Some(depth) => Some(wgpu::RenderPassDepthStencilAttachment {
                view: view(depth.view)?,
                depth_ops: Some(wgpu::Operations {
                    load: match depth.load {
                        LoadOp::Clear => wgpu::LoadOp::Clear(depth.clear_value),
                        LoadOp::Load => wgpu::LoadOp::Load,
                    },
                    store: map_store_op(depth.store),
                }),
                stencil_ops: None,
            }),
            None => None,
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: desc.label.as_deref(),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        for draw in draws {
            let pipeline = pipelines
                .get(draw.pipeline)
                .ok_or(GpuError::UnknownResource { kind: "render pipeline" })?;
            pass.set_pipeline(pipeline);
            for (index, group) in &draw.bind_groups {
                let group = bind_groups
                    .get(*group)
                    .ok_or(GpuError::UnknownResource { kind: "bind group" })?;
                pass.set_bind_group(*index, group, &[]);
            }
            for (slot, buffer) in &draw.vertex_buffers {
                let buffer = buffers
                    .get(*buffer)
                    .ok_or(GpuError::UnknownResource { kind: "buffer" })?;
                pass.set_vertex_buffer(*slot, buffer.slice(..));
            }
            match draw.index_buffer {
                Some((buffer, format)) => {
                    let buffer = buffers
                        .get(buffer)
                        .ok_or(GpuError::UnknownResource { kind: "buffer" })?;
                    pass.set_index_buffer(buffer.slice(..), map_index_format(format));
                    pass.draw_indexed(0..draw.element_count, 0, 0..draw.instance_count);
                }
                None => pass.draw(0..draw.element_count, 0..draw.instance_count),
            }
        }
        trace!(target: "tessel::pass", label = ?desc.label, draws = draws.len(), "encoded render pass");
        Ok(())
    }

    fn surface_size(&self) -> (u32, u32) {
        match &self.presentation {
            Presentation::Window(surface) => (surface.width(), surface.height()),
            Presentation::Headless { size, .. } => *size,
        }
    }

    fn surface_format(&self) -> TextureFormat {
        match &self.presentation {
            Presentation::Window(surface) => surface.format(),
            Presentation::Headless { format, .. } => *format,
        }
    }

    fn current_surface_view(&mut self) -> GpuResult<TextureViewId> {
        Ok(self.acquire_frame()?.view)
    }

    fn current_surface_texture(&mut self) -> GpuResult<TextureId> {
        Ok(self.acquire_frame()?.texture)
    }

    fn submit(&mut self) -> GpuResult<()> {
        if let Some(encoder) = self.encoder.take() {
            self.device.queue().submit(std::iter::once(encoder.finish()));
        }
        if let Some(frame) = self.frame.take() {
            self.views.retain(|_, slot| slot.texture != frame.texture);
            self.textures.remove(frame.texture);
            if let Some(output) = frame.output {
                output.present();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureUsages;

    #[tokio::test]
    #[ignore] // Requires a GPU adapter
    async fn test_headless_frame() {
        let mut gpu = WgpuBackend::headless(
            64,
            64,
            TextureFormat::Rgba8Unorm,
            PowerPreference::LowPower,
        )
        .await
        .expect("Failed to create headless backend");

        let texture = gpu
            .create_texture(&TextureDescriptor::new_2d(
                "upload",
                4,
                4,
                TextureFormat::Rgba8Unorm,
                TextureUsages::COPY_DST | TextureUsages::TEXTURE_BINDING,
            ))
            .unwrap();
        gpu.write_texture(
            TextureCopyLocation::new(texture),
            &[255u8; 64],
            ImageDataLayout {
                offset: 0,
                bytes_per_row: 16,
                rows_per_image: 4,
            },
            Extent3d {
                width: 4,
                height: 4,
                depth_or_array_layers: 1,
            },
        )
        .unwrap();

        let surface = gpu.current_surface_texture().unwrap();
        assert_eq!(gpu.current_surface_texture().unwrap(), surface);
        gpu.submit().unwrap();
        gpu.destroy_texture(texture).unwrap();
        assert!(gpu.destroy_texture(surface).is_err());
    }
}
