//! Headless in-memory backend
//!
//! `RecordingBackend` keeps every resource in generational registries,
//! stores buffer contents, and appends each encoded operation to a command
//! log. It applies the subset of WebGPU validation this crate depends on
//! (usage flags, sample counts, extents, destroyed handles), so it is used
//! both for tests and for dry runs without an adapter.

use slotmap::SlotMap;
use tracing::trace;
use wgpu::{BufferUsages, Extent3d, TextureUsages};

use crate::enums::{TextureDimension, TextureFormat, TextureSampleType};
use crate::error::{GpuError, GpuResult};
use crate::hal::{
    check_buffer_write, BindGroupEntry, BindGroupId, BindGroupLayoutEntry, BindingResource,
    BindingType, BufferDescriptor, BufferId, DrawCall, GpuBackend, ImageDataLayout, RenderPassDescriptor, RenderPipelineDescriptor,
    RenderPipelineId, SamplerDescriptor, SamplerId, ShaderModuleId, TextureCopyLocation,
    TextureDescriptor, TextureId, TextureViewDescriptor, TextureViewId,
};

/// One operation recorded by [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateBuffer {
        buffer: BufferId,
        desc: BufferDescriptor,
    },
    WriteBuffer {
        buffer: BufferId,
        offset: u64,
        len: usize,
    },
    DestroyBuffer {
        buffer: BufferId,
    },
    CreateTexture {
        texture: TextureId,
        desc: TextureDescriptor,
    },
    DestroyTexture {
        texture: TextureId,
    },
    CreateView {
        view: TextureViewId,
        texture: TextureId,
    },
    WriteTexture {
        dst: TextureCopyLocation,
        layout: ImageDataLayout,
        size: Extent3d,
        len: usize,
    },
    CopyTextureToTexture {
        src: TextureCopyLocation,
        dst: TextureCopyLocation,
        size: Extent3d,
    },
    CreateRenderPipeline {
        pipeline: RenderPipelineId,
        label: String,
    },
    RenderPass {
        desc: RenderPassDescriptor,
        draws: Vec<DrawCall>,
    },
    Submit,
}

#[derive(Debug)]
struct RecordedBuffer {
    desc: BufferDescriptor,
    contents: Vec<u8>,
}

#[derive(Debug, Clone)]
struct RecordedView {
    texture: TextureId,
    desc: TextureViewDescriptor,
}

#[derive(Debug)]
struct RecordedBindGroup {
    _pipeline: RenderPipelineId,
    _group: u32,
    entries: Vec<BindGroupEntry>,
}

#[derive(Debug, Clone, Copy)]
struct SurfaceFrame {
    texture: TextureId,
    view: TextureViewId,
}

pub struct RecordingBackend {
    buffers: SlotMap<BufferId, RecordedBuffer>,
    textures: SlotMap<TextureId, TextureDescriptor>,
    views: SlotMap<TextureViewId, RecordedView>,
    samplers: SlotMap<SamplerId, SamplerDescriptor>,
    shaders: SlotMap<ShaderModuleId, String>,
    pipelines: SlotMap<RenderPipelineId, RenderPipelineDescriptor>,
    bind_groups: SlotMap<BindGroupId, RecordedBindGroup>,

    surface_size: (u32, u32),
    surface_format: TextureFormat,
    surface_frame: Option<SurfaceFrame>,
    fail_next_buffer: bool,
    fail_next_destroy: bool,
    fail_next_texture_write: bool,

    commands: Vec<Command>,
    submit_count: u64,
}

impl RecordingBackend {
    /// Backend with a `width` x `height` presentation surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            views: SlotMap::with_key(),
            samplers: SlotMap::with_key(),
            shaders: SlotMap::with_key(),
            pipelines: SlotMap::with_key(),
            bind_groups: SlotMap::with_key(),
            surface_size: (width, height),
            surface_format: TextureFormat::Bgra8Unorm,
            surface_frame: None,
            fail_next_buffer: false,
            fail_next_destroy: false,
            fail_next_texture_write: false,
            commands: Vec::new(),
            submit_count: 0,
        }
    }

    pub fn with_surface_format(mut self, format: TextureFormat) -> Self {
        self.surface_format = format;
        self
    }

    /// Simulate a window resize
    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.surface_size = (width, height);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn submit_count(&self) -> u64 {
        self.submit_count
    }

    pub fn is_buffer_alive(&self, buffer: BufferId) -> bool {
        self.buffers.contains_key(buffer)
    }

    pub fn is_texture_alive(&self, texture: TextureId) -> bool {
        self.textures.contains_key(texture)
    }

    pub fn buffer_size(&self, buffer: BufferId) -> Option<u64> {
        self.buffers.get(buffer).map(|b| b.desc.size)
    }

    pub fn buffer_usage(&self, buffer: BufferId) -> Option<BufferUsages> {
        self.buffers.get(buffer).map(|b| b.desc.usage)
    }

    /// Bytes `[0, len)` of a buffer
    pub fn buffer_contents(&self, buffer: BufferId, len: usize) -> Option<&[u8]> {
        self.buffers
            .get(buffer)
            .and_then(|b| b.contents.get(..len))
    }

    pub fn texture_descriptor(&self, texture: TextureId) -> Option<&TextureDescriptor> {
        self.textures.get(texture)
    }

    /// Make the next `create_buffer` fail as if the device ran out of memory
    pub fn fail_next_buffer_allocation(&mut self) {
        self.fail_next_buffer = true;
    }

    /// Make the next `destroy_texture` fail without destroying anything
    pub fn fail_next_texture_destroy(&mut self) {
        self.fail_next_destroy = true;
    }

    pub fn fail_next_texture_write(&mut self) {
        self.fail_next_texture_write = true;
    }

    /// Texture `view` was created for. Destroyed views are answered from the
    /// command log until [`Self::clear_commands`].
    pub fn view_texture(&self, view: TextureViewId) -> Option<TextureId> {
        if let Some(recorded) = self.views.get(view) {
            return Some(recorded.texture);
        }
        self.commands.iter().rev().find_map(|c| match c {
            Command::CreateView { view: v, texture } if *v == view => Some(*texture),
            _ => None,
        })
    }

    pub fn is_view_alive(&self, view: TextureViewId) -> bool {
        self.views.contains_key(view)
    }

    pub fn live_view_count(&self) -> usize {
        self.views.len()
    }

    pub fn live_bind_group_count(&self) -> usize {
        self.bind_groups.len()
    }

    pub fn view_descriptor(&self, view: TextureViewId) -> Option<&TextureViewDescriptor> {
        self.views.get(view).map(|v| &v.desc)
    }

    pub fn bind_group_entries(&self, group: BindGroupId) -> Option<&[BindGroupEntry]> {
        self.bind_groups.get(group).map(|g| g.entries.as_slice())
    }

    pub fn pipeline_descriptor(&self, pipeline: RenderPipelineId) -> Option<&RenderPipelineDescriptor> {
        self.pipelines.get(pipeline)
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn render_passes(&self) -> Vec<(&RenderPassDescriptor, &[DrawCall])> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::RenderPass { desc, draws } => Some((desc, draws.as_slice())),
                _ => None,
            })
            .collect()
    }

    pub fn texture_writes(&self) -> Vec<(TextureCopyLocation, ImageDataLayout, Extent3d)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::WriteTexture {
                    dst, layout, size, ..
                } => Some((*dst, *layout, *size)),
                _ => None,
            })
            .collect()
    }

    pub fn texture_copies(&self) -> Vec<(TextureCopyLocation, TextureCopyLocation, Extent3d)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::CopyTextureToTexture { src, dst, size } => Some((*src, *dst, *size)),
                _ => None,
            })
            .collect()
    }

    pub fn buffer_writes(&self, buffer: BufferId) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::WriteBuffer { buffer: b, .. } if *b == buffer))
            .count()
    }

    fn texture(&self, texture: TextureId) -> GpuResult<&TextureDescriptor> {
        self.textures
            .get(texture)
            .ok_or(GpuError::UnknownResource { kind: "texture" })
    }

    fn view(&self, view: TextureViewId) -> GpuResult<(&RecordedView, &TextureDescriptor)> {
        let recorded = self
            .views
            .get(view)
            .ok_or(GpuError::UnknownResource { kind: "texture view" })?;
        let texture = self.texture(recorded.texture)?;
        Ok((recorded, texture))
    }

    fn check_region(
        desc: &TextureDescriptor,
        location: &TextureCopyLocation,
        size: Extent3d,
    ) -> GpuResult<()> {
        if location.mip_level >= desc.mip_level_count {
            return Err(GpuError::Backend(format!(
                "mip level {} out of range for '{}'",
                location.mip_level, desc.label
            )));
        }
        let width = (desc.size.width >> location.mip_level).max(1);
        let height = (desc.size.height >> location.mip_level).max(1);
        let depth = match desc.dimension {
            TextureDimension::D3 => (desc.size.depth_or_array_layers >> location.mip_level).max(1),
            _ => desc.size.depth_or_array_layers,
        };
        if location.origin.x + size.width > width
            || location.origin.y + size.height > height
            || location.origin.z + size.depth_or_array_layers > depth
        {
            return Err(GpuError::Backend(format!(
                "copy region {:?}+{:?} exceeds '{}' level {} ({}x{}x{})",
                location.origin, size, desc.label, location.mip_level, width, height, depth
            )));
        }
        Ok(())
    }

    fn check_attachment_view(&self, view: TextureViewId) -> GpuResult<&TextureDescriptor> {
        let (_, desc) = self.view(view)?;
        if !desc.usage.contains(TextureUsages::RENDER_ATTACHMENT) {
            return Err(GpuError::Backend(format!(
                "'{}' is not a render attachment",
                desc.label
            )));
        }
        Ok(desc)
    }

    /// Entries must fill an explicit layout slot for slot with matching kinds
    fn check_layout(
        &self,
        pipeline: &str,
        layout: &[BindGroupLayoutEntry],
        entries: &[BindGroupEntry],
    ) -> GpuResult<()> {
        if layout.len() != entries.len() {
            return Err(GpuError::Backend(format!(
                "'{}' expects {} bindings, got {}",
                pipeline,
                layout.len(),
                entries.len()
            )));
        }
        for entry in entries {
            let slot = layout
                .iter()
                .find(|slot| slot.binding == entry.binding)
                .ok_or_else(|| {
                    GpuError::Backend(format!(
                        "'{}' has no binding {}",
                        pipeline, entry.binding
                    ))
                })?;
            let compatible = match (slot.ty, entry.resource) {
                (
                    BindingType::Texture {
                        sample_type,
                        multisampled,
                        ..
                    },
                    BindingResource::TextureView(view),
                ) => {
                    let (_, texture) = self.view(view)?;
                    let format = texture.format;
                    let sample_ok = match sample_type {
                        TextureSampleType::Float => format.is_filterable(),
                        TextureSampleType::UnfilterableFloat => !format.is_integer(),
                        TextureSampleType::Depth => format.is_depth(),
                    };
                    sample_ok && texture.is_multisampled() == multisampled
                }
                (BindingType::Sampler(_), BindingResource::Sampler(_)) => true,
                (BindingType::Buffer(_), BindingResource::Buffer(_)) => true,
                _ => false,
            };
            if !compatible {
                return Err(GpuError::Backend(format!(
                    "binding {} of '{}' does not match {:?}",
                    entry.binding, pipeline, slot.ty
                )));
            }
        }
        Ok(())
    }

    fn check_draw(&self, draw: &DrawCall) -> GpuResult<()> {
        if !self.pipelines.contains_key(draw.pipeline) {
            return Err(GpuError::UnknownResource { kind: "render pipeline" });
        }
        for (_, group) in &draw.bind_groups {
            let group = self
                .bind_groups
                .get(*group)
                .ok_or(GpuError::UnknownResource { kind: "bind group" })?;
            for entry in &group.entries {
                match entry.resource {
                    BindingResource::TextureView(view) => {
                        self.view(view)?;
                    }
                    BindingResource::Buffer(buffer) if !self.buffers.contains_key(buffer) => {
                        return Err(GpuError::UnknownResource { kind: "buffer" });
                    }
                    _ => {}
                }
            }
        }
        for (_, buffer) in &draw.vertex_buffers {
            if !self.buffers.contains_key(*buffer) {
                return Err(GpuError::UnknownResource { kind: "buffer" });
            }
        }
        if let Some((buffer, _)) = draw.index_buffer {
            if !self.buffers.contains_key(buffer) {
                return Err(GpuError::UnknownResource { kind: "buffer" });
            }
        }
        Ok(())
    }
}

impl GpuBackend for RecordingBackend {
    fn create_buffer(&mut self, desc: &BufferDescriptor) -> GpuResult<BufferId> {
        if std::mem::take(&mut self.fail_next_buffer) {
            return Err(GpuError::Backend(format!(
                "out of memory allocating buffer '{}'",
                desc.label
            )));
        }
        let buffer = self.buffers.insert(RecordedBuffer {
            desc: desc.clone(),
            contents: vec![0; desc.size as usize],
        });
        self.commands.push(Command::CreateBuffer {
            buffer,
            desc: desc.clone(),
        });
        Ok(buffer)
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> GpuResult<()> {
        let recorded = self
            .buffers
            .get_mut(buffer)
            .ok_or(GpuError::UnknownResource { kind: "buffer" })?;
        check_buffer_write(offset, data.len())?;
        if !recorded.desc.usage.contains(BufferUsages::COPY_DST) {
            return Err(GpuError::Backend(format!(
                "buffer '{}' lacks COPY_DST usage",
                recorded.desc.label
            )));
        }
        let start = offset as usize;
        let end = start + data.len();
        if end > recorded.contents.len() {
            return Err(GpuError::Backend(format!(
                "write of {} bytes at {} overflows buffer '{}' ({} bytes)",
                data.len(),
                offset,
                recorded.desc.label,
                recorded.desc.size
            )));
        }
        recorded.contents[start..end].copy_from_slice(data);
        self.commands.push(Command::WriteBuffer {
            buffer,
            offset,
            len: data.len(),
        });
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferId) -> GpuResult<()> {
        self.buffers
            .remove(buffer)
            .ok_or(GpuError::UnknownResource { kind: "buffer" })?;
        self.commands.push(Command::DestroyBuffer { buffer });
        Ok(())
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> GpuResult<TextureId> {
        desc.validate()?;
        let texture = self.textures.insert(desc.clone());
        self.commands.push(Command::CreateTexture {
            texture,
            desc: desc.clone(),
        });
        Ok(texture)
    }

    fn destroy_texture(&mut self, texture: TextureId) -> GpuResult<()> {
        if std::mem::take(&mut self.fail_next_destroy) {
            return Err(GpuError::Backend("device lost while destroying texture".to_string()));
        }
        self.textures
            .remove(texture)
            .ok_or(GpuError::UnknownResource { kind: "texture" })?;
        self.views.retain(|_, v| v.texture != texture);
        self.commands.push(Command::DestroyTexture { texture });
        Ok(())
    }

    fn create_view(
        &mut self,
        texture: TextureId,
        desc: &TextureViewDescriptor,
    ) -> GpuResult<TextureViewId> {
        let tex = self.texture(texture)?;
        let mip_count = desc.mip_level_count.unwrap_or(tex.mip_level_count - desc.base_mip_level.min(tex.mip_level_count));
        if desc.base_mip_level + mip_count > tex.mip_level_count {
            return Err(GpuError::Backend(format!(
                "view mip range {}..{} exceeds '{}'",
                desc.base_mip_level,
                desc.base_mip_level + mip_count,
                tex.label
            )));
        }
        let layers = match tex.dimension {
            TextureDimension::D3 => 1,
            _ => tex.size.depth_or_array_layers,
        };
        let layer_count = desc.array_layer_count.unwrap_or(layers - desc.base_array_layer.min(layers));
        if desc.base_array_layer + layer_count > layers {
            return Err(GpuError::Backend(format!(
                "view layer range {}..{} exceeds '{}'",
                desc.base_array_layer,
                desc.base_array_layer + layer_count,
                tex.label
            )));
        }
        let view = self.views.insert(RecordedView {
            texture,
            desc: desc.clone(),
        });
        self.commands.push(Command::CreateView { view, texture });
        Ok(view)
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
        if std::mem::take(&mut self.fail_next_texture_write) {
            return Err(GpuError::Backend("queue write rejected".to_string()));
        }
        let desc = self.texture(dst.texture)?;
        if !desc.usage.contains(TextureUsages::COPY_DST) {
            return Err(GpuError::Backend(format!(
                "texture '{}' lacks COPY_DST usage",
                desc.label
            )));
        }
        Self::check_region(desc, &dst, size)?;
        let row_bytes = size.width as u64 * desc.format.pixel_size() as u64;
        if (layout.bytes_per_row as u64) < row_bytes {
            return Err(GpuError::Backend(format!(
                "bytes_per_row {} smaller than row size {}",
                layout.bytes_per_row, row_bytes
            )));
        }
        let required = layout.offset
            + layout.bytes_per_row as u64
                * layout.rows_per_image as u64
                * size.depth_or_array_layers as u64;
        if (data.len() as u64) < required {
            return Err(GpuError::Backend(format!(
                "texture write needs {} bytes, got {}",
                required,
                data.len()
            )));
        }
        trace!(target: "tessel::texture", label = %desc.label, z = dst.origin.z, "recorded texture write");
        self.commands.push(Command::WriteTexture {
            dst,
            layout,
            size,
            len: data.len(),
        });
        Ok(())
    }

    fn copy_texture_to_texture(
        &mut self,
        src: TextureCopyLocation,
        dst: TextureCopyLocation,
        size: Extent3d,
    ) -> GpuResult<()> {
        let src_desc = self.texture(src.texture)?;
        let dst_desc = self.texture(dst.texture)?;
        if !src_desc.usage.contains(TextureUsages::COPY_SRC) {
            return Err(GpuError::Backend(format!(
                "texture '{}' lacks COPY_SRC usage",
                src_desc.label
            )));
        }
        if !dst_desc.usage.contains(TextureUsages::COPY_DST) {
            return Err(GpuError::Backend(format!(
                "texture '{}' lacks COPY_DST usage",
                dst_desc.label
            )));
        }
        if src_desc.sample_count != dst_desc.sample_count || src_desc.is_multisampled() {
            return Err(GpuError::Backend(
                "multisampled textures cannot be copied".to_string(),
            ));
        }
        if src_desc.format != dst_desc.format {
            return Err(GpuError::Backend(format!(
                "copy format mismatch {} -> {}",
                src_desc.format, dst_desc.format
            )));
        }
        Self::check_region(src_desc, &src, size)?;
        Self::check_region(dst_desc, &dst, size)?;
        self.commands
            .push(Command::CopyTextureToTexture { src, dst, size });
        Ok(())
    }

    fn create_shader_module(&mut self, _label: &str, wgsl: &str) -> GpuResult<ShaderModuleId> {
        Ok(self.shaders.insert(wgsl.to_string()))
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> GpuResult<RenderPipelineId> {
        if !self.shaders.contains_key(desc.shader) {
            return Err(GpuError::UnknownResource { kind: "shader module" });
        }
        let pipeline = self.pipelines.insert(desc.clone());
        self.commands.push(Command::CreateRenderPipeline {
            pipeline,
            label: desc.label.clone(),
        });
        Ok(pipeline)
    }

    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> GpuResult<SamplerId> {
        Ok(self.samplers.insert(desc.clone()))
    }

    fn create_bind_group(
        &mut self,
        pipeline: RenderPipelineId,
        group: u32,
        entries: &[BindGroupEntry],
    ) -> GpuResult<BindGroupId> {
        let desc = self
            .pipelines
            .get(pipeline)
            .ok_or(GpuError::UnknownResource { kind: "render pipeline" })?;
        if let Some(layout) = desc.layout.group(group) {
            self.check_layout(&desc.label, layout, entries)?;
        }
        for entry in entries {
            match entry.resource {
                BindingResource::TextureView(view) => {
                    let (_, desc) = self.view(view)?;
                    if !desc.usage.contains(TextureUsages::TEXTURE_BINDING) {
                        return Err(GpuError::Backend(format!(
                            "'{}' lacks TEXTURE_BINDING usage",
                            desc.label
                        )));
                    }
                }
                BindingResource::Sampler(sampler) => {
                    if !self.samplers.contains_key(sampler) {
                        return Err(GpuError::UnknownResource { kind: "sampler" });
                    }
                }
                BindingResource::Buffer(buffer) => {
                    if !self.buffers.contains_key(buffer) {
                        return Err(GpuError::UnknownResource { kind: "buffer" });
                    }
                }
            }
        }
        Ok(self.bind_groups.insert(RecordedBindGroup {
            _pipeline: pipeline,
            _group: group,
            entries: entries.to_vec(),
        }))
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
        for attachment in &desc.color_attachments {
            let color = self.check_attachment_view(attachment.view)?;
            if let Some(resolve) = attachment.resolve_target {
                let multisampled = color.is_multisampled();
                let target = self.check_attachment_view(resolve)?;
                if !multisampled || target.is_multisampled() {
                    return Err(GpuError::Backend(
                        "resolve requires a multisampled attachment and a single-sampled target"
                            .to_string(),
                    ));
                }
            }
        }
        if let Some(depth) = &desc.depth_attachment {
            let depth_desc = self.check_attachment_view(depth.view)?;
            if !depth_desc.format.is_depth() {
                return Err(GpuError::Backend(format!(
                    "'{}' is not a depth texture",
                    depth_desc.label
                )));
            }
        }
        for draw in draws {
            self.check_draw(draw)?;
        }
        self.commands.push(Command::RenderPass {
            desc: desc.clone(),
            draws: draws.to_vec(),
        });
        Ok(())
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    fn surface_format(&self) -> TextureFormat {
        self.surface_format
    }

    fn current_surface_view(&mut self) -> GpuResult<TextureViewId> {
        if let Some(frame) = self.surface_frame {
            return Ok(frame.view);
        }
        let (width, height) = self.surface_size;
        let texture = self.textures.insert(TextureDescriptor::new_2d(
            "surface",
            width,
            height,
            self.surface_format,
            TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_DST,
        ));
        let view = self.views.insert(RecordedView {
            texture,
            desc: TextureViewDescriptor::default(),
        });
        self.commands.push(Command::CreateView { view, texture });
        self.surface_frame = Some(SurfaceFrame { texture, view });
        Ok(view)
    }

    fn current_surface_texture(&mut self) -> GpuResult<TextureId> {
        self.current_surface_view()?;
        self.surface_frame
            .map(|frame| frame.texture)
            .ok_or_else(|| GpuError::Surface("no surface frame".to_string()))
    }

    fn submit(&mut self) -> GpuResult<()> {
        if let Some(frame) = self.surface_frame.take() {
            self.textures.remove(frame.texture);
            self.views.retain(|_, v| v.texture != frame.texture);
        }
        self.submit_count += 1;
        self.commands.push(Command::Submit);
        Ok(())
    }
}
