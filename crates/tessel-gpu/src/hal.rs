//! Backend-agnostic GPU interface
//!
//! Resources live inside the backend and are addressed by generational
//! handles. A handle is never handed out twice, so comparing handles tells
//! whether two calls produced the same GPU object.
//!
//! Descriptors here are the single internal representation of GPU objects.
//! Backends translate them to their native API when a resource is created.

use smallvec::SmallVec;
use slotmap::new_key_type;
use wgpu::{BufferUsages, Color, Extent3d, Origin3d, ShaderStages, TextureUsages};

use crate::enums::{
    AddressMode, BlendFactor, BlendOperation, BufferBindingType, CompareFunction, CullMode,
    FilterMode, FrontFace, IndexFormat, LoadOp, MipmapFilterMode, PrimitiveTopology,
    SamplerBindingType, StoreOp, TextureDimension, TextureFormat, TextureSampleType,
    TextureViewDimension, VertexFormat, VertexStepMode,
};
use crate::error::GpuResult;

new_key_type! {
    pub struct BufferId;
    pub struct TextureId;
    pub struct TextureViewId;
    pub struct SamplerId;
    pub struct ShaderModuleId;
    pub struct RenderPipelineId;
    pub struct BindGroupId;
}

/// Granularity of buffer writes and copies
pub const COPY_BUFFER_ALIGNMENT: u64 = wgpu::COPY_BUFFER_ALIGNMENT;

/// `size` rounded up to [`COPY_BUFFER_ALIGNMENT`]
pub const fn align_copy_size(size: u64) -> u64 {
    size.next_multiple_of(COPY_BUFFER_ALIGNMENT)
}

/// Rejects buffer writes a WebGPU queue would refuse
pub fn check_buffer_write(offset: u64, len: usize) -> GpuResult<()> {
    if offset % COPY_BUFFER_ALIGNMENT != 0 || len as u64 % COPY_BUFFER_ALIGNMENT != 0 {
        return Err(crate::error::GpuError::InvalidDescriptor(format!(
            "buffer write of {} bytes at offset {} is not {}-byte aligned",
            len, offset, COPY_BUFFER_ALIGNMENT
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDescriptor {
    pub label: String,
    pub size: u64,
    pub usage: BufferUsages,
}

/// Immutable description of a texture allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub label: String,
    pub size: Extent3d,
    pub format: TextureFormat,
    pub usage: TextureUsages,
    pub mip_level_count: u32,
    pub sample_count: u32,
    pub dimension: TextureDimension,
}

impl TextureDescriptor {
    /// Single-level, single-sample 2D texture
    pub fn new_2d(
        label: impl Into<String>,
        width: u32,
        height: u32,
        format: TextureFormat,
        usage: TextureUsages,
    ) -> Self {
        Self {
            label: label.into(),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            format,
            usage,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
        }
    }

    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn is_multisampled(&self) -> bool {
        self.sample_count > 1
    }

    /// Checks the invariants every backend relies on.
    pub fn validate(&self) -> GpuResult<()> {
        use crate::error::GpuError::InvalidDescriptor;

        if self.size.width == 0 || self.size.height == 0 || self.size.depth_or_array_layers == 0 {
            return Err(InvalidDescriptor(format!(
                "texture '{}' has empty extent {}x{}x{}",
                self.label, self.size.width, self.size.height, self.size.depth_or_array_layers
            )));
        }
        if self.mip_level_count == 0 {
            return Err(InvalidDescriptor(format!(
                "texture '{}' needs at least one mip level",
                self.label
            )));
        }
        if self.sample_count == 0 {
            return Err(InvalidDescriptor(format!(
                "texture '{}' needs a sample count >= 1",
                self.label
            )));
        }
        if self.is_multisampled() {
            if self.mip_level_count != 1 {
                return Err(InvalidDescriptor(format!(
                    "multisampled texture '{}' must have exactly one mip level",
                    self.label
                )));
            }
            if self
                .usage
                .intersects(TextureUsages::COPY_SRC | TextureUsages::STORAGE_BINDING)
            {
                return Err(InvalidDescriptor(format!(
                    "multisampled texture '{}' cannot be a copy source",
                    self.label
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureAspect {
    #[default]
    All,
    DepthOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextureViewDescriptor {
    pub label: Option<String>,
    pub dimension: Option<TextureViewDimension>,
    pub aspect: TextureAspect,
    pub base_mip_level: u32,
    pub mip_level_count: Option<u32>,
    pub base_array_layer: u32,
    pub array_layer_count: Option<u32>,
}

impl TextureViewDescriptor {
    /// View of exactly one sub-resource
    pub fn single(mip_level: u32, layer: u32) -> Self {
        Self {
            label: None,
            dimension: Some(TextureViewDimension::D2),
            aspect: TextureAspect::All,
            base_mip_level: mip_level,
            mip_level_count: Some(1),
            base_array_layer: layer,
            array_layer_count: Some(1),
        }
    }

    pub fn with_aspect(mut self, aspect: TextureAspect) -> Self {
        self.aspect = aspect;
        self
    }
}

/// Memory layout of CPU-side texel data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDataLayout {
    pub offset: u64,
    pub bytes_per_row: u32,
    pub rows_per_image: u32,
}

/// Destination sub-resource of a texture write or copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureCopyLocation {
    pub texture: TextureId,
    pub mip_level: u32,
    pub origin: Origin3d,
}

impl TextureCopyLocation {
    pub fn new(texture: TextureId) -> Self {
        Self {
            texture,
            mip_level: 0,
            origin: Origin3d::ZERO,
        }
    }

    pub fn at_layer(texture: TextureId, layer: u32) -> Self {
        Self {
            texture,
            mip_level: 0,
            origin: Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
        }
    }

    pub fn with_mip_level(mut self, mip_level: u32) -> Self {
        self.mip_level = mip_level;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDescriptor {
    pub label: Option<String>,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
    pub address_mode_w: AddressMode,
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub mipmap_filter: MipmapFilterMode,
    pub compare: Option<CompareFunction>,
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: MipmapFilterMode::Nearest,
            compare: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendComponent {
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
    pub operation: BlendOperation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendState {
    pub color: BlendComponent,
    pub alpha: BlendComponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTargetState {
    pub format: TextureFormat,
    pub blend: Option<BlendState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilState {
    pub format: TextureFormat,
    pub depth_write_enabled: bool,
    pub depth_compare: CompareFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub format: VertexFormat,
    pub offset: u64,
    pub shader_location: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBufferLayout {
    pub array_stride: u64,
    pub step_mode: VertexStepMode,
    pub attributes: Vec<VertexAttribute>,
}

/// Resource kind expected at one bind group layout slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    Buffer(BufferBindingType),
    Sampler(SamplerBindingType),
    Texture {
        sample_type: TextureSampleType,
        view_dimension: TextureViewDimension,
        multisampled: bool,
    },
}

impl BindingType {
    /// Non-arrayed 2D texture binding
    pub fn texture_2d(sample_type: TextureSampleType, multisampled: bool) -> Self {
        BindingType::Texture {
            sample_type,
            view_dimension: TextureViewDimension::D2,
            multisampled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindGroupLayoutEntry {
    pub binding: u32,
    pub visibility: ShaderStages,
    pub ty: BindingType,
}

impl BindGroupLayoutEntry {
    pub fn fragment(binding: u32, ty: BindingType) -> Self {
        Self {
            binding,
            visibility: ShaderStages::FRAGMENT,
            ty,
        }
    }
}

/// Where a pipeline's bind group layouts come from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelineLayout {
    /// Derived from the shader by the backend
    #[default]
    Auto,
    /// One entry list per bind group index
    ///
    /// Needed when the derived layout is wrong for the bound resources, e.g.
    /// depth textures read as unfilterable floats.
    Explicit(Vec<Vec<BindGroupLayoutEntry>>),
}

impl PipelineLayout {
    /// Entries of group `index`, `None` for derived layouts
    pub fn group(&self, index: u32) -> Option<&[BindGroupLayoutEntry]> {
        match self {
            PipelineLayout::Auto => None,
            PipelineLayout::Explicit(groups) => groups.get(index as usize).map(Vec::as_slice),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderPipelineDescriptor {
    pub label: String,
    pub layout: PipelineLayout,
    pub shader: ShaderModuleId,
    pub vertex_entry: String,
    pub fragment_entry: Option<String>,
    pub vertex_buffers: Vec<VertexBufferLayout>,
    pub color_targets: Vec<ColorTargetState>,
    pub depth_stencil: Option<DepthStencilState>,
    pub topology: PrimitiveTopology,
    pub front_face: FrontFace,
    pub cull_mode: CullMode,
    pub sample_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingResource {
    TextureView(TextureViewId),
    Sampler(SamplerId),
    Buffer(BufferId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindGroupEntry {
    pub binding: u32,
    pub resource: BindingResource,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorAttachment {
    pub view: TextureViewId,
    pub resolve_target: Option<TextureViewId>,
    pub load: LoadOp,
    /// Only read when `load` is [`LoadOp::Clear`]
    pub clear_value: Option<Color>,
    pub store: StoreOp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthAttachment {
    pub view: TextureViewId,
    pub load: LoadOp,
    pub clear_value: f32,
    pub store: StoreOp,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderPassDescriptor {
    pub label: Option<String>,
    pub color_attachments: Vec<ColorAttachment>,
    pub depth_attachment: Option<DepthAttachment>,
}

/// One draw recorded inside a render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub pipeline: RenderPipelineId,
    pub bind_groups: SmallVec<[(u32, BindGroupId); 4]>,
    pub vertex_buffers: SmallVec<[(u32, BufferId); 2]>,
    pub index_buffer: Option<(BufferId, IndexFormat)>,
    /// Index count when an index buffer is bound, vertex count otherwise
    pub element_count: u32,
    pub instance_count: u32,
}

impl DrawCall {
    /// Non-indexed draw without vertex buffers
    pub fn procedural(pipeline: RenderPipelineId, vertex_count: u32) -> Self {
        Self {
            pipeline,
            bind_groups: SmallVec::new(),
            vertex_buffers: SmallVec::new(),
            index_buffer: None,
            element_count: vertex_count,
            instance_count: 1,
        }
    }

    pub fn with_bind_group(mut self, index: u32, group: BindGroupId) -> Self {
        self.bind_groups.push((index, group));
        self
    }
}

/// Operations a GPU backend provides to the resource layer.
///
/// All encoding goes into one command stream per frame which is handed to
/// the device by [`GpuBackend::submit`]. Buffer and texture writes are
/// queue writes and become visible to the next submission.
pub trait GpuBackend {
    fn create_buffer(&mut self, desc: &BufferDescriptor) -> GpuResult<BufferId>;
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> GpuResult<()>;
    fn destroy_buffer(&mut self, buffer: BufferId) -> GpuResult<()>;

    fn create_texture(&mut self, desc: &TextureDescriptor) -> GpuResult<TextureId>;
    fn destroy_texture(&mut self, texture: TextureId) -> GpuResult<()>;
    fn create_view(
        &mut self,
        texture: TextureId,
        desc: &TextureViewDescriptor,
    ) -> GpuResult<TextureViewId>;
    /// Drop a view. Views of a destroyed texture are dropped with it.
    fn destroy_view(&mut self, view: TextureViewId) -> GpuResult<()>;

    /// Upload texel data into one region of a texture.
    fn write_texture(
        &mut self,
        dst: TextureCopyLocation,
        data: &[u8],
        layout: ImageDataLayout,
        size: Extent3d,
    ) -> GpuResult<()>;

    fn copy_texture_to_texture(
        &mut self,
        src: TextureCopyLocation,
        dst: TextureCopyLocation,
        size: Extent3d,
    ) -> GpuResult<()>;

    fn create_shader_module(&mut self, label: &str, wgsl: &str) -> GpuResult<ShaderModuleId>;
    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> GpuResult<RenderPipelineId>;
    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> GpuResult<SamplerId>;

    /// Bind group matching layout `group` of `pipeline`
    fn create_bind_group(
        &mut self,
        pipeline: RenderPipelineId,
        group: u32,
        entries: &[BindGroupEntry],
    ) -> GpuResult<BindGroupId>;
    fn destroy_bind_group(&mut self, group: BindGroupId) -> GpuResult<()>;

    /// Encode one render pass containing `draws`.
    fn encode_render_pass(
        &mut self,
        desc: &RenderPassDescriptor,
        draws: &[DrawCall],
    ) -> GpuResult<()>;

    /// Current drawable size of the presentation surface
    fn surface_size(&self) -> (u32, u32);
    fn surface_format(&self) -> TextureFormat;

    /// View of the texture that will be presented at the end of this frame.
    ///
    /// Repeated calls within one frame return the same view.
    fn current_surface_view(&mut self) -> GpuResult<TextureViewId>;

    /// Texture behind [`GpuBackend::current_surface_view`]
    fn current_surface_texture(&mut self) -> GpuResult<TextureId>;

    /// Submit the frame's commands and present the surface texture.
    fn submit(&mut self) -> GpuResult<()>;
}
