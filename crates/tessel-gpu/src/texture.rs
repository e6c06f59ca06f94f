//! GPU texture resources, texture slots and mip level policy

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::enums::{TextureDimension, TextureFormat};
use crate::error::GpuResult;
use crate::hal::{
    GpuBackend, TextureAspect, TextureDescriptor, TextureId, TextureViewDescriptor, TextureViewId,
};
use crate::image::{ImageData, TextureTopology};
use crate::release::ReleaseFlag;
use crate::stats::GpuStats;

/// How many mip levels a loaded texture gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MipMapping {
    /// Full chain down to 1x1
    #[default]
    Full,
    /// Exactly this many levels
    Limited(u32),
    Off,
}

impl MipMapping {
    /// Number of levels for a `width` x `height` base level
    pub fn num_levels(self, width: u32, height: u32) -> u32 {
        match self {
            MipMapping::Full => full_mip_chain(width, height),
            MipMapping::Limited(n) => n,
            MipMapping::Off => 1,
        }
    }
}

/// `floor(log2(max(width, height))) + 1`
pub fn full_mip_chain(width: u32, height: u32) -> u32 {
    let max = width.max(height).max(1);
    32 - max.leading_zeros()
}

/// Largest mip level count a texture of this shape may have
pub fn max_mip_levels(dimension: TextureDimension, width: u32, height: u32, depth: u32) -> u32 {
    match dimension {
        TextureDimension::D1 => 1,
        TextureDimension::D2 => full_mip_chain(width, height),
        TextureDimension::D3 => full_mip_chain(width.max(depth), height),
    }
}

/// A GPU texture together with the descriptor it was created from.
///
/// The resource is released exactly once through [`GpuTextureResource::release`];
/// it is shared via `Arc` between texture slots and the deferred release
/// queue, and the release flag arbitrates between them.
pub struct GpuTextureResource {
    texture: TextureId,
    descriptor: TextureDescriptor,
    released: ReleaseFlag,
    estimated_size: u64,
    stats: Arc<GpuStats>,
}

impl GpuTextureResource {
    /// Allocate a texture on the backend
    pub fn create(
        gpu: &mut dyn GpuBackend,
        descriptor: TextureDescriptor,
        stats: &Arc<GpuStats>,
    ) -> GpuResult<Arc<Self>> {
        descriptor.validate()?;
        let texture = gpu.create_texture(&descriptor)?;
        let estimated_size = estimate_size(&descriptor);
        stats.texture_allocated(estimated_size);

        debug!(
            target: "tessel::texture",
            label = %descriptor.label,
            format = %descriptor.format,
            width = descriptor.size.width,
            height = descriptor.size.height,
            layers = descriptor.size.depth_or_array_layers,
            mips = descriptor.mip_level_count,
            samples = descriptor.sample_count,
            "created texture"
        );

        Ok(Arc::new(Self {
            texture,
            descriptor,
            released: ReleaseFlag::new(),
            estimated_size,
            stats: stats.clone(),
        }))
    }

    pub fn texture_id(&self) -> TextureId {
        self.texture
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    pub fn label(&self) -> &str {
        &self.descriptor.label
    }

    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    pub fn width(&self) -> u32 {
        self.descriptor.size.width
    }

    pub fn height(&self) -> u32 {
        self.descriptor.size.height
    }

    /// Depth for 3D textures, layer count otherwise
    pub fn depth(&self) -> u32 {
        self.descriptor.size.depth_or_array_layers
    }

    pub fn sample_count(&self) -> u32 {
        self.descriptor.sample_count
    }

    pub fn bytes_per_px(&self) -> u32 {
        self.descriptor.format.estimated_bytes_per_px()
    }

    pub fn mip_map_factor(&self) -> f64 {
        mip_map_factor(&self.descriptor)
    }

    pub fn estimated_size(&self) -> u64 {
        self.estimated_size
    }

    pub fn is_released(&self) -> bool {
        self.released.is_released()
    }

    /// Fails if the texture was released
    pub fn ensure_alive(&self) -> GpuResult<()> {
        self.released.check::<Self>(self.label())
    }

    /// View of a single mip level / array layer
    pub fn create_view(
        &self,
        gpu: &mut dyn GpuBackend,
        desc: &TextureViewDescriptor,
    ) -> GpuResult<TextureViewId> {
        self.ensure_alive()?;
        let mut desc = desc.clone();
        if desc.label.is_none() {
            desc.label = Some(format!("{} view", self.label()));
        }
        gpu.create_view(self.texture, &desc)
    }

    /// Default view covering the whole texture
    pub fn create_default_view(&self, gpu: &mut dyn GpuBackend) -> GpuResult<TextureViewId> {
        self.create_view(gpu, &TextureViewDescriptor::default())
    }

    /// View for sampling; depth-stencil textures expose only the depth aspect
    pub fn create_sampling_view(
        &self,
        gpu: &mut dyn GpuBackend,
        mip_level: u32,
        layer: u32,
    ) -> GpuResult<TextureViewId> {
        let aspect = if self.format().is_depth() {
            TextureAspect::DepthOnly
        } else {
            TextureAspect::All
        };
        self.create_view(
            gpu,
            &TextureViewDescriptor::single(mip_level, layer).with_aspect(aspect),
        )
    }

    /// Destroy the GPU texture. A second call fails with `UseAfterRelease`.
    pub fn release(&self, gpu: &mut dyn GpuBackend) -> GpuResult<()> {
        self.released.mark_released::<Self>(self.label())?;
        self.stats.texture_released(self.estimated_size);
        debug!(target: "tessel::texture", label = self.label(), "released texture");
        gpu.destroy_texture(self.texture)
    }
}

/// Release every texture even when one fails, returning the first error
pub fn release_textures<'a>(
    gpu: &mut dyn GpuBackend,
    textures: impl IntoIterator<Item = &'a GpuTextureResource>,
) -> GpuResult<()> {
    let mut first = None;
    for texture in textures {
        if let Err(err) = texture.release(gpu) {
            first.get_or_insert(err);
        }
    }
    first.map_or(Ok(()), Err)
}

impl fmt::Debug for GpuTextureResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuTextureResource")
            .field("texture", &self.texture)
            .field("label", &self.descriptor.label)
            .field("format", &self.descriptor.format)
            .field("size", &self.descriptor.size)
            .field("released", &self.is_released())
            .finish()
    }
}

/// Named holder of at most one loaded GPU texture.
///
/// Capture destinations are bare slots; [`Texture`] wraps a slot together
/// with its declared shape and pending upload.
#[derive(Debug, Default)]
pub struct TextureSlot {
    name: String,
    resource: Option<Arc<GpuTextureResource>>,
}

impl TextureSlot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource(&self) -> Option<&Arc<GpuTextureResource>> {
        self.resource.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.resource.is_some()
    }

    /// Attach `resource`, returning the previous one
    pub fn replace(&mut self, resource: Arc<GpuTextureResource>) -> Option<Arc<GpuTextureResource>> {
        self.resource.replace(resource)
    }

    pub fn take(&mut self) -> Option<Arc<GpuTextureResource>> {
        self.resource.take()
    }
}

/// A texture as seen by its owner: declared shape, format, mip policy and
/// an optional pending upload.
#[derive(Debug)]
pub struct Texture {
    slot: TextureSlot,
    topology: TextureTopology,
    format: TextureFormat,
    mip_mapping: MipMapping,
    upload: Option<ImageData>,
}

impl Texture {
    pub fn new(name: impl Into<String>, topology: TextureTopology, format: TextureFormat) -> Self {
        Self {
            slot: TextureSlot::new(name),
            topology,
            format,
            mip_mapping: MipMapping::default(),
            upload: None,
        }
    }

    pub fn with_mip_mapping(mut self, mip_mapping: MipMapping) -> Self {
        self.mip_mapping = mip_mapping;
        self
    }

    /// Queue `data` for the next load
    pub fn upload(&mut self, data: ImageData) {
        self.upload = Some(data);
    }

    pub fn name(&self) -> &str {
        self.slot.name()
    }

    pub fn topology(&self) -> TextureTopology {
        self.topology
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn mip_mapping(&self) -> MipMapping {
        self.mip_mapping
    }

    pub fn has_pending_upload(&self) -> bool {
        self.upload.is_some()
    }

    pub(crate) fn take_upload(&mut self) -> Option<ImageData> {
        self.upload.take()
    }

    pub(crate) fn restore_upload(&mut self, data: ImageData) {
        self.upload.get_or_insert(data);
    }

    pub fn slot(&self) -> &TextureSlot {
        &self.slot
    }

    pub fn slot_mut(&mut self) -> &mut TextureSlot {
        &mut self.slot
    }

    pub fn resource(&self) -> Option<&Arc<GpuTextureResource>> {
        self.slot.resource()
    }
}

fn mip_map_factor(descriptor: &TextureDescriptor) -> f64 {
    if descriptor.mip_level_count > 1 {
        1.333
    } else {
        1.0
    }
}

fn estimate_size(descriptor: &TextureDescriptor) -> u64 {
    let texels = descriptor.size.width as u64
        * descriptor.size.height as u64
        * descriptor.size.depth_or_array_layers as u64;
    let bytes = texels * descriptor.format.estimated_bytes_per_px() as u64;
    (bytes as f64 * mip_map_factor(descriptor)) as u64
}
