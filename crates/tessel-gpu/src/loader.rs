//! Texture allocation and CPU to GPU upload
//!
//! `TextureLoader::load_texture` matches the texture's declared topology
//! against the payload shape. Matching pairs allocate a texture, copy every
//! sub-resource and generate mip levels; every other pair is rejected.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use wgpu::{Extent3d, TextureUsages};

use crate::depth_resolve::MultisampleDepthResolver;
use crate::error::{GpuError, GpuResult};
use crate::hal::{GpuBackend, TextureCopyLocation, TextureDescriptor};
use crate::image::{BufferedImage, ImageData, TextureTopology};
use crate::mipmap::{BlitMipmapGenerator, MipmapGenerator};
use crate::stats::GpuStats;
use crate::texture::{max_mip_levels, GpuTextureResource, Texture};

/// One base-level copy: payload image and destination array layer
struct SubResource<'a> {
    image: &'a BufferedImage,
    layer: u32,
}

/// Allocation shape and copies derived from a (topology, payload) pair
struct UploadPlan<'a> {
    size: Extent3d,
    copies: Vec<SubResource<'a>>,
}

impl<'a> UploadPlan<'a> {
    fn single(image: &'a BufferedImage) -> Self {
        Self {
            size: image.extent(),
            copies: vec![SubResource { image, layer: 0 }],
        }
    }

    fn layered(first: &BufferedImage, images: impl Iterator<Item = &'a BufferedImage>) -> Self {
        let copies: Vec<_> = images
            .enumerate()
            .map(|(layer, image)| SubResource {
                image,
                layer: layer as u32,
            })
            .collect();
        Self {
            size: Extent3d {
                width: first.width(),
                height: first.height(),
                depth_or_array_layers: copies.len() as u32,
            },
            copies,
        }
    }
}

fn plan<'a>(topology: TextureTopology, data: &'a ImageData) -> GpuResult<UploadPlan<'a>> {
    match (topology, data) {
        (TextureTopology::D1, ImageData::Buffered1d(image))
        | (TextureTopology::D2, ImageData::Buffered2d(image))
        | (TextureTopology::D3, ImageData::Buffered3d(image)) => Ok(UploadPlan::single(image)),
        (TextureTopology::Cube, ImageData::Cube(cube)) => Ok(UploadPlan::layered(
            cube.face(crate::image::CubeFace::PosX),
            cube.faces().map(|(_, image)| image),
        )),
        (TextureTopology::CubeArray, ImageData::CubeArray(cubes)) => {
            let first = cubes.cubes()[0].face(crate::image::CubeFace::PosX);
            Ok(UploadPlan::layered(
                first,
                cubes
                    .cubes()
                    .iter()
                    .flat_map(|cube| cube.faces().map(|(_, image)| image)),
            ))
        }
        (TextureTopology::Array2d, ImageData::Array2d(array)) => Ok(UploadPlan::layered(
            &array.images()[0],
            array.images().iter(),
        )),
        (_, ImageData::Native(_)) => Err(GpuError::NotImplemented {
            payload: data.kind(),
        }),
        _ => Err(GpuError::UnsupportedCombination {
            texture: topology.as_str(),
            payload: data.kind(),
        }),
    }
}

/// Creates textures and uploads image payloads
pub struct TextureLoader {
    stats: Arc<GpuStats>,
    mipmaps: Box<dyn MipmapGenerator>,
    depth_resolver: MultisampleDepthResolver,
}

impl TextureLoader {
    pub fn new(stats: Arc<GpuStats>) -> Self {
        Self::with_mipmap_generator(stats, Box::new(BlitMipmapGenerator::new()))
    }

    pub fn with_mipmap_generator(stats: Arc<GpuStats>, mipmaps: Box<dyn MipmapGenerator>) -> Self {
        Self {
            stats,
            mipmaps,
            depth_resolver: MultisampleDepthResolver::new(),
        }
    }

    pub fn stats(&self) -> &Arc<GpuStats> {
        &self.stats
    }

    pub fn depth_resolver(&self) -> &MultisampleDepthResolver {
        &self.depth_resolver
    }

    /// Allocate a texture from a descriptor
    pub fn create_texture(
        &self,
        gpu: &mut dyn GpuBackend,
        descriptor: TextureDescriptor,
    ) -> GpuResult<Arc<GpuTextureResource>> {
        GpuTextureResource::create(gpu, descriptor, &self.stats)
    }

    /// Upload the pending payload of `texture` into a fresh GPU texture.
    ///
    /// On success the payload is consumed and any previously loaded resource
    /// is released; a failure to release it is logged and does not undo the
    /// load. On failure the payload stays pending and the previous resource
    /// stays attached.
    #[instrument(level = "debug", target = "tessel::texture", skip_all, fields(texture = texture.name()))]
    pub fn load_texture(
        &mut self,
        gpu: &mut dyn GpuBackend,
        texture: &mut Texture,
    ) -> GpuResult<Arc<GpuTextureResource>> {
        let data = texture
            .take_upload()
            .ok_or_else(|| GpuError::MissingUploadPayload {
                texture: texture.name().to_string(),
            })?;

        match self.upload(gpu, texture, &data) {
            Ok(resource) => {
                if let Some(previous) = texture.slot_mut().replace(resource.clone()) {
                    debug!(target: "tessel::texture", label = previous.label(), "replacing loaded texture");
                    if !previous.is_released() {
                        if let Err(err) = previous.release(gpu) {
                            warn!(
                                target: "tessel::texture",
                                label = previous.label(),
                                error = %err,
                                "failed to release replaced texture"
                            );
                        }
                    }
                }
                Ok(resource)
            }
            Err(err) => {
                texture.restore_upload(data);
                Err(err)
            }
        }
    }

    fn upload(
        &mut self,
        gpu: &mut dyn GpuBackend,
        texture: &Texture,
        data: &ImageData,
    ) -> GpuResult<Arc<GpuTextureResource>> {
        if data.format() != texture.format() {
            return Err(GpuError::FormatMismatch {
                texture: texture.name().to_string(),
                expected: texture.format().as_str(),
                actual: data.format().as_str(),
            });
        }
        let topology = texture.topology();
        let plan = plan(topology, data)?;

        let dimension = topology.dimension();
        let (width, height, depth) = (
            plan.size.width,
            plan.size.height,
            plan.size.depth_or_array_layers,
        );
        let requested = texture.mip_mapping().num_levels(width, height);
        let max = max_mip_levels(dimension, width, height, depth);
        let mip_level_count = requested.clamp(1, max);
        if mip_level_count != requested {
            warn!(
                target: "tessel::texture",
                texture = texture.name(),
                requested,
                used = mip_level_count,
                "mip level count clamped"
            );
        }

        let mut usage = TextureUsages::COPY_DST | TextureUsages::TEXTURE_BINDING;
        if topology.is_renderable() {
            usage |= TextureUsages::RENDER_ATTACHMENT;
        }
        let descriptor = TextureDescriptor {
            label: texture.name().to_string(),
            size: plan.size,
            format: texture.format(),
            usage,
            mip_level_count,
            sample_count: 1,
            dimension,
        };

        let resource = self.create_texture(gpu, descriptor)?;
        let written = self.write_sub_resources(gpu, &resource, &plan).and_then(|()| {
            if mip_level_count > 1 {
                self.mipmaps.generate_mip_levels(gpu, &resource)
            } else {
                Ok(())
            }
        });
        if let Err(err) = written {
            if let Err(cleanup) = resource.release(gpu) {
                warn!(target: "tessel::texture", error = %cleanup, "failed to release partially loaded texture");
            }
            return Err(err);
        }

        info!(
            target: "tessel::texture",
            texture = texture.name(),
            topology = %topology,
            payload = data.kind(),
            width,
            height,
            depth,
            mips = mip_level_count,
            "texture loaded"
        );
        Ok(resource)
    }

    fn write_sub_resources(
        &self,
        gpu: &mut dyn GpuBackend,
        resource: &GpuTextureResource,
        plan: &UploadPlan<'_>,
    ) -> GpuResult<()> {
        for copy in &plan.copies {
            gpu.write_texture(
                TextureCopyLocation::at_layer(resource.texture_id(), copy.layer),
                copy.image.data(),
                copy.image.layout(),
                copy.image.extent(),
            )?;
        }
        Ok(())
    }

    /// Copy `mip_levels` levels of `src` into `dst`; level `l` has extent
    /// `(w >> l, h >> l, layers)`.
    pub fn copy_texture_2d(
        &self,
        gpu: &mut dyn GpuBackend,
        src: &GpuTextureResource,
        dst: &GpuTextureResource,
        mip_levels: u32,
    ) -> GpuResult<()> {
        src.ensure_alive()?;
        dst.ensure_alive()?;
        for level in 0..mip_levels {
            let size = Extent3d {
                width: (src.width() >> level).max(1),
                height: (src.height() >> level).max(1),
                depth_or_array_layers: src.depth(),
            };
            gpu.copy_texture_to_texture(
                TextureCopyLocation::new(src.texture_id()).with_mip_level(level),
                TextureCopyLocation::new(dst.texture_id()).with_mip_level(level),
                size,
            )?;
        }
        Ok(())
    }

    /// Resolve (or copy) depth of `src` into `dst` by rendering
    pub fn resolve_multisampled_depth(
        &mut self,
        gpu: &mut dyn GpuBackend,
        src: &GpuTextureResource,
        dst: &GpuTextureResource,
        mip_level: u32,
        layer: u32,
    ) -> GpuResult<()> {
        self.depth_resolver
            .copy_texture(gpu, src, dst, mip_level, layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::enums::{TextureDimension, TextureFormat};
    use crate::image::{CubeArrayImage, CubeImage, ImageArray2d, NativeImage};
    use crate::texture::MipMapping;
    use pretty_assertions::assert_eq;

    fn rgba(size: u32, value: u8) -> BufferedImage {
        BufferedImage::new_2d(
            TextureFormat::Rgba8Unorm,
            size,
            size,
            vec![value; (size * size * 4) as usize],
        )
        .unwrap()
    }

    fn cube(size: u32, base: u8) -> CubeImage {
        CubeImage::new(
            rgba(size, base),
            rgba(size, base + 1),
            rgba(size, base + 2),
            rgba(size, base + 3),
            rgba(size, base + 4),
            rgba(size, base + 5),
        )
        .unwrap()
    }

    fn loader() -> TextureLoader {
        TextureLoader::new(GpuStats::shared())
    }

    #[test]
    fn test_missing_payload() {
        let mut gpu = RecordingBackend::new(8, 8);
        let mut tex = Texture::new("empty", TextureTopology::D2, TextureFormat::Rgba8Unorm);
        assert!(matches!(
            loader().load_texture(&mut gpu, &mut tex),
            Err(GpuError::MissingUploadPayload { texture }) if texture == "empty"
        ));
    }

    #[test]
    fn test_format_mismatch_keeps_payload() {
        let mut gpu = RecordingBackend::new(8, 8);
        let mut tex = Texture::new("albedo", TextureTopology::D2, TextureFormat::Bgra8Unorm);
        tex.upload(ImageData::Buffered2d(rgba(4, 0)));

        let err = loader().load_texture(&mut gpu, &mut tex).unwrap_err();
        assert!(matches!(
            err,
            GpuError::FormatMismatch {
                expected: "bgra8unorm",
                actual: "rgba8unorm",
                ..
            }
        ));
        assert!(tex.has_pending_upload());
    }

    #[test]
    fn test_invalid_combination() {
        let mut gpu = RecordingBackend::new(8, 8);
        let mut tex = Texture::new("sky", TextureTopology::Cube, TextureFormat::Rgba8Unorm);
        tex.upload(ImageData::Buffered2d(rgba(4, 0)));

        let err = loader().load_texture(&mut gpu, &mut tex).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid combination of texture type cube and image data buffered-2d"
        );
    }

    #[test]
    fn test_native_not_implemented() {
        let mut gpu = RecordingBackend::new(8, 8);
        let mut tex = Texture::new("video", TextureTopology::D2, TextureFormat::Rgba8Unorm);
        tex.upload(ImageData::Native(NativeImage {
            label: "frame".to_string(),
            format: TextureFormat::Rgba8Unorm,
            width: 4,
            height: 4,
        }));
        assert!(matches!(
            loader().load_texture(&mut gpu, &mut tex),
            Err(GpuError::NotImplemented { payload: "native" })
        ));
    }

    #[test]
    fn test_2d_upload_with_full_mips() {
        let mut gpu = RecordingBackend::new(8, 8);
        let mut loader = loader();
        let mut tex = Texture::new("albedo", TextureTopology::D2, TextureFormat::Rgba8Unorm);
        tex.upload(ImageData::Buffered2d(rgba(16, 9)));

        let resource = loader.load_texture(&mut gpu, &mut tex).unwrap();
        let desc = resource.descriptor();
        assert_eq!(desc.mip_level_count, 5);
        assert_eq!(
            desc.usage,
            TextureUsages::COPY_DST | TextureUsages::TEXTURE_BINDING | TextureUsages::RENDER_ATTACHMENT
        );
        assert!(!tex.has_pending_upload());

        let writes = gpu.texture_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1.bytes_per_row, 64);
        assert_eq!(writes[0].1.rows_per_image, 16);
        // mip levels 1..5 rendered from their predecessor
        assert_eq!(gpu.render_passes().len(), 4);
    }

    #[test]
    fn test_1d_and_3d_descriptors() {
        let mut gpu = RecordingBackend::new(8, 8);
        let mut loader = loader();

        let mut line = Texture::new("ramp", TextureTopology::D1, TextureFormat::R8Unorm);
        line.upload(ImageData::Buffered1d(
            BufferedImage::new_1d(TextureFormat::R8Unorm, 256, vec![0; 256]).unwrap(),
        ));
        let resource = loader.load_texture(&mut gpu, &mut line).unwrap();
        assert_eq!(resource.descriptor().dimension, TextureDimension::D1);
        assert_eq!(resource.descriptor().mip_level_count, 1);
        assert!(!resource
            .descriptor()
            .usage
            .contains(TextureUsages::RENDER_ATTACHMENT));

        let mut volume = Texture::new("noise", TextureTopology::D3, TextureFormat::R8Unorm)
            .with_mip_mapping(MipMapping::Off);
        volume.upload(ImageData::Buffered3d(
            BufferedImage::new_3d(TextureFormat::R8Unorm, 8, 8, 4, vec![0; 256]).unwrap(),
        ));
        let resource = loader.load_texture(&mut gpu, &mut volume).unwrap();
        assert_eq!(resource.depth(), 4);

        let (dst, layout, size) = *gpu.texture_writes().last().unwrap();
        assert_eq!(dst.origin.z, 0);
        assert_eq!(layout.rows_per_image, 8);
        assert_eq!(size.depth_or_array_layers, 4);
    }

    #[test]
    fn test_cube_fan_out() {
        let mut gpu = RecordingBackend::new(8, 8);
        let mut tex = Texture::new("sky", TextureTopology::Cube, TextureFormat::Rgba8Unorm)
            .with_mip_mapping(MipMapping::Off);
        tex.upload(ImageData::Cube(cube(4, 0)));

        let resource = loader().load_texture(&mut gpu, &mut tex).unwrap();
        assert_eq!(resource.depth(), 6);

        let layers: Vec<u32> = gpu.texture_writes().iter().map(|w| w.0.origin.z).collect();
        assert_eq!(layers, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_cube_array_and_2d_array_layers() {
        let mut gpu = RecordingBackend::new(8, 8);
        let mut loader = loader();

        let mut probes = Texture::new("probes", TextureTopology::CubeArray, TextureFormat::Rgba8Unorm)
            .with_mip_mapping(MipMapping::Off);
        probes.upload(ImageData::CubeArray(
            CubeArrayImage::new(vec![cube(2, 0), cube(2, 10)]).unwrap(),
        ));
        let resource = loader.load_texture(&mut gpu, &mut probes).unwrap();
        assert_eq!(resource.depth(), 12);
        let layers: Vec<u32> = gpu.texture_writes().iter().map(|w| w.0.origin.z).collect();
        assert_eq!(layers, (0..12).collect::<Vec<_>>());

        gpu.clear_commands();
        let mut atlas = Texture::new("atlas", TextureTopology::Array2d, TextureFormat::Rgba8Unorm)
            .with_mip_mapping(MipMapping::Limited(2));
        atlas.upload(ImageData::Array2d(
            ImageArray2d::new(vec![rgba(4, 1), rgba(4, 2), rgba(4, 3)]).unwrap(),
        ));
        let resource = loader.load_texture(&mut gpu, &mut atlas).unwrap();
        assert_eq!(resource.descriptor().mip_level_count, 2);
        let layers: Vec<u32> = gpu.texture_writes().iter().map(|w| w.0.origin.z).collect();
        assert_eq!(layers, vec![0, 1, 2]);
    }

    #[test]
    fn test_reload_releases_previous() {
        let mut gpu = RecordingBackend::new(8, 8);
        let mut loader = loader();
        let mut tex = Texture::new("albedo", TextureTopology::D2, TextureFormat::Rgba8Unorm)
            .with_mip_mapping(MipMapping::Off);

        tex.upload(ImageData::Buffered2d(rgba(4, 1)));
        let first = loader.load_texture(&mut gpu, &mut tex).unwrap();
        tex.upload(ImageData::Buffered2d(rgba(8, 2)));
        let second = loader.load_texture(&mut gpu, &mut tex).unwrap();

        assert!(first.is_released());
        assert!(!gpu.is_texture_alive(first.texture_id()));
        assert!(Arc::ptr_eq(tex.resource().unwrap(), &second));
        assert_eq!(loader.stats().live_textures(), 1);
    }

    #[test]
    fn test_reload_survives_previous_release_failure() {
        let mut gpu = RecordingBackend::new(8, 8);
        let mut loader = loader();
        let mut tex = Texture::new("albedo", TextureTopology::D2, TextureFormat::Rgba8Unorm)
            .with_mip_mapping(MipMapping::Off);

        tex.upload(ImageData::Buffered2d(rgba(4, 1)));
        let first = loader.load_texture(&mut gpu, &mut tex).unwrap();
        tex.upload(ImageData::Buffered2d(rgba(4, 2)));
        gpu.fail_next_texture_destroy();
        let second = loader.load_texture(&mut gpu, &mut tex).unwrap();
        assert!(first.is_released());
        assert!(Arc::ptr_eq(tex.resource().unwrap(), &second));
        assert!(!tex.has_pending_upload());

        // a previous resource released by someone else is skipped
        second.release(&mut gpu).unwrap();
        tex.upload(ImageData::Buffered2d(rgba(4, 3)));
        let third = loader.load_texture(&mut gpu, &mut tex).unwrap();
        assert!(Arc::ptr_eq(tex.resource().unwrap(), &third));
        assert!(gpu.is_texture_alive(third.texture_id()));
    }

    #[test]
    fn test_failed_upload_reports_write_error() {
        let mut gpu = RecordingBackend::new(8, 8);
        let mut tex = Texture::new("albedo", TextureTopology::D2, TextureFormat::Rgba8Unorm)
            .with_mip_mapping(MipMapping::Off);
        tex.upload(ImageData::Buffered2d(rgba(4, 1)));

        gpu.fail_next_texture_write();
        gpu.fail_next_texture_destroy();
        match loader().load_texture(&mut gpu, &mut tex) {
            Err(GpuError::Backend(message)) => assert_eq!(message, "queue write rejected"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(tex.has_pending_upload());
        assert!(tex.resource().is_none());
    }

    #[test]
    fn test_mip_count_clamped() {
        let mut gpu = RecordingBackend::new(8, 8);
        let mut tex = Texture::new("tiny", TextureTopology::D2, TextureFormat::Rgba8Unorm)
            .with_mip_mapping(MipMapping::Limited(10));
        tex.upload(ImageData::Buffered2d(rgba(4, 0)));

        let resource = loader().load_texture(&mut gpu, &mut tex).unwrap();
        assert_eq!(resource.descriptor().mip_level_count, 3);
    }

    #[test]
    fn test_copy_texture_2d_levels() {
        let mut gpu = RecordingBackend::new(8, 8);
        let loader = loader();
        let usage = TextureUsages::COPY_SRC | TextureUsages::COPY_DST;
        let mut desc = TextureDescriptor::new_2d("src", 64, 32, TextureFormat::Rgba8Unorm, usage);
        desc.mip_level_count = 3;
        let src = loader.create_texture(&mut gpu, desc.clone()).unwrap();
        desc.label = "dst".to_string();
        let dst = loader.create_texture(&mut gpu, desc).unwrap();

        loader.copy_texture_2d(&mut gpu, &src, &dst, 3).unwrap();
        let sizes: Vec<(u32, u32, u32)> = gpu
            .texture_copies()
            .iter()
            .map(|(s, _, size)| (s.mip_level, size.width, size.height))
            .collect();
        assert_eq!(sizes, vec![(0, 64, 32), (1, 32, 16), (2, 16, 8)]);
    }
}
