//! Screen pass: swapchain-facing attachments, per-frame render pass and
//! frame capture.
//!
//! The colour and depth attachments are always replaced as a pair. With
//! `sample_count > 1` the colour attachment resolves into the presentable
//! surface texture as part of the scene pass; with a single sample it is
//! copied there after the pass.

use std::sync::Arc;

use tracing::{debug, info, instrument, trace, warn};
use wgpu::{Color, Extent3d, TextureUsages};

use crate::enums::{LoadOp, StoreOp, TextureFormat};
use crate::error::{GpuError, GpuResult};
use crate::hal::{
    ColorAttachment, DepthAttachment, DrawCall, GpuBackend, RenderPassDescriptor,
    TextureCopyLocation, TextureDescriptor, TextureViewId,
};
use crate::loader::TextureLoader;
use crate::release::DeferredReleases;
use crate::stats::GpuStats;
use crate::texture::{release_textures, GpuTextureResource, TextureSlot};

/// Colour clear policy of a pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearColor {
    /// Keep the previous contents
    Load,
    Fill(Color),
}

/// Depth clear policy of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearDepth {
    Load,
    #[default]
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthMode {
    /// Far plane at depth 1.0
    #[default]
    Standard,
    /// Far plane at depth 0.0
    Reversed,
}

impl DepthMode {
    pub fn far_value(self) -> f32 {
        match self {
            DepthMode::Standard => 1.0,
            DepthMode::Reversed => 0.0,
        }
    }
}

/// What the screen pass draws in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePass {
    pub name: String,
    pub clear_color: ClearColor,
    pub clear_depth: ClearDepth,
    pub depth_mode: DepthMode,
    pub draws: Vec<DrawCall>,
}

impl ScenePass {
    pub fn new(name: impl Into<String>, clear_color: Color) -> Self {
        Self {
            name: name.into(),
            clear_color: ClearColor::Fill(clear_color),
            clear_depth: ClearDepth::Clear,
            depth_mode: DepthMode::Standard,
            draws: Vec::new(),
        }
    }

    pub fn with_draw(mut self, draw: DrawCall) -> Self {
        self.draws.push(draw);
        self
    }
}

/// Capture request for one frame
#[derive(Debug, Default)]
pub struct FrameCopy {
    pub copy_color: bool,
    pub color: TextureSlot,
    pub copy_depth: bool,
    pub depth: TextureSlot,
}

impl FrameCopy {
    pub fn new(name: &str) -> Self {
        Self {
            copy_color: false,
            color: TextureSlot::new(format!("{} color", name)),
            copy_depth: false,
            depth: TextureSlot::new(format!("{} depth", name)),
        }
    }

    pub fn color_only(name: &str) -> Self {
        Self {
            copy_color: true,
            ..Self::new(name)
        }
    }

    pub fn depth_only(name: &str) -> Self {
        Self {
            copy_depth: true,
            ..Self::new(name)
        }
    }

    pub fn color_and_depth(name: &str) -> Self {
        Self {
            copy_color: true,
            copy_depth: true,
            ..Self::new(name)
        }
    }

    /// Release both capture destinations, reporting the first failure
    pub fn release(&mut self, gpu: &mut dyn GpuBackend) -> GpuResult<()> {
        let color = self.color.take();
        let depth = self.depth.take();
        release_textures(gpu, color.iter().chain(depth.iter()).map(|t| &**t))
    }
}

/// Allocated colour and depth attachment pair
#[derive(Debug)]
pub struct AttachmentTextures {
    pub color: Arc<GpuTextureResource>,
    pub color_view: TextureViewId,
    pub depth: Arc<GpuTextureResource>,
    pub depth_view: TextureViewId,
}

impl AttachmentTextures {
    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }

    pub fn sample_count(&self) -> u32 {
        self.color.sample_count()
    }

    fn release(self, gpu: &mut dyn GpuBackend) -> GpuResult<()> {
        release_textures(gpu, [self.color.as_ref(), self.depth.as_ref()])
    }
}

#[derive(Debug, Default)]
pub enum Attachments {
    #[default]
    Uninitialized,
    Ready(AttachmentTextures),
}

pub struct ScreenPass {
    sample_count: u32,
    depth_format: TextureFormat,
    attachments: Attachments,
    stats: Arc<GpuStats>,
}

impl ScreenPass {
    pub fn new(sample_count: u32, depth_format: TextureFormat, stats: Arc<GpuStats>) -> Self {
        Self {
            sample_count,
            depth_format,
            attachments: Attachments::Uninitialized,
            stats,
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn depth_format(&self) -> TextureFormat {
        self.depth_format
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    fn ready(&self) -> GpuResult<&AttachmentTextures> {
        match &self.attachments {
            Attachments::Ready(textures) => Ok(textures),
            Attachments::Uninitialized => Err(GpuError::AttachmentsNotReady),
        }
    }

    /// Reallocate both attachments at `width` x `height`.
    ///
    /// The new pair is allocated before the old one is destroyed, so a failed
    /// allocation leaves the previous pair in place.
    #[instrument(level = "debug", target = "tessel::pass", skip(self, gpu))]
    pub fn apply_size(
        &mut self,
        gpu: &mut dyn GpuBackend,
        width: u32,
        height: u32,
    ) -> GpuResult<()> {
        let fresh = self.allocate(gpu, width, height)?;
        let previous = std::mem::replace(&mut self.attachments, Attachments::Ready(fresh));
        if let Attachments::Ready(old) = previous {
            old.release(gpu)?;
        }
        info!(
            target: "tessel::pass",
            width,
            height,
            samples = self.sample_count,
            "screen attachments recreated"
        );
        Ok(())
    }

    fn allocate(
        &self,
        gpu: &mut dyn GpuBackend,
        width: u32,
        height: u32,
    ) -> GpuResult<AttachmentTextures> {
        let mut color_usage = TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING;
        if self.sample_count == 1 {
            color_usage |= TextureUsages::COPY_SRC;
        }
        let color_format = gpu.surface_format();
        let color = GpuTextureResource::create(
            gpu,
            TextureDescriptor::new_2d("screen color", width, height, color_format, color_usage)
                .with_sample_count(self.sample_count),
            &self.stats,
        )?;

        let depth = GpuTextureResource::create(
            gpu,
            TextureDescriptor::new_2d(
                "screen depth",
                width,
                height,
                self.depth_format,
                TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            )
            .with_sample_count(self.sample_count),
            &self.stats,
        );
        let depth = match depth {
            Ok(depth) => depth,
            Err(err) => {
                discard(gpu, [color.as_ref()]);
                return Err(err);
            }
        };

        let views = color
            .create_default_view(gpu)
            .and_then(|color_view| Ok((color_view, depth.create_default_view(gpu)?)));
        let (color_view, depth_view) = match views {
            Ok(views) => views,
            Err(err) => {
                discard(gpu, [color.as_ref(), depth.as_ref()]);
                return Err(err);
            }
        };
        Ok(AttachmentTextures {
            color,
            color_view,
            depth,
            depth_view,
        })
    }

    /// Encode `scene` into the attachments and present it to the surface
    #[instrument(level = "trace", target = "tessel::pass", skip_all, fields(pass = %scene.name))]
    pub fn render_scene(&mut self, gpu: &mut dyn GpuBackend, scene: &ScenePass) -> GpuResult<()> {
        if let Attachments::Uninitialized = self.attachments {
            let (width, height) = gpu.surface_size();
            debug!(target: "tessel::pass", width, height, "allocating attachments on first render");
            self.apply_size(gpu, width, height)?;
        }

        let desc = self.begin_render_pass(gpu, scene, false)?;
        gpu.encode_render_pass(&desc, &scene.draws)?;

        if self.sample_count == 1 {
            self.present_single_sampled(gpu)?;
        }
        trace!(target: "tessel::pass", draws = scene.draws.len(), "scene encoded");
        Ok(())
    }

    fn present_single_sampled(&self, gpu: &mut dyn GpuBackend) -> GpuResult<()> {
        let textures = self.ready()?;
        let (surface_width, surface_height) = gpu.surface_size();
        let surface = gpu.current_surface_texture()?;
        gpu.copy_texture_to_texture(
            TextureCopyLocation::new(textures.color.texture_id()),
            TextureCopyLocation::new(surface),
            Extent3d {
                width: textures.width().min(surface_width),
                height: textures.height().min(surface_height),
                depth_or_array_layers: 1,
            },
        )
    }

    /// Attachment setup of the scene pass.
    ///
    /// Colour and depth are loaded when `force_load` is set or their clear
    /// policy says so, and cleared otherwise.
    pub fn begin_render_pass(
        &self,
        gpu: &mut dyn GpuBackend,
        scene: &ScenePass,
        force_load: bool,
    ) -> GpuResult<RenderPassDescriptor> {
        let textures = self.ready()?;

        let (color_load, clear_value) = match scene.clear_color {
            ClearColor::Fill(color) if !force_load => (LoadOp::Clear, Some(color)),
            _ => (LoadOp::Load, None),
        };
        let depth_load = if force_load || scene.clear_depth == ClearDepth::Load {
            LoadOp::Load
        } else {
            LoadOp::Clear
        };
        let resolve_target = if self.sample_count > 1 {
            Some(gpu.current_surface_view()?)
        } else {
            None
        };

        Ok(RenderPassDescriptor {
            label: Some(scene.name.clone()),
            color_attachments: vec![ColorAttachment {
                view: textures.color_view,
                resolve_target,
                load: color_load,
                clear_value,
                store: StoreOp::Store,
            }],
            depth_attachment: Some(DepthAttachment {
                view: textures.depth_view,
                load: depth_load,
                clear_value: scene.depth_mode.far_value(),
                store: StoreOp::Store,
            }),
        })
    }

    /// Capture the current attachments into the destinations of `request`.
    ///
    /// Destinations are (re)allocated when missing or when their size or
    /// format no longer matches; a replaced destination is handed to
    /// `releases` instead of being destroyed right away.
    #[instrument(level = "debug", target = "tessel::pass", skip_all)]
    pub fn copy(
        &self,
        gpu: &mut dyn GpuBackend,
        loader: &mut TextureLoader,
        request: &mut FrameCopy,
        releases: &mut DeferredReleases,
    ) -> GpuResult<()> {
        let textures = self.ready()?;
        let (width, height) = (textures.width(), textures.height());

        let color_dst = if request.copy_color {
            Some(self.ensure_destination(
                gpu,
                &mut request.color,
                width,
                height,
                textures.color.format(),
                releases,
            )?)
        } else {
            None
        };
        let depth_dst = if request.copy_depth {
            Some(self.ensure_destination(
                gpu,
                &mut request.depth,
                width,
                height,
                self.depth_format,
                releases,
            )?)
        } else {
            None
        };

        if let Some(dst) = color_dst {
            if self.sample_count > 1 {
                let resolve_target = dst.create_default_view(gpu)?;
                let encoded = gpu.encode_render_pass(
                    &RenderPassDescriptor {
                        label: Some(format!("resolve {}", dst.label())),
                        color_attachments: vec![ColorAttachment {
                            view: textures.color_view,
                            resolve_target: Some(resolve_target),
                            load: LoadOp::Load,
                            clear_value: None,
                            store: StoreOp::Store,
                        }],
                        depth_attachment: None,
                    },
                    &[],
                );
                gpu.destroy_view(resolve_target)?;
                encoded?;
            } else {
                loader.copy_texture_2d(gpu, &textures.color, &dst, 1)?;
            }
            trace!(target: "tessel::pass", dst = dst.label(), "captured color");
        }
        if let Some(dst) = depth_dst {
            loader.resolve_multisampled_depth(gpu, &textures.depth, &dst, 0, 0)?;
            trace!(target: "tessel::pass", dst = dst.label(), "captured depth");
        }
        Ok(())
    }

    fn ensure_destination(
        &self,
        gpu: &mut dyn GpuBackend,
        slot: &mut TextureSlot,
        width: u32,
        height: u32,
        format: TextureFormat,
        releases: &mut DeferredReleases,
    ) -> GpuResult<Arc<GpuTextureResource>> {
        if let Some(current) = slot.resource() {
            let reusable = !current.is_released()
                && current.width() == width
                && current.height() == height
                && current.format() == format;
            if reusable {
                return Ok(current.clone());
            }
        }

        let fresh = GpuTextureResource::create(
            gpu,
            TextureDescriptor::new_2d(
                slot.name(),
                width,
                height,
                format,
                TextureUsages::COPY_DST
                    | TextureUsages::TEXTURE_BINDING
                    | TextureUsages::RENDER_ATTACHMENT,
            ),
            &self.stats,
        )?;
        if let Some(stale) = slot.replace(fresh.clone()) {
            if !stale.is_released() {
                releases.schedule(stale);
            }
        }
        debug!(target: "tessel::pass", slot = slot.name(), width, height, format = %format, "capture destination allocated");
        Ok(fresh)
    }

    /// Destroy the attachments; the pass re-initialises on the next render.
    pub fn release(&mut self, gpu: &mut dyn GpuBackend) -> GpuResult<()> {
        match std::mem::take(&mut self.attachments) {
            Attachments::Ready(old) => old.release(gpu),
            Attachments::Uninitialized => Ok(()),
        }
    }
}

/// Cleanup after a failed allocation; the allocation error is the one reported
fn discard<'a>(gpu: &mut dyn GpuBackend, textures: impl IntoIterator<Item = &'a GpuTextureResource>) {
    if let Err(err) = release_textures(gpu, textures) {
        warn!(target: "tessel::pass", error = %err, "cleanup after failed allocation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Command, RecordingBackend};
    use pretty_assertions::assert_eq;

    const GREY: Color = Color {
        r: 0.2,
        g: 0.2,
        b: 0.2,
        a: 1.0,
    };

    fn screen(samples: u32) -> ScreenPass {
        ScreenPass::new(samples, TextureFormat::Depth32Float, GpuStats::shared())
    }

    fn ready(pass: &ScreenPass) -> &AttachmentTextures {
        match pass.attachments() {
            Attachments::Ready(textures) => textures,
            Attachments::Uninitialized => panic!("attachments not allocated"),
        }
    }

    #[test]
    fn test_apply_size_replaces_pair() {
        let mut gpu = RecordingBackend::new(640, 480);
        let mut pass = screen(4);

        pass.apply_size(&mut gpu, 640, 480).unwrap();
        let (color, depth) = {
            let t = ready(&pass);
            (t.color.texture_id(), t.depth.texture_id())
        };

        pass.apply_size(&mut gpu, 640, 480).unwrap();
        let t = ready(&pass);
        assert_ne!(t.color.texture_id(), color);
        assert_ne!(t.depth.texture_id(), depth);
        assert!(!gpu.is_texture_alive(color));
        assert!(!gpu.is_texture_alive(depth));
        assert_eq!(gpu.live_texture_count(), 2);

        pass.apply_size(&mut gpu, 800, 600).unwrap();
        let t = ready(&pass);
        assert_eq!((t.width(), t.height(), t.sample_count()), (800, 600, 4));
        assert_eq!(t.depth.format(), TextureFormat::Depth32Float);
    }

    #[test]
    fn test_failed_color_release_still_releases_depth() {
        let mut gpu = RecordingBackend::new(64, 64);
        let mut pass = screen(4);
        pass.apply_size(&mut gpu, 64, 64).unwrap();
        let (color, depth) = {
            let t = ready(&pass);
            (t.color.texture_id(), t.depth.texture_id())
        };

        gpu.fail_next_texture_destroy();
        assert!(matches!(pass.apply_size(&mut gpu, 32, 32), Err(GpuError::Backend(_))));
        assert!(gpu.is_texture_alive(color));
        assert!(!gpu.is_texture_alive(depth));
        assert_eq!(ready(&pass).width(), 32);

        gpu.fail_next_texture_destroy();
        assert!(pass.release(&mut gpu).is_err());
        assert!(matches!(pass.attachments(), Attachments::Uninitialized));
        // the two colour textures whose destroy failed
        assert_eq!(gpu.live_texture_count(), 2);
    }

    #[test]
    fn test_not_ready_before_first_render() {
        let mut gpu = RecordingBackend::new(64, 64);
        let pass = screen(4);
        let scene = ScenePass::new("scene", GREY);
        assert!(matches!(
            pass.begin_render_pass(&mut gpu, &scene, false),
            Err(GpuError::AttachmentsNotReady)
        ));
    }

    #[test]
    fn test_render_initializes_from_surface() {
        let mut gpu = RecordingBackend::new(320, 200);
        let mut pass = screen(4);
        pass.render_scene(&mut gpu, &ScenePass::new("scene", GREY)).unwrap();

        let t = ready(&pass);
        assert_eq!((t.width(), t.height()), (320, 200));

        let passes = gpu.render_passes();
        assert_eq!(passes.len(), 1);
        let color = passes[0].0.color_attachments[0];
        let surface = gpu.view_texture(color.resolve_target.unwrap()).unwrap();
        assert_eq!(gpu.texture_descriptor(surface).unwrap().label, "surface");
    }

    #[test]
    fn test_load_ops() {
        let mut gpu = RecordingBackend::new(64, 64);
        let mut pass = screen(4);
        pass.apply_size(&mut gpu, 64, 64).unwrap();

        let scene = ScenePass::new("scene", GREY);
        let desc = pass.begin_render_pass(&mut gpu, &scene, false).unwrap();
        assert_eq!(desc.color_attachments[0].load, LoadOp::Clear);
        assert_eq!(desc.color_attachments[0].clear_value, Some(GREY));
        let depth = desc.depth_attachment.unwrap();
        assert_eq!((depth.load, depth.clear_value), (LoadOp::Clear, 1.0));

        let desc = pass.begin_render_pass(&mut gpu, &scene, true).unwrap();
        assert_eq!(desc.color_attachments[0].load, LoadOp::Load);
        assert_eq!(desc.color_attachments[0].clear_value, None);
        assert_eq!(desc.depth_attachment.unwrap().load, LoadOp::Load);

        let mut scene = ScenePass::new("overlay", GREY);
        scene.clear_color = ClearColor::Load;
        scene.depth_mode = DepthMode::Reversed;
        let desc = pass.begin_render_pass(&mut gpu, &scene, false).unwrap();
        assert_eq!(desc.color_attachments[0].load, LoadOp::Load);
        let depth = desc.depth_attachment.unwrap();
        assert_eq!((depth.load, depth.clear_value), (LoadOp::Clear, 0.0));
    }

    #[test]
    fn test_single_sample_copies_to_surface() {
        let mut gpu = RecordingBackend::new(64, 64);
        let mut pass = screen(1);
        pass.render_scene(&mut gpu, &ScenePass::new("scene", GREY)).unwrap();

        let passes = gpu.render_passes();
        assert_eq!(passes[0].0.color_attachments[0].resolve_target, None);
        let copies = gpu.texture_copies();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].0.texture, ready(&pass).color.texture_id());
    }

    #[test]
    fn test_msaa_color_capture_uses_empty_resolve_pass() {
        let mut gpu = RecordingBackend::new(64, 64);
        let mut pass = screen(4);
        let mut loader = TextureLoader::new(GpuStats::shared());
        let mut releases = DeferredReleases::default();
        pass.apply_size(&mut gpu, 64, 64).unwrap();

        let mut request = FrameCopy::color_only("capture");
        pass.copy(&mut gpu, &mut loader, &mut request, &mut releases).unwrap();

        let dst = request.color.resource().unwrap().clone();
        assert_eq!(dst.format(), gpu.surface_format());
        assert_eq!(dst.sample_count(), 1);
        let passes = gpu.render_passes();
        assert_eq!(passes.len(), 1);
        let (desc, draws) = passes[0];
        assert!(draws.is_empty());
        assert_eq!(desc.depth_attachment, None);
        let resolve = desc.color_attachments[0].resolve_target.unwrap();
        assert_eq!(gpu.view_texture(resolve), Some(dst.texture_id()));
        assert!(!request.depth.is_loaded());
    }

    #[test]
    fn test_single_sample_color_capture_copies() {
        let mut gpu = RecordingBackend::new(64, 64);
        let mut pass = screen(1);
        let mut loader = TextureLoader::new(GpuStats::shared());
        let mut releases = DeferredReleases::default();
        pass.apply_size(&mut gpu, 64, 64).unwrap();

        let mut request = FrameCopy::color_only("capture");
        pass.copy(&mut gpu, &mut loader, &mut request, &mut releases).unwrap();

        assert!(gpu.render_passes().is_empty());
        let copies = gpu.texture_copies();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].1.texture, request.color.resource().unwrap().texture_id());
        assert_eq!(copies[0].2, Extent3d { width: 64, height: 64, depth_or_array_layers: 1 });
    }

    #[test]
    fn test_depth_capture_goes_through_resolver() {
        for samples in [1, 4] {
            let mut gpu = RecordingBackend::new(32, 32);
            let mut pass = screen(samples);
            let mut loader = TextureLoader::new(GpuStats::shared());
            let mut releases = DeferredReleases::default();
            pass.apply_size(&mut gpu, 32, 32).unwrap();

            let mut request = FrameCopy::depth_only("capture");
            pass.copy(&mut gpu, &mut loader, &mut request, &mut releases).unwrap();

            let dst = request.depth.resource().unwrap();
            assert_eq!(dst.format(), TextureFormat::Depth32Float);
            assert!(gpu.texture_copies().is_empty());
            let passes = gpu.render_passes();
            assert_eq!(passes.len(), 1);
            assert_eq!(passes[0].1[0].element_count, 4);
            assert_eq!(loader.depth_resolver().cache_len(), 1);
        }
    }

    #[test]
    fn test_destination_reused_then_replaced_deferred() {
        let mut gpu = RecordingBackend::new(64, 64);
        let mut pass = screen(4);
        let mut loader = TextureLoader::new(GpuStats::shared());
        let mut releases = DeferredReleases::new(1);
        pass.apply_size(&mut gpu, 64, 64).unwrap();

        let mut request = FrameCopy::color_and_depth("capture");
        pass.copy(&mut gpu, &mut loader, &mut request, &mut releases).unwrap();
        let first = request.color.resource().unwrap().clone();

        pass.copy(&mut gpu, &mut loader, &mut request, &mut releases).unwrap();
        assert!(Arc::ptr_eq(&first, request.color.resource().unwrap()));
        assert!(releases.is_empty());

        pass.apply_size(&mut gpu, 128, 64).unwrap();
        pass.copy(&mut gpu, &mut loader, &mut request, &mut releases).unwrap();
        let second = request.color.resource().unwrap().clone();
        assert_eq!(second.width(), 128);
        assert!(releases.is_pending(&first));
        assert_eq!(releases.len(), 2);
        assert!(gpu.is_texture_alive(first.texture_id()));

        gpu.submit().unwrap();
        releases.on_frame_boundary(&mut gpu).unwrap();
        assert!(!gpu.is_texture_alive(first.texture_id()));
        assert!(gpu.is_texture_alive(second.texture_id()));
    }

    #[test]
    fn test_frame_copy_release_empties_both_slots() {
        let mut gpu = RecordingBackend::new(32, 32);
        let mut pass = screen(4);
        let mut loader = TextureLoader::new(GpuStats::shared());
        let mut releases = DeferredReleases::new(1);
        pass.apply_size(&mut gpu, 32, 32).unwrap();

        let mut request = FrameCopy::color_and_depth("capture");
        pass.copy(&mut gpu, &mut loader, &mut request, &mut releases).unwrap();
        let color = request.color.resource().unwrap().clone();
        let depth = request.depth.resource().unwrap().clone();

        gpu.fail_next_texture_destroy();
        assert!(request.release(&mut gpu).is_err());
        assert!(!request.color.is_loaded());
        assert!(!request.depth.is_loaded());
        assert!(color.is_released());
        assert!(!gpu.is_texture_alive(depth.texture_id()));

        // nothing left to release
        request.release(&mut gpu).unwrap();
    }

    #[test]
    fn test_release_returns_to_uninitialized() {
        let mut gpu = RecordingBackend::new(16, 16);
        let mut pass = screen(4);
        pass.apply_size(&mut gpu, 16, 16).unwrap();
        pass.release(&mut gpu).unwrap();
        assert!(matches!(pass.attachments(), Attachments::Uninitialized));
        assert_eq!(gpu.live_texture_count(), 0);
        assert!(gpu
            .commands()
            .iter()
            .any(|c| matches!(c, Command::DestroyTexture { .. })));
    }
}
