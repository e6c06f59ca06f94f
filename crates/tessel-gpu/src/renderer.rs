//! Frame driver
//!
//! [`RenderBackend`] ties the resource layer to one [`GpuBackend`]. A frame
//! is: buffer updates, [`RenderBackend::render_scene`], optional
//! [`RenderBackend::copy`] calls, then [`RenderBackend::end_frame`], which
//! submits once and advances the deferred release queue.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::config::GpuConfig;
use crate::enums::TextureFormat;
use crate::error::GpuResult;
use crate::geometry::{GeometryBuffers, MeshGeometry};
use crate::hal::{GpuBackend, TextureDescriptor};
use crate::image::TextureTopology;
use crate::loader::TextureLoader;
use crate::release::DeferredReleases;
use crate::screen_pass::{FrameCopy, ScenePass, ScreenPass};
use crate::stats::GpuStats;
use crate::texture::{GpuTextureResource, Texture};

pub struct RenderBackend<B: GpuBackend> {
    gpu: B,
    config: GpuConfig,
    stats: Arc<GpuStats>,
    loader: TextureLoader,
    screen: ScreenPass,
    releases: DeferredReleases,
    frame_index: u64,
}

impl<B: GpuBackend> RenderBackend<B> {
    pub fn new(gpu: B, config: GpuConfig) -> GpuResult<Self> {
        config.validate()?;
        let stats = GpuStats::shared();
        let screen = ScreenPass::new(config.sample_count, config.depth_format, stats.clone());
        info!(
            target: "tessel::gpu",
            samples = config.sample_count,
            depth_format = %config.depth_format,
            surface_format = %gpu.surface_format(),
            "render backend ready"
        );
        Ok(Self {
            loader: TextureLoader::new(stats.clone()),
            releases: DeferredReleases::new(config.release_delay_frames),
            gpu,
            config,
            stats,
            screen,
            frame_index: 0,
        })
    }

    pub fn gpu(&self) -> &B {
        &self.gpu
    }

    /// Backend access, e.g. to resize the surface before [`Self::apply_size`]
    pub fn gpu_mut(&mut self) -> &mut B {
        &mut self.gpu
    }

    pub fn config(&self) -> &GpuConfig {
        &self.config
    }

    pub fn stats(&self) -> &Arc<GpuStats> {
        &self.stats
    }

    pub fn loader(&self) -> &TextureLoader {
        &self.loader
    }

    pub fn screen(&self) -> &ScreenPass {
        &self.screen
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn pending_releases(&self) -> usize {
        self.releases.len()
    }

    pub fn create_texture(
        &mut self,
        descriptor: TextureDescriptor,
    ) -> GpuResult<Arc<GpuTextureResource>> {
        self.loader.create_texture(&mut self.gpu, descriptor)
    }

    /// Unloaded texture using the configured mip policy
    pub fn new_texture(
        &self,
        name: impl Into<String>,
        topology: TextureTopology,
        format: TextureFormat,
    ) -> Texture {
        Texture::new(name, topology, format).with_mip_mapping(self.config.default_mip_mapping)
    }

    pub fn load_texture(&mut self, texture: &mut Texture) -> GpuResult<Arc<GpuTextureResource>> {
        self.loader.load_texture(&mut self.gpu, texture)
    }

    pub fn create_geometry(&mut self, mesh: &MeshGeometry) -> GpuResult<GeometryBuffers> {
        GeometryBuffers::new(&mut self.gpu, mesh, &self.stats)
    }

    pub fn check_buffers(
        &mut self,
        buffers: &mut GeometryBuffers,
        mesh: &mut MeshGeometry,
    ) -> GpuResult<bool> {
        buffers.check_buffers(&mut self.gpu, mesh)
    }

    pub fn apply_size(&mut self, width: u32, height: u32) -> GpuResult<()> {
        self.screen.apply_size(&mut self.gpu, width, height)
    }

    /// Scene pass clearing to the configured colour
    pub fn scene_pass(&self, name: impl Into<String>) -> ScenePass {
        ScenePass::new(name, self.config.clear_color())
    }

    pub fn render_scene(&mut self, scene: &ScenePass) -> GpuResult<()> {
        self.screen.render_scene(&mut self.gpu, scene)
    }

    pub fn copy(&mut self, request: &mut FrameCopy) -> GpuResult<()> {
        self.screen
            .copy(&mut self.gpu, &mut self.loader, request, &mut self.releases)
    }

    /// Submit the frame, then release textures whose delay ran out
    #[instrument(level = "trace", target = "tessel::gpu", skip(self), fields(frame = self.frame_index))]
    pub fn end_frame(&mut self) -> GpuResult<()> {
        self.gpu.submit()?;
        self.frame_index += 1;
        let released = self.releases.on_frame_boundary(&mut self.gpu)?;
        if released > 0 {
            debug!(target: "tessel::gpu", released, "deferred releases completed");
        }
        Ok(())
    }

    /// Release the screen attachments and every pending texture, returning
    /// the backend.
    pub fn shutdown(mut self) -> GpuResult<B> {
        self.releases.flush(&mut self.gpu)?;
        self.screen.release(&mut self.gpu)?;
        info!(
            target: "tessel::gpu",
            frames = self.frame_index,
            live_textures = self.stats.live_textures(),
            live_buffers = self.stats.live_buffers(),
            "render backend shut down"
        );
        Ok(self.gpu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::error::GpuError;
    use pretty_assertions::assert_eq;

    fn backend(samples: u32) -> RenderBackend<RecordingBackend> {
        let config = GpuConfig {
            sample_count: samples,
            ..GpuConfig::default()
        };
        RenderBackend::new(RecordingBackend::new(64, 64), config).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = GpuConfig {
            sample_count: 3,
            ..GpuConfig::default()
        };
        assert!(matches!(
            RenderBackend::new(RecordingBackend::new(8, 8), config),
            Err(GpuError::Config(_))
        ));
    }

    #[test]
    fn test_frame_submits_once() {
        let mut renderer = backend(4);
        let scene = renderer.scene_pass("main");
        renderer.render_scene(&scene).unwrap();
        renderer.end_frame().unwrap();
        renderer.render_scene(&scene).unwrap();
        renderer.end_frame().unwrap();

        assert_eq!(renderer.gpu().submit_count(), 2);
        assert_eq!(renderer.frame_index(), 2);
    }

    #[test]
    fn test_replaced_capture_released_after_frame() {
        let mut renderer = backend(4);
        let scene = renderer.scene_pass("main");
        let mut request = FrameCopy::color_only("capture");

        renderer.render_scene(&scene).unwrap();
        renderer.copy(&mut request).unwrap();
        renderer.end_frame().unwrap();
        let old = request.color.resource().unwrap().clone();

        renderer.gpu_mut().set_surface_size(96, 64);
        renderer.apply_size(96, 64).unwrap();
        renderer.render_scene(&scene).unwrap();
        renderer.copy(&mut request).unwrap();
        assert_eq!(renderer.pending_releases(), 1);
        assert!(renderer.gpu().is_texture_alive(old.texture_id()));

        renderer.end_frame().unwrap();
        assert_eq!(renderer.pending_releases(), 0);
        assert!(old.is_released());
        assert!(!renderer.gpu().is_texture_alive(old.texture_id()));
    }

    #[test]
    fn test_transient_views_freed_each_frame() {
        let mut renderer = backend(4);
        let scene = renderer.scene_pass("main");
        let mut request = FrameCopy::color_and_depth("capture");
        for _ in 0..3 {
            renderer.render_scene(&scene).unwrap();
            renderer.copy(&mut request).unwrap();
            renderer.end_frame().unwrap();
        }
        // the two attachment views
        assert_eq!(renderer.gpu().live_view_count(), 2);
        assert_eq!(renderer.gpu().live_bind_group_count(), 0);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut renderer = backend(1);
        let scene = renderer.scene_pass("main");
        let mut request = FrameCopy::color_and_depth("capture");
        renderer.render_scene(&scene).unwrap();
        renderer.copy(&mut request).unwrap();
        renderer.end_frame().unwrap();

        request.release(renderer.gpu_mut()).unwrap();
        assert!(!request.color.is_loaded());
        assert!(!request.depth.is_loaded());
        let stats = renderer.stats().clone();
        let gpu = renderer.shutdown().unwrap();
        assert_eq!(gpu.live_texture_count(), 0);
        assert_eq!(stats.live_textures(), 0);
    }
}
