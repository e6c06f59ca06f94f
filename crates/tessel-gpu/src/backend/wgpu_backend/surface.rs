//! Surface configuration and resize handling

use tracing::{debug, info};
use wgpu::{
    Adapter, Device, PresentMode, Surface, SurfaceConfiguration, SurfaceError, SurfaceTexture,
    TextureUsages,
};

use crate::enums::TextureFormat;

use super::conv::unmap_texture_format;

/// Manages a wgpu surface and its configuration
pub struct SurfaceManager {
    surface: Surface<'static>,
    config: SurfaceConfiguration,
    format: TextureFormat,
}

impl SurfaceManager {
    /// Configure `surface` for presentation.
    ///
    /// Prefers a non-sRGB 8-bit format. The surface is created with
    /// `COPY_DST` so single-sampled frames can be copied onto it.
    ///
    /// # Errors
    /// Returns error if the surface offers no supported format
    pub fn new(
        surface: Surface<'static>,
        device: &Device,
        adapter: &Adapter,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> anyhow::Result<Self> {
        let capabilities = surface.get_capabilities(adapter);

        let (native, format) = capabilities
            .formats
            .iter()
            .copied()
            .filter_map(|f| unmap_texture_format(f).map(|ours| (f, ours)))
            .min_by_key(|(f, _)| f.is_srgb())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Surface offers no supported format: {:?}",
                    capabilities.formats
                )
            })?;
        let alpha_mode = capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_DST,
            format: native,
            width: width.max(1),
            height: height.max(1),
            present_mode: if vsync {
                PresentMode::AutoVsync
            } else {
                PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(device, &config);

        info!(
            target: "tessel::gpu",
            format = %format,
            width = config.width,
            height = config.height,
            "surface configured"
        );

        Ok(Self {
            surface,
            config,
            format,
        })
    }

    /// Reconfigure the surface for a new drawable size
    pub fn resize(&mut self, width: u32, height: u32, device: &Device) -> anyhow::Result<()> {
        validate_dimensions(width, height)?;
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(device, &self.config);
        debug!(target: "tessel::gpu", width, height, "surface resized");
        Ok(())
    }

    pub fn get_current_texture(&mut self) -> Result<SurfaceTexture, SurfaceError> {
        self.surface.get_current_texture()
    }

    /// Reconfigure after the surface was lost or became outdated
    pub fn reconfigure(&mut self, device: &Device) {
        self.surface.configure(device, &self.config);
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }
}

pub(crate) fn validate_dimensions(width: u32, height: u32) -> anyhow::Result<()> {
    if width == 0 || height == 0 {
        return Err(anyhow::anyhow!(
            "Invalid surface dimensions: {}x{}",
            width,
            height
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_validation() {
        assert!(validate_dimensions(0, 600).is_err());
        assert!(validate_dimensions(800, 0).is_err());
        assert!(validate_dimensions(800, 600).is_ok());
    }
}
