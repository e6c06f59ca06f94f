//! Tessel SDK - GPU resource layer for WebGPU renderers
//!
//! Tessel manages the lifetime of GPU buffers and textures, uploads image
//! data of every texture topology, and drives a screen pass with
//! multisampled attachments and on-demand frame capture.

pub use tessel_core;
pub use tessel_gpu;

use tessel_gpu::{GpuBackend, GpuResult, RenderBackend, TesselConfig};

/// Unified prelude module that exports all commonly used types
pub mod prelude {
    pub use tessel_core::{CoreError, LogCategory, LogLevel, LoggingConfig};
    pub use tessel_gpu::hal::{DrawCall, GpuBackend, TextureDescriptor};
    pub use tessel_gpu::{
        BufferedImage, ClearColor, ClearDepth, CubeFace, CubeImage, DepthMode, FrameCopy,
        GeometryBuffers, GpuConfig, GpuError, GpuResult, ImageData, MeshGeometry, MipMapping,
        RecordingBackend, RenderBackend, ScenePass, TesselConfig, Texture, TextureFormat,
        TextureTopology, WgpuBackend,
    };
}

/// Install logging from `config` and build a frame driver around `gpu`
pub fn init<B: GpuBackend>(gpu: B, config: &TesselConfig) -> GpuResult<RenderBackend<B>> {
    tessel_core::init(&config.logging)?;
    RenderBackend::new(gpu, config.gpu.clone())
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_init_with_recording_backend() {
        let config = TesselConfig::default();
        let renderer = super::init(RecordingBackend::new(32, 32), &config).unwrap();
        assert_eq!(renderer.frame_index(), 0);
        assert_eq!(renderer.config().sample_count, 4);
    }
}
