//! Tessel GPU layer
//!
//! GPU resource lifecycle and upload pipeline for WebGPU-style renderers:
//! growable vertex/index buffers, texture upload for every texture topology
//! with mip generation, and a screen pass that renders into multisampled
//! attachments and captures colour and depth on request.
//!
//! ## Layout
//! - [`hal`]: backend-agnostic descriptors, handles and the [`GpuBackend`] trait
//! - [`backend`]: the `wgpu` implementation and a headless recording backend
//! - [`buffer`], [`geometry`]: buffers that grow to fit uploaded data
//! - [`texture`], [`image`], [`loader`], [`mipmap`]: texture resources and upload
//! - [`depth_resolve`], [`screen_pass`]: attachments, resolve and frame capture
//! - [`renderer`]: frame driver tying everything to one backend

pub mod backend;
pub mod buffer;
pub mod config;
pub mod depth_resolve;
pub mod enums;
pub mod error;
pub mod geometry;
pub mod hal;
pub mod image;
pub mod loader;
pub mod mipmap;
pub mod release;
pub mod renderer;
pub mod screen_pass;
pub mod stats;
pub mod texture;

// Re-export commonly used types
pub use backend::{RecordingBackend, WgpuBackend};
pub use buffer::GrowableBuffer;
pub use config::{GpuConfig, TesselConfig};
pub use depth_resolve::MultisampleDepthResolver;
pub use enums::TextureFormat;
pub use error::{GpuError, GpuResult};
pub use geometry::{GeometryBuffers, MeshGeometry};
pub use hal::GpuBackend;
pub use image::{
    BufferedImage, CubeArrayImage, CubeFace, CubeImage, ImageArray2d, ImageData, NativeImage,
    TextureTopology,
};
pub use loader::TextureLoader;
pub use mipmap::{BlitMipmapGenerator, MipmapGenerator};
pub use release::DeferredReleases;
pub use renderer::RenderBackend;
pub use screen_pass::{ClearColor, ClearDepth, DepthMode, FrameCopy, ScenePass, ScreenPass};
pub use stats::GpuStats;
pub use texture::{GpuTextureResource, MipMapping, Texture, TextureSlot};
