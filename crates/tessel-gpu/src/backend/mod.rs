//! Concrete [`crate::hal::GpuBackend`] implementations

mod recording;
pub mod wgpu_backend;

pub use recording::{Command, RecordingBackend};
pub use wgpu_backend::{DeviceManager, SurfaceManager, WgpuBackend};
