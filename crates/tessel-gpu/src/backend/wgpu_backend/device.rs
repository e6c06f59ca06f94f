//! Device management for wgpu
//!
//! Handles instance, adapter, device and queue initialization.

use tracing::info;
use wgpu::{
    Adapter, AdapterInfo, Backends, Device, DeviceDescriptor, Features, Instance,
    InstanceDescriptor, Limits, Queue, RequestAdapterOptions, Surface,
};

use crate::enums::PowerPreference;

use super::conv::map_power_preference;

/// Owns the wgpu instance, adapter, device and queue
pub struct DeviceManager {
    instance: Instance,
    adapter: Adapter,
    device: Device,
    queue: Queue,
}

impl DeviceManager {
    /// Create a device without a presentation surface
    ///
    /// # Errors
    /// Returns error if no suitable adapter is found or device creation fails
    pub async fn new(backends: Backends, power: PowerPreference) -> anyhow::Result<Self> {
        let instance = Instance::new(InstanceDescriptor {
            backends,
            ..Default::default()
        });
        Self::with_instance(instance, None, power).await
    }

    /// Create a device compatible with `surface`, which must come from `instance`
    pub async fn with_instance(
        instance: Instance,
        surface: Option<&Surface<'_>>,
        power: PowerPreference,
    ) -> anyhow::Result<Self> {
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: map_power_preference(power),
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        let adapter_info = adapter.get_info();
        info!(
            target: "tessel::gpu",
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "selected GPU adapter"
        );

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("Tessel Device"),
                    required_features: Features::empty(),
                    required_limits: Limits::default(),
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create device: {}", e))?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn adapter_info(&self) -> AdapterInfo {
        self.adapter.get_info()
    }

    pub fn limits(&self) -> Limits {
        self.device.limits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires a GPU adapter
    async fn test_device_creation() {
        let dm = DeviceManager::new(Backends::all(), PowerPreference::HighPerformance)
            .await
            .expect("Failed to create device manager");

        assert!(dm.limits().max_texture_dimension_2d >= 2048);
        assert!(!dm.adapter_info().name.is_empty());
    }
}
