//! GPU memory accounting
//!
//! Counters are estimates: texture sizes come from
//! [`crate::texture::GpuTextureResource::estimated_size`], buffer sizes from
//! their allocated capacity.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct GpuStats {
    live_textures: AtomicU64,
    texture_bytes: AtomicU64,
    live_buffers: AtomicU64,
    buffer_bytes: AtomicU64,
    peak_bytes: AtomicU64,
    texture_allocations: AtomicU64,
    buffer_allocations: AtomicU64,
}

impl GpuStats {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn texture_allocated(&self, bytes: u64) {
        self.live_textures.fetch_add(1, Ordering::Relaxed);
        self.texture_allocations.fetch_add(1, Ordering::Relaxed);
        self.texture_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.update_peak();
    }

    pub fn texture_released(&self, bytes: u64) {
        self.live_textures.fetch_sub(1, Ordering::Relaxed);
        self.texture_bytes.fetch_sub(bytes, Ordering::Relaxed);
    }

    pub fn buffer_allocated(&self, bytes: u64) {
        self.live_buffers.fetch_add(1, Ordering::Relaxed);
        self.buffer_allocations.fetch_add(1, Ordering::Relaxed);
        self.buffer_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.update_peak();
    }

    pub fn buffer_released(&self, bytes: u64) {
        self.live_buffers.fetch_sub(1, Ordering::Relaxed);
        self.buffer_bytes.fetch_sub(bytes, Ordering::Relaxed);
    }

    pub fn live_textures(&self) -> u64 {
        self.live_textures.load(Ordering::Relaxed)
    }

    pub fn texture_bytes(&self) -> u64 {
        self.texture_bytes.load(Ordering::Relaxed)
    }

    pub fn live_buffers(&self) -> u64 {
        self.live_buffers.load(Ordering::Relaxed)
    }

    pub fn buffer_bytes(&self) -> u64 {
        self.buffer_bytes.load(Ordering::Relaxed)
    }

    pub fn total_bytes(&self) -> u64 {
        self.texture_bytes() + self.buffer_bytes()
    }

    fn update_peak(&self) {
        self.peak_bytes
            .fetch_max(self.total_bytes(), Ordering::Relaxed);
    }

    /// Snapshot of all counters
    pub fn get_stats(&self) -> HashMap<String, u64> {
        let mut stats = HashMap::new();
        stats.insert("live_textures".to_string(), self.live_textures());
        stats.insert("texture_bytes".to_string(), self.texture_bytes());
        stats.insert("live_buffers".to_string(), self.live_buffers());
        stats.insert("buffer_bytes".to_string(), self.buffer_bytes());
        stats.insert(
            "peak_bytes".to_string(),
            self.peak_bytes.load(Ordering::Relaxed),
        );
        stats.insert(
            "texture_allocations".to_string(),
            self.texture_allocations.load(Ordering::Relaxed),
        );
        stats.insert(
            "buffer_allocations".to_string(),
            self.buffer_allocations.load(Ordering::Relaxed),
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_balance() {
        let stats = GpuStats::default();
        stats.texture_allocated(1024);
        stats.buffer_allocated(256);
        stats.buffer_released(256);
        stats.buffer_allocated(512);

        assert_eq!(stats.live_textures(), 1);
        assert_eq!(stats.live_buffers(), 1);
        assert_eq!(stats.total_bytes(), 1536);

        let snapshot = stats.get_stats();
        assert_eq!(snapshot["peak_bytes"], 1536);
        assert_eq!(snapshot["buffer_allocations"], 2);

        stats.texture_released(1024);
        assert_eq!(stats.texture_bytes(), 0);
    }
}
