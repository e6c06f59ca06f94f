//! GPU buffers that grow on demand
//!
//! A [`GrowableBuffer`] reallocates whenever a write exceeds its capacity.
//! Capacity only ever grows, and the backing [`BufferId`] changes on growth,
//! so callers must fetch [`GrowableBuffer::buffer`] again after every write.
//!
//! Queue writes move whole 4-byte words. Payloads of other lengths are
//! zero-padded and capacities are rounded up to match.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::{debug, instrument, trace};
use wgpu::BufferUsages;

use crate::error::GpuResult;
use crate::hal::{align_copy_size, BufferDescriptor, BufferId, GpuBackend, COPY_BUFFER_ALIGNMENT};
use crate::release::ReleaseFlag;
use crate::stats::GpuStats;

pub struct GrowableBuffer {
    label: String,
    usage: BufferUsages,
    capacity: u64,
    buffer: BufferId,
    released: ReleaseFlag,
    stats: Arc<GpuStats>,
}

impl GrowableBuffer {
    /// Usage for vertex streams
    pub const VERTEX_USAGE: BufferUsages = BufferUsages::VERTEX.union(BufferUsages::COPY_DST);
    /// Usage for index streams
    pub const INDEX_USAGE: BufferUsages = BufferUsages::INDEX.union(BufferUsages::COPY_DST);

    pub fn new(
        gpu: &mut dyn GpuBackend,
        label: impl Into<String>,
        size: u64,
        usage: BufferUsages,
        stats: &Arc<GpuStats>,
    ) -> GpuResult<Self> {
        let label = label.into();
        let size = align_copy_size(size);
        let buffer = allocate(gpu, &label, size, usage, stats)?;
        Ok(Self {
            label,
            usage,
            capacity: size,
            buffer,
            released: ReleaseFlag::new(),
            stats: stats.clone(),
        })
    }

    /// Buffer with [`Self::VERTEX_USAGE`]
    pub fn vertex(
        gpu: &mut dyn GpuBackend,
        label: impl Into<String>,
        size: u64,
        stats: &Arc<GpuStats>,
    ) -> GpuResult<Self> {
        Self::new(gpu, label, size, Self::VERTEX_USAGE, stats)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn usage(&self) -> BufferUsages {
        self.usage
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn is_released(&self) -> bool {
        self.released.is_released()
    }

    /// Current backing buffer. Only valid until the next write.
    pub fn buffer(&self) -> GpuResult<BufferId> {
        self.released.check::<Self>(&self.label)?;
        Ok(self.buffer)
    }

    /// Copy `data` to the start of the buffer, growing it first if needed.
    ///
    /// Returns `true` when the buffer was reallocated.
    #[instrument(level = "trace", target = "tessel::buffer", skip(self, gpu, data), fields(label = %self.label, len = data.len()))]
    pub fn write_data(&mut self, gpu: &mut dyn GpuBackend, data: &[u8]) -> GpuResult<bool> {
        self.released.check::<Self>(&self.label)?;

        let data = padded(data);
        let required = data.len() as u64;
        let grown = required > self.capacity;
        if grown {
            let replacement = allocate(gpu, &self.label, required, self.usage, &self.stats)?;
            let old = std::mem::replace(&mut self.buffer, replacement);
            let old_capacity = std::mem::replace(&mut self.capacity, required);
            debug!(
                target: "tessel::buffer",
                label = %self.label,
                old = old_capacity,
                new = required,
                "growing buffer"
            );
            self.stats.buffer_released(old_capacity);
            gpu.destroy_buffer(old)?;
        }

        if !data.is_empty() {
            gpu.write_buffer(self.buffer, 0, &data)?;
        }
        trace!(target: "tessel::buffer", label = %self.label, bytes = required, "buffer written");
        Ok(grown)
    }

    pub fn write_f32(&mut self, gpu: &mut dyn GpuBackend, data: &[f32]) -> GpuResult<bool> {
        self.write_data(gpu, bytemuck::cast_slice(data))
    }

    pub fn write_i32(&mut self, gpu: &mut dyn GpuBackend, data: &[i32]) -> GpuResult<bool> {
        self.write_data(gpu, bytemuck::cast_slice(data))
    }

    pub fn write_u32(&mut self, gpu: &mut dyn GpuBackend, data: &[u32]) -> GpuResult<bool> {
        self.write_data(gpu, bytemuck::cast_slice(data))
    }

    /// Destroy the backing buffer. Fails with `UseAfterRelease` when called twice.
    pub fn release(&self, gpu: &mut dyn GpuBackend) -> GpuResult<()> {
        self.released.mark_released::<Self>(&self.label)?;
        self.stats.buffer_released(self.capacity);
        debug!(target: "tessel::buffer", label = %self.label, "released buffer");
        gpu.destroy_buffer(self.buffer)
    }
}

impl std::fmt::Debug for GrowableBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("label", &self.label)
            .field("capacity", &self.capacity)
            .field("buffer", &self.buffer)
            .field("released", &self.is_released())
            .finish()
    }
}

/// `data` extended with zeros to a whole number of copy words
fn padded(data: &[u8]) -> Cow<'_, [u8]> {
    if data.len() as u64 % COPY_BUFFER_ALIGNMENT == 0 {
        Cow::Borrowed(data)
    } else {
        let mut bytes = data.to_vec();
        bytes.resize(align_copy_size(data.len() as u64) as usize, 0);
        Cow::Owned(bytes)
    }
}

fn allocate(
    gpu: &mut dyn GpuBackend,
    label: &str,
    size: u64,
    usage: BufferUsages,
    stats: &GpuStats,
) -> GpuResult<BufferId> {
    let buffer = gpu.create_buffer(&BufferDescriptor {
        label: label.to_string(),
        size,
        usage,
    })?;
    stats.buffer_allocated(size);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::error::GpuError;

    fn buffer(gpu: &mut RecordingBackend, size: u64) -> GrowableBuffer {
        GrowableBuffer::vertex(gpu, "test vertices", size, &GpuStats::shared()).unwrap()
    }

    #[test]
    fn test_capacity_is_monotonic_and_contents_match() {
        let mut gpu = RecordingBackend::new(16, 16);
        let mut buf = buffer(&mut gpu, 8);

        let payloads: [&[u8]; 4] = [&[1; 4], &[2; 32], &[3; 12], &[4; 64]];
        let mut last_capacity = buf.capacity();
        for payload in payloads {
            buf.write_data(&mut gpu, payload).unwrap();
            assert!(buf.capacity() >= payload.len() as u64);
            assert!(buf.capacity() >= last_capacity);
            last_capacity = buf.capacity();

            let id = buf.buffer().unwrap();
            assert_eq!(gpu.buffer_contents(id, payload.len()), Some(payload));
        }
        assert_eq!(buf.capacity(), 64);
    }

    #[test]
    fn test_identity_stable_within_capacity() {
        let mut gpu = RecordingBackend::new(16, 16);
        let mut buf = buffer(&mut gpu, 16);
        let before = buf.buffer().unwrap();

        assert!(!buf.write_f32(&mut gpu, &[1.0, 2.0, 3.0]).unwrap());
        assert_eq!(buf.buffer().unwrap(), before);

        assert!(buf.write_f32(&mut gpu, &[0.0; 5]).unwrap());
        let after = buf.buffer().unwrap();
        assert_ne!(after, before);
        assert!(!gpu.is_buffer_alive(before));
        assert_eq!(gpu.buffer_size(after), Some(20));
        assert_eq!(gpu.buffer_usage(after), Some(GrowableBuffer::VERTEX_USAGE));
    }

    #[test]
    fn test_stats_follow_growth() {
        let mut gpu = RecordingBackend::new(16, 16);
        let stats = GpuStats::shared();
        let mut buf = GrowableBuffer::new(
            &mut gpu,
            "indices",
            8,
            GrowableBuffer::INDEX_USAGE,
            &stats,
        )
        .unwrap();
        buf.write_u32(&mut gpu, &[0, 1, 2, 2, 3, 0]).unwrap();
        assert_eq!(stats.buffer_bytes(), 24);
        assert_eq!(stats.live_buffers(), 1);

        buf.release(&mut gpu).unwrap();
        assert_eq!(stats.buffer_bytes(), 0);
    }

    #[test]
    fn test_unaligned_payload_is_padded() {
        let mut gpu = RecordingBackend::new(16, 16);
        let mut buf = buffer(&mut gpu, 3);
        assert_eq!(buf.capacity(), 4);

        assert!(buf.write_data(&mut gpu, &[1, 2, 3, 4, 5, 6]).unwrap());
        assert_eq!(buf.capacity(), 8);
        let id = buf.buffer().unwrap();
        assert_eq!(gpu.buffer_size(id), Some(8));
        assert_eq!(gpu.buffer_contents(id, 8), Some(&[1u8, 2, 3, 4, 5, 6, 0, 0][..]));
    }

    #[test]
    fn test_failed_growth_keeps_old_buffer() {
        let mut gpu = RecordingBackend::new(16, 16);
        let stats = GpuStats::shared();
        let mut buf = GrowableBuffer::vertex(&mut gpu, "stream", 8, &stats).unwrap();
        let before = buf.buffer().unwrap();

        gpu.fail_next_buffer_allocation();
        assert!(buf.write_data(&mut gpu, &[0; 16]).is_err());
        assert_eq!(buf.buffer().unwrap(), before);
        assert_eq!(buf.capacity(), 8);
        assert!(gpu.is_buffer_alive(before));
        assert_eq!(stats.buffer_bytes(), 8);

        assert!(!buf.write_data(&mut gpu, &[7; 8]).unwrap());
        buf.release(&mut gpu).unwrap();
        assert_eq!(stats.live_buffers(), 0);
    }

    #[test]
    fn test_use_after_release() {
        let mut gpu = RecordingBackend::new(16, 16);
        let mut buf = buffer(&mut gpu, 4);
        buf.release(&mut gpu).unwrap();

        assert!(matches!(
            buf.release(&mut gpu),
            Err(GpuError::UseAfterRelease { kind: "GrowableBuffer", .. })
        ));
        assert!(buf.write_i32(&mut gpu, &[1]).is_err());
        assert!(buf.buffer().is_err());
    }
}
