//! Release tracking for GPU resources
//!
//! [`ReleaseFlag`] makes a resource releasable exactly once. A second release,
//! or any use after release, fails with [`GpuError::UseAfterRelease`].
//!
//! [`DeferredReleases`] postpones destruction of textures that may still be
//! referenced by already submitted command buffers. Entries are drained at
//! frame boundaries by the frame driver.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{GpuError, GpuResult};
use crate::hal::GpuBackend;
use crate::texture::GpuTextureResource;

/// Number of frame boundaries a replaced texture survives by default
pub const DEFAULT_RELEASE_DELAY_FRAMES: u32 = 1;

/// Once-only release marker
#[derive(Debug, Default)]
pub struct ReleaseFlag {
    released: AtomicBool,
}

impl ReleaseFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Fails if the owner has already been released.
    pub fn check<T: ?Sized>(&self, label: &str) -> GpuResult<()> {
        if self.is_released() {
            Err(GpuError::use_after_release::<T>(label))
        } else {
            Ok(())
        }
    }

    /// Marks the owner released; the first caller wins, every later caller
    /// gets an error.
    pub fn mark_released<T: ?Sized>(&self, label: &str) -> GpuResult<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            Err(GpuError::use_after_release::<T>(label))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug)]
struct PendingRelease {
    texture: Arc<GpuTextureResource>,
    frames_left: u32,
}

/// Queue of textures whose destruction waits for in-flight frames.
///
/// A texture scheduled during frame `N` is released at the `delay`-th frame
/// boundary after it was scheduled, i.e. after frame `N` has been submitted.
/// Whether one boundary is enough for the GPU to have retired frame `N`
/// depends on the device's frame latency, so the delay is configurable.
#[derive(Debug)]
pub struct DeferredReleases {
    delay_frames: u32,
    pending: VecDeque<PendingRelease>,
}

impl DeferredReleases {
    pub fn new(delay_frames: u32) -> Self {
        Self {
            delay_frames: delay_frames.max(1),
            pending: VecDeque::new(),
        }
    }

    pub fn delay_frames(&self) -> u32 {
        self.delay_frames
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, texture: &Arc<GpuTextureResource>) -> bool {
        self.pending.iter().any(|p| Arc::ptr_eq(&p.texture, texture))
    }

    pub fn schedule(&mut self, texture: Arc<GpuTextureResource>) {
        debug!(
            target: "tessel::texture",
            label = texture.label(),
            frames = self.delay_frames,
            "scheduling deferred texture release"
        );
        self.pending.push_back(PendingRelease {
            texture,
            frames_left: self.delay_frames,
        });
    }

    /// Advance one frame boundary, releasing every texture whose delay ran out.
    ///
    /// All due entries are attempted; the first error is reported after the
    /// queue has been processed.
    pub fn on_frame_boundary(&mut self, gpu: &mut dyn GpuBackend) -> GpuResult<usize> {
        let mut released = 0;
        let mut first_error = None;

        for entry in self.pending.iter_mut() {
            entry.frames_left = entry.frames_left.saturating_sub(1);
        }

        while let Some(entry) = self.pending.front() {
            if entry.frames_left > 0 {
                break;
            }
            let Some(entry) = self.pending.pop_front() else {
                break;
            };
            trace!(target: "tessel::texture", label = entry.texture.label(), "deferred release due");
            match entry.texture.release(gpu) {
                Ok(()) => released += 1,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(released),
        }
    }

    /// Release everything immediately, e.g. on device teardown.
    pub fn flush(&mut self, gpu: &mut dyn GpuBackend) -> GpuResult<()> {
        let mut first_error = None;
        while let Some(entry) = self.pending.pop_front() {
            if let Err(err) = entry.texture.release(gpu) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Default for DeferredReleases {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASE_DELAY_FRAMES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::enums::TextureFormat;
    use crate::hal::TextureDescriptor;
    use crate::stats::GpuStats;
    use wgpu::TextureUsages;

    struct Owner;

    fn texture(gpu: &mut RecordingBackend, label: &str) -> Arc<GpuTextureResource> {
        let desc = TextureDescriptor::new_2d(
            label,
            8,
            8,
            TextureFormat::Rgba8Unorm,
            TextureUsages::COPY_DST,
        );
        GpuTextureResource::create(gpu, desc, &GpuStats::shared()).unwrap()
    }

    #[test]
    fn test_release_flag_once() {
        let flag = ReleaseFlag::new();
        assert!(flag.check::<Owner>("a").is_ok());
        assert!(flag.mark_released::<Owner>("a").is_ok());
        assert!(matches!(
            flag.mark_released::<Owner>("a"),
            Err(GpuError::UseAfterRelease { kind: "Owner", .. })
        ));
        assert!(flag.check::<Owner>("a").is_err());
    }

    #[test]
    fn test_release_after_one_boundary() {
        let mut gpu = RecordingBackend::new(64, 64);
        let tex = texture(&mut gpu, "old capture");
        let id = tex.texture_id();

        let mut releases = DeferredReleases::new(1);
        releases.schedule(tex.clone());
        assert!(gpu.is_texture_alive(id));
        assert!(releases.is_pending(&tex));

        assert_eq!(releases.on_frame_boundary(&mut gpu).unwrap(), 1);
        assert!(!gpu.is_texture_alive(id));
        assert!(tex.is_released());
        assert!(releases.is_empty());
    }

    #[test]
    fn test_longer_delay_waits() {
        let mut gpu = RecordingBackend::new(64, 64);
        let tex = texture(&mut gpu, "old capture");
        let id = tex.texture_id();

        let mut releases = DeferredReleases::new(3);
        releases.schedule(tex);
        assert_eq!(releases.on_frame_boundary(&mut gpu).unwrap(), 0);
        assert_eq!(releases.on_frame_boundary(&mut gpu).unwrap(), 0);
        assert!(gpu.is_texture_alive(id));
        assert_eq!(releases.on_frame_boundary(&mut gpu).unwrap(), 1);
        assert!(!gpu.is_texture_alive(id));
    }

    #[test]
    fn test_double_scheduled_release_reports_error() {
        let mut gpu = RecordingBackend::new(64, 64);
        let tex = texture(&mut gpu, "shared");

        let mut releases = DeferredReleases::new(1);
        releases.schedule(tex.clone());
        releases.schedule(tex);
        assert!(matches!(
            releases.on_frame_boundary(&mut gpu),
            Err(GpuError::UseAfterRelease { .. })
        ));
        assert!(releases.is_empty());
    }
}
