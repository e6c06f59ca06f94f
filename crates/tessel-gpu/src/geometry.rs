//! Per-mesh vertex and index buffers

use std::sync::Arc;

use tracing::{debug, trace};

use crate::buffer::GrowableBuffer;
use crate::error::GpuResult;
use crate::hal::{BufferId, GpuBackend};
use crate::release::ReleaseFlag;
use crate::stats::GpuStats;

/// CPU-side mesh data as produced by the scene layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    pub name: String,
    pub indices: Vec<u32>,
    /// Interleaved float vertex attributes
    pub data_f: Vec<f32>,
    /// Interleaved integer vertex attributes
    pub data_i: Vec<i32>,
    pub num_vertices: u32,
    pub byte_stride_f: u32,
    pub byte_stride_i: u32,
    pub has_changed: bool,
    pub is_batch_update: bool,
}

impl MeshGeometry {
    pub fn num_indices(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// GPU buffers backing one mesh.
///
/// The index buffer always exists; the float and int vertex buffers exist
/// only for streams with a nonzero byte stride.
pub struct GeometryBuffers {
    name: String,
    index: GrowableBuffer,
    float: Option<GrowableBuffer>,
    int: Option<GrowableBuffer>,
    is_newly_created: bool,
    released: ReleaseFlag,
}

impl GeometryBuffers {
    pub fn new(
        gpu: &mut dyn GpuBackend,
        mesh: &MeshGeometry,
        stats: &Arc<GpuStats>,
    ) -> GpuResult<Self> {
        let index = GrowableBuffer::new(
            gpu,
            format!("{} index data", mesh.name),
            4 * mesh.num_indices() as u64,
            GrowableBuffer::INDEX_USAGE,
            stats,
        )?;
        let float = match mesh.byte_stride_f {
            0 => None,
            stride => Some(GrowableBuffer::vertex(
                gpu,
                format!("{} vertex float data", mesh.name),
                stride as u64 * mesh.num_vertices as u64,
                stats,
            )?),
        };
        let int = match mesh.byte_stride_i {
            0 => None,
            stride => Some(GrowableBuffer::vertex(
                gpu,
                format!("{} vertex int data", mesh.name),
                stride as u64 * mesh.num_vertices as u64,
                stats,
            )?),
        };
        debug!(
            target: "tessel::buffer",
            mesh = %mesh.name,
            float = float.is_some(),
            int = int.is_some(),
            "created geometry buffers"
        );

        Ok(Self {
            name: mesh.name.clone(),
            index,
            float,
            int,
            is_newly_created: true,
            released: ReleaseFlag::new(),
        })
    }

    /// Upload mesh data if it changed or was never uploaded.
    ///
    /// Nothing happens while the mesh is mid batch update; the first upload
    /// then happens on the first check after the batch completes. Returns
    /// whether data was uploaded.
    pub fn check_buffers(
        &mut self,
        gpu: &mut dyn GpuBackend,
        mesh: &mut MeshGeometry,
    ) -> GpuResult<bool> {
        self.released.check::<Self>(&self.name)?;
        if mesh.is_batch_update || !(mesh.has_changed || self.is_newly_created) {
            return Ok(false);
        }

        self.index.write_u32(gpu, &mesh.indices)?;
        if let Some(float) = &mut self.float {
            float.write_f32(gpu, &mesh.data_f)?;
        }
        if let Some(int) = &mut self.int {
            int.write_i32(gpu, &mesh.data_i)?;
        }
        mesh.has_changed = false;
        self.is_newly_created = false;
        trace!(target: "tessel::buffer", mesh = %self.name, "geometry uploaded");
        Ok(true)
    }

    pub fn index_buffer(&self) -> GpuResult<BufferId> {
        self.released.check::<Self>(&self.name)?;
        self.index.buffer()
    }

    pub fn float_buffer(&self) -> GpuResult<Option<BufferId>> {
        self.released.check::<Self>(&self.name)?;
        self.float.as_ref().map(GrowableBuffer::buffer).transpose()
    }

    pub fn int_buffer(&self) -> GpuResult<Option<BufferId>> {
        self.released.check::<Self>(&self.name)?;
        self.int.as_ref().map(GrowableBuffer::buffer).transpose()
    }

    pub fn index_capacity(&self) -> GpuResult<u64> {
        self.released.check::<Self>(&self.name)?;
        Ok(self.index.capacity())
    }

    pub fn float_capacity(&self) -> GpuResult<Option<u64>> {
        self.released.check::<Self>(&self.name)?;
        Ok(self.float.as_ref().map(GrowableBuffer::capacity))
    }

    pub fn int_capacity(&self) -> GpuResult<Option<u64>> {
        self.released.check::<Self>(&self.name)?;
        Ok(self.int.as_ref().map(GrowableBuffer::capacity))
    }

    /// Release all owned buffers, returning the first failure
    pub fn release(&self, gpu: &mut dyn GpuBackend) -> GpuResult<()> {
        self.released.mark_released::<Self>(&self.name)?;
        let mut first = None;
        let buffers = std::iter::once(&self.index)
            .chain(self.float.as_ref())
            .chain(self.int.as_ref());
        for buffer in buffers {
            if let Err(err) = buffer.release(gpu) {
                first.get_or_insert(err);
            }
        }
        debug!(target: "tessel::buffer", mesh = %self.name, "released geometry");
        first.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::error::GpuError;
    use pretty_assertions::assert_eq;

    fn quad() -> MeshGeometry {
        MeshGeometry {
            name: "quad".to_string(),
            indices: vec![0, 1, 2, 2, 3, 0],
            data_f: vec![0.0; 12],
            num_vertices: 4,
            byte_stride_f: 12,
            ..Default::default()
        }
    }

    #[test]
    fn test_int_stream_only_with_stride() {
        let mut gpu = RecordingBackend::new(16, 16);
        let mut mesh = quad();
        mesh.byte_stride_i = 4;
        mesh.data_i = vec![7; 4];
        let mut geometry = GeometryBuffers::new(&mut gpu, &mesh, &GpuStats::shared()).unwrap();
        assert_eq!(geometry.int_capacity().unwrap(), Some(16));

        assert!(geometry.check_buffers(&mut gpu, &mut mesh).unwrap());
        let int = geometry.int_buffer().unwrap().unwrap();
        assert_eq!(
            gpu.buffer_contents(int, 16),
            Some(bytemuck::cast_slice::<i32, u8>(&[7; 4]))
        );
    }

    #[test]
    fn test_batch_update_defers_first_upload() {
        let mut gpu = RecordingBackend::new(16, 16);
        let mut mesh = quad();
        mesh.is_batch_update = true;
        let mut geometry = GeometryBuffers::new(&mut gpu, &mesh, &GpuStats::shared()).unwrap();

        assert!(!geometry.check_buffers(&mut gpu, &mut mesh).unwrap());
        mesh.is_batch_update = false;
        assert!(geometry.check_buffers(&mut gpu, &mut mesh).unwrap());
        assert!(!geometry.check_buffers(&mut gpu, &mut mesh).unwrap());
    }

    #[test]
    fn test_changed_mesh_grows_buffers() {
        let mut gpu = RecordingBackend::new(16, 16);
        let mut mesh = quad();
        let mut geometry = GeometryBuffers::new(&mut gpu, &mesh, &GpuStats::shared()).unwrap();
        geometry.check_buffers(&mut gpu, &mut mesh).unwrap();

        mesh.indices.extend([4, 5, 6]);
        mesh.has_changed = true;
        assert!(geometry.check_buffers(&mut gpu, &mut mesh).unwrap());
        assert_eq!(geometry.index_capacity().unwrap(), 36);
        assert_eq!(geometry.float_capacity().unwrap(), Some(48));
        assert!(!mesh.has_changed);
    }

    #[test]
    fn test_release_once() {
        let mut gpu = RecordingBackend::new(16, 16);
        let mut mesh = quad();
        let mut geometry = GeometryBuffers::new(&mut gpu, &mesh, &GpuStats::shared()).unwrap();
        let index = geometry.index_buffer().unwrap();

        geometry.release(&mut gpu).unwrap();
        assert!(!gpu.is_buffer_alive(index));
        assert!(matches!(
            geometry.release(&mut gpu),
            Err(GpuError::UseAfterRelease { kind: "GeometryBuffers", .. })
        ));
        assert!(geometry.check_buffers(&mut gpu, &mut mesh).is_err());
    }

    #[test]
    fn test_accessors_fail_after_release() {
        let mut gpu = RecordingBackend::new(16, 16);
        let geometry = GeometryBuffers::new(&mut gpu, &quad(), &GpuStats::shared()).unwrap();
        assert_eq!(geometry.index_capacity().unwrap(), 24);
        geometry.release(&mut gpu).unwrap();

        assert!(matches!(
            geometry.index_capacity(),
            Err(GpuError::UseAfterRelease { kind: "GeometryBuffers", .. })
        ));
        assert!(geometry.float_capacity().is_err());
        assert!(geometry.int_capacity().is_err());
        assert!(geometry.index_buffer().is_err());
        assert!(geometry.float_buffer().is_err());
        assert!(geometry.int_buffer().is_err());
    }
}
