//! GPU buffer management.

use wgpu::util::DeviceExt;

/// Creates a read-only storage buffer from data.
///
/// `COPY_SRC` is set so the contents can be read back for inspection.
pub fn create_storage_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    data: &[T],
    label: Option<&str>,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label,
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC,
    })
}

/// Creates a mappable buffer that copies can land in.
pub fn create_readback_buffer(
    device: &wgpu::Device,
    size: u64,
    label: Option<&str>,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label,
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Uploads the Gaussian kernel weights.
pub fn create_kernel_buffer(
    device: &wgpu::Device,
    kernel: &volprobe_core::GaussianKernel,
) -> wgpu::Buffer {
    create_storage_buffer(device, kernel.weights(), Some("gaussian kernel"))
}
