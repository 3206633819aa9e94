//! Copying textures and buffers back to the CPU.

use glam::{UVec3, Vec3};
use volprobe_core::VolumeGrid;

use crate::buffer::create_readback_buffer;
use crate::context::GpuContext;
use crate::error::{RenderError, RenderResult};
use crate::textures::{channels_of, VolumeTexture};

/// Row pitch rounded up to `COPY_BYTES_PER_ROW_ALIGNMENT`.
#[must_use]
pub fn aligned_bytes_per_row(width: u32, bytes_per_texel: u32) -> u32 {
    let unaligned = width * bytes_per_texel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

fn map_blocking(ctx: &GpuContext, buffer: &wgpu::Buffer) -> RenderResult<()> {
    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.wait_idle();
    rx.recv()
        .map_err(|_| RenderError::BufferMapFailed)?
        .map_err(|_| RenderError::BufferMapFailed)
}

/// Reads one mip level as tightly packed floats, x fastest.
pub fn read_texture_level(
    ctx: &GpuContext,
    texture: &VolumeTexture,
    level: u32,
) -> RenderResult<Vec<f32>> {
    if level >= texture.mip_count() {
        return Err(RenderError::InvalidMipLevel {
            level,
            count: texture.mip_count(),
        });
    }

    let extent = texture.level_extent(level);
    let texel_bytes = channels_of(texture.format()) * 4;
    let bytes_per_row = aligned_bytes_per_row(extent.x, texel_bytes);
    let size = u64::from(bytes_per_row) * u64::from(extent.y) * u64::from(extent.z);
    let buffer = create_readback_buffer(&ctx.device, size, Some("texture readback"));

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("texture readback encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: texture.texture(),
            mip_level: level,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(extent.y),
            },
        },
        wgpu::Extent3d {
            width: extent.x,
            height: extent.y,
            depth_or_array_layers: extent.z,
        },
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));
    map_blocking(ctx, &buffer)?;

    // Drop row padding.
    let data = buffer.slice(..).get_mapped_range();
    let row_bytes = (extent.x * texel_bytes) as usize;
    let mut result = Vec::with_capacity(row_bytes / 4 * (extent.y * extent.z) as usize);
    for row in 0..extent.y * extent.z {
        let start = (row * bytes_per_row) as usize;
        result.extend_from_slice(bytemuck::cast_slice(&data[start..start + row_bytes]));
    }
    drop(data);
    buffer.unmap();

    Ok(result)
}

/// Reads one mip level into a [`VolumeGrid`] spanning the unit cube.
pub fn read_volume(
    ctx: &GpuContext,
    texture: &VolumeTexture,
    level: u32,
) -> RenderResult<VolumeGrid> {
    let data = read_texture_level(ctx, texture, level)?;
    let extent: UVec3 = texture.level_extent(level);
    let mut grid = VolumeGrid::from_data(extent, channels_of(texture.format()), data)?;
    grid.set_range(Vec3::ZERO, Vec3::ONE);
    Ok(grid)
}

/// Reads a whole buffer of `f32`s. The buffer needs `COPY_SRC`.
pub fn read_buffer_f32(ctx: &GpuContext, source: &wgpu::Buffer) -> RenderResult<Vec<f32>> {
    let size = source.size();
    let buffer = create_readback_buffer(&ctx.device, size, Some("buffer readback"));
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("buffer readback encoder"),
        });
    encoder.copy_buffer_to_buffer(source, 0, &buffer, 0, size);
    ctx.queue.submit(std::iter::once(encoder.finish()));
    map_blocking(ctx, &buffer)?;

    let data = buffer.slice(..).get_mapped_range();
    let result: Vec<f32> = bytemuck::cast_slice(&data[..]).to_vec();
    drop(data);
    buffer.unmap();
    Ok(result)
}
