//! Box-filtered mip chain of the radiance texture.

use super::Dispatch;
use crate::error::RenderResult;
use crate::launch::ComputeLaunch;
use crate::shader::{ComputeProgram, ComputeProgramBuilder};
use crate::textures::{VolumeTexture, RADIANCE_FORMAT};
use crate::uniforms::{UniformBlock, UniformType};

const SHADER: &str = include_str!("../shaders/mipmap.wgsl");

pub(crate) fn mip_uniforms() -> UniformBlock {
    UniformBlock::new("mip params")
        .with_field("u_srcSize", UniformType::IVec3)
        .with_field("u_LOD", UniformType::I32)
        .with_field("u_dstSize", UniformType::IVec3)
}

struct MipLevel {
    level: u32,
    // Kept alive for the bind group.
    _uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    launch: ComputeLaunch,
}

/// Builds levels `1..mip_count` of a texture, each from the one below.
///
/// Level uniforms never change, so every level gets its own buffer and
/// bind group at construction.
pub struct MipStage {
    program: ComputeProgram,
    levels: Vec<MipLevel>,
}

impl MipStage {
    pub fn new(device: &wgpu::Device, texture: &VolumeTexture) -> RenderResult<Self> {
        let program = ComputeProgramBuilder::new()
            .with_label("radiance mipmap")
            .with_source(SHADER)
            .with_uniform(mip_uniforms().size() as u64)
            .with_texture_3d()
            .with_storage_texture_3d(RADIANCE_FORMAT)
            .build(device)?;

        let mut levels = Vec::new();
        for level in 1..texture.mip_count() {
            let src_extent = texture.level_extent(level - 1);
            let dst_extent = texture.level_extent(level);

            let mut uniforms = mip_uniforms();
            uniforms.set("u_srcSize", src_extent.as_ivec3());
            uniforms.set("u_LOD", level as i32);
            uniforms.set("u_dstSize", dst_extent.as_ivec3());
            let uniform_buffer = uniforms.create_buffer(device);

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("radiance mipmap bind group {level}")),
                layout: &program.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(texture.mip_view(level - 1)?),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(texture.mip_view(level)?),
                    },
                ],
            });

            levels.push(MipLevel {
                level,
                _uniform_buffer: uniform_buffer,
                bind_group,
                launch: ComputeLaunch::for_extent(dst_extent),
            });
        }

        Ok(Self { program, levels })
    }

    /// Number of levels generated (mip count minus one).
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// One dispatch per level, coarsening.
    #[must_use]
    pub fn dispatches(&self) -> Vec<Dispatch<'_>> {
        self.levels
            .iter()
            .map(|l| Dispatch {
                label: "radiance mipmap",
                level: l.level,
                pipeline: &self.program.pipeline,
                bind_group: &l.bind_group,
                launch: l.launch,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        let block = mip_uniforms();
        assert_eq!(block.offset_of("u_LOD"), Some(12));
        assert_eq!(block.offset_of("u_dstSize"), Some(16));
        assert_eq!(block.size(), 32);
    }
}
