//! Separable, margin-aware Gaussian filtering of every radiance mip.
//!
//! Each level runs three axis passes that ping-pong between textures:
//!
//! ```text
//! X: radiance      -> filtered
//! Y: filtered      -> filter buffer
//! Z: filter buffer -> filtered
//! ```
//!
//! Levels are processed from the coarsest allocated level down to 0.

use glam::UVec3;
use volprobe_core::{GaussianKernel, GridLayout};

use super::Dispatch;
use crate::buffer::create_kernel_buffer;
use crate::error::RenderResult;
use crate::launch::ComputeLaunch;
use crate::shader::{ComputeProgram, ComputeProgramBuilder};
use crate::textures::{VolumeTexture, VolumeTextures, RADIANCE_FORMAT};
use crate::uniforms::{UniformBlock, UniformType};

const SHADER: &str = include_str!("../shaders/gaussian_filter.wgsl");

/// Which texture a filter pass reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTarget {
    Radiance,
    Filtered,
    FilterBuffer,
}

/// One axis pass over one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPassPlan {
    pub level: u32,
    /// 0 = x, 1 = y, 2 = z.
    pub axis: u32,
    pub src: FilterTarget,
    pub dst: FilterTarget,
}

/// Pass order for a texture with `mip_count` levels.
#[must_use]
pub fn plan_filter_passes(mip_count: u32) -> Vec<FilterPassPlan> {
    const PING_PONG: [(FilterTarget, FilterTarget); 3] = [
        (FilterTarget::Radiance, FilterTarget::Filtered),
        (FilterTarget::Filtered, FilterTarget::FilterBuffer),
        (FilterTarget::FilterBuffer, FilterTarget::Filtered),
    ];
    (0..mip_count)
        .rev()
        .flat_map(|level| {
            PING_PONG
                .into_iter()
                .zip(0u32..)
                .map(move |((src, dst), axis)| FilterPassPlan {
                    level,
                    axis,
                    src,
                    dst,
                })
        })
        .collect()
}

pub(crate) fn filter_uniforms() -> UniformBlock {
    UniformBlock::new("filter params")
        .with_field("u_lodTexSize", UniformType::IVec3)
        .with_field("u_LOD", UniformType::I32)
        .with_field("u_marginSize", UniformType::IVec3)
        .with_field("u_maxLOD", UniformType::I32)
        .with_field("u_axis", UniformType::I32)
        .with_field("u_kernelSize", UniformType::I32)
}

struct FilterPass {
    plan: FilterPassPlan,
    _uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    launch: ComputeLaunch,
}

/// Low-pass filters the radiance mips into the filtered texture.
pub struct FilterStage {
    program: ComputeProgram,
    kernel: GaussianKernel,
    kernel_buffer: wgpu::Buffer,
    passes: Vec<FilterPass>,
}

impl FilterStage {
    pub fn new(
        device: &wgpu::Device,
        textures: &VolumeTextures,
        layout: &GridLayout,
        kernel: GaussianKernel,
    ) -> RenderResult<Self> {
        let program = ComputeProgramBuilder::new()
            .with_label("gaussian filter")
            .with_source(SHADER)
            .with_uniform(filter_uniforms().size() as u64)
            .with_storage_buffer()
            .with_texture_3d()
            .with_storage_texture_3d(RADIANCE_FORMAT)
            .build(device)?;
        let kernel_buffer = create_kernel_buffer(device, &kernel);

        let mip_count = textures.radiance.mip_count();
        let max_level = mip_count.saturating_sub(1);
        let mut passes = Vec::new();
        for plan in plan_filter_passes(mip_count) {
            let extent = textures.radiance.level_extent(plan.level);

            let mut uniforms = filter_uniforms();
            uniforms.set("u_lodTexSize", extent.as_ivec3());
            uniforms.set("u_LOD", plan.level as i32);
            uniforms.set("u_marginSize", layout.margin.as_ivec3());
            uniforms.set("u_maxLOD", max_level as i32);
            uniforms.set("u_axis", plan.axis as i32);
            uniforms.set("u_kernelSize", kernel.len() as i32);
            let uniform_buffer = uniforms.create_buffer(device);

            let src = target(textures, plan.src);
            let dst = target(textures, plan.dst);
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!(
                    "gaussian filter bind group {} axis {}",
                    plan.level, plan.axis
                )),
                layout: &program.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: kernel_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(src.mip_view(plan.level)?),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(dst.mip_view(plan.level)?),
                    },
                ],
            });

            passes.push(FilterPass {
                plan,
                _uniform_buffer: uniform_buffer,
                bind_group,
                launch: ComputeLaunch::for_extent(extent),
            });
        }

        log::debug!(
            "gaussian filter: sigma {}, {} taps, {} passes",
            kernel.sigma(),
            kernel.len(),
            passes.len()
        );
        Ok(Self {
            program,
            kernel,
            kernel_buffer,
            passes,
        })
    }

    #[must_use]
    pub fn kernel(&self) -> &GaussianKernel {
        &self.kernel
    }

    /// The uploaded kernel weights.
    #[must_use]
    pub fn kernel_buffer(&self) -> &wgpu::Buffer {
        &self.kernel_buffer
    }

    /// Planned passes, in dispatch order.
    pub fn plan(&self) -> impl Iterator<Item = FilterPassPlan> + '_ {
        self.passes.iter().map(|p| p.plan)
    }

    #[must_use]
    pub fn dispatches(&self) -> Vec<Dispatch<'_>> {
        self.passes
            .iter()
            .map(|p| Dispatch {
                label: "gaussian filter",
                level: p.plan.level,
                pipeline: &self.program.pipeline,
                bind_group: &p.bind_group,
                launch: p.launch,
            })
            .collect()
    }
}

fn target(textures: &VolumeTextures, which: FilterTarget) -> &VolumeTexture {
    match which {
        FilterTarget::Radiance => &textures.radiance,
        FilterTarget::Filtered => &textures.filtered,
        FilterTarget::FilterBuffer => &textures.filter_buffer,
    }
}

/// Margin width at `level`, `margin >> level`.
#[must_use]
pub fn level_margin(margin: UVec3, level: u32) -> UVec3 {
    margin >> level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_run_coarse_to_fine() {
        let plan = plan_filter_passes(3);
        assert_eq!(plan.len(), 9);
        let levels: Vec<u32> = plan.iter().map(|p| p.level).collect();
        assert_eq!(levels, vec![2, 2, 2, 1, 1, 1, 0, 0, 0]);
        let axes: Vec<u32> = plan.iter().map(|p| p.axis).collect();
        assert_eq!(axes, vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_each_level_ends_in_filtered() {
        for chunk in plan_filter_passes(7).chunks(3) {
            assert_eq!(chunk[0].src, FilterTarget::Radiance);
            assert_eq!(chunk[0].dst, FilterTarget::Filtered);
            assert_eq!(chunk[1].src, FilterTarget::Filtered);
            assert_eq!(chunk[1].dst, FilterTarget::FilterBuffer);
            assert_eq!(chunk[2].src, FilterTarget::FilterBuffer);
            assert_eq!(chunk[2].dst, FilterTarget::Filtered);
        }
    }

    #[test]
    fn test_uniform_layout() {
        let block = filter_uniforms();
        assert_eq!(block.offset_of("u_LOD"), Some(12));
        assert_eq!(block.offset_of("u_marginSize"), Some(16));
        assert_eq!(block.offset_of("u_maxLOD"), Some(28));
        assert_eq!(block.offset_of("u_axis"), Some(32));
        assert_eq!(block.offset_of("u_kernelSize"), Some(36));
        assert_eq!(block.size(), 48);
    }

    #[test]
    fn test_level_margin_halves() {
        let margins: Vec<u32> = (0..4).map(|l| level_margin(UVec3::splat(4), l).x).collect();
        assert_eq!(margins, vec![4, 2, 1, 0]);
    }
}
