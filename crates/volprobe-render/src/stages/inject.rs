//! Radiance injection: single scattering from a point light into mip 0.

use volprobe_core::{CubePair, GridLayout, MediumParams, PointLight};

use super::Dispatch;
use crate::error::RenderResult;
use crate::launch::ComputeLaunch;
use crate::shader::{ComputeProgram, ComputeProgramBuilder};
use crate::textures::{VolumeTextures, RADIANCE_FORMAT};
use crate::uniforms::{UniformBlock, UniformType};

const SHADER: &str = include_str!("../shaders/inject_radiance.wgsl");

/// Uniform table matching `InjectParams` in the shader.
pub(crate) fn inject_uniforms() -> UniformBlock {
    UniformBlock::new("inject params")
        .with_field("u_texelToWorld", UniformType::Mat4)
        .with_field("u_worldToTexel", UniformType::Mat4)
        .with_field("u_cubeCorners", UniformType::Vec3Array(8))
        .with_field("u_lightPos", UniformType::Vec3)
        .with_field("u_mediumType", UniformType::I32)
        .with_field("u_lightLe", UniformType::Vec3)
        .with_field("u_albedo", UniformType::Vec3)
        .with_field("u_emission", UniformType::Vec3)
        .with_field("u_marginedSize", UniformType::IVec3)
}

/// Fills the injection uniforms from scene state.
pub(crate) fn write_inject_params(
    block: &mut UniformBlock,
    light: &PointLight,
    medium: &MediumParams,
    cubes: &CubePair,
    layout: &GridLayout,
) {
    let cube = &cubes.margined;
    block.set("u_texelToWorld", cube.texel_to_world());
    block.set("u_worldToTexel", cube.world_to_texel());
    block.set("u_cubeCorners", cube.corners.to_vec());
    block.set("u_lightPos", light.position);
    block.set("u_mediumType", medium.medium_type.tag());
    block.set("u_lightLe", light.intensity);
    block.set("u_albedo", medium.albedo);
    block.set("u_emission", medium.emission_color);
    block.set("u_marginedSize", layout.margined().as_ivec3());
}

/// Writes `(albedo * Le * T / d^2 * density [+ emission], density)` for
/// every voxel of the margined grid.
pub struct InjectStage {
    program: ComputeProgram,
    uniforms: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    launch: ComputeLaunch,
}

impl InjectStage {
    pub fn new(device: &wgpu::Device, textures: &VolumeTextures) -> RenderResult<Self> {
        let uniforms = inject_uniforms();
        let program = ComputeProgramBuilder::new()
            .with_label("inject radiance")
            .with_source(SHADER)
            .with_uniform(uniforms.size() as u64)
            .with_texture_3d()
            .with_texture_3d()
            .with_storage_texture_3d(RADIANCE_FORMAT)
            .build(device)?;
        let uniform_buffer = uniforms.create_buffer(device);
        let bind_group = Self::create_bind_group(device, &program, &uniform_buffer, textures)?;
        let launch = ComputeLaunch::for_extent(textures.radiance.extent());

        Ok(Self {
            program,
            uniforms,
            uniform_buffer,
            bind_group,
            launch,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        program: &ComputeProgram,
        uniform_buffer: &wgpu::Buffer,
        textures: &VolumeTextures,
    ) -> RenderResult<wgpu::BindGroup> {
        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("inject radiance bind group"),
            layout: &program.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(textures.density.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(textures.emission.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(textures.radiance.mip_view(0)?),
                },
            ],
        }))
    }

    /// Rebuilds the bind group after an input texture was reallocated.
    pub fn rebind(&mut self, device: &wgpu::Device, textures: &VolumeTextures) -> RenderResult<()> {
        self.bind_group =
            Self::create_bind_group(device, &self.program, &self.uniform_buffer, textures)?;
        Ok(())
    }

    /// Updates the uniforms and uploads them.
    pub fn set_params(
        &mut self,
        queue: &wgpu::Queue,
        light: &PointLight,
        medium: &MediumParams,
        cubes: &CubePair,
        layout: &GridLayout,
    ) {
        write_inject_params(&mut self.uniforms, light, medium, cubes, layout);
        self.uniforms.upload(queue, &self.uniform_buffer);
    }

    #[must_use]
    pub fn launch(&self) -> ComputeLaunch {
        self.launch
    }

    #[must_use]
    pub fn dispatches(&self) -> Vec<Dispatch<'_>> {
        vec![Dispatch {
            label: "inject radiance",
            level: 0,
            pipeline: &self.program.pipeline,
            bind_group: &self.bind_group,
            launch: self.launch,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use volprobe_core::{MediumType, VolumeTransform};

    #[test]
    fn test_uniform_offsets_match_shader_struct() {
        let block = inject_uniforms();
        assert_eq!(block.offset_of("u_texelToWorld"), Some(0));
        assert_eq!(block.offset_of("u_worldToTexel"), Some(64));
        assert_eq!(block.offset_of("u_cubeCorners"), Some(128));
        assert_eq!(block.offset_of("u_lightPos"), Some(256));
        assert_eq!(block.offset_of("u_mediumType"), Some(268));
        assert_eq!(block.offset_of("u_lightLe"), Some(272));
        assert_eq!(block.offset_of("u_albedo"), Some(288));
        assert_eq!(block.offset_of("u_emission"), Some(304));
        assert_eq!(block.offset_of("u_marginedSize"), Some(320));
        assert_eq!(block.size(), 336);
    }

    #[test]
    fn test_params_are_written() {
        let layout = GridLayout::uniform(8, 4);
        let cubes = CubePair::from_transform(&VolumeTransform::identity(), &layout);
        let light = PointLight::new(Vec3::new(1.0, 2.0, 3.0), Vec3::splat(5.0));
        let mut medium = MediumParams::default();
        medium.set_medium_type(MediumType::NonEmissive);

        let mut block = inject_uniforms();
        write_inject_params(&mut block, &light, &medium, &cubes, &layout);

        let bytes = block.bytes();
        let at = |o: usize| bytemuck::pod_read_unaligned::<f32>(&bytes[o..o + 4]);
        let at_i = |o: usize| bytemuck::pod_read_unaligned::<i32>(&bytes[o..o + 4]);
        assert_eq!(at(256), 1.0);
        assert_eq!(at(264), 3.0);
        assert_eq!(at_i(268), 0);
        assert_eq!(at(272), 5.0);
        assert_eq!(at_i(320), 16);
        assert_eq!(at_i(328), 16);
        // First corner of the margined identity cube is (-2, -2, -2).
        assert_eq!(at(128), -2.0);
    }
}
