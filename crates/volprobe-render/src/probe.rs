//! The probe pipeline driver.
//!
//! A [`VolumeProbe`] owns the volume sequence, the GPU textures and the
//! three compute stages. Every [`VolumeProbe::update`] uploads the current
//! frame, records injection, mipmapping and filtering as three compute
//! passes in one command buffer, submits it, and advances the frame cycle.

use glam::{Mat4, UVec3, Vec3};
use volprobe_core::{
    Cube, CubePair, FrameCycle, GaussianKernel, GridLayout, MarginedVolumeSequence, MediumParams,
    MediumType, PointLight, VolumeGrid, VolumeTransform, DEFAULT_SIGMA,
};

use crate::context::GpuContext;
use crate::error::{RenderError, RenderResult};
use crate::readback::read_volume;
use crate::stages::{record_pass, FilterStage, InjectStage, MipStage};
use crate::textures::VolumeTextures;

/// Scene parameters a probe starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    pub light: PointLight,
    pub medium: MediumParams,
    pub transform: VolumeTransform,
    /// Gaussian standard deviation in voxels.
    pub sigma: f32,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            light: PointLight::default(),
            medium: MediumParams::default(),
            transform: VolumeTransform::default(),
            sigma: DEFAULT_SIGMA,
        }
    }
}

/// A volumetric light probe over an animated medium.
pub struct VolumeProbe {
    sequence: MarginedVolumeSequence,
    cycle: FrameCycle,
    light: PointLight,
    medium: MediumParams,
    transform: VolumeTransform,
    cubes: CubePair,
    textures: VolumeTextures,
    inject: InjectStage,
    mip: MipStage,
    filter: FilterStage,
}

impl VolumeProbe {
    /// Allocates textures and builds the compute stages.
    pub fn new(
        ctx: &GpuContext,
        sequence: MarginedVolumeSequence,
        settings: ProbeSettings,
    ) -> RenderResult<Self> {
        if settings.sigma <= 0.0 {
            return Err(RenderError::PipelineCreationFailed(format!(
                "gaussian sigma must be positive, got {}",
                settings.sigma
            )));
        }

        let layout = *sequence.layout();
        let emissive = settings.medium.medium_type.is_emissive();
        let textures = VolumeTextures::new(&ctx.device, &layout, emissive);
        let inject = InjectStage::new(&ctx.device, &textures)?;
        let mip = MipStage::new(&ctx.device, &textures.radiance)?;
        let filter = FilterStage::new(
            &ctx.device,
            &textures,
            &layout,
            GaussianKernel::new(settings.sigma),
        )?;
        let cycle = FrameCycle::new(sequence.num_frames());

        Ok(Self {
            cubes: CubePair::from_transform(&settings.transform, &layout),
            sequence,
            cycle,
            light: settings.light,
            medium: settings.medium,
            transform: settings.transform,
            textures,
            inject,
            mip,
            filter,
        })
    }

    /// Recomputes the probe for the current frame, then advances the frame.
    ///
    /// Returns without waiting for the GPU.
    pub fn update(&mut self, ctx: &GpuContext) -> RenderResult<wgpu::SubmissionIndex> {
        let frame_index = self.cycle.current();
        let layout = *self.sequence.layout();
        self.textures
            .upload_frame(&ctx.queue, self.sequence.frame(frame_index))?;
        self.inject.set_params(
            &ctx.queue,
            &self.light,
            &self.medium,
            &self.cubes,
            &layout,
        );

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("volume probe update"),
            });
        let inject = self.inject.dispatches();
        let mip = self.mip.dispatches();
        let filter = self.filter.dispatches();
        record_pass(&mut encoder, "inject radiance", &inject);
        record_pass(&mut encoder, "radiance mipmap", &mip);
        record_pass(&mut encoder, "gaussian filter", &filter);
        let index = ctx.queue.submit(std::iter::once(encoder.finish()));

        let groups = self.inject.launch().groups;
        log::debug!(
            "frame {} / {}: inject {}x{}x{} groups, {} mip levels, {} filter passes",
            frame_index + 1,
            self.cycle.count(),
            groups.x,
            groups.y,
            groups.z,
            mip.len(),
            filter.len()
        );

        self.cycle.advance();
        Ok(index)
    }

    #[must_use]
    pub fn layout(&self) -> &GridLayout {
        self.sequence.layout()
    }

    #[must_use]
    pub fn sequence(&self) -> &MarginedVolumeSequence {
        &self.sequence
    }

    /// Index of the frame the next update will use.
    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.cycle.current()
    }

    #[must_use]
    pub fn num_frames(&self) -> usize {
        self.cycle.count()
    }

    /// Whether updates cycle through more than one frame.
    #[must_use]
    pub fn is_animated(&self) -> bool {
        self.cycle.is_animated()
    }

    /// Restarts the animation at frame 0.
    pub fn reset_frames(&mut self) {
        self.cycle.reset();
    }

    #[must_use]
    pub fn light(&self) -> &PointLight {
        &self.light
    }

    pub fn set_light(&mut self, light: PointLight) {
        self.light = light;
    }

    #[must_use]
    pub fn medium(&self) -> &MediumParams {
        &self.medium
    }

    pub fn set_albedo(&mut self, albedo: Vec3) {
        self.medium.set_albedo(albedo);
    }

    pub fn set_emission(&mut self, color: Vec3) {
        self.medium.set_emission(color);
    }

    /// Switches the medium type, reallocating the emission texture if
    /// needed. Density scale changes only apply to sequences loaded later.
    pub fn set_medium(&mut self, ctx: &GpuContext, medium: MediumParams) -> RenderResult<()> {
        self.medium = medium;
        self.sync_emission_texture(ctx)
    }

    pub fn set_medium_type(
        &mut self,
        ctx: &GpuContext,
        medium_type: MediumType,
    ) -> RenderResult<()> {
        self.medium.set_medium_type(medium_type);
        self.sync_emission_texture(ctx)
    }

    fn sync_emission_texture(&mut self, ctx: &GpuContext) -> RenderResult<()> {
        let layout = *self.sequence.layout();
        let emissive = self.medium.medium_type.is_emissive();
        if self.textures.ensure_emission(&ctx.device, &layout, emissive) {
            self.inject.rebind(&ctx.device, &self.textures)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn transform(&self) -> &VolumeTransform {
        &self.transform
    }

    /// Moves the volume; both cubes are recomputed.
    pub fn set_transform(&mut self, transform: VolumeTransform) {
        self.transform = transform;
        self.cubes = CubePair::from_transform(&transform, self.sequence.layout());
    }

    #[must_use]
    pub fn cubes(&self) -> &CubePair {
        &self.cubes
    }

    #[must_use]
    pub fn kernel(&self) -> &GaussianKernel {
        self.filter.kernel()
    }

    /// Rebuilds the filter stage with a new kernel width.
    pub fn set_sigma(&mut self, ctx: &GpuContext, sigma: f32) -> RenderResult<()> {
        if sigma <= 0.0 {
            return Err(RenderError::PipelineCreationFailed(format!(
                "gaussian sigma must be positive, got {sigma}"
            )));
        }
        let layout = *self.sequence.layout();
        self.filter = FilterStage::new(
            &ctx.device,
            &self.textures,
            &layout,
            GaussianKernel::new(sigma),
        )?;
        Ok(())
    }

    #[must_use]
    pub fn textures(&self) -> &VolumeTextures {
        &self.textures
    }

    #[must_use]
    pub fn filter_stage(&self) -> &FilterStage {
        &self.filter
    }

    #[must_use]
    pub fn mip_stage(&self) -> &MipStage {
        &self.mip
    }

    /// Copies a level of the filtered texture to the CPU (blocking).
    pub fn read_filtered(&self, ctx: &GpuContext, level: u32) -> RenderResult<VolumeGrid> {
        read_volume(ctx, &self.textures.filtered, level)
    }

    /// Copies a level of the unfiltered radiance texture to the CPU (blocking).
    pub fn read_radiance(&self, ctx: &GpuContext, level: u32) -> RenderResult<VolumeGrid> {
        read_volume(ctx, &self.textures.radiance, level)
    }

    /// What surface and volume renderers need to sample the probe.
    #[must_use]
    pub fn view(&self) -> ProbeView<'_> {
        ProbeView {
            filtered: self.textures.filtered.view(),
            mip_levels: self.textures.filtered.mip_count(),
            cubes: &self.cubes,
            albedo: self.medium.albedo,
            max_sample_extent: self.sequence.layout().max_extent_margined(),
            margined_extent: self.sequence.layout().margined(),
        }
    }
}

/// Read-only handle to the filtered probe, borrowed from a [`VolumeProbe`].
#[derive(Clone, Copy)]
pub struct ProbeView<'a> {
    filtered: &'a wgpu::TextureView,
    mip_levels: u32,
    cubes: &'a CubePair,
    albedo: Vec3,
    max_sample_extent: u32,
    margined_extent: UVec3,
}

impl<'a> ProbeView<'a> {
    /// Filtered radiance (rgb) and density (a), all mips.
    #[must_use]
    pub fn filtered_view(&self) -> &'a wgpu::TextureView {
        self.filtered
    }

    #[must_use]
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    #[must_use]
    pub fn inner_cube(&self) -> &'a Cube {
        &self.cubes.inner
    }

    #[must_use]
    pub fn margined_cube(&self) -> &'a Cube {
        &self.cubes.margined
    }

    #[must_use]
    pub fn albedo(&self) -> Vec3 {
        self.albedo
    }

    /// Largest margined axis; a ray-march step budget for renderers.
    #[must_use]
    pub fn max_sample_extent(&self) -> u32 {
        self.max_sample_extent
    }

    #[must_use]
    pub fn margined_extent(&self) -> UVec3 {
        self.margined_extent
    }

    /// Maps texel coordinates in `[0, 1]^3` to world space.
    #[must_use]
    pub fn texel_to_world(&self) -> Mat4 {
        self.cubes.margined.texel_to_world()
    }
}
