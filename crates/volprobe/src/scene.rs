//! A loaded probe scene.

use std::path::Path;

use volprobe_core::{
    write_vol, MarginedVolumeSequence, MediumParams, PointLight, SceneConfig, VolumeTransform,
};
use volprobe_render::{
    save_slice_png, GpuContext, ProbeSettings, ProbeView, SliceOptions, VolumeProbe,
};

use crate::error::Result;

/// Scene state: the configuration it was loaded from and the probe built
/// from it. Light, medium and transform live on the probe and are changed
/// through the setters here.
pub struct Scene {
    config: SceneConfig,
    probe: VolumeProbe,
}

impl Scene {
    /// Loads the volume frames named by `config` and builds the probe.
    pub fn from_config(ctx: &GpuContext, config: SceneConfig) -> Result<Self> {
        let medium = config.medium();
        let sequence = MarginedVolumeSequence::load(
            &config.volume_folder,
            &config.density_filter,
            config.emission_filter.as_deref(),
            config.layout(),
            medium.density_scale,
        )?;
        let settings = ProbeSettings {
            light: config.light(),
            medium,
            transform: config.transform(),
            sigma: config.sigma,
        };
        let probe = VolumeProbe::new(ctx, sequence, settings)?;
        log::info!(
            "Scene ready: {} frame(s), {} mip levels",
            probe.num_frames(),
            probe.view().mip_levels()
        );
        Ok(Self { config, probe })
    }

    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    #[must_use]
    pub fn probe(&self) -> &VolumeProbe {
        &self.probe
    }

    pub fn probe_mut(&mut self) -> &mut VolumeProbe {
        &mut self.probe
    }

    #[must_use]
    pub fn view(&self) -> ProbeView<'_> {
        self.probe.view()
    }

    pub fn set_light(&mut self, light: PointLight) {
        self.probe.set_light(light);
    }

    pub fn set_medium(&mut self, ctx: &GpuContext, medium: MediumParams) -> Result<()> {
        self.probe.set_medium(ctx, medium)?;
        Ok(())
    }

    pub fn set_transform(&mut self, transform: VolumeTransform) {
        self.probe.set_transform(transform);
    }

    /// Runs one probe update and submits it.
    pub fn update(&mut self, ctx: &GpuContext) -> Result<()> {
        self.probe.update(ctx)?;
        Ok(())
    }

    /// Runs one update and waits for the GPU, so the filtered texture is
    /// valid before the first read.
    pub fn prime(&mut self, ctx: &GpuContext) -> Result<()> {
        self.update(ctx)?;
        ctx.wait_idle();
        Ok(())
    }

    /// Writes the filtered level-0 volume as a `.vol` file.
    pub fn export_filtered(&self, ctx: &GpuContext, path: impl AsRef<Path>) -> Result<()> {
        let grid = self.probe.read_filtered(ctx, 0)?;
        write_vol(path.as_ref(), &grid)?;
        log::info!("Exported filtered volume to {}", path.as_ref().display());
        Ok(())
    }

    /// Saves the middle z-slice of the filtered level-0 volume as PNG.
    pub fn export_slice(&self, ctx: &GpuContext, path: impl AsRef<Path>) -> Result<()> {
        let grid = self.probe.read_filtered(ctx, 0)?;
        let z = grid.size().z / 2;
        save_slice_png(path, &grid, z, &SliceOptions::default())?;
        Ok(())
    }
}

/// Reads a scene file and builds its probe.
pub fn load_scene(ctx: &GpuContext, config_path: impl AsRef<Path>) -> Result<Scene> {
    let config = SceneConfig::load(config_path)?;
    Scene::from_config(ctx, config)
}
