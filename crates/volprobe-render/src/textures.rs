//! 3D textures backing the probe.

use glam::UVec3;
use volprobe_core::{GridLayout, VolumeFrame};

use crate::error::{RenderError, RenderResult};

/// Radiance (rgb) plus density (a).
pub const RADIANCE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
pub const DENSITY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
/// Emission RGB; the alpha channel is unused.
pub const EMISSION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Float channels per texel for the formats used here.
#[must_use]
pub fn channels_of(format: wgpu::TextureFormat) -> u32 {
    match format {
        wgpu::TextureFormat::R32Float => 1,
        wgpu::TextureFormat::Rg32Float => 2,
        _ => 4,
    }
}

/// A 3D texture with one view over all mips and one view per mip.
pub struct VolumeTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    mip_views: Vec<wgpu::TextureView>,
    extent: UVec3,
    format: wgpu::TextureFormat,
}

impl VolumeTexture {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        extent: UVec3,
        mip_level_count: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: extent.x,
                height: extent.y,
                depth_or_array_layers: extent.z,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format,
            usage,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mip_views = (0..mip_level_count)
            .map(|level| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("{label} mip {level}")),
                    base_mip_level: level,
                    mip_level_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        Self {
            texture,
            view,
            mip_views,
            extent,
            format,
        }
    }

    /// A texture the compute stages write and renderers sample.
    pub fn new_mipmapped(device: &wgpu::Device, label: &str, layout: &GridLayout) -> Self {
        Self::new(
            device,
            label,
            layout.margined(),
            layout.max_lod().max(1),
            RADIANCE_FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        )
    }

    /// A single-mip texture filled from the CPU.
    pub fn new_input(
        device: &wgpu::Device,
        label: &str,
        extent: UVec3,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::new(
            device,
            label,
            extent,
            1,
            format,
            wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
        )
    }

    #[must_use]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// View over every mip, for sampling.
    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// View over exactly one mip.
    pub fn mip_view(&self, level: u32) -> RenderResult<&wgpu::TextureView> {
        self.mip_views
            .get(level as usize)
            .ok_or(RenderError::InvalidMipLevel {
                level,
                count: self.mip_count(),
            })
    }

    #[must_use]
    pub fn mip_count(&self) -> u32 {
        self.mip_views.len() as u32
    }

    #[must_use]
    pub fn extent(&self) -> UVec3 {
        self.extent
    }

    /// Extent of `level`, halving per level as wgpu does.
    #[must_use]
    pub fn level_extent(&self, level: u32) -> UVec3 {
        (self.extent >> level).max(UVec3::ONE)
    }

    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Replaces mip 0 with `data`, tightly packed, x fastest.
    pub fn write(&self, queue: &wgpu::Queue, data: &[f32]) -> RenderResult<()> {
        let channels = channels_of(self.format);
        let texels = self.extent.x as usize * self.extent.y as usize * self.extent.z as usize;
        let expected = texels * channels as usize;
        if data.len() != expected {
            return Err(RenderError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(data),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.extent.x * channels * 4),
                rows_per_image: Some(self.extent.y),
            },
            wgpu::Extent3d {
                width: self.extent.x,
                height: self.extent.y,
                depth_or_array_layers: self.extent.z,
            },
        );
        Ok(())
    }
}

/// Expands packed RGB triples to RGBA with zero alpha.
#[must_use]
pub fn rgb_to_rgba(rgb: &[f32]) -> Vec<f32> {
    rgb.chunks_exact(3)
        .flat_map(|c| [c[0], c[1], c[2], 0.0])
        .collect()
}

/// All textures of one probe.
pub struct VolumeTextures {
    /// Injected radiance and its mip chain.
    pub radiance: VolumeTexture,
    /// Gaussian-filtered radiance, sampled by renderers.
    pub filtered: VolumeTexture,
    /// Scratch target of the middle filter pass.
    pub filter_buffer: VolumeTexture,
    pub density: VolumeTexture,
    /// Full-size for the emissive medium, a single zero voxel otherwise.
    pub emission: VolumeTexture,
}

impl VolumeTextures {
    pub fn new(device: &wgpu::Device, layout: &GridLayout, emissive: bool) -> Self {
        let extent = layout.margined();
        log::info!(
            "Allocating probe textures {}x{}x{} with {} mips",
            extent.x,
            extent.y,
            extent.z,
            layout.max_lod().max(1)
        );
        Self {
            radiance: VolumeTexture::new_mipmapped(device, "radiance", layout),
            filtered: VolumeTexture::new_mipmapped(device, "filtered radiance", layout),
            filter_buffer: VolumeTexture::new_mipmapped(device, "filter buffer", layout),
            density: VolumeTexture::new_input(device, "density", extent, DENSITY_FORMAT),
            emission: Self::create_emission(device, layout, emissive),
        }
    }

    fn create_emission(
        device: &wgpu::Device,
        layout: &GridLayout,
        emissive: bool,
    ) -> VolumeTexture {
        let extent = if emissive {
            layout.margined()
        } else {
            UVec3::ONE
        };
        VolumeTexture::new_input(device, "emission", extent, EMISSION_FORMAT)
    }

    /// Reallocates the emission texture if its size no longer matches the
    /// medium type. Returns whether it changed.
    pub fn ensure_emission(
        &mut self,
        device: &wgpu::Device,
        layout: &GridLayout,
        emissive: bool,
    ) -> bool {
        let wanted = if emissive {
            layout.margined()
        } else {
            UVec3::ONE
        };
        if self.emission.extent() == wanted {
            return false;
        }
        self.emission = Self::create_emission(device, layout, emissive);
        true
    }

    /// Uploads one frame's density, and its emission when the emission
    /// texture is full-size.
    pub fn upload_frame(&self, queue: &wgpu::Queue, frame: &VolumeFrame) -> RenderResult<()> {
        self.density.write(queue, frame.density.data())?;
        if self.emission.extent() == self.density.extent() {
            self.emission.write(queue, &rgb_to_rgba(frame.emission.data()))?;
        }
        Ok(())
    }
}
