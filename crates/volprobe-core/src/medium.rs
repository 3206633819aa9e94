//! Participating medium and light parameters.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Whether the medium emits light of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum MediumType {
    /// Scattering only (smoke).
    NonEmissive,
    /// Scattering plus emission (fire).
    #[default]
    Emissive,
}

impl MediumType {
    /// Integer tag passed to shaders: 0 non-emissive, 1 emissive.
    #[must_use]
    pub fn tag(self) -> i32 {
        match self {
            Self::NonEmissive => 0,
            Self::Emissive => 1,
        }
    }

    #[must_use]
    pub fn is_emissive(self) -> bool {
        self == Self::Emissive
    }
}

/// Optical parameters of the medium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediumParams {
    /// Single-scattering albedo per RGB channel.
    pub albedo: Vec3,
    /// Color multiplied with the emission volume.
    pub emission_color: Vec3,
    /// Multiplier applied to density samples when loading.
    pub density_scale: f32,
    pub medium_type: MediumType,
}

impl Default for MediumParams {
    fn default() -> Self {
        Self {
            albedo: Vec3::splat(0.3),
            emission_color: Vec3::ONE,
            density_scale: 1.0,
            medium_type: MediumType::Emissive,
        }
    }
}

impl MediumParams {
    /// Sets the albedo.
    pub fn set_albedo(&mut self, albedo: Vec3) -> &mut Self {
        self.albedo = albedo;
        self
    }

    /// Sets the emission color.
    pub fn set_emission(&mut self, color: Vec3) -> &mut Self {
        self.emission_color = color;
        self
    }

    /// Sets the density scale. Takes effect on the next load.
    pub fn set_density_scale(&mut self, scale: f32) -> &mut Self {
        self.density_scale = scale;
        self
    }

    /// Sets the medium type.
    pub fn set_medium_type(&mut self, medium_type: MediumType) -> &mut Self {
        self.medium_type = medium_type;
        self
    }
}

/// Isotropic point light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PointLight {
    pub position: Vec3,
    /// Radiant intensity `Le`.
    pub intensity: Vec3,
}

impl PointLight {
    #[must_use]
    pub fn new(position: Vec3, intensity: Vec3) -> Self {
        Self {
            position,
            intensity,
        }
    }
}
