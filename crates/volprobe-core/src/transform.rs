//! Placement of the probe volume in the world.

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Model transform of the probe volume.
///
/// The matrix applies scale, then rotation, then translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeTransform {
    /// Half-extent of the inner cube along each axis.
    pub scale: Vec3,
    pub rotation: Quat,
    pub translation: Vec3,
}

impl Default for VolumeTransform {
    fn default() -> Self {
        Self {
            scale: Vec3::splat(3.3),
            rotation: Quat::IDENTITY,
            translation: Vec3::new(0.0, 4.0, 0.0),
        }
    }
}

impl VolumeTransform {
    #[must_use]
    pub fn new(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self {
            scale,
            rotation,
            translation,
        }
    }

    /// Identity placement: the unit cube `[-1, 1]^3`.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(Vec3::ONE, Quat::IDENTITY, Vec3::ZERO)
    }

    /// Sets the rotation from XYZ Euler angles in degrees.
    #[must_use]
    pub fn with_euler_degrees(mut self, degrees: Vec3) -> Self {
        let r = degrees * (std::f32::consts::PI / 180.0);
        self.rotation = Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z);
        self
    }

    /// `translate * rotate * scale`.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// The same placement with the scale multiplied per axis.
    #[must_use]
    pub fn scaled(&self, factor: Vec3) -> Self {
        Self {
            scale: self.scale * factor,
            ..*self
        }
    }
}
