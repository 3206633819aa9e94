//! Texture sizing for the margined probe grid.
//!
//! ```text
//! |---|***********|---|
//!  (m)   (inner)   (m)
//! ```
//!
//! The inner region holds the medium; a fixed band of `margin` empty voxels
//! surrounds it on every side.

use glam::UVec3;
use serde::{Deserialize, Serialize};

/// Default inner texture size per axis.
pub const DEFAULT_INNER_TEX_SIZE: u32 = 128;
/// Default margin per side.
pub const DEFAULT_TEX_MARGIN: u32 = 4;

/// Inner size and margin of the probe grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Size of the region holding real data.
    pub inner: UVec3,
    /// Width of the empty border on each side.
    pub margin: UVec3,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::uniform(DEFAULT_INNER_TEX_SIZE, DEFAULT_TEX_MARGIN)
    }
}

impl GridLayout {
    #[must_use]
    pub fn new(inner: UVec3, margin: UVec3) -> Self {
        Self { inner, margin }
    }

    /// Same inner size and margin along every axis.
    #[must_use]
    pub fn uniform(inner: u32, margin: u32) -> Self {
        Self::new(UVec3::splat(inner), UVec3::splat(margin))
    }

    /// Full texture extent, `inner + 2 * margin`.
    #[must_use]
    pub fn margined(&self) -> UVec3 {
        self.inner + 2 * self.margin
    }

    #[must_use]
    pub fn total_size_inner(&self) -> usize {
        self.inner.x as usize * self.inner.y as usize * self.inner.z as usize
    }

    #[must_use]
    pub fn total_size_margined(&self) -> usize {
        let size = self.margined();
        size.x as usize * size.y as usize * size.z as usize
    }

    #[must_use]
    pub fn max_extent(&self) -> u32 {
        self.inner.max_element()
    }

    /// Largest margined axis; also the ray-march step budget for renderers.
    #[must_use]
    pub fn max_extent_margined(&self) -> u32 {
        self.margined().max_element()
    }

    /// `floor(log2(max extent))`, the number of mip levels allocated.
    #[must_use]
    pub fn max_lod(&self) -> u32 {
        self.max_extent_margined().max(1).ilog2()
    }

    /// Per-axis scale from the inner cube to the margined cube.
    #[must_use]
    pub fn margin_scale(&self) -> glam::Vec3 {
        self.margined().as_vec3() / self.inner.as_vec3()
    }

    /// Extent of mip `level`, halving (integer division) per level.
    #[must_use]
    pub fn level_extent(&self, level: u32) -> UVec3 {
        (self.margined() >> level).max(UVec3::ONE)
    }

    /// Whether the voxel lies in the empty border.
    #[must_use]
    pub fn is_margin(&self, x: u32, y: u32, z: u32) -> bool {
        let lo = self.margin;
        let hi = self.inner + self.margin;
        x < lo.x || x >= hi.x || y < lo.y || y >= hi.y || z < lo.z || z >= hi.z
    }
}
