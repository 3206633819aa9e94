//! Dense voxel grids.

use glam::{UVec3, Vec3};

use crate::error::{Result, VolumeError};

/// Returns the smallest power of two that is greater than or equal to `n`.
///
/// `n` must be at least 1.
#[must_use]
pub fn next_power_of_two(n: u32) -> u32 {
    debug_assert!(n >= 1, "next_power_of_two is undefined for 0");
    n.next_power_of_two()
}

/// A dense grid of `f32` samples with an attached world-space bounding box.
///
/// Samples are stored x-fastest with the channel index innermost:
/// `((z * size.y + y) * size.x + x) * channels + c`.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeGrid {
    size: UVec3,
    channels: u32,
    bbox_min: Vec3,
    bbox_max: Vec3,
    data: Vec<f32>,
}

impl Default for VolumeGrid {
    fn default() -> Self {
        Self {
            size: UVec3::ZERO,
            channels: 0,
            bbox_min: Vec3::splat(f32::MAX),
            bbox_max: Vec3::splat(f32::MIN_POSITIVE),
            data: Vec::new(),
        }
    }
}

impl VolumeGrid {
    /// Creates a zero-filled grid.
    #[must_use]
    pub fn new(size: UVec3, channels: u32) -> Self {
        Self {
            size,
            channels,
            data: vec![0.0; Self::sample_count(size, channels)],
            ..Self::default()
        }
    }

    /// Creates a zero-filled grid, or `None` when the sample count does not
    /// fit in memory. Used for sizes that come from file headers.
    #[must_use]
    pub fn try_new(size: UVec3, channels: u32) -> Option<Self> {
        let count = Self::checked_sample_count(size, channels)?;
        let mut data = Vec::new();
        data.try_reserve_exact(count).ok()?;
        data.resize(count, 0.0);
        Some(Self {
            size,
            channels,
            data,
            ..Self::default()
        })
    }

    /// Wraps existing samples.
    ///
    /// Returns an error if `data` does not hold exactly
    /// `size.x * size.y * size.z * channels` samples.
    pub fn from_data(size: UVec3, channels: u32, data: Vec<f32>) -> Result<Self> {
        let expected = Self::sample_count(size, channels);
        if data.len() != expected {
            return Err(VolumeError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            size,
            channels,
            data,
            ..Self::default()
        })
    }

    fn sample_count(size: UVec3, channels: u32) -> usize {
        size.x as usize * size.y as usize * size.z as usize * channels as usize
    }

    /// `size.x * size.y * size.z * channels`, if the samples stay below
    /// `isize::MAX` bytes.
    #[must_use]
    pub fn checked_sample_count(size: UVec3, channels: u32) -> Option<usize> {
        let count = (size.x as usize)
            .checked_mul(size.y as usize)?
            .checked_mul(size.z as usize)?
            .checked_mul(channels as usize)?;
        let bytes = count.checked_mul(std::mem::size_of::<f32>())?;
        (bytes <= isize::MAX as usize).then_some(count)
    }

    /// Reallocates the grid and clears every sample to zero.
    pub fn resize(&mut self, size: UVec3, channels: u32) {
        self.size = size;
        self.channels = channels;
        self.data = vec![0.0; Self::sample_count(size, channels)];
    }

    /// Sets the world-space bounding box.
    pub fn set_range(&mut self, bbox_min: Vec3, bbox_max: Vec3) {
        self.bbox_min = bbox_min;
        self.bbox_max = bbox_max;
    }

    /// Grid extent in voxels.
    #[must_use]
    pub fn size(&self) -> UVec3 {
        self.size
    }

    /// Number of channels per voxel.
    #[must_use]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    #[must_use]
    pub fn bbox_min(&self) -> Vec3 {
        self.bbox_min
    }

    #[must_use]
    pub fn bbox_max(&self) -> Vec3 {
        self.bbox_max
    }

    /// Total number of samples (voxels times channels).
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.data.len()
    }

    /// Raw sample storage.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable raw sample storage.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Flat sample index of `(x, y, z, c)`.
    #[must_use]
    pub fn index(&self, x: u32, y: u32, z: u32, c: u32) -> usize {
        let voxel = (z as usize * self.size.y as usize + y as usize) * self.size.x as usize
            + x as usize;
        voxel * self.channels as usize + c as usize
    }

    /// Returns the sample at `(x, y, z, c)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the grid.
    #[must_use]
    pub fn get(&self, x: u32, y: u32, z: u32, c: u32) -> f32 {
        self.data[self.index(x, y, z, c)]
    }

    /// Returns the sample at `(x, y, z, c)`, or zero outside the grid.
    #[must_use]
    pub fn get_or_zero(&self, x: u32, y: u32, z: u32, c: u32) -> f32 {
        if x < self.size.x && y < self.size.y && z < self.size.z && c < self.channels {
            self.get(x, y, z, c)
        } else {
            0.0
        }
    }

    /// Writes the sample at `(x, y, z, c)`.
    pub fn set(&mut self, x: u32, y: u32, z: u32, c: u32, value: f32) {
        let i = self.index(x, y, z, c);
        self.data[i] = value;
    }

    /// World-space size of one voxel.
    #[must_use]
    pub fn voxel_pitch(&self) -> Vec3 {
        (self.bbox_max - self.bbox_min) / self.size.as_vec3()
    }
}
