//! Workgroup counts for 3D compute dispatches.

use glam::UVec3;

/// Edge length of the cubic workgroup every probe shader declares
/// (`@workgroup_size(4, 4, 4)`).
pub const WORKGROUP_SIZE: u32 = 4;

/// Number of workgroups launched along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeLaunch {
    pub groups: UVec3,
}

impl ComputeLaunch {
    /// Enough groups to cover `extent` voxels, `ceil(extent / 4)` per axis.
    #[must_use]
    pub fn for_extent(extent: UVec3) -> Self {
        Self {
            groups: (extent + UVec3::splat(WORKGROUP_SIZE - 1)) / WORKGROUP_SIZE,
        }
    }

    /// Total invocations, including the ones masked off at the edges.
    #[must_use]
    pub fn invocations(&self) -> UVec3 {
        self.groups * WORKGROUP_SIZE
    }
}
