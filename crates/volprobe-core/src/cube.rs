//! World-space corners of the probe volume.

use glam::{Mat4, Vec3, Vec4};

use crate::layout::GridLayout;
use crate::transform::VolumeTransform;

/// Corners of the canonical cube `[-1, 1]^3`.
///
/// Corner 0 is the texel-space origin and corners 1, 2 and 3 lie one step
/// along +x, +y and +z from it.
pub const UNIT_CUBE: [Vec3; 8] = [
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
];

/// Eight transformed corners and their centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cube {
    pub corners: [Vec3; 8],
    pub center: Vec3,
}

impl Cube {
    #[must_use]
    pub fn from_corners(corners: [Vec3; 8]) -> Self {
        let center = corners.iter().copied().sum::<Vec3>() / corners.len() as f32;
        Self { corners, center }
    }

    /// Applies `matrix` to every corner of [`UNIT_CUBE`], dividing by `w`.
    #[must_use]
    pub fn from_matrix(matrix: Mat4) -> Self {
        let corners = UNIT_CUBE.map(|c| {
            let p = matrix * c.extend(1.0);
            p.truncate() / p.w
        });
        Self::from_corners(corners)
    }

    /// Affine map from texel space `[0, 1]^3` onto the cube.
    #[must_use]
    pub fn texel_to_world(&self) -> Mat4 {
        let origin = self.corners[0];
        Mat4::from_cols(
            (self.corners[1] - origin).extend(0.0),
            (self.corners[2] - origin).extend(0.0),
            (self.corners[3] - origin).extend(0.0),
            Vec4::from((origin, 1.0)),
        )
    }

    /// Inverse of [`Cube::texel_to_world`].
    #[must_use]
    pub fn world_to_texel(&self) -> Mat4 {
        self.texel_to_world().inverse()
    }
}

/// The inner and margined cubes of one probe volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubePair {
    /// Tight bound of the real data.
    pub inner: Cube,
    /// Bound of the full texture, including the margin.
    pub margined: Cube,
}

impl CubePair {
    /// Derives both cubes from the model transform.
    ///
    /// The margined cube uses the transform's scale multiplied by
    /// `(inner + 2 * margin) / inner` per axis.
    #[must_use]
    pub fn from_transform(transform: &VolumeTransform, layout: &GridLayout) -> Self {
        let inner = Cube::from_matrix(transform.to_matrix());
        let margined = Cube::from_matrix(transform.scaled(layout.margin_scale()).to_matrix());
        Self { inner, margined }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, UVec3};
    use proptest::prelude::*;

    #[test]
    fn test_identity_cube_matches_template() {
        let cube = Cube::from_matrix(Mat4::IDENTITY);
        assert_eq!(cube.corners, UNIT_CUBE);
        assert!(cube.center.length() < 1e-7);
    }

    #[test]
    fn test_centroid_follows_translation() {
        let t = VolumeTransform::new(Vec3::ONE, Quat::IDENTITY, Vec3::new(0.0, 4.0, 0.0));
        let cubes = CubePair::from_transform(&t, &GridLayout::default());
        assert!((cubes.inner.center - Vec3::new(0.0, 4.0, 0.0)).length() < 1e-5);
        assert!((cubes.margined.center - Vec3::new(0.0, 4.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_homogeneous_divide() {
        let m = Mat4::from_scale(Vec3::ONE) * 2.0;
        let cube = Cube::from_matrix(m);
        assert_eq!(cube.corners, UNIT_CUBE);
    }

    #[test]
    fn test_texel_mapping_hits_corners() {
        let t = VolumeTransform::default().with_euler_degrees(Vec3::new(10.0, 30.0, 0.0));
        let cube = Cube::from_matrix(t.to_matrix());
        let m = cube.texel_to_world();
        assert!((m.transform_point3(Vec3::ZERO) - cube.corners[0]).length() < 1e-4);
        assert!((m.transform_point3(Vec3::ONE) - cube.corners[7]).length() < 1e-4);
        assert!((m.transform_point3(Vec3::splat(0.5)) - cube.center).length() < 1e-4);

        let back = cube.world_to_texel().transform_point3(cube.corners[4]);
        assert!((back - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_margined_distance_ratio(
            inner in 1u32..512,
            margin in 0u32..32,
            scale in 0.1f32..10.0,
            angle in 0.0f32..6.28,
            tx in -10.0f32..10.0,
        ) {
            let layout = GridLayout::new(UVec3::splat(inner), UVec3::splat(margin));
            let t = VolumeTransform::new(
                Vec3::splat(scale),
                Quat::from_rotation_y(angle),
                Vec3::new(tx, 1.0, -tx),
            );
            let cubes = CubePair::from_transform(&t, &layout);
            let expected = (inner + 2 * margin) as f32 / inner as f32;

            for i in 0..8 {
                let d_inner = (cubes.inner.corners[i] - cubes.inner.center).length();
                let d_margin = (cubes.margined.corners[i] - cubes.margined.center).length();
                prop_assert!((d_margin / d_inner - expected).abs() < 1e-4 * expected);
            }
        }
    }
}
