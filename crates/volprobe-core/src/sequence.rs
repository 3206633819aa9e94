//! Animated density/emission sequences padded with an empty margin.

use std::path::{Path, PathBuf};

use glam::UVec3;

use crate::error::{Result, VolumeError};
use crate::layout::GridLayout;
use crate::vol_file::read_vol;
use crate::volume::VolumeGrid;

/// One animation frame: 1-channel density and 3-channel emission.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeFrame {
    pub density: VolumeGrid,
    pub emission: VolumeGrid,
}

/// Per-frame volumes resized to the margined extent of a [`GridLayout`].
///
/// Voxels in the margin band are zero in every frame regardless of the
/// source data.
#[derive(Debug, Clone)]
pub struct MarginedVolumeSequence {
    layout: GridLayout,
    frames: Vec<VolumeFrame>,
}

/// Lists the files of `dir` whose name contains `filter`, sorted by name.
pub fn discover_frames(dir: &Path, filter: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().contains(filter) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

impl MarginedVolumeSequence {
    /// Loads every frame from `dir`.
    ///
    /// Density files are those whose name contains `density_filter`. When
    /// `emission_filter` is given, emission files are matched the same way
    /// and paired with density files by sorted position; the two counts must
    /// agree.
    pub fn load(
        dir: impl AsRef<Path>,
        density_filter: &str,
        emission_filter: Option<&str>,
        layout: GridLayout,
        density_scale: f32,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let density_files = discover_frames(dir, density_filter)?;
        if density_files.is_empty() {
            return Err(VolumeError::NoFrames {
                dir: dir.to_path_buf(),
                filter: density_filter.to_string(),
            });
        }

        let emission_files = match emission_filter {
            Some(filter) => {
                let files = discover_frames(dir, filter)?;
                if files.len() != density_files.len() {
                    return Err(VolumeError::FrameCountMismatch {
                        density: density_files.len(),
                        emission: files.len(),
                    });
                }
                Some(files)
            }
            None => None,
        };

        let num_frames = density_files.len();
        let mut frames = Vec::with_capacity(num_frames);
        for (i, density_path) in density_files.iter().enumerate() {
            let density = read_vol(density_path)?;
            let emission = match &emission_files {
                Some(files) => Some(read_vol(&files[i])?),
                None => None,
            };
            frames.push(Self::pad_frame(
                &layout,
                &density,
                emission.as_ref(),
                density_scale,
            ));
            log::info!("[ {} / {} ] volumes loaded...", i + 1, num_frames);
        }

        Ok(Self { layout, frames })
    }

    /// Builds a sequence from grids already in memory.
    ///
    /// `emission`, if present, must hold one grid per density grid.
    pub fn from_grids(
        layout: GridLayout,
        density: &[VolumeGrid],
        emission: Option<&[VolumeGrid]>,
        density_scale: f32,
    ) -> Result<Self> {
        if density.is_empty() {
            return Err(VolumeError::NoFrames {
                dir: PathBuf::new(),
                filter: String::new(),
            });
        }
        if let Some(emission) = emission {
            if emission.len() != density.len() {
                return Err(VolumeError::FrameCountMismatch {
                    density: density.len(),
                    emission: emission.len(),
                });
            }
        }

        let frames = density
            .iter()
            .enumerate()
            .map(|(i, d)| {
                Self::pad_frame(&layout, d, emission.map(|e| &e[i]), density_scale)
            })
            .collect();
        Ok(Self { layout, frames })
    }

    fn pad_frame(
        layout: &GridLayout,
        density: &VolumeGrid,
        emission: Option<&VolumeGrid>,
        density_scale: f32,
    ) -> VolumeFrame {
        let ext = layout.margined();
        let margin = layout.margin;
        let mut density_out = VolumeGrid::new(ext, 1);
        let mut emission_out = VolumeGrid::new(ext, 3);
        density_out.set_range(density.bbox_min(), density.bbox_max());
        if let Some(e) = emission {
            emission_out.set_range(e.bbox_min(), e.bbox_max());
        }

        // Both outputs start zeroed, so only interior voxels are written.
        for z in 0..ext.z {
            for y in 0..ext.y {
                for x in 0..ext.x {
                    if layout.is_margin(x, y, z) {
                        continue;
                    }
                    let src = UVec3::new(x, y, z) - margin;
                    let d = density.get_or_zero(src.x, src.y, src.z, 0);
                    density_out.set(x, y, z, 0, d * density_scale);

                    if let Some(e) = emission {
                        let value = e.get_or_zero(src.x, src.y, src.z, 0);
                        for c in 0..3 {
                            emission_out.set(x, y, z, c, value);
                        }
                    }
                }
            }
        }

        VolumeFrame {
            density: density_out,
            emission: emission_out,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    #[must_use]
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Returns frame `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= num_frames()`.
    #[must_use]
    pub fn frame(&self, index: usize) -> &VolumeFrame {
        &self.frames[index]
    }

    pub fn frames(&self) -> impl Iterator<Item = &VolumeFrame> {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn filled(size: UVec3, value: f32) -> VolumeGrid {
        let mut grid = VolumeGrid::new(size, 1);
        grid.data_mut().fill(value);
        grid
    }

    #[test]
    fn test_interior_is_scaled_and_margin_is_zero() {
        let layout = GridLayout::uniform(4, 2);
        let density = filled(UVec3::splat(4), 0.5);
        let seq = MarginedVolumeSequence::from_grids(layout, &[density], None, 3.0).unwrap();
        let frame = seq.frame(0);

        assert_eq!(frame.density.size(), UVec3::splat(8));
        assert_eq!(frame.emission.channels(), 3);
        assert_eq!(frame.density.get(2, 2, 2, 0), 1.5);
        assert_eq!(frame.density.get(5, 5, 5, 0), 1.5);
        assert_eq!(frame.density.get(1, 3, 3, 0), 0.0);
        assert_eq!(frame.density.get(6, 3, 3, 0), 0.0);
        assert!(frame.emission.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_emission_scalar_replicated_to_rgb() {
        let layout = GridLayout::uniform(2, 1);
        let density = filled(UVec3::splat(2), 1.0);
        let mut emission = filled(UVec3::splat(2), 0.0);
        emission.set(1, 0, 1, 0, 0.25);

        let seq = MarginedVolumeSequence::from_grids(
            layout,
            &[density],
            Some(std::slice::from_ref(&emission)),
            1.0,
        )
        .unwrap();
        let e = &seq.frame(0).emission;
        for c in 0..3 {
            assert_eq!(e.get(2, 1, 2, c), 0.25);
            assert_eq!(e.get(1, 1, 1, c), 0.0);
        }
    }

    #[test]
    fn test_source_smaller_than_inner_reads_zero() {
        let layout = GridLayout::uniform(4, 1);
        let density = filled(UVec3::splat(2), 1.0);
        let seq = MarginedVolumeSequence::from_grids(layout, &[density], None, 1.0).unwrap();
        let d = &seq.frame(0).density;
        assert_eq!(d.get(2, 2, 2, 0), 1.0);
        assert_eq!(d.get(3, 3, 3, 0), 0.0);
    }

    #[test]
    fn test_mismatched_grid_counts_are_rejected() {
        let layout = GridLayout::uniform(2, 1);
        let density = vec![filled(UVec3::splat(2), 1.0); 5];
        let emission = vec![filled(UVec3::splat(2), 1.0); 4];
        let err =
            MarginedVolumeSequence::from_grids(layout, &density, Some(emission.as_slice()), 1.0)
                .unwrap_err();
        assert!(matches!(
            err,
            VolumeError::FrameCountMismatch {
                density: 5,
                emission: 4
            }
        ));
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        let err = MarginedVolumeSequence::from_grids(GridLayout::default(), &[], None, 1.0)
            .unwrap_err();
        assert!(matches!(err, VolumeError::NoFrames { .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_margin_voxels_are_empty(
            inner in 1u32..6,
            margin in 0u32..3,
            value in 0.1f32..10.0,
            frames in 1usize..3,
        ) {
            let layout = GridLayout::uniform(inner, margin);
            let density = vec![filled(UVec3::splat(inner), value); frames];
            let emission = vec![filled(UVec3::splat(inner), value); frames];
            let seq = MarginedVolumeSequence::from_grids(
                layout, &density, Some(emission.as_slice()), 2.0,
            ).unwrap();

            let ext = layout.margined();
            for frame in seq.frames() {
                for z in 0..ext.z {
                    for y in 0..ext.y {
                        for x in 0..ext.x {
                            let d = frame.density.get(x, y, z, 0);
                            if layout.is_margin(x, y, z) {
                                prop_assert_eq!(d, 0.0);
                                for c in 0..3 {
                                    prop_assert_eq!(frame.emission.get(x, y, z, c), 0.0);
                                }
                            } else {
                                prop_assert_eq!(d, value * 2.0);
                            }
                        }
                    }
                }
            }
        }
    }
}
