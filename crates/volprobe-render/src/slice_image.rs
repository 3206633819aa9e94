//! Saving z-slices of radiance volumes as images.

use std::path::Path;

use image::{ImageBuffer, Rgba};
use volprobe_core::VolumeGrid;

use crate::error::{RenderError, RenderResult};

/// Options for slice export.
#[derive(Debug, Clone)]
pub struct SliceOptions {
    /// Multiplier applied before clamping to `[0, 1]`.
    pub exposure: f32,
    /// Writes density into the alpha channel instead of opaque alpha.
    pub density_as_alpha: bool,
}

impl Default for SliceOptions {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            density_as_alpha: false,
        }
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Converts slice `z` of a 1-, 3- or 4-channel grid to RGBA8.
///
/// Single-channel grids are shown as gray.
pub fn slice_to_image(
    grid: &VolumeGrid,
    z: u32,
    options: &SliceOptions,
) -> RenderResult<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    let size = grid.size();
    if z >= size.z {
        return Err(RenderError::InvalidSlice { z, depth: size.z });
    }

    let channels = grid.channels();
    let mut pixels = Vec::with_capacity((size.x * size.y * 4) as usize);
    for y in 0..size.y {
        for x in 0..size.x {
            let v = |c: u32| grid.get(x, y, z, c.min(channels - 1)) * options.exposure;
            let (r, g, b) = if channels >= 3 {
                (v(0), v(1), v(2))
            } else {
                (v(0), v(0), v(0))
            };
            let a = if options.density_as_alpha && channels == 4 {
                to_u8(grid.get(x, y, z, 3))
            } else {
                255
            };
            pixels.extend_from_slice(&[to_u8(r), to_u8(g), to_u8(b), a]);
        }
    }

    ImageBuffer::from_raw(size.x, size.y, pixels).ok_or(RenderError::SizeMismatch {
        expected: (size.x * size.y * 4) as usize,
        actual: 0,
    })
}

/// Saves slice `z` as PNG.
pub fn save_slice_png(
    path: impl AsRef<Path>,
    grid: &VolumeGrid,
    z: u32,
    options: &SliceOptions,
) -> RenderResult<()> {
    let img = slice_to_image(grid, z, options)?;
    img.save_with_format(path.as_ref(), image::ImageFormat::Png)?;
    log::info!("Saved slice {z} to {}", path.as_ref().display());
    Ok(())
}

/// Encodes slice `z` as PNG in memory.
pub fn slice_to_png_buffer(
    grid: &VolumeGrid,
    z: u32,
    options: &SliceOptions,
) -> RenderResult<Vec<u8>> {
    let img = slice_to_image(grid, z, options)?;
    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;

    fn rgba_grid() -> VolumeGrid {
        let mut grid = VolumeGrid::new(UVec3::new(2, 2, 2), 4);
        grid.set(0, 0, 1, 0, 1.0);
        grid.set(1, 1, 1, 1, 0.5);
        grid.set(1, 1, 1, 3, 1.0);
        grid
    }

    #[test]
    fn test_slice_pixels() {
        let img = slice_to_image(&rgba_grid(), 1, &SliceOptions::default()).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 1).0, [0, 128, 0, 255]);
    }

    #[test]
    fn test_exposure_and_alpha() {
        let options = SliceOptions {
            exposure: 2.0,
            density_as_alpha: true,
        };
        let img = slice_to_image(&rgba_grid(), 1, &options).unwrap();
        assert_eq!(img.get_pixel(1, 1).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_out_of_range_slice() {
        let err = slice_to_image(&rgba_grid(), 2, &SliceOptions::default()).unwrap_err();
        assert!(matches!(err, RenderError::InvalidSlice { z: 2, depth: 2 }));
    }

    #[test]
    fn test_png_buffer_has_signature() {
        let png = slice_to_png_buffer(&rgba_grid(), 0, &SliceOptions::default()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
