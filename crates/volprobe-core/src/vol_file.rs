//! Reader and writer for the binary `.vol` format.
//!
//! Layout (little-endian, 48-byte header):
//!
//! | offset | size | field                         |
//! |--------|------|-------------------------------|
//! | 0      | 3    | identifier, `"VOL"`           |
//! | 3      | 1    | version, `3`                  |
//! | 4      | 4    | sample type, `1` (float32)    |
//! | 8      | 12   | stored size x, y, z (i32)     |
//! | 20     | 4    | channels (i32)                |
//! | 24     | 12   | bbox min (f32 x3)             |
//! | 36     | 12   | bbox max (f32 x3)             |
//! | 48     | ...  | samples, z-major, x-fastest   |
//!
//! On load every axis is rounded up to the next power of two. The bounding
//! box grows with it so that the world-space voxel pitch of the stored data
//! is unchanged; the padded tail voxels stay zero.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use glam::{UVec3, Vec3};

use crate::error::{Result, VolumeError};
use crate::volume::{next_power_of_two, VolumeGrid};

/// File identifier.
pub const VOL_IDENTIFIER: &[u8; 3] = b"VOL";
/// The only supported version byte.
pub const VOL_VERSION: u8 = 3;
/// Sample type tag for float32 data.
pub const VOL_TYPE_FLOAT32: i32 = 1;
/// Header size in bytes.
pub const VOL_HEADER_SIZE: usize = 48;

/// Parsed `.vol` header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolHeader {
    /// Size of the stored data, before power-of-two rounding.
    pub orig_size: UVec3,
    pub channels: u32,
    pub bbox_min: Vec3,
    pub bbox_max: Vec3,
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

impl VolHeader {
    /// Parses and validates a 48-byte header.
    pub fn parse(bytes: &[u8; VOL_HEADER_SIZE]) -> Result<Self> {
        let identifier = [bytes[0], bytes[1], bytes[2]];
        if &identifier != VOL_IDENTIFIER {
            return Err(VolumeError::InvalidIdentifier(identifier));
        }

        let version = bytes[3];
        if version != VOL_VERSION {
            return Err(VolumeError::UnsupportedVersion(version));
        }

        let ty = read_i32(bytes, 4);
        if ty != VOL_TYPE_FLOAT32 {
            return Err(VolumeError::UnsupportedType(ty));
        }

        let size = [read_i32(bytes, 8), read_i32(bytes, 12), read_i32(bytes, 16)];
        let channels = read_i32(bytes, 20);
        if size.iter().any(|&s| s <= 0) || channels <= 0 {
            return Err(VolumeError::InvalidDimensions { size, channels });
        }

        Ok(Self {
            orig_size: UVec3::new(size[0] as u32, size[1] as u32, size[2] as u32),
            channels: channels as u32,
            bbox_min: Vec3::new(read_f32(bytes, 24), read_f32(bytes, 28), read_f32(bytes, 32)),
            bbox_max: Vec3::new(read_f32(bytes, 36), read_f32(bytes, 40), read_f32(bytes, 44)),
        })
    }

    /// Encodes the header.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; VOL_HEADER_SIZE] {
        let mut bytes = [0u8; VOL_HEADER_SIZE];
        bytes[..3].copy_from_slice(VOL_IDENTIFIER);
        bytes[3] = VOL_VERSION;

        let ints = [
            VOL_TYPE_FLOAT32,
            self.orig_size.x as i32,
            self.orig_size.y as i32,
            self.orig_size.z as i32,
            self.channels as i32,
        ];
        for (i, v) in ints.iter().enumerate() {
            bytes[4 + i * 4..8 + i * 4].copy_from_slice(&v.to_le_bytes());
        }

        let floats = self.bbox_min.to_array().into_iter().chain(self.bbox_max.to_array());
        for (i, v) in floats.enumerate() {
            bytes[24 + i * 4..28 + i * 4].copy_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    /// Grid size after rounding each axis up to a power of two.
    #[must_use]
    pub fn padded_size(&self) -> UVec3 {
        UVec3::new(
            next_power_of_two(self.orig_size.x),
            next_power_of_two(self.orig_size.y),
            next_power_of_two(self.orig_size.z),
        )
    }

    /// Bounding box max corner extended over the padded tail.
    #[must_use]
    pub fn padded_bbox_max(&self) -> Vec3 {
        let orig = self.orig_size.as_vec3();
        let pitch = (self.bbox_max - self.bbox_min) / orig;
        self.bbox_max + (self.padded_size().as_vec3() - orig) * pitch
    }
}

/// Loads a `.vol` file into a power-of-two grid.
pub fn read_vol(path: impl AsRef<Path>) -> Result<VolumeGrid> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| VolumeError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let grid = read_vol_from(BufReader::new(file))?;
    log::debug!(
        "loaded {} ({}x{}x{}, {} channels)",
        path.display(),
        grid.size().x,
        grid.size().y,
        grid.size().z,
        grid.channels()
    );
    Ok(grid)
}

/// Parses `.vol` data from any reader.
pub fn read_vol_from(mut reader: impl Read) -> Result<VolumeGrid> {
    let mut header_bytes = [0u8; VOL_HEADER_SIZE];
    read_exact_or_truncated(&mut reader, &mut header_bytes, 0)?;
    let header = VolHeader::parse(&header_bytes)?;

    let size = header.padded_size();
    let channels = header.channels;
    let mut grid =
        VolumeGrid::try_new(size, channels).ok_or_else(|| VolumeError::InvalidDimensions {
            size: header.orig_size.as_ivec3().to_array(),
            channels: channels as i32,
        })?;
    grid.set_range(header.bbox_min, header.padded_bbox_max());

    let orig = header.orig_size;
    let expected = orig.x as usize * orig.y as usize * orig.z as usize * channels as usize;

    // One row of stored samples at a time, scattered into the padded grid.
    let max_extent = size.max_element() as usize;
    let row_len = orig.x as usize * channels as usize;
    let mut row_bytes = vec![0u8; max_extent * channels as usize * 4];
    let data = grid.data_mut();
    for z in 0..orig.z {
        for y in 0..orig.y {
            let bytes = &mut row_bytes[..row_len * 4];
            read_exact_or_truncated(&mut reader, bytes, expected)?;

            let start = ((z as usize * size.y as usize + y as usize) * size.x as usize)
                * channels as usize;
            for (dst, src) in data[start..start + row_len]
                .iter_mut()
                .zip(bytes.chunks_exact(4))
            {
                *dst = f32::from_le_bytes([src[0], src[1], src[2], src[3]]);
            }
        }
    }

    Ok(grid)
}

fn read_exact_or_truncated(reader: &mut impl Read, buf: &mut [u8], expected: usize) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            VolumeError::Truncated { expected }
        } else {
            VolumeError::IoError(e)
        }
    })
}

/// Writes `grid` as a `.vol` file, storing its full extent.
pub fn write_vol(path: impl AsRef<Path>, grid: &VolumeGrid) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_vol_to(&mut writer, grid)?;
    writer.flush()?;
    Ok(())
}

/// Serializes `grid` in `.vol` format to any writer.
pub fn write_vol_to(mut writer: impl Write, grid: &VolumeGrid) -> Result<()> {
    let header = VolHeader {
        orig_size: grid.size(),
        channels: grid.channels(),
        bbox_min: grid.bbox_min(),
        bbox_max: grid.bbox_max(),
    };
    writer.write_all(&header.to_bytes())?;
    for v in grid.data() {
        writer.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(header: &VolHeader, samples: &[f32]) -> Vec<u8> {
        let mut bytes = header.to_bytes().to_vec();
        for v in samples {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    fn header(orig: UVec3, channels: u32) -> VolHeader {
        VolHeader {
            orig_size: orig,
            channels,
            bbox_min: Vec3::ZERO,
            bbox_max: orig.as_vec3(),
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = header(UVec3::new(100, 50, 30), 1).to_bytes();
        assert_eq!(&bytes[..3], b"VOL");
        assert_eq!(bytes[3], 3);
        assert_eq!(read_i32(&bytes, 4), 1);
        assert_eq!(read_i32(&bytes, 8), 100);
        assert_eq!(read_i32(&bytes, 16), 30);
        assert_eq!(read_f32(&bytes, 36), 100.0);
    }

    #[test]
    fn test_padded_size_and_bbox() {
        let h = VolHeader {
            orig_size: UVec3::new(100, 50, 30),
            channels: 1,
            bbox_min: Vec3::new(-1.0, 0.0, 2.0),
            bbox_max: Vec3::new(1.0, 1.0, 5.0),
        };
        assert_eq!(h.padded_size(), UVec3::new(128, 64, 32));

        let pitch = Vec3::new(2.0 / 100.0, 1.0 / 50.0, 3.0 / 30.0);
        let expected = h.bbox_max + Vec3::new(28.0, 14.0, 2.0) * pitch;
        assert!((h.padded_bbox_max() - expected).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_read_scatters_rows_and_zero_pads() {
        let orig = UVec3::new(3, 2, 1);
        let samples: Vec<f32> = (0..6).map(|i| i as f32 + 1.0).collect();
        let grid = read_vol_from(encode(&header(orig, 1), &samples).as_slice()).unwrap();

        assert_eq!(grid.size(), UVec3::new(4, 2, 1));
        assert_eq!(grid.get(0, 0, 0, 0), 1.0);
        assert_eq!(grid.get(2, 0, 0, 0), 3.0);
        assert_eq!(grid.get(3, 0, 0, 0), 0.0);
        assert_eq!(grid.get(0, 1, 0, 0), 4.0);
        assert_eq!(grid.get(2, 1, 0, 0), 6.0);
        assert_eq!(grid.get(3, 1, 0, 0), 0.0);
    }

    #[test]
    fn test_read_multichannel() {
        let orig = UVec3::new(1, 1, 1);
        let grid = read_vol_from(encode(&header(orig, 3), &[0.1, 0.2, 0.3]).as_slice()).unwrap();
        assert_eq!(grid.channels(), 3);
        assert_eq!(grid.get(0, 0, 0, 2), 0.3);
    }

    #[test]
    fn test_rejects_bad_identifier() {
        let mut bytes = encode(&header(UVec3::ONE, 1), &[1.0]);
        bytes[0] = b'X';
        let err = read_vol_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, VolumeError::InvalidIdentifier(id) if &id == b"XOL"));
    }

    #[test]
    fn test_rejects_bad_version() {
        let mut bytes = encode(&header(UVec3::ONE, 1), &[1.0]);
        bytes[3] = 2;
        let err = read_vol_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, VolumeError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_rejects_non_float_type() {
        let mut bytes = encode(&header(UVec3::ONE, 1), &[1.0]);
        bytes[4..8].copy_from_slice(&2i32.to_le_bytes());
        let err = read_vol_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, VolumeError::UnsupportedType(2)));
    }

    #[test]
    fn test_rejects_truncated_data() {
        let bytes = encode(&header(UVec3::new(2, 2, 2), 1), &[1.0; 5]);
        let err = read_vol_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, VolumeError::Truncated { expected: 8 }));
    }

    #[test]
    fn test_rejects_zero_dimension() {
        let mut bytes = encode(&header(UVec3::ONE, 1), &[1.0]);
        bytes[12..16].copy_from_slice(&0i32.to_le_bytes());
        let err = read_vol_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, VolumeError::InvalidDimensions { .. }));
    }

    #[test]
    fn test_rejects_unallocatable_dimensions() {
        let h = header(UVec3::splat(1 << 30), 4);
        let err = read_vol_from(h.to_bytes().as_slice()).unwrap_err();
        assert!(matches!(
            err,
            VolumeError::InvalidDimensions {
                size: [1_073_741_824, 1_073_741_824, 1_073_741_824],
                channels: 4
            }
        ));
    }

    #[test]
    fn test_write_then_read_power_of_two_grid() {
        let mut grid = VolumeGrid::new(UVec3::new(4, 2, 2), 1);
        grid.set_range(Vec3::ZERO, Vec3::new(4.0, 2.0, 2.0));
        grid.set(3, 1, 1, 0, 7.5);

        let mut bytes = Vec::new();
        write_vol_to(&mut bytes, &grid).unwrap();
        assert_eq!(bytes.len(), VOL_HEADER_SIZE + 16 * 4);

        let back = read_vol_from(bytes.as_slice()).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = read_vol("/nonexistent/volprobe/frame.vol").unwrap_err();
        assert!(matches!(err, VolumeError::Unreadable { .. }));
    }
}
