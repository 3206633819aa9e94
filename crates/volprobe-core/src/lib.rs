//! CPU side of volprobe.
//!
//! This crate holds everything that does not touch the GPU:
//! - [`VolumeGrid`] and the `.vol` reader/writer
//! - [`MarginedVolumeSequence`], the per-frame density/emission volumes
//!   padded with an empty margin
//! - [`GaussianKernel`], [`FrameCycle`] and the cube transform math
//! - [`SceneConfig`], the scene description file

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Voxel counts and extents are well inside f32/u32 precision
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

pub mod config;
pub mod cube;
pub mod error;
pub mod frame;
pub mod kernel;
pub mod layout;
pub mod medium;
pub mod sequence;
pub mod transform;
pub mod vol_file;
pub mod volume;

pub use config::SceneConfig;
pub use cube::{Cube, CubePair, UNIT_CUBE};
pub use error::{Result, VolumeError};
pub use frame::FrameCycle;
pub use kernel::{GaussianKernel, DEFAULT_SIGMA};
pub use layout::{GridLayout, DEFAULT_INNER_TEX_SIZE, DEFAULT_TEX_MARGIN};
pub use medium::{MediumParams, MediumType, PointLight};
pub use sequence::{discover_frames, MarginedVolumeSequence, VolumeFrame};
pub use transform::VolumeTransform;
pub use vol_file::{read_vol, read_vol_from, write_vol, write_vol_to, VolHeader};
pub use volume::{next_power_of_two, VolumeGrid};

// Re-export glam types for convenience
pub use glam::{IVec3, Mat4, Quat, UVec3, Vec3, Vec4};
