//! GPU side of volprobe.
//!
//! This crate runs the probe pipeline with wgpu compute shaders:
//! - radiance injection from a point light through the medium
//! - box-filtered mipmapping of the radiance texture
//! - separable Gaussian filtering of every mip, margin aware
//!
//! plus texture readback and PNG slice export for inspection.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Texture extents and mip levels are small
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod buffer;
pub mod context;
pub mod error;
pub mod launch;
pub mod probe;
pub mod readback;
pub mod shader;
pub mod slice_image;
pub mod stages;
pub mod textures;
pub mod uniforms;

pub use context::{supports_backend, GpuContext, HEADLESS_BACKENDS};
pub use error::{RenderError, RenderResult};
pub use launch::{ComputeLaunch, WORKGROUP_SIZE};
pub use probe::{ProbeSettings, ProbeView, VolumeProbe};
pub use readback::{read_buffer_f32, read_texture_level, read_volume};
pub use shader::{ComputeProgram, ComputeProgramBuilder};
pub use slice_image::{save_slice_png, slice_to_image, slice_to_png_buffer, SliceOptions};
pub use stages::{
    plan_filter_passes, FilterPassPlan, FilterStage, FilterTarget, InjectStage, MipStage,
};
pub use textures::{VolumeTexture, VolumeTextures};
pub use uniforms::{UniformBlock, UniformType, UniformValue};
