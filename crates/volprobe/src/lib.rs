//! volprobe: volumetric light probes for indirect illumination from
//! participating media.
//!
//! A probe turns an animated density volume (and optionally an emission
//! volume) into a filtered, mipmapped radiance texture that surface and
//! volume renderers sample for one-bounce lighting from the medium.
//!
//! # Quick Start
//!
//! ```no_run
//! use volprobe::*;
//!
//! fn main() -> Result<()> {
//!     let ctx = GpuContext::new_headless_blocking()?;
//!     let mut scene = load_scene(&ctx, "scene.txt")?;
//!     scene.prime(&ctx)?;
//!
//!     // Once per rendered frame
//!     scene.update(&ctx)?;
//!     let view = scene.view();
//!     println!("{} mip levels", view.mip_levels());
//!     Ok(())
//! }
//! ```
//!
//! # Pipeline
//!
//! Every update uploads the current frame and runs three compute stages:
//!
//! 1. radiance injection from the point light, attenuated through the medium
//! 2. box-filtered mipmapping of the radiance
//! 3. separable Gaussian filtering of every mip, skipping the empty margin

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
mod error;
mod scene;

pub use error::{Error, Result};
pub use scene::{load_scene, Scene};

pub use volprobe_core::{
    CubePair, GaussianKernel, GridLayout, MarginedVolumeSequence, MediumParams, MediumType,
    PointLight, SceneConfig, VolumeError, VolumeGrid, VolumeTransform,
};
pub use volprobe_render::{
    GpuContext, ProbeSettings, ProbeView, RenderError, SliceOptions, VolumeProbe,
};

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, UVec3, Vec3, Vec4};
