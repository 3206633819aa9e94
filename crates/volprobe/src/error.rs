//! Top-level error type.

use thiserror::Error;
use volprobe_core::VolumeError;
use volprobe_render::RenderError;

/// Errors surfaced by the scene facade and the command-line driver.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A specialized Result type for volprobe operations.
pub type Result<T> = std::result::Result<T, Error>;
