//! Rendering error types.

use thiserror::Error;
use volprobe_core::VolumeError;

/// Errors that can occur while building or running the probe pipeline.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Shader compilation failed.
    #[error("shader compilation failed: {0}")]
    ShaderCompilationFailed(String),

    /// Pipeline creation failed.
    #[error("pipeline creation failed: {0}")]
    PipelineCreationFailed(String),

    /// A readback buffer could not be mapped.
    #[error("GPU buffer mapping failed")]
    BufferMapFailed,

    /// The requested mip level does not exist.
    #[error("mip level {level} out of range (texture has {count})")]
    InvalidMipLevel { level: u32, count: u32 },

    /// The requested z slice lies outside the volume.
    #[error("slice {z} out of range (volume depth is {depth})")]
    InvalidSlice { z: u32, depth: u32 },

    /// CPU data does not match the texture it is uploaded to.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Loading or validating volume data failed.
    #[error(transparent)]
    Volume(#[from] VolumeError),

    /// Image encoding error.
    #[error("image encoding error: {0}")]
    ImageError(#[from] image::ImageError),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
