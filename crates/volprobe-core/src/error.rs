//! Error types for volprobe.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for loading volumes and scene descriptions.
///
/// Every variant is fatal for a loading session: a scene with a malformed
/// asset cannot be rendered meaningfully, so callers propagate these up to
/// the top level instead of recovering.
#[derive(Error, Debug)]
pub enum VolumeError {
    /// The volume file could not be opened or read.
    #[error("unable to read volume file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The 3-byte file identifier is not `VOL`.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier([u8; 3]),

    /// The version byte is not supported.
    #[error("invalid version number: {0}")]
    UnsupportedVersion(u8),

    /// The sample encoding is not float32.
    #[error("only float32 supported (type = {0}, this should be 1)")]
    UnsupportedType(i32),

    /// The header declares a non-positive size or channel count.
    #[error("invalid volume dimensions: {size:?} with {channels} channels")]
    InvalidDimensions { size: [i32; 3], channels: i32 },

    /// The file ends before all declared samples were read.
    #[error("volume data truncated: expected {expected} samples")]
    Truncated { expected: usize },

    /// Density and emission directories hold different frame counts.
    #[error("# of density and emission volumes are different: {density} vs {emission}")]
    FrameCountMismatch { density: usize, emission: usize },

    /// No file in the directory matched the density filter.
    #[error("no volume matching \"{filter}\" found in {}", dir.display())]
    NoFrames { dir: PathBuf, filter: String },

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Scene configuration is missing a key or has a malformed value.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for volprobe operations.
pub type Result<T> = std::result::Result<T, VolumeError>;
