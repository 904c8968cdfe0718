//! Error type for link simulation.

use vlink_core::{CodecError, ConfigError};

/// Result type for simulation operations
pub type SimResult<T> = Result<T, SimError>;

/// Errors that can occur while simulating a link
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Error rate {0} out of range (0-10000)")]
    InvalidErrorRate(u32),

    #[error("Bit count {found} does not match a {width}x{height} raster ({expected} bits)")]
    BitCount {
        found: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
