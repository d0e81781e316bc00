//! Error types for the overlay engine boundary

use thiserror::Error;

/// Result type alias for overlay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur at the overlay engine boundary
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Failed to parse configuration text
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Invalid network prefix
    #[error("invalid network prefix: {0}")]
    InvalidPrefix(String),

    /// Capability not available on this device
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// The device has been torn down.
    ///
    /// This is the only read failure the engine's fault handler treats as
    /// an orderly shutdown; any other error from a device read is
    /// unrecoverable and aborts the engine.
    #[error("device closed")]
    Closed,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error reports an orderly device closure
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed)
    }
}
