//! Error types for the bridge

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or driving the bridge
#[derive(Debug, Error)]
pub enum Error {
    /// The overlay engine configuration text did not parse or validate
    #[error("failed to load overlay config: {0}")]
    Config(#[source] nimbus_overlay::Error),

    /// Engine bootstrap failed (including CIDR parse failures inside the
    /// device factory)
    #[error("failed to set up overlay engine: {0}")]
    Setup(#[source] nimbus_overlay::Error),

    /// Bootstrap returned without ever invoking the device factory, so no
    /// prefix was negotiated
    #[error("overlay engine finished bootstrap without building a device")]
    DeviceNotBuilt,

    /// I/O error on a conduit
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
