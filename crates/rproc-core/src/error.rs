//! Error types for the remote-processor framework

use crate::backend::BackendError;
use rproc_image::ImageError;

/// Result type for framework operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the framework.
///
/// Firmware-pipeline failures (`Image`, `InvalidAddress`,
/// `MappingFailed`, `TooManyTraces`, `Backend`) are terminal for the
/// acquisition that triggered the load: the processor returns to
/// offline and the caller observes the failure on its next operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No processor registered under this name.
    #[error("can't find remote processor {0}")]
    NotFound(String),

    /// A processor with this name is already registered.
    #[error("remote processor {0} already registered")]
    Exists(String),

    /// The processor has users, or its owner refused to be pinned.
    #[error("remote processor {0} is in use")]
    Busy(String),

    /// Acquired before a firmware name was configured.
    #[error("no firmware configured for {0}")]
    MissingFirmware(String),

    /// Registration name is empty, too long, or not printable.
    #[error("invalid remote processor name {0:?}")]
    InvalidName(String),

    /// Firmware container decoding failed.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// A device address fell outside every configured mapping.
    #[error("no mapping for device address {da:#x}")]
    InvalidAddress { da: u64 },

    /// The host could not provide a mapping at this physical address.
    #[error("can't map {len} bytes at {pa:#x}")]
    MappingFailed { pa: u64, len: usize },

    /// The firmware announced more trace buffers than the record holds.
    #[error("too many trace buffers (at most 2 per processor)")]
    TooManyTraces,

    /// The platform backend failed to start or stop the core.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Release without a matching acquire.
    #[error("asymmetric release (forgot to call get?)")]
    AsymmetricRelease,

    /// Bounded wait for the processor lock ran out.
    #[error("interrupted while waiting for the processor lock")]
    Interrupted,

    /// The firmware blob could not be fetched.
    #[error("firmware fetch for {name} failed: {reason}")]
    FetchFailed { name: String, reason: String },
}
