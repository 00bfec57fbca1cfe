use std::io;

use thiserror::Error;

/// Canonical result for vmvec.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The initial address-space reservation was refused.
    #[error("failed to reserve {bytes} bytes of address space: {source}")]
    Allocation {
        bytes: usize,
        #[source]
        source: io::Error,
    },

    /// A commit would run past the reservation ceiling fixed at construction.
    #[error("capacity exceeded: requested {requested} bytes, reservation holds {mapping_size}")]
    CapacityExceeded {
        requested: usize,
        mapping_size: usize,
    },

    /// The OS refused to change page protection.
    #[error("{op} failed to change protection of {bytes} bytes: {source}")]
    Protection {
        op: &'static str,
        bytes: usize,
        #[source]
        source: io::Error,
    },

    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
