//! Error types for the vanity search engine.

use thiserror::Error;

/// Errors surfaced by candidate construction, the search coordinator,
/// the GPU offload path, and key persistence.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The requested prefix is empty, too long for the network, or
    /// contains characters outside the base32 alphabet.
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    /// The OS randomness source failed while creating a candidate.
    #[error("randomness source failure: {0}")]
    Randomness(String),

    /// No usable GPU device, or the crate was built without GPU support.
    #[error("GPU unavailable: {0}")]
    GpuUnavailable(String),

    /// A kernel dispatch or device buffer transfer failed mid-search.
    #[error("GPU dispatch failed: {0}")]
    GpuDispatch(String),

    /// Writing key material to disk failed. The found result itself
    /// remains valid and can be saved again.
    #[error("failed to write key material: {0}")]
    KeyPersistence(#[from] std::io::Error),
}
