//! Error types for Mooring
//!
//! ## Table of Contents
//! - **MooringError**: Main error enum covering all failure modes
//! - **Result**: Type alias for `Result<T, MooringError>`

use thiserror::Error;

/// Result type alias for Mooring operations
pub type Result<T> = std::result::Result<T, MooringError>;

/// Main error type for Mooring operations
#[derive(Error, Debug)]
pub enum MooringError {
    /// Configuration error during builder setup
    #[error("configuration error: {0}")]
    Config(String),

    /// Anchor store failure (backing file could not be written)
    #[error("store error: {0}")]
    Store(String),

    /// Platform anchor subsystem failure (create/save/load/erase/remove)
    #[error("provider error: {0}")]
    Provider(String),

    /// Object spawner failure (unknown prefab, instantiation refused)
    #[error("spawn error: {0}")]
    Spawn(String),

    /// Operation not supported by the active provider
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Anchor id text that is not two hyphen-joined hex halves
    #[error("invalid anchor id: {0}")]
    InvalidAnchorId(String),

    /// Generic IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MooringError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a spawn error
    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::Spawn(msg.into())
    }

    /// Create an unsupported-operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}
