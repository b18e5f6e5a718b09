//! Error types for TallyChain

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("block index {index} is out of range for a chain of {height} blocks")]
    BlockOutOfRange { index: usize, height: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
