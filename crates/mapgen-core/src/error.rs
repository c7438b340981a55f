//! Core error type.
//!
//! Sub-crates define their own error enums (`LayerError`, `NetworkError`)
//! and either wrap `CoreError` as a variant or convert via `From`.  Fatal
//! invariant violations (malformed topology, broken tree shape) do not go
//! through these types — they assert.

use thiserror::Error;

/// Errors produced by `mapgen-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `mapgen-core`.
pub type CoreResult<T> = Result<T, CoreError>;
