//! Network-subsystem error type.

use thiserror::Error;

/// Errors produced by `mapgen-network`.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// A route's next segment run could not be oriented against the
    /// already-stitched chain.  Carries the full picture needed to debug
    /// the offending relation upstream.
    #[error(
        "broken line: route {route_index}, segment set {set_index} cannot be oriented\n\
         previous run endpoints: {prev_endpoints}\n\
         stitched so far: {stitched}\n\
         current set: {segments}\n\
         linearized: {linearized}"
    )]
    BrokenLine {
        route_index: usize,
        set_index: usize,
        prev_endpoints: String,
        stitched: String,
        segments: String,
        linearized: String,
    },
}

/// Shorthand result type for `mapgen-network`.
pub type NetworkResult<T> = Result<T, NetworkError>;
