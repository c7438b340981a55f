//! Aggregation-pipeline error type.
//!
//! Everything here is malformed input — fatal to the run, reported with
//! enough context to identify the offending dataset.  Expected data loss
//! (masked entries, dropped split entities, non-dominant fuse layers) is
//! not an error and never surfaces here.

use thiserror::Error;

/// Errors produced by `mapgen-layers`.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error("layer requires dataset '{0}' which was not provided")]
    MissingDataset(String),

    #[error("grid dimension {0} is not a power of two")]
    GridDimension(u64),

    #[error("grid has {got} cells, expected {expected}")]
    GridCellCount { expected: usize, got: usize },

    #[error("dataset '{dataset}' grid is {got}x{got}, tree needs {expected}x{expected}")]
    GridSize { dataset: String, expected: u64, got: u64 },

    #[error(
        "raster tile '{tile}' resolution ({got_lat}, {got_lon}) does not match \
         ({want_lat}, {want_lon})"
    )]
    ResolutionMismatch {
        tile: String,
        want_lat: f64,
        want_lon: f64,
        got_lat: f64,
        got_lon: f64,
    },

    #[error("raster tiles cover {got} of {want} requested cells")]
    IncompleteCoverage { got: u64, want: u64 },
}

/// Shorthand result type for `mapgen-layers`.
pub type LayerResult<T> = Result<T, LayerError>;
