//! `mapgen-layers` — the quadtree aggregation pipeline.
//!
//! Thematic **layers** (terrain, housing density, workplaces, …) compete for
//! the same spatial cells.  The pipeline initializes every full-depth cell
//! from raster data, then reconciles the claims in three convolve passes —
//! priorities bubble down, mergeable cells collapse upward, overfull cells
//! split their entities downward — until every leaf holds exactly one
//! finalized, immutable [`Tile`].
//!
//! # Crate layout
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | [`tile`]     | `Tile` — finalized leaf payload (kind + fields)         |
//! | [`cell`]     | `CellData` — per-node layer entries + aggregates        |
//! | [`layer`]    | the `Layer` capability trait                            |
//! | [`pipeline`] | `Pipeline` — the pass orchestrator, `for_each_tile`     |
//! | [`terrain`]  | built-in water/land layer                               |
//! | [`density`]  | built-in population/employment density layer            |
//! | [`raster`]   | `Grid`, `Datasets`, raster tile assembly                |
//! | [`commute`]  | pairing housing and workplace tiles into commutes       |
//! | [`error`]    | `LayerError`, `LayerResult<T>`                          |
//!
//! # Determinism
//!
//! Given the same map seed, the same registered layers, and the same input
//! grids, the finalized tile tree is byte-identical across runs.  The only
//! randomness is the split pass's tie-break among equally loaded children,
//! drawn from one explicit [`MapRng`](mapgen_core::MapRng).  Everything is
//! single-threaded.

pub mod cell;
pub mod commute;
pub mod density;
pub mod error;
pub mod layer;
pub mod pipeline;
pub mod raster;
pub mod terrain;
pub mod tile;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use cell::{CellData, LayerEntry};
pub use commute::{assign_commutes, CommuteSink};
pub use density::{DensityLayer, MapEntity, DENSITY_PRIORITY};
pub use error::{LayerError, LayerResult};
pub use layer::Layer;
pub use pipeline::{for_each_tile, Pipeline};
pub use raster::{assemble_raster, Datasets, Grid, RasterTile};
pub use terrain::{TerrainLayer, EMPTY_PRIORITY, WATER_PRIORITY};
pub use tile::Tile;
