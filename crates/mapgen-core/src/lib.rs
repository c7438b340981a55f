//! `mapgen-core` — foundational types for the `mapgen` world-model generator.
//!
//! This crate is a dependency of every other `mapgen-*` crate.  It
//! intentionally has no `mapgen-*` dependencies and minimal external ones
//! (`rand`, `rustc-hash`, `thiserror`, `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`ids`]    | `LayerId`, `SegmentId`, `WayId`                           |
//! | [`geo`]    | `MapPoint`, `CoordKey`, `Coords`, affine raster windows   |
//! | [`rng`]    | `MapRng` (per-map deterministic RNG)                      |
//! | [`config`] | `MapConfig`, `GeneratorConfig`                            |
//! | [`error`]  | `CoreError`, `CoreResult`                                 |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{GeneratorConfig, MapConfig};
pub use error::{CoreError, CoreResult};
pub use geo::{AffineTransform, CoordKey, Coords, GeoTransform, MapPoint};
pub use ids::{LayerId, SegmentId, WayId};
pub use rng::MapRng;
