//! `mapgen-network` — polyline features to a junction/segment graph.
//!
//! Input ways arrive as loosely-connected polylines with opaque attribute
//! data.  [`NetworkBuilder`] welds them into maximal attribute-consistent
//! [`Segment`]s between junctions, splices point features (stations, ramps)
//! into the nearest segment, and finally *bakes* the live graph into
//! handles owned by an external state store.  [`stitch`] turns ordered
//! route relations over that graph into oriented per-line segment chains.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                 |
//! |-------------|----------------------------------------------------------|
//! | [`types`]   | `InputWay`/`InputNode`, `Segment`, `Junction`,           |
//! |             | `RouteMember`, the `NetworkConsumer` trait               |
//! | [`builder`] | `NetworkBuilder` — tracing, splitting, baking            |
//! | [`stitch`]  | route stitching and the `BrokenLinePolicy`               |
//! | [`attrs`]   | lane/speed/ref tag parsing with warn-and-recover         |
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                       |
//!
//! # Error policy
//!
//! Irreconcilable topology (a way whose endpoints cannot meet the walk's
//! border point, degree violations inside one route's segment run) is
//! malformed input and panics with context.  A route that merely cannot be
//! *oriented* goes through the per-network [`BrokenLinePolicy`]: fail with
//! a full diagnostic, or warn and drop the route.  Unparseable attribute
//! values are recovered locally (`attrs`) and never fatal.

pub mod attrs;
pub mod builder;
pub mod error;
pub mod stitch;
pub mod types;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::NetworkBuilder;
pub use error::{NetworkError, NetworkResult};
pub use stitch::BrokenLinePolicy;
pub use types::{InputNode, InputWay, Junction, NetworkConsumer, RouteMember, Segment};
