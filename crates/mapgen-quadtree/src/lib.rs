//! `mapgen-quadtree` — the spatial tree every generator algorithm runs on.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | [`quadrant`] | `Quadrant` (NW/NE/SW/SE), `QuadMap`                     |
//! | [`address`]  | `Address` — quadrant path from the root                 |
//! | [`tree`]     | `Quadtree<T>`, `ConvolveRecord`, the traversal primitive|
//!
//! # The one traversal
//!
//! Everything downstream — cell initialization, the priority bubble pass,
//! merging, splitting, tile write-out — is a [`Quadtree::convolve`] call
//! with a different visitor and pre/post flag.  There is deliberately no
//! second traversal mechanism to keep invariants in one place.

pub mod address;
pub mod quadrant;
pub mod tree;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use address::Address;
pub use quadrant::{QuadMap, Quadrant, QUADRANTS};
pub use tree::{ConvolveRecord, Quadtree};
