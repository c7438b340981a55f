//! The `Layer` trait — the aggregation pipeline's extension point.

use mapgen_core::LayerId;
use mapgen_quadtree::{ConvolveRecord, Quadtree};

use crate::{CellData, LayerResult, Tile};

/// A pluggable producer/consumer of tile entities for one thematic
/// category.
///
/// Registered layers are boxed trait objects; registration order assigns
/// the [`LayerId`] each hook receives and fixes every encounter-order
/// tie-break in the pipeline.  Hooks are called single-threaded, in
/// registration order, so implementations may keep internal state without
/// synchronization.
///
/// `E` is the application's entity vocabulary (see
/// [`MapEntity`](crate::MapEntity) for the one the built-in layers use);
/// `S` is the external state store handed to [`modify_state`](Self::modify_state).
pub trait Layer<E, S> {
    /// Stable name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Name of the raster dataset this layer initializes from, or `None`
    /// for layers that populate the tree in [`post_init`](Self::post_init)
    /// instead.
    fn dataset(&self) -> Option<&str> {
        None
    }

    /// Initialize one full-depth cell from its raster value.
    ///
    /// Called once per leaf during the initialize pass.  Use
    /// [`CellData::set_layer`]/[`CellData::clear_layer`] on the node's
    /// data; one entity per raw unit of this layer's data.
    fn initialize(
        &mut self,
        id: LayerId,
        value: f64,
        node: &mut Quadtree<CellData<E>>,
        rec: &ConvolveRecord<'_>,
    );

    /// Extra initialization after the raster pass — the hook for layers
    /// whose dataset is not a raster grid.
    fn post_init(&mut self, _id: LayerId, _tree: &mut Quadtree<CellData<E>>) -> LayerResult<()> {
        Ok(())
    }

    /// Optionally collapse the node's children into the node.
    ///
    /// Invoked (post-order) only when all four children currently hold an
    /// entry for this layer.  Read the children, then rewrite the node's
    /// own entry and/or clear the children's.
    fn merge(&mut self, id: LayerId, node: &mut Quadtree<CellData<E>>, rec: &ConvolveRecord<'_>);

    /// Convert one of this layer's entities into its final tile.  Called
    /// once a cell has been assigned to exactly one entity.
    fn finalize(&self, entity: E) -> Tile;

    /// Combine several of this layer's entities into one.  Called when a
    /// full-depth cell cannot be divided further; picking one entity and
    /// discarding the rest is an acceptable implementation.
    fn fuse(&self, entities: Vec<E>) -> E;

    /// Modify the external state after the tree is fully finalized.  Use
    /// this to add non-tile items (graph handles, agents, …).
    fn modify_state(&mut self, _id: LayerId, _state: &mut S, _tree: &mut Quadtree<CellData<E>>) {}
}
