//! The pass orchestrator.
//!
//! Four convolve passes run over one shared tree:
//!
//! 1. **initialize** (pre-order, per layer) — every full-depth cell gets
//!    this layer's entities from its raster value; non-raster layers
//!    populate the tree in `post_init`.
//! 2. **bubble-priority-down** (pre-order) — the highest priority seen on
//!    the path from the root masks out any strictly-lower claim beneath it.
//! 3. **merge** (post-order) — layers collapse uniform children upward;
//!    subtree aggregates are recomputed; childless subtrees are discarded.
//! 4. **split** (pre-order) — every remaining cell resolves to exactly one
//!    finalized tile: single claims finalize in place, crowds are
//!    redistributed into children (priority-compatible, least-loaded,
//!    seeded-RNG tie-break), and full-depth crowds fuse to the dominant
//!    layer.
//!
//! Entity loss in passes 2 and 4 (masked entries, claims with no eligible
//! child, non-dominant layers at full depth) is an expected outcome, not an
//! error.

use mapgen_core::{LayerId, MapRng};
use mapgen_quadtree::{Address, Quadtree};

use crate::{CellData, Layer, LayerError, LayerResult, Tile};
use crate::raster::Datasets;

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Orchestrates the aggregation passes over a set of registered layers.
///
/// `E` is the entity vocabulary shared by the layers; `S` the external
/// state store passed through to `modify_state`.
pub struct Pipeline<E, S> {
    layers: Vec<Box<dyn Layer<E, S>>>,
    rng: MapRng,
}

impl<E, S> Pipeline<E, S> {
    pub fn new(rng: MapRng) -> Self {
        Self { layers: Vec::new(), rng }
    }

    /// Pipeline seeded from a map identifier — the normal entry point;
    /// reusing the name reproduces the exact same tile tree.
    pub fn for_map(name: &str) -> Self {
        Self::new(MapRng::for_map(name))
    }

    /// Register a layer.  Registration order assigns the returned
    /// [`LayerId`] and fixes every encounter-order tie-break.
    pub fn register(&mut self, layer: Box<dyn Layer<E, S>>) -> LayerId {
        let id = LayerId(u16::try_from(self.layers.len()).expect("too many layers"));
        self.layers.push(layer);
        id
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Run all passes and return the finalized tile tree.
    pub fn run(
        &mut self,
        max_depth: u32,
        datasets: &Datasets,
        state: &mut S,
    ) -> LayerResult<Quadtree<CellData<E>>> {
        let mut tree = Quadtree::new(max_depth);
        self.initialize(&mut tree, datasets)?;
        self.bubble_priorities(&mut tree);
        self.merge(&mut tree);
        self.split(&mut tree);
        self.modify_state(state, &mut tree);
        Ok(tree)
    }

    // ── Pass 1: initialize ────────────────────────────────────────────────

    /// Fill the tree and hand every full-depth cell its raster value, one
    /// layer at a time, then run the layers' `post_init` hooks.
    pub fn initialize(
        &mut self,
        tree: &mut Quadtree<CellData<E>>,
        datasets: &Datasets,
    ) -> LayerResult<()> {
        let max_depth = tree.max_depth();
        tree.fill_to_bottom(&mut || CellData::default());

        for i in 0..self.layers.len() {
            let id = LayerId(i as u16);
            if let Some(name) = self.layers[i].dataset().map(str::to_owned) {
                let grid = datasets
                    .grid(&name)
                    .ok_or_else(|| LayerError::MissingDataset(name.clone()))?;
                if grid.dim() != 1u64 << max_depth {
                    return Err(LayerError::GridSize {
                        dataset: name,
                        expected: 1u64 << max_depth,
                        got: grid.dim(),
                    });
                }
                let layer = &mut self.layers[i];
                tree.convolve(false, &mut |node, rec| {
                    if rec.depth == max_depth {
                        layer.initialize(id, grid.get(rec.x, rec.y), node, rec);
                    }
                });
            }
            self.layers[i].post_init(id, tree)?;
        }
        Ok(())
    }

    // ── Pass 2: bubble priorities down ────────────────────────────────────

    /// Mask out every claim that sits below a strictly-higher-priority
    /// claim on its root path (or in its own cell).
    pub fn bubble_priorities(&mut self, tree: &mut Quadtree<CellData<E>>) {
        // One entry per depth level of the current root path.  Pre-order
        // visits a node's subtree before its next sibling, so truncating to
        // the node's depth discards exactly the finished branches.
        let mut stack: Vec<Option<i32>> = Vec::new();

        tree.convolve(false, &mut |node, rec| {
            stack.truncate(rec.depth as usize);
            let inherited = stack.last().copied().flatten();
            let own = node.data().and_then(CellData::max_own_priority);

            let current = match (inherited, own) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
            stack.push(current);

            if let (Some(cutoff), Some(data)) = (current, node.data_mut()) {
                data.remove_below(cutoff);
            }
        });
    }

    // ── Pass 3: merge ─────────────────────────────────────────────────────

    /// Give every layer a chance to collapse resolved children into their
    /// parent, then rebuild the subtree aggregates bottom-up.
    pub fn merge(&mut self, tree: &mut Quadtree<CellData<E>>) {
        let layers = &mut self.layers;

        tree.convolve(true, &mut |node, rec| {
            for (i, layer) in layers.iter_mut().enumerate() {
                let id = LayerId(i as u16);
                let every_child_claims = node
                    .children()
                    .is_some_and(|cs| cs.iter().all(|c| c.data().is_some_and(|d| d.has_entry(id))));
                if every_child_claims {
                    layer.merge(id, node, rec);
                }
            }

            // Recompute aggregates from the (post-hook) children and own
            // entries; an empty subtree below this node is discarded.
            let mut child_total = 0usize;
            let mut min_p: Option<i32> = None;
            let mut max_p: Option<i32> = None;
            if let Some(children) = node.children() {
                for child in children {
                    let data = child.data().expect("filled tree");
                    child_total += data.total_entities();
                    min_p = fold_min(min_p, data.min_priority());
                    max_p = fold_max(max_p, data.max_priority());
                }
                if child_total == 0 {
                    node.clear_children();
                }
            }

            let data = node.data_mut().expect("filled tree");
            for entry in data.entries().iter().filter(|e| !e.entities.is_empty()) {
                min_p = fold_min(min_p, entry.priority);
                max_p = fold_max(max_p, entry.priority);
            }
            let total = child_total + data.own_entity_count();
            data.update_aggregates(total, min_p, max_p);
        });
    }

    // ── Pass 4: split / finalize ──────────────────────────────────────────

    /// Resolve every cell to exactly one finalized tile.
    pub fn split(&mut self, tree: &mut Quadtree<CellData<E>>) {
        let Pipeline { layers, rng } = self;

        tree.convolve(false, &mut |node, _rec| {
            let Some(data) = node.data() else { return };
            if data.is_finalized() {
                return;
            }
            let own = data.own_entity_count();
            let is_leaf = node.is_leaf();

            if own == 0 {
                // nothing claims this cell: empty leaf tile, or descend
                if is_leaf {
                    node.data_mut().unwrap().set_tile(Tile::empty());
                }
                return;
            }

            if own == 1 && is_leaf {
                let entry = node
                    .data_mut()
                    .unwrap()
                    .take_entries()
                    .into_iter()
                    .find(|e| !e.entities.is_empty())
                    .expect("counted entity missing");
                let entity = entry.entities.into_iter().next().unwrap();
                let tile = layers[entry.layer.index()].finalize(entity);
                node.data_mut().unwrap().set_tile(tile);
                return;
            }

            if node.max_depth() > 0 {
                Self::split_into_children(rng, node);
            } else {
                Self::fuse_at_bottom(layers, node);
            }
        });
    }

    /// Branch case: clear the cell and redistribute its entities into
    /// (possibly new) children, lowest priority first.
    fn split_into_children(rng: &mut MapRng, node: &mut Quadtree<CellData<E>>) {
        let entries = node.data_mut().unwrap().take_entries();
        if node.is_leaf() {
            node.add_children(|| Some(CellData::default()));
        }

        // Flatten to (layer, priority, entity) preserving encounter order,
        // then stable-sort ascending by priority so low-priority claims
        // spread out before high-priority ones land on top of them.
        let mut items: Vec<(LayerId, i32, E)> = Vec::new();
        for entry in entries {
            if entry.entities.is_empty() {
                continue; // cleared claim, nothing to place
            }
            let priority = entry.priority.expect("claim without priority");
            for entity in entry.entities {
                items.push((entry.layer, priority, entity));
            }
        }
        items.sort_by_key(|&(_, priority, _)| priority);

        let children = node.children_mut().unwrap();
        for (layer, priority, entity) in items {
            // Children whose subtree minimum outranks this claim cannot
            // host it.
            let mut candidates: Vec<usize> = (0..4)
                .filter(|&i| {
                    children[i]
                        .data()
                        .expect("seeded child")
                        .min_priority()
                        .is_none_or(|mp| mp <= priority)
                })
                .collect();
            if candidates.is_empty() {
                // expected loss: nowhere to put this claim
                continue;
            }

            let fewest = candidates
                .iter()
                .map(|&i| children[i].data().unwrap().total_entities())
                .min()
                .unwrap();
            candidates.retain(|&i| children[i].data().unwrap().total_entities() == fewest);

            let chosen = if candidates.len() == 1 {
                candidates[0]
            } else {
                candidates[rng.pick(candidates.len())]
            };
            children[chosen].data_mut().unwrap().push_entity(layer, entity, priority);
        }
    }

    /// Full-depth case: the cell cannot divide, so the layer with the most
    /// entities wins (ties by encounter order), fuses them into one, and
    /// finalizes.  Every other layer's entities are discarded.
    fn fuse_at_bottom(layers: &mut [Box<dyn Layer<E, S>>], node: &mut Quadtree<CellData<E>>) {
        let mut entries = node.data_mut().unwrap().take_entries();
        entries.retain(|e| !e.entities.is_empty());
        debug_assert!(!entries.is_empty());

        let mut best = 0;
        for i in 1..entries.len() {
            if entries[i].entities.len() > entries[best].entities.len() {
                best = i;
            }
        }
        let entry = entries.swap_remove(best);

        let layer = &layers[entry.layer.index()];
        let entity = layer.fuse(entry.entities);
        let tile = layer.finalize(entity);
        node.data_mut().unwrap().set_tile(tile);
    }

    // ── Pass 5: modify external state ─────────────────────────────────────

    /// Run every layer's `modify_state` hook, in registration order, over
    /// the finalized tree.
    pub fn modify_state(&mut self, state: &mut S, tree: &mut Quadtree<CellData<E>>) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.modify_state(LayerId(i as u16), state, tree);
        }
    }
}

// ── Tile walk ─────────────────────────────────────────────────────────────────

/// Visit every finalized leaf as `(address, tile)` — the external writer's
/// entry point into the finished tree.
pub fn for_each_tile<E, F>(tree: &mut Quadtree<CellData<E>>, f: &mut F)
where
    F: FnMut(Address, &Tile),
{
    tree.convolve(false, &mut |node, rec| {
        if node.is_leaf() {
            if let Some(tile) = node.data().and_then(CellData::tile) {
                f(Address::from_slice(rec.address), tile);
            }
        }
    });
}

// ── Small helpers ─────────────────────────────────────────────────────────────

fn fold_min(a: Option<i32>, b: Option<i32>) -> Option<i32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}

fn fold_max(a: Option<i32>, b: Option<i32>) -> Option<i32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    }
}
