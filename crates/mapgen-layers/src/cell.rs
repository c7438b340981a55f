//! Per-node cell data: layer entries plus subtree aggregates.
//!
//! A cell maps layer IDs to (entity list, priority) pairs.  The collection
//! is a small ordered `Vec` rather than a hash map — there are at most a
//! handful of layers, entry order is the encounter order that tie-breaks
//! depend on, and iteration must be deterministic.
//!
//! # Aggregates
//!
//! `total_entities` and `min`/`max_priority` summarize the whole subtree
//! rooted at the node.  They are recomputed bottom-up by the merge pass and
//! updated incrementally by the split pass.  Invariant: the priorities are
//! unset iff the subtree holds zero entities.
//!
//! `set_layer`/`clear_layer` keep `total_entities` in step but do not touch
//! the priority aggregates; those are only valid after a merge pass.

use mapgen_core::LayerId;

use crate::Tile;

/// One layer's claim on a cell.
#[derive(Clone, Debug)]
pub struct LayerEntry<E> {
    pub layer: LayerId,
    pub entities: Vec<E>,
    pub priority: Option<i32>,
}

/// The aggregation pipeline's per-node payload.
#[derive(Clone, Debug)]
pub struct CellData<E> {
    entries: Vec<LayerEntry<E>>,
    total_entities: usize,
    min_priority: Option<i32>,
    max_priority: Option<i32>,
    tile: Option<Tile>,
}

impl<E> Default for CellData<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            total_entities: 0,
            min_priority: None,
            max_priority: None,
            tile: None,
        }
    }
}

impl<E> CellData<E> {
    // ── Layer entries ─────────────────────────────────────────────────────

    pub fn has_entry(&self, layer: LayerId) -> bool {
        self.entries.iter().any(|e| e.layer == layer)
    }

    /// Entities this layer holds here (empty slice when the layer has no
    /// entry).
    pub fn entities(&self, layer: LayerId) -> &[E] {
        self.entries
            .iter()
            .find(|e| e.layer == layer)
            .map_or(&[], |e| e.entities.as_slice())
    }

    pub fn priority(&self, layer: LayerId) -> Option<i32> {
        self.entries.iter().find(|e| e.layer == layer).and_then(|e| e.priority)
    }

    /// Replace this layer's entry with `entities` at `priority`.
    ///
    /// Keeps `total_entities` in step.  Does not reconcile the priority
    /// aggregates — those are the merge pass's job.
    pub fn set_layer(&mut self, layer: LayerId, entities: Vec<E>, priority: i32) {
        self.total_entities += entities.len();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.layer == layer) {
            self.total_entities -= entry.entities.len();
            entry.entities = entities;
            entry.priority = Some(priority);
        } else {
            self.entries.push(LayerEntry { layer, entities, priority: Some(priority) });
        }
    }

    /// Clear this layer's claim down to an explicit empty entry (no
    /// entities, unset priority), creating the entry if absent.
    ///
    /// A cleared entry still counts as "holding an entry" for the merge
    /// pass's gate — an explicitly emptied claim propagates upward, unlike
    /// a claim that was masked away (see [`remove_below`](Self::remove_below)).
    pub fn clear_layer(&mut self, layer: LayerId) {
        if let Some(pos) = self.entries.iter().position(|e| e.layer == layer) {
            let entry = &mut self.entries[pos];
            let removed = entry.entities.len();
            entry.entities.clear();
            entry.priority = None;
            self.total_entities -= removed;
        } else {
            self.entries.push(LayerEntry { layer, entities: Vec::new(), priority: None });
        }
    }

    /// Add one entity to this layer's entry, creating the entry at
    /// `priority` if absent.
    ///
    /// When the entry already exists, a differing `priority` is **not**
    /// reconciled — the first claim's priority stands.  Downstream code
    /// depends on this exact behavior; do not "fix" it here.
    pub fn push_entity(&mut self, layer: LayerId, entity: E, priority: i32) {
        self.total_entities += 1;
        self.min_priority = Some(self.min_priority.map_or(priority, |p| p.min(priority)));
        self.max_priority = Some(self.max_priority.map_or(priority, |p| p.max(priority)));
        if let Some(entry) = self.entries.iter_mut().find(|e| e.layer == layer) {
            entry.entities.push(entity);
        } else {
            self.entries.push(LayerEntry { layer, entities: vec![entity], priority: Some(priority) });
        }
    }

    /// Delete every entry whose priority is strictly below `cutoff` (the
    /// bubble pass's masking step).  Unlike `clear_layer`, masked entries
    /// are removed outright.
    pub fn remove_below(&mut self, cutoff: i32) {
        let total = &mut self.total_entities;
        self.entries.retain(|e| {
            let masked = e.priority.is_some_and(|p| p < cutoff);
            if masked {
                *total -= e.entities.len();
            }
            !masked
        });
    }

    /// Take all entries out of the cell, leaving it empty of claims.  The
    /// subtree aggregate keeps counting entities that now live in children.
    pub fn take_entries(&mut self) -> Vec<LayerEntry<E>> {
        let own: usize = self.entries.iter().map(|e| e.entities.len()).sum();
        self.total_entities -= own;
        std::mem::take(&mut self.entries)
    }

    pub fn entries(&self) -> &[LayerEntry<E>] {
        &self.entries
    }

    /// Number of entities held by this cell itself (children excluded).
    pub fn own_entity_count(&self) -> usize {
        self.entries.iter().map(|e| e.entities.len()).sum()
    }

    /// Highest priority among this cell's own non-empty entries.
    pub fn max_own_priority(&self) -> Option<i32> {
        self.entries
            .iter()
            .filter(|e| !e.entities.is_empty())
            .filter_map(|e| e.priority)
            .max()
    }

    // ── Aggregates ────────────────────────────────────────────────────────

    pub fn total_entities(&self) -> usize {
        self.total_entities
    }

    pub fn min_priority(&self) -> Option<i32> {
        self.min_priority
    }

    pub fn max_priority(&self) -> Option<i32> {
        self.max_priority
    }

    /// Overwrite the subtree aggregates (merge pass).
    pub fn update_aggregates(&mut self, total: usize, min: Option<i32>, max: Option<i32>) {
        debug_assert_eq!(
            min.is_none() && max.is_none(),
            total == 0,
            "priority aggregates must be unset exactly when the subtree is empty"
        );
        self.total_entities = total;
        self.min_priority = min;
        self.max_priority = max;
    }

    // ── Finalization ──────────────────────────────────────────────────────

    pub fn tile(&self) -> Option<&Tile> {
        self.tile.as_ref()
    }

    pub fn set_tile(&mut self, tile: Tile) {
        debug_assert!(self.tile.is_none(), "cell finalized twice");
        self.tile = Some(tile);
    }

    pub fn is_finalized(&self) -> bool {
        self.tile.is_some()
    }
}
