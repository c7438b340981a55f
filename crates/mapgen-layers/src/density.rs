//! Built-in density layer: population or employment counts per cell.
//!
//! Raw per-cell counts are converted into simulated-people units
//! (`people_per_sim` real people per unit).  A cell holding more than one
//! unit carries one entity per whole unit so the split pass can spread
//! them into sub-cells; fractional cells pool upward during merge until a
//! whole unit accumulates.

use mapgen_core::LayerId;
use mapgen_quadtree::{ConvolveRecord, Quadtree};

use crate::{CellData, Layer, Tile};

/// Density claims sit between water (masks them) and empty land (which
/// they replace).
pub const DENSITY_PRIORITY: i32 = 0;

// ── MapEntity ─────────────────────────────────────────────────────────────────

/// Entity vocabulary shared by the built-in layers.  Applications with
/// custom layers define their own entity type instead.
#[derive(Clone, PartialEq, Debug)]
pub enum MapEntity {
    /// One terrain claim: is this cell water?
    Water(bool),
    /// One unit of simulated people (housing or workplaces), usually 1.0
    /// but fractional while pooling.
    Units(f64),
}

impl MapEntity {
    /// The unit count of a density entity, 0 for anything else.
    pub fn units(&self) -> f64 {
        match self {
            MapEntity::Units(u) => *u,
            MapEntity::Water(_) => 0.0,
        }
    }
}

// ── DensityLayer ──────────────────────────────────────────────────────────────

/// Population/employment density layer.
///
/// Two stock configurations exist: [`housing`](DensityLayer::housing)
/// (dataset `population` → `HousingTile`) and
/// [`workplaces`](DensityLayer::workplaces) (dataset `employment` →
/// `WorkplaceTile`).
pub struct DensityLayer {
    name: String,
    dataset: String,
    tile_kind: String,
    people_per_sim: u32,
}

impl DensityLayer {
    pub fn new(
        name: impl Into<String>,
        dataset: impl Into<String>,
        tile_kind: impl Into<String>,
        people_per_sim: u32,
    ) -> Self {
        Self {
            name: name.into(),
            dataset: dataset.into(),
            tile_kind: tile_kind.into(),
            people_per_sim,
        }
    }

    pub fn housing(people_per_sim: u32) -> Self {
        Self::new("housing", "population", "HousingTile", people_per_sim)
    }

    pub fn workplaces(people_per_sim: u32) -> Self {
        Self::new("workplaces", "employment", "WorkplaceTile", people_per_sim)
    }

    fn unit_sum(data: &CellData<MapEntity>, id: LayerId) -> f64 {
        data.entities(id).iter().map(MapEntity::units).sum()
    }
}

impl<S> Layer<MapEntity, S> for DensityLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn dataset(&self) -> Option<&str> {
        Some(&self.dataset)
    }

    fn initialize(
        &mut self,
        id: LayerId,
        value: f64,
        node: &mut Quadtree<CellData<MapEntity>>,
        _rec: &ConvolveRecord<'_>,
    ) {
        let raw = if value.is_nan() { 0.0 } else { value };
        assert!(raw >= 0.0, "negative density {raw}");

        let units = raw / self.people_per_sim as f64;
        let data = node.data_mut().expect("filled tree");
        if units == 0.0 {
            data.clear_layer(id);
        } else if units > 1.0 {
            // enough for several tiles; the split pass will spread them
            let whole = units.floor() as usize;
            let per_unit = units / whole as f64;
            data.set_layer(id, vec![MapEntity::Units(per_unit); whole], DENSITY_PRIORITY);
        } else {
            // fractional: most likely pools with neighbors during merge
            data.set_layer(id, vec![MapEntity::Units(units)], DENSITY_PRIORITY);
        }
    }

    fn merge(
        &mut self,
        id: LayerId,
        node: &mut Quadtree<CellData<MapEntity>>,
        _rec: &ConvolveRecord<'_>,
    ) {
        let total: f64 = node
            .children()
            .expect("merge called on a leaf")
            .iter()
            .map(|c| c.data().map_or(0.0, |d| Self::unit_sum(d, id)))
            .sum();

        if total == 0.0 {
            // no people here. carry on.
            node.data_mut().unwrap().clear_layer(id);
        } else if total < 4.0 {
            // too sparse for four children; pool everything in the parent
            for child in node.children_mut().unwrap() {
                child.data_mut().unwrap().clear_layer(id);
            }
            let whole = (total.floor() as usize).max(1);
            let per_unit = total / whole as f64;
            node.data_mut()
                .unwrap()
                .set_layer(id, vec![MapEntity::Units(per_unit); whole], DENSITY_PRIORITY);
        }
    }

    fn finalize(&self, entity: MapEntity) -> Tile {
        let units = entity.units();
        // be conservative in the 0.2..1 band: produce a tile where strict
        // rounding wouldn't, for a more spatially diverse map
        let rounded = if 0.2 < units && units < 1.0 { 1 } else { units.round() as u64 };
        if rounded == 0 {
            Tile::empty()
        } else {
            Tile::new(self.tile_kind.clone()).with_field("density", rounded)
        }
    }

    fn fuse(&self, entities: Vec<MapEntity>) -> MapEntity {
        MapEntity::Units(entities.iter().map(MapEntity::units).sum())
    }
}
