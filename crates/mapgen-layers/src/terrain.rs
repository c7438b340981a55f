//! Built-in terrain layer: water vs. land.
//!
//! Water is the one thing nothing else may build over, so it claims cells
//! at the highest built-in priority; land cells claim at the lowest so any
//! other layer replaces them.

use mapgen_core::LayerId;
use mapgen_quadtree::{ConvolveRecord, Quadtree};

use crate::{CellData, Layer, MapEntity, Tile};

/// Water outranks every other built-in claim.
pub const WATER_PRIORITY: i32 = 100;

/// Land (empty) cells are replaced by everything else.
pub const EMPTY_PRIORITY: i32 = -100;

/// GlobCover land-cover code for water bodies.
const GLOBCOVER_WATER: f64 = 210.0;

/// Water/land layer fed from a land-cover raster.
pub struct TerrainLayer {
    dataset: String,
}

impl TerrainLayer {
    pub fn new() -> Self {
        Self { dataset: "terrain".into() }
    }

    pub fn with_dataset(dataset: impl Into<String>) -> Self {
        Self { dataset: dataset.into() }
    }

    fn water_flag(data: &CellData<MapEntity>, id: LayerId) -> Option<bool> {
        match data.entities(id) {
            [MapEntity::Water(flag)] => Some(*flag),
            _ => None,
        }
    }
}

impl Default for TerrainLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<MapEntity, S> for TerrainLayer {
    fn name(&self) -> &str {
        "terrain"
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
        let data = node.data_mut().expect("filled tree");
        if value == GLOBCOVER_WATER {
            data.set_layer(id, vec![MapEntity::Water(true)], WATER_PRIORITY);
        } else {
            data.set_layer(id, vec![MapEntity::Water(false)], EMPTY_PRIORITY);
        }
    }

    fn merge(
        &mut self,
        id: LayerId,
        node: &mut Quadtree<CellData<MapEntity>>,
        _rec: &ConvolveRecord<'_>,
    ) {
        // Collapse four uniform children into one claim on the parent.
        let uniform = {
            let children = node.children().expect("merge called on a leaf");
            let first = children[0].data().and_then(|d| Self::water_flag(d, id));
            match first {
                Some(flag) if children.iter().all(|c| {
                    c.data().and_then(|d| Self::water_flag(d, id)) == Some(flag)
                }) =>
                {
                    Some(flag)
                }
                _ => None,
            }
        };

        if let Some(flag) = uniform {
            for child in node.children_mut().unwrap() {
                child.data_mut().unwrap().clear_layer(id);
            }
            let priority = if flag { WATER_PRIORITY } else { EMPTY_PRIORITY };
            node.data_mut().unwrap().set_layer(id, vec![MapEntity::Water(flag)], priority);
        }
    }

    fn finalize(&self, entity: MapEntity) -> Tile {
        match entity {
            MapEntity::Water(true) => Tile::new("WaterTile"),
            MapEntity::Water(false) => Tile::empty(),
            other => unreachable!("terrain layer cannot finalize {other:?}"),
        }
    }

    fn fuse(&self, entities: Vec<MapEntity>) -> MapEntity {
        // Water cells never stack within one cell, so there is never more
        // than one terrain entity to combine.
        unreachable!("terrain entities cannot fuse: {entities:?}")
    }
}
