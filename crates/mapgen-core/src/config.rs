//! Generator configuration.
//!
//! Loaded by the external application (TOML, CLI flags — outside this
//! workspace's scope) and passed into the pipeline and network builders.

use serde::Deserialize;

use crate::geo::{parse_lat_lon, Coords};
use crate::CoreResult;

/// Tunables shared with the downstream simulation engine.
#[derive(Clone, Debug, Deserialize)]
pub struct GeneratorConfig {
    /// Depth of the world quadtree.  The map is a
    /// `2^max_depth × 2^max_depth` pixel grid.  Typically ≤ 20.
    pub max_depth: u32,

    /// Size of one full-depth tile in meters.  Converts pixel distances
    /// into physical ones (node snap radii, map radius).
    pub min_tile_size: u32,

    /// How many real people one simulated unit represents.
    pub people_per_sim: u32,
}

impl GeneratorConfig {
    /// Side length of the map in pixels: `2^max_depth`.
    #[inline]
    pub fn max_dim(&self) -> u64 {
        1u64 << self.max_depth
    }

    /// Half the physical side length of the map, in meters.
    #[inline]
    pub fn radius_m(&self) -> f64 {
        self.min_tile_size as f64 * self.max_dim() as f64 / 2.0
    }
}

/// Top-level description of one map to generate.
#[derive(Clone, Debug, Deserialize)]
pub struct MapConfig {
    /// Map identifier.  Seeds the tie-break RNG; reusing a name reproduces
    /// the exact same world.
    pub name: String,

    /// Center latitude, e.g. `"37.77N"`.
    pub latitude: String,

    /// Center longitude, e.g. `"122.41W"`.
    pub longitude: String,

    pub generator: GeneratorConfig,
}

impl MapConfig {
    /// Parse the textual center coordinates into signed degrees.
    pub fn lat_lon(&self) -> CoreResult<(f64, f64)> {
        parse_lat_lon(&self.latitude, &self.longitude)
    }

    /// The region of interest covered by this map.
    pub fn coords(&self) -> CoreResult<Coords> {
        let (lat, lon) = self.lat_lon()?;
        Ok(Coords::new(lat, lon, self.generator.radius_m()))
    }
}
