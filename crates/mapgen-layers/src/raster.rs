//! Raster grids and dataset registry.
//!
//! File-format reading (GDAL and friends) happens upstream; this module
//! receives already-decoded raster windows as plain arrays.  What it owns
//! is the validation the pipeline depends on — square power-of-two
//! dimensions, matching tile resolutions, complete coverage — and the
//! stitching of several tiles into the one grid a layer initializes from.

use mapgen_core::geo::{centered_box, round_to_pow2, Coords, GeoTransform};
use rustc_hash::FxHashMap;

use crate::{LayerError, LayerResult};

// ── Grid ──────────────────────────────────────────────────────────────────────

/// A square raster of per-cell values, `dim × dim` with `dim` a power of
/// two, indexed by pixel coordinate.
#[derive(Clone, Debug)]
pub struct Grid {
    dim: u64,
    cells: Vec<f64>,
}

impl Grid {
    /// Wrap a row-major cell array.
    ///
    /// # Errors
    ///
    /// [`LayerError::GridDimension`] if `dim` is not a power of two,
    /// [`LayerError::GridCellCount`] if the array length is not `dim²`.
    pub fn from_cells(dim: u64, cells: Vec<f64>) -> LayerResult<Self> {
        if dim == 0 || !dim.is_power_of_two() {
            return Err(LayerError::GridDimension(dim));
        }
        let expected = (dim * dim) as usize;
        if cells.len() != expected {
            return Err(LayerError::GridCellCount { expected, got: cells.len() });
        }
        Ok(Self { dim, cells })
    }

    /// A grid of zeros (or any uniform value).
    pub fn filled(dim: u64, value: f64) -> LayerResult<Self> {
        Self::from_cells(dim, vec![value; (dim * dim) as usize])
    }

    #[inline]
    pub fn dim(&self) -> u64 {
        self.dim
    }

    /// `log2(dim)` — the tree depth this grid corresponds to.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.dim.trailing_zeros()
    }

    #[inline]
    pub fn get(&self, x: u64, y: u64) -> f64 {
        debug_assert!(x < self.dim && y < self.dim);
        self.cells[(y * self.dim + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u64, y: u64, value: f64) {
        debug_assert!(x < self.dim && y < self.dim);
        self.cells[(y * self.dim + x) as usize] = value;
    }
}

// ── Datasets ──────────────────────────────────────────────────────────────────

/// Named grids the pipeline pulls layer inputs from.
#[derive(Default)]
pub struct Datasets {
    grids: FxHashMap<String, Grid>,
}

impl Datasets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, grid: Grid) {
        self.grids.insert(name.into(), grid);
    }

    pub fn grid(&self, name: &str) -> Option<&Grid> {
        self.grids.get(name)
    }
}

// ── Raster tile assembly ──────────────────────────────────────────────────────

/// One already-decoded raster window, as handed over by the external
/// reader.
pub struct RasterTile {
    /// Source identifier, for logs and error messages.
    pub name: String,
    pub transform: GeoTransform,
    pub width: i64,
    pub height: i64,
    /// Row-major `height × width` values.
    pub data: Vec<f64>,
}

impl RasterTile {
    fn sample(&self, x: i64, y: i64) -> f64 {
        self.data[(y * self.width + x) as usize]
    }
}

/// Stitch raster tiles into the single grid covering `coords`.
///
/// Tiles must share one resolution and together cover the whole requested
/// region.  Overlapping tiles do not fail, but which value wins is
/// unspecified.  The output is downsampled by `2^downsample` relative to
/// the natural window size and clamped to `max_dim`, with nearest-neighbor
/// sampling.
///
/// # Errors
///
/// [`LayerError::ResolutionMismatch`] for inconsistent tiles,
/// [`LayerError::IncompleteCoverage`] when the assembled area falls short
/// of the request.
pub fn assemble_raster(
    tiles: &[RasterTile],
    coords: &Coords,
    max_dim: u64,
    downsample: u32,
) -> LayerResult<Grid> {
    // Sort by name so overlap resolution is deterministic run to run.
    let mut order: Vec<&RasterTile> = tiles.iter().collect();
    order.sort_by(|a, b| a.name.cmp(&b.name));

    let mut output: Option<Grid> = None;
    let mut resolution = (0.0, 0.0);
    let mut covered: u64 = 0;

    for tile in order {
        let ((x1, y1), (x2, y2)) = centered_box(coords, &tile.transform);

        if output.is_some() {
            if tile.transform.resolution() != resolution {
                return Err(LayerError::ResolutionMismatch {
                    tile: tile.name.clone(),
                    want_lat: resolution.0,
                    want_lon: resolution.1,
                    got_lat: tile.transform.lat_res,
                    got_lon: tile.transform.lon_res,
                });
            }
        } else {
            // First tile fixes the resolution and the output size, so each
            // tile only has to be visited once.
            resolution = tile.transform.resolution();
            let natural = round_to_pow2((y2 - y1) as f64, true).min(max_dim);
            let dim = (natural >> downsample).max(1);
            output = Some(Grid::filled(dim, 0.0)?);
        }
        let grid = output.as_mut().unwrap();
        let dim = grid.dim() as i64;

        // crop to the portion covered by this tile
        let x1c = x1.clamp(0, tile.width);
        let x2c = x2.clamp(0, tile.width);
        let y1c = y1.clamp(0, tile.height);
        let y2c = y2.clamp(0, tile.height);
        if x2c - x1c == 0 || y2c - y1c == 0 {
            log::info!("unused raster tile: {}", tile.name);
            continue;
        }

        // project the covered portion into output space
        let project = |v: i64, lo: i64, hi: i64| -> i64 {
            (((v - lo) as f64 / (hi - lo) as f64) * dim as f64).round() as i64
        };
        let (dx1, dx2) = (project(x1c, x1, x2), project(x2c, x1, x2));
        let (dy1, dy2) = (project(y1c, y1, y2), project(y2c, y1, y2));

        // nearest-neighbor map from output pixel back to source pixel
        let source_of = |o: i64, d1: i64, d2: i64, s1: i64, s2: i64| -> i64 {
            let t = ((o - d1) as f64 + 0.5) / (d2 - d1) as f64;
            (s1 + (t * (s2 - s1) as f64).floor() as i64).min(s2 - 1)
        };
        for oy in dy1..dy2 {
            let sy = source_of(oy, dy1, dy2, y1c, y2c);
            for ox in dx1..dx2 {
                let sx = source_of(ox, dx1, dx2, x1c, x2c);
                grid.set(ox as u64, oy as u64, tile.sample(sx, sy));
            }
        }

        covered += ((dx2 - dx1) * (dy2 - dy1)) as u64;
    }

    let grid = output.ok_or(LayerError::IncompleteCoverage { got: 0, want: 1 })?;
    let want = grid.dim() * grid.dim();
    if covered < want {
        return Err(LayerError::IncompleteCoverage { got: covered, want });
    }
    Ok(grid)
}
