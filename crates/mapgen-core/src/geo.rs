//! Geographic and pixel-space primitives.
//!
//! Two coordinate worlds meet here:
//!
//! - **lon/lat degrees** — what the survey datasets speak.  `Coords`
//!   describes a square region of interest; `GeoTransform` + `centered_box`
//!   locate that region inside a raster; `AffineTransform` maps vector
//!   features into pixel space.
//! - **pixel space** — the `2^max_depth × 2^max_depth` grid the quadtree and
//!   the network builder operate in.  `MapPoint` is an `f64` point in that
//!   space; `CoordKey` is its rounded, hashable form.
//!
//! Anything beyond these simple affine relationships (projections, datum
//! shifts) is the responsibility of the external dataset readers.

use serde::Deserialize;

use crate::{CoreError, CoreResult};

/// Kilometers per degree of latitude (and of longitude at the equator).
pub const EQ_KM_PER_DEG: f64 = 111.0;

// ── MapPoint ──────────────────────────────────────────────────────────────────

/// A point in pixel space, stored as double-precision floats.
///
/// Pixel space runs from `(0, 0)` to `(max_dim, max_dim)` with y growing
/// downward (raster convention).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance_sq(self, other: MapPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn distance(self, other: MapPoint) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Squared distance from `self` to the line segment `a`–`b`.
    ///
    /// Used by the nearest-segment index; cheap rejection happens on the
    /// squared value, so no square root is taken.
    pub fn distance_sq_to_segment(self, a: MapPoint, b: MapPoint) -> f64 {
        let (abx, aby) = (b.x - a.x, b.y - a.y);
        let len_sq = abx * abx + aby * aby;
        if len_sq == 0.0 {
            return self.distance_sq(a);
        }
        let t = (((self.x - a.x) * abx + (self.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
        self.distance_sq(MapPoint::new(a.x + t * abx, a.y + t * aby))
    }

    /// Whether the point lies inside the closed square `[0, max_dim]²`.
    #[inline]
    pub fn in_bounds(self, max_dim: f64) -> bool {
        0.0 <= self.x && self.x <= max_dim && 0.0 <= self.y && self.y <= max_dim
    }

    /// The rounded, hashable form of this point.
    #[inline]
    pub fn key(self) -> CoordKey {
        CoordKey::from_point(self)
    }
}

impl std::fmt::Display for MapPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.x, self.y)
    }
}

impl From<(f64, f64)> for MapPoint {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

// ── CoordKey ──────────────────────────────────────────────────────────────────

/// A `MapPoint` rounded to 6 decimal places and scaled to integers.
///
/// Rounding before comparing lets small floating-point discrepancies between
/// supposedly-shared way endpoints be ignored, and makes the coordinate
/// usable as a hash-map key.  6 decimals is far more precision than a map
/// unit warrants.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct CoordKey(pub i64, pub i64);

const KEY_SCALE: f64 = 1_000_000.0;

impl CoordKey {
    #[inline]
    pub fn from_point(p: MapPoint) -> Self {
        CoordKey((p.x * KEY_SCALE).round() as i64, (p.y * KEY_SCALE).round() as i64)
    }

    /// Recover the (rounded) point this key represents.
    #[inline]
    pub fn to_point(self) -> MapPoint {
        MapPoint::new(self.0 as f64 / KEY_SCALE, self.1 as f64 / KEY_SCALE)
    }
}

impl std::fmt::Display for CoordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = self.to_point();
        write!(f, "({:.6}, {:.6})", p.x, p.y)
    }
}

// ── Coords ────────────────────────────────────────────────────────────────────

/// The square region of interest: a center in degrees plus a radius in
/// meters.
#[derive(Copy, Clone, Debug)]
pub struct Coords {
    pub lat: f64,
    pub lon: f64,
    /// Half the side length of the region, in meters.
    pub radius_m: f64,
}

impl Coords {
    pub fn new(lat: f64, lon: f64, radius_m: f64) -> Self {
        Self { lat, lon, radius_m }
    }

    /// Radius in degrees of longitude, corrected for the curvature of the
    /// earth at this latitude.
    pub fn lon_radius(&self) -> f64 {
        self.radius_m / 1000.0 / EQ_KM_PER_DEG / self.lat.to_radians().cos()
    }

    /// Radius in degrees of latitude.
    pub fn lat_radius(&self) -> f64 {
        self.radius_m / 1000.0 / EQ_KM_PER_DEG
    }

    /// Degree bounds of the region as `(min_lon, min_lat, max_lon, max_lat)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.lon - self.lon_radius(),
            self.lat - self.lat_radius(),
            self.lon + self.lon_radius(),
            self.lat + self.lat_radius(),
        )
    }
}

/// Parse a `"37.77N"` / `"122.41W"` latitude/longitude pair into signed
/// degrees.
///
/// # Errors
///
/// Returns [`CoreError::Parse`] when the hemisphere suffix is missing or the
/// numeric part does not parse.
pub fn parse_lat_lon(lat: &str, lon: &str) -> CoreResult<(f64, f64)> {
    fn parse_one(s: &str, pos: char, neg: char) -> CoreResult<f64> {
        let Some((idx, suffix)) = s.char_indices().last() else {
            return Err(CoreError::Parse("empty coordinate".into()));
        };
        let value: f64 = s[..idx]
            .parse()
            .map_err(|_| CoreError::Parse(format!("bad coordinate: '{s}'")))?;
        if suffix == pos {
            Ok(value)
        } else if suffix == neg {
            Ok(-value)
        } else {
            Err(CoreError::Parse(format!(
                "coordinate '{s}' must end in '{pos}' or '{neg}'"
            )))
        }
    }

    Ok((parse_one(lat, 'N', 'S')?, parse_one(lon, 'E', 'W')?))
}

// ── Raster windows ────────────────────────────────────────────────────────────

/// Round up or down to the nearest power of two.
pub fn round_to_pow2(x: f64, up: bool) -> u64 {
    let exp = if up { x.log2().ceil() } else { x.log2().floor() };
    2f64.powf(exp) as u64
}

/// The affine georeference of one raster file: origin plus per-pixel
/// resolution (degrees).  Rotation terms are unsupported by the simple
/// interface and omitted.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct GeoTransform {
    pub lon_min: f64,
    pub lon_res: f64,
    pub lat_min: f64,
    pub lat_res: f64,
}

impl GeoTransform {
    /// Per-pixel resolution pair, used to detect mismatched raster tiles.
    #[inline]
    pub fn resolution(&self) -> (f64, f64) {
        (self.lat_res, self.lon_res)
    }
}

/// Pixel window of `coords` inside a raster described by `transform`,
/// returned as `((x1, y1), (x2, y2))`.
///
/// # Panics
///
/// Panics when the center is outside the valid degree ranges — the request
/// itself is malformed, not the data.
pub fn centered_box(coords: &Coords, transform: &GeoTransform) -> ((i64, i64), (i64, i64)) {
    assert!((-180.0..180.0).contains(&coords.lon), "bad longitude {}", coords.lon);
    assert!((-90.0..=90.0).contains(&coords.lat), "bad latitude {}", coords.lat);

    let lon_px = ((coords.lon - transform.lon_min) / transform.lon_res).floor() as i64;
    let lat_px = ((coords.lat - transform.lat_min) / transform.lat_res).floor() as i64;
    let lon_rad = (coords.lon_radius() / transform.lon_res.abs()) as i64;
    let lat_rad = (coords.lat_radius() / transform.lat_res.abs()) as i64;

    (
        (lon_px - lon_rad, lat_px - lat_rad),
        (lon_px + lon_rad, lat_px + lat_rad),
    )
}

// ── AffineTransform ───────────────────────────────────────────────────────────

/// A 6-coefficient 2-D affine transform:
///
/// ```text
/// x' = a·x + b·y + xoff
/// y' = d·x + e·y + yoff
/// ```
///
/// Used to map vector features from lon/lat into pixel space.  This is the
/// whole of the projection math the generator carries; real reprojection
/// happens upstream.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub d: f64,
    pub e: f64,
    pub xoff: f64,
    pub yoff: f64,
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        a: 1.0,
        b: 0.0,
        d: 0.0,
        e: 1.0,
        xoff: 0.0,
        yoff: 0.0,
    };

    /// Scale-and-translate transform taking the degree bounds of `coords`
    /// onto the pixel square `[0, max_dim]²`, with y flipped so north is up
    /// in raster orientation.
    pub fn lonlat_to_pixels(coords: &Coords, max_dim: u64) -> Self {
        let (min_lon, min_lat, max_lon, max_lat) = coords.bounds();
        let dim = max_dim as f64;
        let xscale = dim / (max_lon - min_lon);
        let yscale = dim / (max_lat - min_lat);

        let to_pixels = AffineTransform {
            a: xscale,
            b: 0.0,
            d: 0.0,
            e: yscale,
            xoff: -min_lon * xscale,
            yoff: -min_lat * yscale,
        };
        // flip to raster orientation: y grows downward
        let flip = AffineTransform {
            a: 1.0,
            b: 0.0,
            d: 0.0,
            e: -1.0,
            xoff: 0.0,
            yoff: dim,
        };
        flip.compose(&to_pixels)
    }

    /// The transform applying `other` first, then `self`.
    pub fn compose(&self, other: &AffineTransform) -> AffineTransform {
        AffineTransform {
            a: self.a * other.a + self.b * other.d,
            b: self.a * other.b + self.b * other.e,
            d: self.d * other.a + self.e * other.d,
            e: self.d * other.b + self.e * other.e,
            xoff: self.a * other.xoff + self.b * other.yoff + self.xoff,
            yoff: self.d * other.xoff + self.e * other.yoff + self.yoff,
        }
    }

    #[inline]
    pub fn apply(&self, p: MapPoint) -> MapPoint {
        MapPoint::new(
            self.a * p.x + self.b * p.y + self.xoff,
            self.d * p.x + self.e * p.y + self.yoff,
        )
    }
}
