//! Graph and input types, and the consumer trait that plugs a network
//! into its datasets and external state store.

use mapgen_core::{CoordKey, MapPoint, SegmentId, WayId};

// ── Inputs ────────────────────────────────────────────────────────────────────

/// One source polyline feature.
///
/// `data` is the way's attribute payload; segments break wherever it
/// changes between consecutive ways, so it must have structural equality.
#[derive(Clone, Debug)]
pub struct InputWay<D> {
    pub id: WayId,
    pub points: Vec<MapPoint>,
    /// Register the reverse direction too (undirected roads).
    pub bidirectional: bool,
    pub data: D,
}

/// One point feature to splice into the nearest segment (a station, a
/// ramp, …).
#[derive(Clone, Debug)]
pub struct InputNode<D> {
    pub location: MapPoint,
    /// Maximum snap distance in meters; farther nodes are dropped.
    pub max_dist: f64,
    pub data: D,
}

/// One member of an ordered route relation.  Stops are carried for
/// completeness but the stitcher only consumes ways — stop geometry enters
/// the graph through node insertion instead.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RouteMember {
    Way(WayId),
    Stop(i64),
}

// ── Graph elements ────────────────────────────────────────────────────────────

/// A maximal attribute-consistent polyline run between two junctions.
///
/// Segments live in the builder's arena and are addressed by [`SegmentId`].
/// Splitting never mutates geometry in place: the parent gets a `split`
/// record pointing at two child IDs and goes inert, staying reachable so
/// stale references can be resolved to the live leaves.
#[derive(Clone, Debug)]
pub struct Segment<D, H> {
    pub points: Vec<MapPoint>,
    pub data: D,
    /// Every source way this segment absorbed.
    pub way_ids: Vec<WayId>,
    /// Binary split record; `Some` means this segment is inert.
    pub split: Option<(SegmentId, SegmentId)>,
    /// External handle, assigned once when the segment is baked.
    pub handle: Option<H>,
    pub(crate) pruned: bool,
}

impl<D, H> Segment<D, H> {
    pub fn start(&self) -> MapPoint {
        self.points[0]
    }

    pub fn end(&self) -> MapPoint {
        *self.points.last().expect("segment without points")
    }

    pub fn endpoints(&self) -> (MapPoint, MapPoint) {
        (self.start(), self.end())
    }

    pub fn has_endpoint(&self, key: CoordKey) -> bool {
        self.start().key() == key || self.end().key() == key
    }

    /// Polyline length in map units.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// A live leaf: neither split nor pruned, so it is part of the final
    /// graph and will be baked.
    pub fn is_live(&self) -> bool {
        self.split.is_none() && !self.pruned
    }

    /// Index and squared distance of the vertex nearest to `p`.
    pub(crate) fn nearest_vertex(&self, p: MapPoint) -> (usize, f64) {
        let mut best = (0, f64::INFINITY);
        for (i, point) in self.points.iter().enumerate() {
            let d = p.distance_sq(*point);
            if d < best.1 {
                best = (i, d);
            }
        }
        best
    }
}

/// A graph node: a rounded coordinate with optional attached data, formed
/// by way intersections or explicit node insertion.
#[derive(Clone, Debug)]
pub struct Junction<D, H> {
    pub location: MapPoint,
    pub data: D,
    /// External handle, assigned once when an adjacent segment bakes.
    pub handle: Option<H>,
}

// ── NetworkConsumer ───────────────────────────────────────────────────────────

/// The capability set a network implementation plugs into the builder.
///
/// One implementation per network kind (highways, railways, …) supplies
/// the input features and converts finished graph elements into handles of
/// the external state store.  `bake_*` hooks are called exactly once per
/// junction coordinate and once per live leaf segment.
pub trait NetworkConsumer {
    /// Per-segment attribute payload.  Structural equality decides where
    /// attribute-consistent runs break.
    type SegmentData: Clone + PartialEq + std::fmt::Debug;

    /// Payload attached to inserted nodes (station metadata, ramp
    /// direction, …).
    type NodeData: std::fmt::Debug;

    /// The external state store.
    type State;

    /// Handle type the store assigns to baked elements.
    type Handle: Copy;

    /// Ways to weld into segments, filtered to the region of interest.
    fn ways(&mut self) -> Vec<InputWay<Self::SegmentData>>;

    /// Point features to splice in as extra junctions.  (Most junctions
    /// are implied by way intersections.)
    fn nodes(&mut self) -> Vec<InputNode<Self::NodeData>>;

    /// Commit one junction to the store.  `data` is present only when an
    /// inserted node resolved to this coordinate.
    fn bake_junction(
        &mut self,
        data: Option<&Self::NodeData>,
        state: &mut Self::State,
        point: MapPoint,
    ) -> Self::Handle;

    /// Commit one segment to the store.
    fn bake_segment(
        &mut self,
        data: &Self::SegmentData,
        state: &mut Self::State,
        start: Self::Handle,
        end: Self::Handle,
        points: &[MapPoint],
    ) -> Self::Handle;
}
