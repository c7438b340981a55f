//! The network builder: ways → segments → junctions → baked handles.
//!
//! # Algorithm
//!
//! 1. Index rounded way endpoints into an (incoming, outgoing) map;
//!    bidirectional ways register both directions.
//! 2. Any coordinate whose degree differs from exactly (1 in, 1 out) is a
//!    junction — a real intersection or a dead end.
//! 3. From every junction, walk each outgoing way through pass-through
//!    coordinates, concatenating geometry into one segment until the
//!    attribute data changes, the clip window is left, or the next
//!    junction is reached.  Walking only outgoing ways guarantees each
//!    edge is traversed once.  Closed loops reachable from no junction are
//!    never visited and drop out silently — a documented limitation.
//! 4. Prune short dead-end spurs (best effort).
//! 5. Splice point features into the nearest segment via an R-tree,
//!    splitting segments at interior vertices.
//! 6. Bake every live leaf segment and its two junctions into external
//!    handles, memoized so each junction bakes once.

use std::collections::BTreeSet;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use mapgen_core::{CoordKey, GeneratorConfig, MapPoint, SegmentId, WayId};

use crate::types::{InputWay, Junction, NetworkConsumer, Segment};

/// Segments shorter than this (map units) with loose ends on both sides
/// are considered noise and pruned.
const SPUR_LENGTH: f64 = 2000.0;

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// Spatial-index entry: one segment's polyline, envelope plus exact
/// point-to-polyline distance.
struct SegmentEntry {
    id: SegmentId,
    points: Vec<MapPoint>,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let corners: Vec<[f64; 2]> = self.points.iter().map(|p| [p.x, p.y]).collect();
        AABB::from_points(corners.iter())
    }
}

impl PointDistance for SegmentEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let p = MapPoint::new(point[0], point[1]);
        if self.points.len() == 1 {
            return p.distance_sq(self.points[0]);
        }
        self.points
            .windows(2)
            .map(|w| p.distance_sq_to_segment(w[0], w[1]))
            .fold(f64::INFINITY, f64::min)
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Builds one network's junction/segment graph from a [`NetworkConsumer`].
pub struct NetworkBuilder<C: NetworkConsumer> {
    consumer: C,
    max_dim: f64,
    min_tile_size: f64,
    track_way_segments: bool,

    segments: Vec<Segment<C::SegmentData, C::Handle>>,
    junctions: FxHashMap<CoordKey, Junction<C::NodeData, C::Handle>>,
    /// Way id → the live segment ids that absorbed it.  Only maintained
    /// when enabled; route stitching requires it.
    way_segments: FxHashMap<WayId, BTreeSet<SegmentId>>,
}

impl<C: NetworkConsumer> NetworkBuilder<C> {
    pub fn new(consumer: C, config: &GeneratorConfig) -> Self {
        Self {
            consumer,
            max_dim: config.max_dim() as f64,
            min_tile_size: config.min_tile_size as f64,
            track_way_segments: false,
            segments: Vec::new(),
            junctions: FxHashMap::default(),
            way_segments: FxHashMap::default(),
        }
    }

    /// Maintain the way → segment map needed by route stitching.
    ///
    /// Incompatible with bidirectional ways: the map assumes each way id
    /// is absorbed along a single traversal direction.
    pub fn track_way_segments(mut self) -> Self {
        self.track_way_segments = true;
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }

    pub fn segment(&self, id: SegmentId) -> &Segment<C::SegmentData, C::Handle> {
        &self.segments[id.index()]
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// IDs of all live leaf segments, in arena order.
    pub fn live_segments(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_live())
            .map(|(i, _)| SegmentId(i as u32))
    }

    pub fn junction(&self, key: CoordKey) -> Option<&Junction<C::NodeData, C::Handle>> {
        self.junctions.get(&key)
    }

    pub fn junction_count(&self) -> usize {
        self.junctions.len()
    }

    pub fn way_segment_ids(&self, way: WayId) -> Option<&BTreeSet<SegmentId>> {
        self.way_segments.get(&way)
    }

    /// Resolve a (possibly split) segment id down through the split tree
    /// to all live leaves underneath it.
    pub fn split_leaves(&self, id: SegmentId) -> Vec<SegmentId> {
        let mut leaves = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.segments[current.index()].split {
                Some((a, b)) => {
                    // push b first so leaves come out in geometric order
                    stack.push(b);
                    stack.push(a);
                }
                None => leaves.push(current),
            }
        }
        leaves
    }

    // ── Build ─────────────────────────────────────────────────────────────

    /// Run the full construction: trace ways into segments, prune spurs,
    /// splice in point features.
    pub fn build(&mut self) {
        self.trace_ways();
        self.prune_spurs();
        self.insert_nodes();
    }

    /// Steps 1–3: weld ways into maximal attribute-consistent segments.
    fn trace_ways(&mut self) {
        let ways = self.consumer.ways();

        // (incoming, outgoing) way indices per rounded coordinate, plus
        // first-seen coordinate order so junction discovery is
        // deterministic.
        let mut coord_map: FxHashMap<CoordKey, (Vec<usize>, Vec<usize>)> = FxHashMap::default();
        let mut coord_order: Vec<CoordKey> = Vec::new();

        for (i, way) in ways.iter().enumerate() {
            if way.points.len() < 2 {
                continue;
            }
            let first = way.points[0].key();
            let last = way.points[way.points.len() - 1].key();
            if first == last {
                // a self-loop has no usable boundary
                continue;
            }
            for key in [first, last] {
                if !coord_map.contains_key(&key) {
                    coord_map.insert(key, (Vec::new(), Vec::new()));
                    coord_order.push(key);
                }
            }
            coord_map.get_mut(&first).unwrap().1.push(i);
            coord_map.get_mut(&last).unwrap().0.push(i);
            if way.bidirectional {
                coord_map.get_mut(&first).unwrap().0.push(i);
                coord_map.get_mut(&last).unwrap().1.push(i);
            }
        }

        // junctions and dead ends: anything but a simple pass-through
        let junction_keys: Vec<CoordKey> = coord_order
            .into_iter()
            .filter(|key| {
                let (ins, outs) = &coord_map[key];
                ins.len() != 1 || outs.len() != 1
            })
            .collect();

        for junction_key in junction_keys {
            // walking only diverging ways avoids counting an edge twice
            let outgoing = coord_map[&junction_key].1.clone();
            for start in outgoing {
                self.walk_from(&ways, &coord_map, junction_key, start);
            }
        }
    }

    /// Follow one outgoing way from a junction to the next junction,
    /// flushing a segment whenever the attribute data changes or the walk
    /// leaves the clip window.
    fn walk_from(
        &mut self,
        ways: &[InputWay<C::SegmentData>],
        coord_map: &FxHashMap<CoordKey, (Vec<usize>, Vec<usize>)>,
        start_point: CoordKey,
        start_way: usize,
    ) {
        let mut points: Vec<MapPoint> = Vec::new();
        let mut way_ids: Vec<WayId> = Vec::new();
        let mut prev_data: Option<C::SegmentData> = None;

        let mut border = start_point;
        let mut current = start_way;

        loop {
            let way = &ways[current];
            let first = way.points[0].key();
            let last = way.points[way.points.len() - 1].key();

            // ways are occasionally stored flipped relative to the walk
            let coords: Vec<MapPoint> = if first == border {
                border = last;
                way.points.clone()
            } else if last == border {
                border = first;
                way.points.iter().rev().copied().collect()
            } else {
                panic!(
                    "way {} cannot be reconciled with border point {}: endpoints {} / {}",
                    way.id,
                    border.to_point(),
                    first.to_point(),
                    last.to_point(),
                );
            };

            if coords.iter().any(|p| !p.in_bounds(self.max_dim)) {
                // truncate at the region boundary; the way itself is
                // dropped rather than split in two
                self.flush_segment(&mut points, &prev_data, &mut way_ids);
            } else {
                if prev_data.as_ref().is_some_and(|prev| *prev != way.data) {
                    // attribute run ends here
                    self.flush_segment(&mut points, &prev_data, &mut way_ids);
                }
                // the border vertex is shared with the previous way
                let skip_shared = points
                    .last()
                    .zip(coords.first())
                    .is_some_and(|(a, b)| a.key() == b.key());
                points.extend(coords.into_iter().skip(usize::from(skip_shared)));
                way_ids.push(way.id);
                prev_data = Some(way.data.clone());
            }

            let (ins, outs) = &coord_map[&border];
            if ins.len() != 1 || outs.len() != 1 {
                break;
            }
            // pass-through: keep following the line
            current = outs[0];
        }

        if prev_data.is_some() {
            self.flush_segment(&mut points, &prev_data, &mut way_ids);
        }
    }

    /// Commit the collected run as one segment (no-op when empty).
    fn flush_segment(
        &mut self,
        points: &mut Vec<MapPoint>,
        data: &Option<C::SegmentData>,
        way_ids: &mut Vec<WayId>,
    ) {
        if points.is_empty() {
            // everything fell outside the region of interest
            way_ids.clear();
            return;
        }
        let data = data.as_ref().expect("segment points without data").clone();
        let id = SegmentId(self.segments.len() as u32);

        if self.track_way_segments {
            if way_ids.iter().any(|w| self.way_segments.contains_key(w)) {
                // this way already belongs to another segment; keep the
                // first claim and abandon this run entirely
                assert!(way_ids.len() == 1, "duplicate way id inside a multi-way segment");
                points.clear();
                way_ids.clear();
                return;
            }
            for way in way_ids.iter() {
                self.way_segments.entry(*way).or_default().insert(id);
            }
        }

        self.segments.push(Segment {
            points: std::mem::take(points),
            data,
            way_ids: std::mem::take(way_ids),
            split: None,
            handle: None,
            pruned: false,
        });
    }

    /// Step 4: drop very short segments that connect to nothing on either
    /// side.  Best effort — longer disconnected chains survive.
    fn prune_spurs(&mut self) {
        let mut degree: FxHashMap<CoordKey, u32> = FxHashMap::default();
        for segment in &self.segments {
            *degree.entry(segment.start().key()).or_insert(0) += 1;
            *degree.entry(segment.end().key()).or_insert(0) += 1;
        }

        for index in 0..self.segments.len() {
            let segment = &self.segments[index];
            let loose = degree[&segment.start().key()] == 1 && degree[&segment.end().key()] == 1;
            if loose && segment.length() < SPUR_LENGTH {
                let id = SegmentId(index as u32);
                let way_ids = self.segments[index].way_ids.clone();
                self.segments[index].pruned = true;
                for way in way_ids {
                    if let Some(set) = self.way_segments.get_mut(&way) {
                        set.remove(&id);
                        if set.is_empty() {
                            self.way_segments.remove(&way);
                        }
                    }
                }
            }
        }
    }

    /// Step 5: splice point features into the nearest segment vertex.
    fn insert_nodes(&mut self) {
        let entries: Vec<SegmentEntry> = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_live())
            .map(|(i, s)| SegmentEntry { id: SegmentId(i as u32), points: s.points.clone() })
            .collect();
        let index = RTree::bulk_load(entries);

        for node in self.consumer.nodes() {
            let location = node.location;
            let Some(entry) = index.nearest_neighbor(&[location.x, location.y]) else {
                continue; // no segments at all
            };

            // the index predates splits: resolve to the live leaf by
            // walking the split tree toward the nearer child
            let mut seg_id = entry.id;
            while let Some((a, b)) = self.segments[seg_id.index()].split {
                let da = self.segments[a.index()].nearest_vertex(location).1;
                let db = self.segments[b.index()].nearest_vertex(location).1;
                seg_id = if da < db { a } else { b };
            }

            let (vertex_index, dist_sq) = self.segments[seg_id.index()].nearest_vertex(location);
            let dist = dist_sq.sqrt();
            if dist * self.min_tile_size > node.max_dist {
                continue; // too far from any line to attach
            }

            let vertex = self.segments[seg_id.index()].points[vertex_index];
            let key = vertex.key();

            let len = self.segments[seg_id.index()].points.len();
            if vertex_index > 0 && vertex_index < len - 1 {
                self.split_segment(seg_id, vertex_index);
            }
            // an existing endpoint needs no split — the junction is there
            // already; either way, record the node (last claim wins)
            self.junctions
                .insert(key, Junction { location: vertex, data: node.data, handle: None });
        }
    }

    /// Split a live segment at an interior vertex into two children
    /// sharing its data and way ids.
    fn split_segment(&mut self, id: SegmentId, vertex_index: usize) {
        let parent = &self.segments[id.index()];
        debug_assert!(parent.is_live(), "splitting an inert segment");

        // split segments inherit all of the parent's ways: a line taking
        // one half of a split way is assumed to take the other half too
        let a = Segment {
            points: parent.points[..=vertex_index].to_vec(),
            data: parent.data.clone(),
            way_ids: parent.way_ids.clone(),
            split: None,
            handle: None,
            pruned: false,
        };
        let b = Segment {
            points: parent.points[vertex_index..].to_vec(),
            data: parent.data.clone(),
            way_ids: parent.way_ids.clone(),
            split: None,
            handle: None,
            pruned: false,
        };

        let a_id = SegmentId(self.segments.len() as u32);
        let b_id = SegmentId(self.segments.len() as u32 + 1);
        let way_ids = parent.way_ids.clone();

        self.segments.push(a);
        self.segments.push(b);
        self.segments[id.index()].split = Some((a_id, b_id));

        if self.track_way_segments {
            for way in way_ids {
                let set = self.way_segments.entry(way).or_default();
                set.remove(&id);
                set.insert(a_id);
                set.insert(b_id);
            }
        }
    }

    // ── Bake ──────────────────────────────────────────────────────────────

    /// Step 6: commit every live leaf segment (and its two junctions,
    /// memoized per coordinate) to the external state store, writing the
    /// returned handles back onto the graph.
    pub fn bake(&mut self, state: &mut C::State) {
        let mut handles: FxHashMap<CoordKey, C::Handle> = FxHashMap::default();

        for index in 0..self.segments.len() {
            if !self.segments[index].is_live() {
                continue;
            }
            let (start, end) = self.segments[index].endpoints();
            let start_handle = self.junction_handle(&mut handles, state, start);
            let end_handle = self.junction_handle(&mut handles, state, end);

            let handle = self.consumer.bake_segment(
                &self.segments[index].data,
                state,
                start_handle,
                end_handle,
                &self.segments[index].points,
            );
            self.segments[index].handle = Some(handle);
        }
    }

    fn junction_handle(
        &mut self,
        handles: &mut FxHashMap<CoordKey, C::Handle>,
        state: &mut C::State,
        point: MapPoint,
    ) -> C::Handle {
        let key = point.key();
        if let Some(handle) = handles.get(&key) {
            return *handle;
        }
        assert!(
            point.in_bounds(self.max_dim),
            "junction {point} outside the {} map window",
            self.max_dim
        );

        let data = self.junctions.get(&key).map(|node| &node.data);
        let handle = self.consumer.bake_junction(data, state, point);
        handles.insert(key, handle);
        if let Some(node) = self.junctions.get_mut(&key) {
            node.handle = Some(handle);
        }
        handle
    }
}
