//! Route stitching: ordered relation members → one oriented segment chain.
//!
//! A route relation lists member ways in travel order.  Each way maps to
//! the set of segments that absorbed it (more than one when node insertion
//! split the way); consecutive duplicate sets collapse.  Every set is
//! linearized into a chain between its two loose endpoints, then oriented
//! against the chain stitched so far — directly, by retro-reversing the
//! first run, or through the turnaround splice for out-and-back
//! geometries.  A run that fits none of those goes through the
//! per-network [`BrokenLinePolicy`].

use std::collections::BTreeMap;

use mapgen_core::{CoordKey, SegmentId};

use crate::builder::NetworkBuilder;
use crate::types::{NetworkConsumer, RouteMember};
use crate::{NetworkError, NetworkResult};

/// What to do with a route whose runs cannot be oriented.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum BrokenLinePolicy {
    /// Abort with a [`NetworkError::BrokenLine`] carrying full context.
    #[default]
    Fail,
    /// Log a warning and drop the whole route.
    Skip,
}

impl<C: NetworkConsumer> NetworkBuilder<C> {
    /// Stitch one ordered route into an oriented list of live segment ids.
    ///
    /// Returns `Ok(None)` when the route has no in-bounds members or was
    /// dropped under [`BrokenLinePolicy::Skip`].  Requires
    /// [`track_way_segments`](NetworkBuilder::track_way_segments).
    ///
    /// # Panics
    ///
    /// Panics when a member's segment run is not a simple open chain
    /// (degree violations, zero or more than two loose endpoints) — that
    /// is malformed topology, not a recoverable orientation problem.
    pub fn stitch_route(
        &self,
        route_index: usize,
        members: &[RouteMember],
        policy: BrokenLinePolicy,
    ) -> NetworkResult<Option<Vec<SegmentId>>> {
        // member ways → collapsed segment-id sets
        let mut segment_sets: Vec<Vec<SegmentId>> = Vec::new();
        for member in members {
            let RouteMember::Way(way) = member else {
                continue; // stops enter the graph through node insertion
            };
            let Some(set) = self.way_segment_ids(*way) else {
                continue; // way fell outside the region of interest
            };
            let set: Vec<SegmentId> = set.iter().copied().collect();
            if segment_sets.last() != Some(&set) {
                segment_sets.push(set);
            }
        }
        if segment_sets.is_empty() {
            return Ok(None);
        }

        let mut stitched: Vec<SegmentId> = Vec::new();

        for (set_index, set) in segment_sets.iter().enumerate() {
            let chain = self.linearize(set);

            if stitched.is_empty() {
                // no reference point yet; orientation is fixed up at i == 1
                // if this guess turns out wrong
                stitched.extend(&chain);
                continue;
            }

            let touches = |a: SegmentId, b: SegmentId| {
                let b = self.segment(b);
                let a = self.segment(a);
                a.has_endpoint(b.start().key()) || a.has_endpoint(b.end().key())
            };

            let last = *stitched.last().unwrap();
            let head = chain[0];
            let tail = *chain.last().unwrap();
            let prev_len = segment_sets[set_index - 1].len();

            if touches(last, head) {
                stitched.extend(&chain);
            } else if touches(last, tail) {
                stitched.extend(chain.iter().rev());
            } else if set_index == 1 && touches(stitched[0], head) {
                // the first run was stitched backwards
                stitched.reverse();
                stitched.extend(&chain);
            } else if set_index == 1 && touches(stitched[0], tail) {
                stitched.reverse();
                stitched.extend(chain.iter().rev());
            } else if prev_len <= stitched.len()
                && touches(stitched[stitched.len() - prev_len], head)
            {
                // turnaround: ride the previous run back out, minus its tip
                let back: Vec<SegmentId> =
                    stitched[stitched.len() - prev_len..stitched.len() - 1]
                        .iter()
                        .rev()
                        .copied()
                        .collect();
                stitched.extend(back);
                stitched.extend(&chain);
            } else if prev_len <= stitched.len()
                && touches(stitched[stitched.len() - prev_len], tail)
            {
                let back: Vec<SegmentId> =
                    stitched[stitched.len() - prev_len..stitched.len() - 1]
                        .iter()
                        .rev()
                        .copied()
                        .collect();
                stitched.extend(back);
                stitched.extend(chain.iter().rev());
            } else {
                match policy {
                    BrokenLinePolicy::Skip => {
                        log::warn!(
                            "skipping broken route {route_index}: segment set {set_index} \
                             cannot be oriented against the stitched chain"
                        );
                        return Ok(None);
                    }
                    BrokenLinePolicy::Fail => {
                        return Err(NetworkError::BrokenLine {
                            route_index,
                            set_index,
                            prev_endpoints: self.describe_segments(&[last]),
                            stitched: self.describe_segments(&stitched),
                            segments: self.describe_segments(set),
                            linearized: self.describe_segments(&chain),
                        });
                    }
                }
            }
        }

        Ok(Some(stitched))
    }

    /// Order one segment set into a chain between its two loose endpoints.
    fn linearize(&self, set: &[SegmentId]) -> Vec<SegmentId> {
        assert!(!set.is_empty());

        // endpoint → incident segments within the set
        let mut incidence: BTreeMap<CoordKey, Vec<SegmentId>> = BTreeMap::new();
        for &id in set {
            let segment = self.segment(id);
            incidence.entry(segment.start().key()).or_default().push(id);
            incidence.entry(segment.end().key()).or_default().push(id);
        }

        let mut loose_ends: Vec<CoordKey> = Vec::new();
        for (key, incident) in &incidence {
            assert!(
                incident.len() <= 2,
                "point {} shared by {} segments of one run",
                key.to_point(),
                incident.len()
            );
            if incident.len() == 1 {
                loose_ends.push(*key);
            }
        }
        assert!(
            loose_ends.len() == 2,
            "segment run has {} loose endpoints, expected 2",
            loose_ends.len()
        );

        let mut current = loose_ends[0];
        let mut chain = vec![incidence[&current][0]];
        loop {
            let last = *chain.last().unwrap();
            let segment = self.segment(last);
            let (start, end) = (segment.start().key(), segment.end().key());
            let next_point = if start == current { end } else { start };

            match incidence[&next_point].iter().copied().find(|&id| id != last) {
                Some(next) => {
                    chain.push(next);
                    current = next_point;
                }
                None => {
                    assert!(loose_ends.contains(&next_point), "walk escaped the run");
                    break;
                }
            }
        }
        assert!(
            chain.len() == set.len(),
            "linearized {} of {} segments — the run is not a single chain",
            chain.len(),
            set.len()
        );
        chain
    }

    fn describe_segments(&self, ids: &[SegmentId]) -> String {
        let parts: Vec<String> = ids
            .iter()
            .map(|&id| {
                let segment = self.segment(id);
                format!(
                    "{id}: {} -> {} ({} pts, ways {:?})",
                    segment.start(),
                    segment.end(),
                    segment.points.len(),
                    segment.way_ids,
                )
            })
            .collect();
        parts.join("; ")
    }
}
