//! Unit tests for mapgen-network.
//!
//! All tests run on hand-crafted ways in a 4096-unit map window
//! (max_depth 12), with coordinates scaled so deliberate segments clear
//! the spur-pruning threshold.

#[cfg(test)]
mod helpers {
    use mapgen_core::{GeneratorConfig, MapPoint, WayId};

    use crate::types::{InputNode, InputWay, NetworkConsumer};
    use crate::NetworkBuilder;

    /// Segment attribute data: a plain comparable tag.
    #[derive(Clone, PartialEq, Debug)]
    pub struct Tag(pub u32);

    /// Node attribute data: a station name.
    #[derive(Clone, Debug)]
    pub struct Station(pub &'static str);

    /// Recording state store; handles are indices into these vecs.
    #[derive(Default)]
    pub struct TestState {
        /// (location, attached station name)
        pub junctions: Vec<(MapPoint, Option<&'static str>)>,
        /// (tag, start handle, end handle, point count)
        pub segments: Vec<(u32, usize, usize, usize)>,
    }

    pub struct TestNet {
        pub ways: Vec<InputWay<Tag>>,
        pub nodes: Vec<InputNode<Station>>,
    }

    impl NetworkConsumer for TestNet {
        type SegmentData = Tag;
        type NodeData = Station;
        type State = TestState;
        type Handle = usize;

        fn ways(&mut self) -> Vec<InputWay<Tag>> {
            self.ways.clone()
        }

        fn nodes(&mut self) -> Vec<InputNode<Station>> {
            self.nodes.clone()
        }

        fn bake_junction(
            &mut self,
            data: Option<&Station>,
            state: &mut TestState,
            point: MapPoint,
        ) -> usize {
            state.junctions.push((point, data.map(|s| s.0)));
            state.junctions.len() - 1
        }

        fn bake_segment(
            &mut self,
            data: &Tag,
            state: &mut TestState,
            start: usize,
            end: usize,
            points: &[MapPoint],
        ) -> usize {
            state.segments.push((data.0, start, end, points.len()));
            state.segments.len() - 1
        }
    }

    pub fn config() -> GeneratorConfig {
        GeneratorConfig { max_depth: 12, min_tile_size: 1, people_per_sim: 1000 }
    }

    pub fn p(x: f64, y: f64) -> MapPoint {
        MapPoint::new(x, y)
    }

    pub fn way(id: i64, points: &[(f64, f64)], tag: u32) -> InputWay<Tag> {
        InputWay {
            id: WayId(id),
            points: points.iter().map(|&(x, y)| p(x, y)).collect(),
            bidirectional: false,
            data: Tag(tag),
        }
    }

    pub fn bway(id: i64, points: &[(f64, f64)], tag: u32) -> InputWay<Tag> {
        InputWay { bidirectional: true, ..way(id, points, tag) }
    }

    pub fn node(x: f64, y: f64, max_dist: f64, name: &'static str) -> InputNode<Station> {
        InputNode { location: p(x, y), max_dist, data: Station(name) }
    }

    pub fn built(ways: Vec<InputWay<Tag>>, nodes: Vec<InputNode<Station>>) -> NetworkBuilder<TestNet> {
        let mut builder = NetworkBuilder::new(TestNet { ways, nodes }, &config());
        builder.build();
        builder
    }

    pub fn built_tracked(
        ways: Vec<InputWay<Tag>>,
        nodes: Vec<InputNode<Station>>,
    ) -> NetworkBuilder<TestNet> {
        let mut builder =
            NetworkBuilder::new(TestNet { ways, nodes }, &config()).track_way_segments();
        builder.build();
        builder
    }
}

// ── Way tracing ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tracing {
    use mapgen_core::WayId;

    use super::helpers::*;

    #[test]
    fn four_ways_diverge_from_one_intersection() {
        let center = (2048.0, 2048.0);
        let tips = [(2048.0, 1048.0), (3048.0, 2048.0), (2048.0, 3048.0), (1048.0, 2048.0)];
        let ways = tips
            .iter()
            .enumerate()
            .map(|(i, &tip)| way(i as i64 + 1, &[center, tip], 7))
            .collect();

        let builder = built(ways, vec![]);
        let live: Vec<_> = builder.live_segments().collect();
        assert_eq!(live.len(), 4);
        for (id, tip) in live.iter().zip(tips) {
            let segment = builder.segment(*id);
            assert_eq!(segment.start(), p(center.0, center.1));
            assert_eq!(segment.end(), p(tip.0, tip.1));
        }
    }

    #[test]
    fn attribute_consistent_chain_becomes_one_segment() {
        let ways = vec![
            way(1, &[(1000.0, 1000.0), (2000.0, 1000.0)], 7),
            way(2, &[(2000.0, 1000.0), (3000.0, 1000.0)], 7),
            way(3, &[(3000.0, 1000.0), (4000.0, 1000.0)], 7),
        ];
        let builder = built(ways, vec![]);

        let live: Vec<_> = builder.live_segments().collect();
        assert_eq!(live.len(), 1);
        let segment = builder.segment(live[0]);
        assert_eq!(segment.start(), p(1000.0, 1000.0));
        assert_eq!(segment.end(), p(4000.0, 1000.0));
        assert_eq!(segment.way_ids, vec![WayId(1), WayId(2), WayId(3)]);
        // shared border vertices are kept once
        assert_eq!(segment.points.len(), 4);
    }

    #[test]
    fn attribute_change_breaks_the_chain() {
        let ways = vec![
            way(1, &[(1000.0, 1000.0), (2000.0, 1000.0)], 7),
            way(2, &[(2000.0, 1000.0), (3000.0, 1000.0)], 7),
            way(3, &[(3000.0, 1000.0), (4000.0, 1000.0)], 8), // tag differs
        ];
        let builder = built(ways, vec![]);

        let live: Vec<_> = builder.live_segments().collect();
        assert_eq!(live.len(), 2);
        let first = builder.segment(live[0]);
        let second = builder.segment(live[1]);
        assert_eq!((first.start(), first.end()), (p(1000.0, 1000.0), p(3000.0, 1000.0)));
        assert_eq!(first.way_ids, vec![WayId(1), WayId(2)]);
        assert_eq!((second.start(), second.end()), (p(3000.0, 1000.0), p(4000.0, 1000.0)));
        assert_eq!(second.way_ids, vec![WayId(3)]);
    }

    #[test]
    fn out_of_bounds_ways_truncate_the_segment() {
        // max_dim is 4096; the second way leaves the window
        let ways = vec![
            way(1, &[(1000.0, 1000.0), (3500.0, 1000.0)], 7),
            way(2, &[(3500.0, 1000.0), (5000.0, 1000.0)], 7),
        ];
        let builder = built(ways, vec![]);

        let live: Vec<_> = builder.live_segments().collect();
        assert_eq!(live.len(), 1, "in-bounds prefix survives, the rest is cut");
        let segment = builder.segment(live[0]);
        assert_eq!(segment.end(), p(3500.0, 1000.0));
        assert_eq!(segment.way_ids, vec![WayId(1)]);
    }

    #[test]
    fn closed_loops_are_dropped() {
        // a self-loop way, and a two-way cycle with no third connection:
        // neither is reachable from any intersection
        let ways = vec![
            way(1, &[(1000.0, 1000.0), (1000.0, 3200.0), (1000.0, 1000.0)], 7),
            way(2, &[(2000.0, 1000.0), (2000.0, 3200.0)], 7),
            way(3, &[(2000.0, 3200.0), (2000.0, 1000.0)], 7),
        ];
        let builder = built(ways, vec![]);
        assert_eq!(builder.live_segments().count(), 0);
    }

    #[test]
    fn short_loose_spurs_are_pruned() {
        let ways = vec![
            way(1, &[(1000.0, 2000.0), (1100.0, 2000.0)], 7), // 100 units, loose
            way(2, &[(1000.0, 3000.0), (3500.0, 3000.0)], 7), // 2500 units, loose
        ];
        let builder = built(ways, vec![]);

        let live: Vec<_> = builder.live_segments().collect();
        assert_eq!(live.len(), 1);
        assert_eq!(builder.segment(live[0]).start(), p(1000.0, 3000.0));
    }

    #[test]
    fn bidirectional_endpoints_become_intersections() {
        // two chained bidirectional ways register both directions, so the
        // shared point has degree (2, 2) and the chain breaks there
        let ways = vec![
            bway(1, &[(1000.0, 1000.0), (2000.0, 1000.0)], 7),
            bway(2, &[(2000.0, 1000.0), (3000.0, 1000.0)], 7),
        ];
        let builder = built(ways, vec![]);

        let live: Vec<_> = builder.live_segments().collect();
        assert_eq!(live.len(), 2, "no segment spans the shared endpoint");
        for id in live {
            let ways_in_segment: std::collections::BTreeSet<_> =
                builder.segment(id).way_ids.iter().collect();
            assert_eq!(ways_in_segment.len(), 1, "each segment folds back along one way");
        }
    }
}

// ── Node insertion ────────────────────────────────────────────────────────────

#[cfg(test)]
mod nodes {
    use mapgen_core::MapPoint;

    use super::helpers::*;

    fn spine() -> Vec<crate::types::InputWay<Tag>> {
        // one segment with two interior vertices
        vec![way(
            1,
            &[(1000.0, 1000.0), (2000.0, 1000.0), (3000.0, 1000.0), (4000.0, 1000.0)],
            7,
        )]
    }

    #[test]
    fn node_at_existing_endpoint_does_not_split() {
        let builder = built(spine(), vec![node(1000.0, 1000.0, 5.0, "terminus")]);

        assert_eq!(builder.segment_count(), 1, "no split happened");
        assert_eq!(builder.live_segments().count(), 1);
        let junction = builder.junction(MapPoint::new(1000.0, 1000.0).key()).unwrap();
        assert_eq!(junction.data.0, "terminus");
    }

    #[test]
    fn node_beyond_max_dist_is_dropped() {
        // 10 units from the nearest vertex, but only 5 allowed
        let builder = built(spine(), vec![node(1000.0, 990.0, 5.0, "ghost")]);

        assert_eq!(builder.segment_count(), 1);
        assert_eq!(builder.junction_count(), 0, "graph unchanged");
    }

    #[test]
    fn node_at_interior_vertex_splits_the_segment() {
        let builder = built(spine(), vec![node(2000.0, 1005.0, 10.0, "midway")]);

        let live: Vec<_> = builder.live_segments().collect();
        assert_eq!(live.len(), 2);
        let (a, b) = (builder.segment(live[0]), builder.segment(live[1]));
        assert_eq!(a.end(), p(2000.0, 1000.0));
        assert_eq!(b.start(), p(2000.0, 1000.0));
        // both halves inherit the parent's ways
        assert_eq!(a.way_ids, b.way_ids);

        let junction = builder.junction(MapPoint::new(2000.0, 1000.0).key()).unwrap();
        assert_eq!(junction.data.0, "midway");
    }

    #[test]
    fn two_splits_resolve_to_three_leaves() {
        let original = {
            let builder = built(spine(), vec![]);
            builder.live_segments().next().unwrap()
        };

        let builder = built(
            spine(),
            vec![node(2000.0, 1005.0, 10.0, "first"), node(3000.0, 995.0, 10.0, "second")],
        );

        let leaves = builder.split_leaves(original);
        assert_eq!(leaves.len(), 3);
        let spans: Vec<_> = leaves
            .iter()
            .map(|&id| (builder.segment(id).start().x, builder.segment(id).end().x))
            .collect();
        assert_eq!(spans, vec![(1000.0, 2000.0), (2000.0, 3000.0), (3000.0, 4000.0)]);
    }

    #[test]
    fn split_reroutes_the_way_segment_map() {
        let builder = built_tracked(
            spine(),
            vec![node(2000.0, 1005.0, 10.0, "first"), node(3000.0, 995.0, 10.0, "second")],
        );

        let ids = builder.way_segment_ids(mapgen_core::WayId(1)).unwrap();
        assert_eq!(ids.len(), 3, "the split children replaced the parent");
        for &id in ids {
            assert!(builder.segment(id).is_live());
        }
    }
}

// ── Baking ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod baking {
    use super::helpers::*;

    #[test]
    fn live_leaves_bake_once_with_memoized_junctions() {
        let ways = vec![
            way(1, &[(1000.0, 1000.0), (2000.0, 1000.0)], 7),
            way(2, &[(2000.0, 1000.0), (3000.0, 1000.0)], 8),
        ];
        let mut builder = built(ways, vec![node(2000.0, 1000.0, 5.0, "central")]);

        let mut state = TestState::default();
        builder.bake(&mut state);

        // A, B, C — B is shared and baked exactly once
        assert_eq!(state.junctions.len(), 3);
        assert_eq!(state.segments.len(), 2);

        // the inserted node's data reached its junction bake
        let named: Vec<_> = state.junctions.iter().filter_map(|(_, name)| *name).collect();
        assert_eq!(named, vec!["central"]);

        // the two segments reference the same middle handle
        let (_, _, end_of_first, _) = state.segments[0];
        let (_, start_of_second, _, _) = state.segments[1];
        assert_eq!(end_of_first, start_of_second);

        // handles were written back onto the graph
        for id in builder.live_segments().collect::<Vec<_>>() {
            assert!(builder.segment(id).handle.is_some());
        }
        assert!(builder.junction(p(2000.0, 1000.0).key()).unwrap().handle.is_some());
    }

    #[test]
    fn split_parents_are_not_baked() {
        let ways = vec![way(
            1,
            &[(1000.0, 1000.0), (2000.0, 1000.0), (3000.0, 1000.0)],
            7,
        )];
        let mut builder = built(ways, vec![node(2000.0, 1000.0, 5.0, "mid")]);

        let mut state = TestState::default();
        builder.bake(&mut state);

        assert_eq!(state.segments.len(), 2, "only the two live halves bake");
        // parent (id 0) went inert and keeps no handle
        assert!(builder.segment(mapgen_core::SegmentId(0)).handle.is_none());
    }
}

// ── Route stitching ───────────────────────────────────────────────────────────

#[cfg(test)]
mod stitching {
    use mapgen_core::{SegmentId, WayId};

    use super::helpers::*;
    use crate::{BrokenLinePolicy, NetworkError, RouteMember};

    fn members(ways: &[i64]) -> Vec<RouteMember> {
        ways.iter().map(|&id| RouteMember::Way(WayId(id))).collect()
    }

    #[test]
    fn ordered_sets_stitch_directly() {
        let ways = vec![
            way(1, &[(1000.0, 1000.0), (2000.0, 1000.0)], 1),
            way(2, &[(2000.0, 1000.0), (3000.0, 1000.0)], 2),
            way(3, &[(3000.0, 1000.0), (4000.0, 1000.0)], 3),
        ];
        let builder = built_tracked(ways, vec![]);

        let line = builder
            .stitch_route(0, &members(&[1, 2, 3]), BrokenLinePolicy::Fail)
            .unwrap()
            .unwrap();
        assert_eq!(line, vec![SegmentId(0), SegmentId(1), SegmentId(2)]);
    }

    #[test]
    fn stops_and_out_of_bounds_members_are_skipped() {
        let ways = vec![way(1, &[(1000.0, 1000.0), (3500.0, 1000.0)], 1)];
        let builder = built_tracked(ways, vec![]);

        let mut route = members(&[99, 1]); // way 99 never existed
        route.push(RouteMember::Stop(42));
        let line = builder.stitch_route(0, &route, BrokenLinePolicy::Fail).unwrap().unwrap();
        assert_eq!(line, vec![SegmentId(0)]);

        // a route with nothing usable dissolves
        let empty = builder.stitch_route(1, &members(&[99]), BrokenLinePolicy::Fail).unwrap();
        assert!(empty.is_none());
    }

    #[test]
    fn consecutive_duplicate_sets_collapse() {
        let ways = vec![way(1, &[(1000.0, 1000.0), (2000.0, 1000.0), (3000.0, 1000.0)], 1)];
        let builder = built_tracked(ways, vec![node(2000.0, 1005.0, 10.0, "stn")]);

        // the same way listed twice maps to the same (split) set once
        let line = builder
            .stitch_route(0, &members(&[1, 1]), BrokenLinePolicy::Fail)
            .unwrap()
            .unwrap();
        assert_eq!(line.len(), 2, "one linearized run of the two split halves");
    }

    #[test]
    fn wrongly_oriented_first_run_is_reversed() {
        // corridor P–Q–R split at the station Q, then a branch at P: the
        // first run linearizes P→R, but the line actually leaves from P
        let ways = vec![
            way(1, &[(1000.0, 1000.0), (2000.0, 1000.0), (3000.0, 1000.0)], 1),
            way(2, &[(1000.0, 1000.0), (1000.0, 3200.0)], 2),
        ];
        let builder = built_tracked(ways, vec![node(2000.0, 995.0, 10.0, "q")]);

        let line = builder
            .stitch_route(0, &members(&[1, 2]), BrokenLinePolicy::Fail)
            .unwrap()
            .unwrap();
        // way 1 split into 2 (P–Q) and 3 (Q–R); reversed to R→Q→P, then on
        // to the branch
        assert_eq!(line, vec![SegmentId(3), SegmentId(2), SegmentId(1)]);
    }

    #[test]
    fn out_and_back_route_uses_the_turnaround_splice() {
        // A–B, then B–S–C (split at S), then back out from B: the third
        // run touches nothing at the stitched tip, only at the turnaround
        let ways = vec![
            way(1, &[(1000.0, 2000.0), (2000.0, 2000.0)], 1),
            way(2, &[(2000.0, 2000.0), (3000.0, 2000.0), (4000.0, 2000.0)], 2),
            way(3, &[(2000.0, 2000.0), (2000.0, 3000.0)], 3),
        ];
        let builder = built_tracked(ways, vec![node(3000.0, 2005.0, 10.0, "s")]);

        let line = builder
            .stitch_route(0, &members(&[1, 2, 3]), BrokenLinePolicy::Fail)
            .unwrap()
            .unwrap();
        // 0 = A–B, way 2 split into 3 (B–S) and 4 (S–C), 2 = B–E:
        // ride out to S–C, come back over B–S, continue down the branch
        assert_eq!(
            line,
            vec![SegmentId(0), SegmentId(3), SegmentId(4), SegmentId(3), SegmentId(2)]
        );
    }

    #[test]
    fn disconnected_run_fails_with_full_context() {
        let ways = vec![
            way(1, &[(1000.0, 1000.0), (3500.0, 1000.0)], 1),
            way(2, &[(1000.0, 3000.0), (3500.0, 3000.0)], 2), // nowhere near way 1
        ];
        let builder = built_tracked(ways, vec![]);

        let err = builder
            .stitch_route(5, &members(&[1, 2]), BrokenLinePolicy::Fail)
            .unwrap_err();
        match err {
            NetworkError::BrokenLine { route_index, set_index, ref segments, .. } => {
                assert_eq!(route_index, 5);
                assert_eq!(set_index, 1);
                assert!(segments.contains("WayId(2)"));
            }
        }
        let message = err.to_string();
        assert!(message.contains("route 5"));
        assert!(message.contains("segment set 1"));
    }

    #[test]
    fn skip_policy_drops_the_route() {
        let ways = vec![
            way(1, &[(1000.0, 1000.0), (3500.0, 1000.0)], 1),
            way(2, &[(1000.0, 3000.0), (3500.0, 3000.0)], 2),
        ];
        let builder = built_tracked(ways, vec![]);

        let line = builder
            .stitch_route(5, &members(&[1, 2]), BrokenLinePolicy::Skip)
            .unwrap();
        assert!(line.is_none());
    }
}

// ── Attribute parsing ─────────────────────────────────────────────────────────

#[cfg(test)]
mod attrs {
    use crate::attrs::*;

    #[test]
    fn lanes_plain_and_summed() {
        assert_eq!(parse_lanes(Some("4"), None, None), Some(4));
        assert_eq!(parse_lanes(Some("2;2"), None, None), Some(4));
        assert_eq!(parse_lanes(None, Some("2"), Some("1")), Some(3));
        assert_eq!(parse_lanes(None, None, None), None);
    }

    #[test]
    fn lanes_malformed_recovers_to_unknown() {
        assert_eq!(parse_lanes(Some("a few"), None, None), None);
        assert_eq!(parse_lanes(Some("0"), None, None), None);
    }

    #[test]
    fn speed_units() {
        assert_eq!(parse_speed("50"), Some(14)); // km/h by default
        assert_eq!(parse_speed("50 km/h"), Some(14));
        assert_eq!(parse_speed("55 mph"), Some(25));
        assert_eq!(parse_speed("fast"), None);
        assert_eq!(parse_speed_limit(None), None);
        assert_eq!(parse_speed_limit(Some("30")), Some(8));
    }

    #[test]
    fn oneway_rules() {
        // motorway implies one-way
        assert!(is_oneway("motorway", None, false));
        assert!(!is_oneway("motorway", Some("no"), false));
        assert!(!is_oneway("motorway", None, true)); // explicit lane directions
        // other road classes default to bidirectional
        assert!(!is_oneway("residential", None, false));
        assert!(is_oneway("residential", Some("yes"), false));
    }
}
