//! Graph reconstruction: matched primitives become nodes, pipe linework is
//! stitched into continuous runs, and pipe crossings the legend never marks
//! become inferred junctions.
//!
//! All inputs are in world feet (the page scale has already been applied).
//! The produced edge *geometry* is independent of input order; only ids and
//! internal point ordering follow first-seen order.

use crate::catalog::{SymbolCatalog, SymbolCategory};
use crate::config::{GraphConfig, MatchConfig};
use crate::geom::{self, Point};
use crate::model::{Discipline, PrimitiveKind, VectorPrimitive};
use crate::network::{Edge, Network, Node, NodeKind};
use crate::symbol;
use tracing::debug;

/// Builds one discipline's network from a page's primitives.
pub fn build_network(
    discipline: Discipline,
    primitives: &[VectorPrimitive],
    catalog: &SymbolCatalog,
    cfg: &GraphConfig,
    match_cfg: &MatchConfig,
) -> Network {
    let mut net = Network::new(discipline.as_str(), discipline);

    let mut node_seq = 0usize;
    let mut push_node = |net: &mut Network, kind: NodeKind, at: Point| -> String {
        node_seq += 1;
        let id = format!("{discipline}-n{node_seq}");
        net.nodes.push(Node::new(id.clone(), kind, at));
        id
    };

    // Symbol-matched structures. A second primitive resolving to the same
    // spot (a hatch or double circle) collapses into the first node.
    for prim in primitives {
        if prim.points.is_empty() {
            continue;
        }
        let Some(entry) = symbol::match_node_symbol(prim, catalog, discipline, None, match_cfg)
        else {
            continue;
        };
        let SymbolCategory::Node { kind, .. } = entry.category else {
            continue;
        };
        let at = geom::centroid(&prim.points);
        if net.node_near(at, cfg.node_snap_tolerance_ft).is_some() {
            continue;
        }
        let id = push_node(&mut net, kind, at);
        if let Some(node) = net.node_mut(&id) {
            node.set_attr("symbol", entry.name.as_str());
        }
    }

    // Pipe linework for this discipline. Primitives that match nothing or
    // carry fewer than two points are ignored, not errors.
    let pipe_lines: Vec<&VectorPrimitive> = primitives
        .iter()
        .filter(|p| {
            matches!(p.kind, PrimitiveKind::Line | PrimitiveKind::Polyline)
                && p.points.len() >= 2
                && symbol::match_pipe_symbol(p, catalog, discipline, match_cfg).is_some()
        })
        .collect();

    // Crossings between pipe strokes that no symbol marks become junctions.
    // A meeting point at the ends of both strokes is a continuation elbow
    // (the stitcher's business), not a junction; X and T crossings qualify.
    let near_end = |seg: &[Point], x: Point| {
        (x - seg[0]).length() <= cfg.merge_tolerance_ft
            || (x - seg[1]).length() <= cfg.merge_tolerance_ft
    };
    for (i, a) in pipe_lines.iter().enumerate() {
        for b in &pipe_lines[i + 1..] {
            for sa in a.points.windows(2) {
                for sb in b.points.windows(2) {
                    let Some(x) = geom::segment_intersection(sa[0], sa[1], sb[0], sb[1]) else {
                        continue;
                    };
                    if near_end(sa, x) && near_end(sb, x) {
                        continue;
                    }
                    if net.node_near(x, cfg.junction_tolerance_ft).is_none() {
                        push_node(&mut net, NodeKind::Junction, x);
                    }
                }
            }
        }
    }

    let runs = stitch_polylines(
        pipe_lines.iter().map(|p| p.points.clone()).collect(),
        cfg.merge_tolerance_ft,
    );
    debug!(
        discipline = %discipline,
        strokes = pipe_lines.len(),
        runs = runs.len(),
        nodes = net.nodes.len(),
        "network reconstructed"
    );

    for (i, points) in runs.into_iter().enumerate() {
        let mut edge = Edge::new(format!("{discipline}-e{}", i + 1), discipline, points);
        let (head, tail) = (edge.points[0], edge.points[edge.points.len() - 1]);
        edge.from = net
            .node_near(head, cfg.node_snap_tolerance_ft)
            .map(|n| n.id.clone());
        edge.to = net
            .node_near(tail, cfg.node_snap_tolerance_ft)
            .map(|n| n.id.clone());
        net.edges.push(edge);
    }

    net
}

/// Repeatedly merges polylines whose endpoints fall within `tolerance_ft`
/// until no merge applies. Transitive: a chain of touching strokes collapses
/// to one run no matter how the passes visit it.
pub fn stitch_polylines(mut lines: Vec<Vec<Point>>, tolerance_ft: f64) -> Vec<Vec<Point>> {
    lines.retain(|l| l.len() >= 2);
    loop {
        let mut merged_at = None;
        'scan: for i in 0..lines.len() {
            for j in i + 1..lines.len() {
                if let Some(joined) = merge_pair(&lines[i], &lines[j], tolerance_ft) {
                    merged_at = Some((i, j, joined));
                    break 'scan;
                }
            }
        }
        match merged_at {
            Some((i, j, joined)) => {
                lines[i] = joined;
                lines.remove(j);
            }
            None => return lines,
        }
    }
}

/// Joins `a` and `b` when a pair of their endpoints touch, orienting `b` to
/// continue `a`. The shared endpoint is kept once (from `a`).
fn merge_pair(a: &[Point], b: &[Point], tolerance_ft: f64) -> Option<Vec<Point>> {
    let close = |p: Point, q: Point| (p - q).length() <= tolerance_ft;
    let (a0, an) = (a[0], a[a.len() - 1]);
    let (b0, bn) = (b[0], b[b.len() - 1]);

    let joined: Vec<Point> = if close(an, b0) {
        a.iter().chain(&b[1..]).copied().collect()
    } else if close(an, bn) {
        a.iter().chain(b[..b.len() - 1].iter().rev()).copied().collect()
    } else if close(a0, bn) {
        b.iter().chain(&a[1..]).copied().collect()
    } else if close(a0, b0) {
        b.iter().rev().chain(&a[1..]).copied().collect()
    } else {
        return None;
    };
    Some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SymbolCatalogEntry, SymbolPredicate};
    use crate::geom::point;

    fn line(a: (f64, f64), b: (f64, f64)) -> VectorPrimitive {
        VectorPrimitive::new(PrimitiveKind::Line, vec![point(a.0, a.1), point(b.0, b.1)])
    }

    fn storm_catalog() -> SymbolCatalog {
        let mut catalog = SymbolCatalog::new();
        catalog.register(SymbolCatalogEntry {
            name: "storm manhole".into(),
            category: SymbolCategory::Node {
                kind: NodeKind::Manhole,
                discipline: Some(Discipline::Storm),
            },
            predicate: SymbolPredicate {
                shape: Some(PrimitiveKind::Circle),
                ..Default::default()
            },
            label_patterns: vec![r"MH-?\d+".into()],
        });
        catalog.register(SymbolCatalogEntry {
            name: "storm pipe".into(),
            category: SymbolCategory::Pipe {
                discipline: Discipline::Storm,
            },
            predicate: SymbolPredicate::default(),
            label_patterns: Vec::new(),
        });
        catalog
    }

    fn build(prims: &[VectorPrimitive]) -> Network {
        build_network(
            Discipline::Storm,
            prims,
            &storm_catalog(),
            &GraphConfig::default(),
            &MatchConfig::default(),
        )
    }

    #[test]
    fn touching_segments_become_one_edge() {
        // Two strokes sharing (50,0) must come back as a single 100 ft run.
        let net = build(&[line((0.0, 0.0), (50.0, 0.0)), line((50.0, 0.0), (100.0, 0.0))]);
        assert_eq!(net.edges.len(), 1);
        let e = &net.edges[0];
        assert!((e.length_ft() - 100.0).abs() < 1e-9);
        assert_eq!(e.points.first().copied(), Some(point(0.0, 0.0)));
        assert_eq!(e.points.last().copied(), Some(point(100.0, 0.0)));
    }

    #[test]
    fn three_segment_chain_fully_collapses() {
        let segs = [
            line((0.0, 0.0), (40.0, 0.0)),
            line((40.0, 0.0), (80.0, 0.0)),
            line((80.0, 0.0), (120.0, 30.0)),
        ];
        let net = build(&segs);
        assert_eq!(net.edges.len(), 1);
        assert!((net.edges[0].length_ft() - 130.0).abs() < 1e-9);
    }

    #[test]
    fn stitching_is_geometry_invariant_under_permutation() {
        let segs = [
            line((0.0, 0.0), (40.0, 0.0)),
            line((80.0, 0.0), (40.0, 0.0)), // reversed orientation on purpose
            line((80.0, 0.0), (80.0, 60.0)),
        ];
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let prims: Vec<_> = order.iter().map(|&i| segs[i].clone()).collect();
            let net = build(&prims);
            assert_eq!(net.edges.len(), 1, "order {order:?}");
            assert!(
                (net.edges[0].length_ft() - 140.0).abs() < 1e-9,
                "order {order:?}"
            );
            let ends: std::collections::BTreeSet<(i64, i64)> = [
                net.edges[0].points[0],
                *net.edges[0].points.last().unwrap(),
            ]
            .iter()
            .map(|p| (p.x.round() as i64, p.y.round() as i64))
            .collect();
            let expected: std::collections::BTreeSet<(i64, i64)> =
                [(0, 0), (80, 60)].into_iter().collect();
            assert_eq!(ends, expected);
        }
    }

    #[test]
    fn stitching_is_idempotent() {
        let merged = stitch_polylines(
            vec![
                vec![point(0.0, 0.0), point(50.0, 0.0)],
                vec![point(50.0, 0.0), point(100.0, 0.0)],
                vec![point(0.0, 200.0), point(50.0, 200.0)],
            ],
            5.0,
        );
        let again = stitch_polylines(merged.clone(), 5.0);
        assert_eq!(merged, again);
    }

    #[test]
    fn crossing_pipes_get_an_inferred_junction() {
        let net = build(&[line((0.0, 0.0), (100.0, 0.0)), line((50.0, -50.0), (50.0, 50.0))]);
        let junctions: Vec<_> = net
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Junction)
            .collect();
        assert_eq!(junctions.len(), 1);
        assert!((junctions[0].x - 50.0).abs() < 1e-9);
        assert!((junctions[0].y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn crossing_near_existing_node_is_not_duplicated() {
        let mut circle = VectorPrimitive::new(
            PrimitiveKind::Circle,
            vec![
                point(48.0, -2.0),
                point(52.0, -2.0),
                point(52.0, 2.0),
                point(48.0, 2.0),
            ],
        );
        circle.stroke_width = 1.0;
        let net = build(&[
            circle,
            line((0.0, 0.0), (100.0, 0.0)),
            line((50.0, -50.0), (50.0, 50.0)),
        ]);
        assert!(net.nodes.iter().any(|n| n.kind == NodeKind::Manhole));
        assert!(!net.nodes.iter().any(|n| n.kind == NodeKind::Junction));
    }

    #[test]
    fn endpoints_snap_to_matched_nodes() {
        let manhole = VectorPrimitive::new(
            PrimitiveKind::Circle,
            vec![
                point(-2.0, -2.0),
                point(2.0, -2.0),
                point(2.0, 2.0),
                point(-2.0, 2.0),
            ],
        );
        let net = build(&[manhole, line((0.0, 0.0), (100.0, 0.0))]);
        let e = &net.edges[0];
        let from = e.from.as_deref().expect("snapped endpoint");
        assert_eq!(net.node(from).unwrap().kind, NodeKind::Manhole);
        assert!(e.to.is_none());
        assert!(net.validate().is_ok());
    }

    #[test]
    fn degenerate_and_unmatched_primitives_are_ignored() {
        let lonely_point = VectorPrimitive::new(PrimitiveKind::Polyline, vec![point(5.0, 5.0)]);
        let net = build(&[lonely_point]);
        assert!(net.edges.is_empty());
    }
}
