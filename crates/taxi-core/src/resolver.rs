//! Code sequence to contiguous vertex path.
//!
//! Each code is pinned to its representative vertex. Consecutive
//! representatives joined by an edge are emitted directly; otherwise the gap
//! is bridged with a Dijkstra search over the whole surface graph.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::error::RouteError;
use crate::graph::TaxiwayGraph;
use crate::models::{DisconnectedSegmentWarning, ResolvedPath, TaxiwayCode, VertexId};
use crate::route_parser::parse_route;

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Parse a raw route string and resolve it against the graph.
pub fn resolve_route(raw: &str, graph: &TaxiwayGraph) -> Result<ResolvedPath, RouteError> {
    let codes = parse_route(raw)?;
    resolve_codes(&codes, graph)
}

/// Resolve an ordered code sequence into a connected vertex walk.
///
/// Every code is checked against the graph before any search runs, so an
/// unknown code never yields a partial path.
pub fn resolve_codes(codes: &[TaxiwayCode], graph: &TaxiwayGraph) -> Result<ResolvedPath, RouteError> {
    let mut collapsed: Vec<TaxiwayCode> = Vec::with_capacity(codes.len());
    for code in codes {
        if collapsed.last() != Some(code) {
            collapsed.push(code.clone());
        }
    }
    if collapsed.is_empty() {
        return Err(RouteError::InvalidRoute(
            "no taxiway codes to resolve".to_string(),
        ));
    }

    let representatives = collapsed
        .iter()
        .map(|code| graph.representative_index(code))
        .collect::<Result<Vec<usize>, RouteError>>()?;

    let mut path: Vec<usize> = vec![representatives[0]];
    let mut warnings = Vec::new();

    for (i, pair) in representatives.windows(2).enumerate() {
        let (source, target) = (pair[0], pair[1]);
        if source == target {
            continue;
        }

        let from = graph.vertex_at(source).id;
        let to = graph.vertex_at(target).id;
        if graph.edge_weight(from, to).is_some() {
            path.push(target);
            continue;
        }

        let (chain, bridge_length_m) = dijkstra(graph, source, target)
            .ok_or(RouteError::NoConnectingPath { from, to })?;

        let warning = DisconnectedSegmentWarning {
            from_code: collapsed[i].clone(),
            to_code: collapsed[i + 1].clone(),
            from_vertex: from,
            to_vertex: to,
            inserted_vertices: chain.len().saturating_sub(2),
            bridge_length_m,
        };
        tracing::warn!("Disconnected segment: {}", warning);
        warnings.push(warning);

        // chain[0] is the boundary vertex already on the path.
        path.extend_from_slice(&chain[1..]);
    }

    let vertices = path.iter().map(|&idx| *graph.vertex_at(idx)).collect();
    tracing::debug!(
        "Resolved {} codes into {} vertices ({} bridged segments)",
        collapsed.len(),
        path.len(),
        warnings.len()
    );

    Ok(ResolvedPath::new(vertices, collapsed, warnings))
}

/// Shortest path between two vertices by cached edge weight.
///
/// Returns the vertex ids from `from` to `to` inclusive, or `None` when they
/// are in different components or unknown.
pub fn shortest_path(graph: &TaxiwayGraph, from: VertexId, to: VertexId) -> Option<Vec<VertexId>> {
    let source = graph.index(from)?;
    let target = graph.index(to)?;
    dijkstra(graph, source, target)
        .map(|(chain, _)| chain.into_iter().map(|idx| graph.vertex_at(idx).id).collect())
}

/// Dijkstra over arena indices. Ties break toward the lower vertex id.
fn dijkstra(graph: &TaxiwayGraph, source: usize, target: usize) -> Option<(Vec<usize>, f64)> {
    let n = graph.vertex_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    dist[source] = 0.0;
    heap.push(Reverse((FloatOrd(0.0), source)));

    while let Some(Reverse((FloatOrd(d), node))) = heap.pop() {
        if node == target {
            break;
        }
        if d > dist[node] {
            continue;
        }
        for edge in graph.edges_at(node) {
            let candidate = d + edge.weight_m;
            if candidate < dist[edge.to] {
                dist[edge.to] = candidate;
                prev[edge.to] = Some(node);
                heap.push(Reverse((FloatOrd(candidate), edge.to)));
            }
        }
    }

    if !dist[target].is_finite() {
        return None;
    }

    let mut chain = vec![target];
    let mut current = target;
    while let Some(p) = prev[current] {
        chain.push(p);
        current = p;
    }
    chain.reverse();
    Some((chain, dist[target]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaxiwayRow, Vertex};
    use crate::spatial::offset_position;

    fn vertex(id: VertexId, north_m: f64, east_m: f64) -> Vertex {
        let (lat, lon) = offset_position(40.85, -74.06, north_m, east_m);
        Vertex::new(id, lat, lon)
    }

    /// Square 1-2-3-4 with a long detour 1-5-3, plus an isolated taxiway Q.
    fn square() -> TaxiwayGraph {
        let vertices = vec![
            vertex(1, 0.0, 0.0),
            vertex(2, 0.0, 100.0),
            vertex(3, 100.0, 100.0),
            vertex(4, 100.0, 0.0),
            vertex(5, 300.0, 300.0),
            vertex(20, 1000.0, 0.0),
            vertex(21, 1000.0, 50.0),
        ];
        let rows = vec![
            TaxiwayRow::new("A", vec![1, 2]),
            TaxiwayRow::new("B", vec![2, 3]),
            TaxiwayRow::new("D", vec![3, 4]),
            TaxiwayRow::new("E", vec![4, 1]),
            TaxiwayRow::new("G", vec![1, 5, 3]),
            TaxiwayRow::new("Q", vec![20, 21]),
        ];
        TaxiwayGraph::build(&vertices, &rows).expect("build")
    }

    fn codes(list: &[&str]) -> Vec<TaxiwayCode> {
        list.iter().map(|c| TaxiwayCode::new(c)).collect()
    }

    #[test]
    fn single_code_resolves_to_representative() {
        let graph = square();
        let path = resolve_codes(&codes(&["B"]), &graph).expect("resolve");
        assert_eq!(path.vertex_ids(), vec![2]);
        assert!(path.warnings().is_empty());
    }

    #[test]
    fn shortest_path_prefers_lower_weight() {
        let graph = square();
        let path = shortest_path(&graph, 1, 3).expect("path");
        assert_eq!(path.len(), 3);
        assert_ne!(path[1], 5);
        assert!(shortest_path(&graph, 1, 20).is_none());
        assert_eq!(shortest_path(&graph, 2, 2), Some(vec![2]));
    }

    #[test]
    fn shortest_path_tie_breaks_deterministically() {
        let graph = square();
        // 1 -> 3 via 2 or via 4 is the same length up to projection error;
        // repeated searches must agree.
        let first = shortest_path(&graph, 1, 3).expect("path");
        for _ in 0..10 {
            assert_eq!(shortest_path(&graph, 1, 3).as_ref(), Some(&first));
        }
    }

    #[test]
    fn adjacent_representatives_emit_single_edge() {
        let graph = square();
        // rep(A) = 1, rep(B) = 2, edge 1-2 exists.
        let path = resolve_codes(&codes(&["A", "B"]), &graph).expect("resolve");
        assert_eq!(path.vertex_ids(), vec![1, 2]);
        assert!(path.warnings().is_empty());
    }

    #[test]
    fn gap_is_bridged_with_warning() {
        let graph = square();
        // rep(A) = 1, rep(D) = 3: not adjacent.
        let path = resolve_codes(&codes(&["A", "D"]), &graph).expect("resolve");
        let ids = path.vertex_ids();
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&3));
        assert_eq!(ids.len(), 3);
        assert_eq!(path.warnings().len(), 1);
        let warning = &path.warnings()[0];
        assert_eq!(warning.inserted_vertices, 1);
        assert!((warning.bridge_length_m - 200.0).abs() < 2.0);
    }

    #[test]
    fn unknown_code_fails_before_search() {
        let graph = square();
        let err = resolve_codes(&codes(&["A", "Z", "D"]), &graph).unwrap_err();
        assert_eq!(
            err,
            RouteError::UnknownTaxiway {
                code: TaxiwayCode::new("Z")
            }
        );
    }

    #[test]
    fn disconnected_component_is_an_error() {
        let graph = square();
        let err = resolve_codes(&codes(&["A", "Q"]), &graph).unwrap_err();
        assert_eq!(err, RouteError::NoConnectingPath { from: 1, to: 20 });
        let err = resolve_codes(&codes(&["Q", "A"]), &graph).unwrap_err();
        assert_eq!(err, RouteError::NoConnectingPath { from: 20, to: 1 });
    }

    #[test]
    fn shared_representatives_do_not_repeat_vertices() {
        let graph = square();
        // rep(A) = rep(E) = rep(G) = 1
        let path = resolve_codes(&codes(&["A", "E", "G"]), &graph).expect("resolve");
        assert_eq!(path.vertex_ids(), vec![1]);
        assert_eq!(path.codes().len(), 3);
    }

    #[test]
    fn consecutive_edges_always_exist() {
        let graph = square();
        let path = resolve_route("A-D-B-E", &graph).expect("resolve");
        for pair in path.vertex_ids().windows(2) {
            assert!(
                graph.edge_weight(pair[0], pair[1]).is_some(),
                "gap between {} and {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn resolve_route_reports_parse_errors() {
        let graph = square();
        assert!(matches!(
            resolve_route("A/B", &graph),
            Err(RouteError::InvalidRoute(_))
        ));
    }
}
