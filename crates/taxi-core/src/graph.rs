//! Immutable weighted graph of the airport surface.
//!
//! Vertices live in an arena sorted by id; adjacency is stored as index lists
//! with the haversine weight cached on each edge at build time. A secondary
//! index maps each canonical taxiway code to its member vertices.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::error::{GraphConstructionError, RouteError};
use crate::models::{TaxiwayCode, TaxiwayRow, Vertex, VertexId};
use crate::route_parser::{canonical_code, is_runway_designator};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Edge {
    /// Arena index of the neighbour
    pub(crate) to: usize,
    pub(crate) weight_m: f64,
}

#[derive(Debug, Clone)]
struct TaxiwayMembers {
    vertices: BTreeSet<VertexId>,
    /// Arena index of the lowest member id
    representative: usize,
    edges: usize,
    length_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxiwayCategory {
    Runway,
    /// Single-letter taxiway
    Taxiway,
    Other,
}

impl TaxiwayCategory {
    fn of(code: &TaxiwayCode) -> Self {
        let text = code.as_str();
        if is_runway_designator(text) {
            TaxiwayCategory::Runway
        } else if text.len() == 1 && text.chars().all(|c| c.is_ascii_alphabetic()) {
            TaxiwayCategory::Taxiway
        } else {
            TaxiwayCategory::Other
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaxiwayCategory::Runway => "runway",
            TaxiwayCategory::Taxiway => "taxiway",
            TaxiwayCategory::Other => "other",
        }
    }
}

impl fmt::Display for TaxiwayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Catalogue entry for one indexed code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxiwaySummary {
    pub code: TaxiwayCode,
    pub category: TaxiwayCategory,
    pub vertex_count: usize,
    pub edge_count: usize,
    pub length_m: f64,
}

/// Read-only surface graph, safe to share across concurrent requests.
#[derive(Debug, Clone)]
pub struct TaxiwayGraph {
    vertices: Vec<Vertex>,
    index_of: HashMap<VertexId, usize>,
    adjacency: Vec<Vec<Edge>>,
    taxiways: BTreeMap<TaxiwayCode, TaxiwayMembers>,
    edge_count: usize,
}

/// Key a table ident is indexed under: runways verbatim, taxiways by parent letter.
fn index_key(ident: &str) -> TaxiwayCode {
    let upper = ident.trim().to_ascii_uppercase();
    if is_runway_designator(&upper) {
        return TaxiwayCode::new(upper);
    }
    canonical_code(&upper).unwrap_or_else(|| TaxiwayCode::new(upper))
}

impl TaxiwayGraph {
    /// Build the graph from the vertex table and the taxiway table.
    pub fn build(
        vertex_table: &[Vertex],
        taxiway_table: &[TaxiwayRow],
    ) -> Result<Self, GraphConstructionError> {
        if vertex_table.is_empty() {
            return Err(GraphConstructionError::NoVertices);
        }

        let mut vertices = vertex_table.to_vec();
        vertices.sort_by_key(|v| v.id);
        for pair in vertices.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(GraphConstructionError::DuplicateVertex(pair[0].id));
            }
        }
        if let Some(bad) = vertices
            .iter()
            .find(|v| !crate::spatial::is_valid_coordinate(v.lat, v.lon))
        {
            return Err(GraphConstructionError::InvalidCoordinates {
                id: bad.id,
                lat: bad.lat,
                lon: bad.lon,
            });
        }

        let index_of: HashMap<VertexId, usize> = vertices
            .iter()
            .enumerate()
            .map(|(idx, v)| (v.id, idx))
            .collect();

        let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); vertices.len()];
        let mut seen_edges: HashSet<(usize, usize)> = HashSet::new();
        let mut owned_edges: BTreeMap<TaxiwayCode, HashSet<(usize, usize)>> = BTreeMap::new();

        for row in taxiway_table {
            let ident = row.ident.trim();
            if ident.is_empty() {
                return Err(GraphConstructionError::EmptyIdent);
            }

            let mut chain: Vec<usize> = Vec::with_capacity(row.vertices.len());
            for &id in &row.vertices {
                let idx = *index_of.get(&id).ok_or_else(|| {
                    GraphConstructionError::DanglingVertex {
                        ident: ident.to_string(),
                        vertex: id,
                    }
                })?;
                if chain.last() != Some(&idx) {
                    chain.push(idx);
                }
            }
            if chain.len() < 2 {
                return Err(GraphConstructionError::DegenerateTaxiway {
                    ident: ident.to_string(),
                    count: chain.len(),
                });
            }

            let owned = owned_edges.entry(index_key(ident)).or_default();
            for pair in chain.windows(2) {
                let key = (pair[0].min(pair[1]), pair[0].max(pair[1]));
                owned.insert(key);
                if seen_edges.insert(key) {
                    let weight_m = vertices[key.0].distance_to(&vertices[key.1]);
                    adjacency[key.0].push(Edge {
                        to: key.1,
                        weight_m,
                    });
                    adjacency[key.1].push(Edge {
                        to: key.0,
                        weight_m,
                    });
                }
            }
        }

        // Arena is sorted by id, so index order is id order.
        for edges in &mut adjacency {
            edges.sort_by_key(|e| e.to);
        }

        let taxiways = owned_edges
            .into_iter()
            .map(|(code, edges)| {
                let mut members = BTreeSet::new();
                let mut representative = usize::MAX;
                let mut length_m = 0.0;
                for &(a, b) in &edges {
                    members.insert(vertices[a].id);
                    members.insert(vertices[b].id);
                    // a < b, and arena order is id order.
                    representative = representative.min(a);
                    length_m += vertices[a].distance_to(&vertices[b]);
                }
                (
                    code,
                    TaxiwayMembers {
                        vertices: members,
                        representative,
                        edges: edges.len(),
                        length_m,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();

        let graph = Self {
            vertices,
            index_of,
            adjacency,
            taxiways,
            edge_count: seen_edges.len(),
        };

        tracing::info!(
            "Built taxiway graph: {} vertices, {} edges, {} taxiway codes",
            graph.vertex_count(),
            graph.edge_count(),
            graph.taxiways.len()
        );

        Ok(graph)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.index_of.get(&id).map(|&idx| &self.vertices[idx])
    }

    /// Neighbours of a vertex ordered by id, with cached edge weights in meters.
    ///
    /// Unknown vertices have no neighbours.
    pub fn neighbors(&self, id: VertexId) -> Vec<(VertexId, f64)> {
        self.index_of
            .get(&id)
            .map(|&idx| {
                self.adjacency[idx]
                    .iter()
                    .map(|e| (self.vertices[e.to].id, e.weight_m))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cached weight of the edge between two vertices, if they are adjacent.
    pub fn edge_weight(&self, a: VertexId, b: VertexId) -> Option<f64> {
        let from = *self.index_of.get(&a)?;
        let to = *self.index_of.get(&b)?;
        let edges = &self.adjacency[from];
        edges
            .binary_search_by_key(&to, |e| e.to)
            .ok()
            .map(|pos| edges[pos].weight_m)
    }

    /// Member vertices of a taxiway code.
    pub fn vertices_of(&self, code: &TaxiwayCode) -> Result<&BTreeSet<VertexId>, RouteError> {
        self.members(code).map(|m| &m.vertices)
    }

    /// Deterministic representative vertex of a taxiway code (its lowest member id).
    pub fn representative(&self, code: &TaxiwayCode) -> Result<VertexId, RouteError> {
        self.representative_index(code).map(|idx| self.vertices[idx].id)
    }

    /// Arena index of a code's representative vertex.
    pub(crate) fn representative_index(&self, code: &TaxiwayCode) -> Result<usize, RouteError> {
        self.members(code).map(|m| m.representative)
    }

    pub fn contains_code(&self, code: &TaxiwayCode) -> bool {
        self.taxiways.contains_key(code)
    }

    fn members(&self, code: &TaxiwayCode) -> Result<&TaxiwayMembers, RouteError> {
        self.taxiways
            .get(code)
            .ok_or_else(|| RouteError::UnknownTaxiway { code: code.clone() })
    }

    /// Catalogue of every indexed code, ordered by code.
    pub fn taxiway_summaries(&self) -> Vec<TaxiwaySummary> {
        self.taxiways
            .iter()
            .map(|(code, members)| TaxiwaySummary {
                code: code.clone(),
                category: TaxiwayCategory::of(code),
                vertex_count: members.vertices.len(),
                edge_count: members.edges,
                length_m: members.length_m,
            })
            .collect()
    }

    pub(crate) fn index(&self, id: VertexId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    pub(crate) fn vertex_at(&self, idx: usize) -> &Vertex {
        &self.vertices[idx]
    }

    pub(crate) fn edges_at(&self, idx: usize) -> &[Edge] {
        &self.adjacency[idx]
    }
}
