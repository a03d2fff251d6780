//! Synthetic airport shared by the integration tests.
//!
//! Coordinates are laid out in meters north/east of a reference point so the
//! expected lengths and turn angles are easy to read off.
//!
//! ```text
//!   N                      G: 6 - 14
//!   |                      F: 4 - 5 - 6, connector F5: 5 - 8
//!   +-- E                  C: 1 - 2 - 3 - 4, connector C3: 3 - 7
//!                          L: 7 - 42
//!   P: 40 - 41, M: 41 - 42, N: 42 - 43
//!   RW27: 20 - 21 (not joined to the taxiways), Q: 30 - 31 (isolated)
//! ```

#![allow(dead_code)]

use taxi_core::spatial::offset_position;
use taxi_core::{TaxiwayGraph, TaxiwayRow, Vertex, VertexId};

pub const ORIGIN: (f64, f64) = (40.85, -74.06);

pub fn vertex(id: VertexId, north_m: f64, east_m: f64) -> Vertex {
    let (lat, lon) = offset_position(ORIGIN.0, ORIGIN.1, north_m, east_m);
    Vertex::new(id, lat, lon)
}

pub fn vertex_table() -> Vec<Vertex> {
    vec![
        vertex(1, 0.0, 0.0),
        vertex(2, 0.0, 100.0),
        vertex(3, 0.0, 200.0),
        vertex(4, 0.0, 300.0),
        vertex(5, 100.0, 300.0),
        vertex(6, 200.0, 300.0),
        vertex(7, -100.0, 200.0),
        vertex(8, 100.0, 400.0),
        vertex(14, 200.0, 400.0),
        vertex(20, -200.0, -100.0),
        vertex(21, -200.0, 400.0),
        vertex(30, 1000.0, 0.0),
        vertex(31, 1000.0, 100.0),
        vertex(40, -300.0, 0.0),
        vertex(41, -300.0, 100.0),
        vertex(42, -400.0, 100.0),
        vertex(43, -400.0, 200.0),
    ]
}

pub fn taxiway_table() -> Vec<TaxiwayRow> {
    vec![
        TaxiwayRow::new("C", vec![1, 2, 3, 4]),
        TaxiwayRow::new("F", vec![4, 5, 6]),
        TaxiwayRow::new("C3", vec![3, 7]),
        TaxiwayRow::new("F5", vec![5, 8]),
        TaxiwayRow::new("G", vec![6, 14]),
        TaxiwayRow::new("L", vec![7, 42]),
        TaxiwayRow::new("P", vec![40, 41]),
        TaxiwayRow::new("M", vec![41, 42]),
        TaxiwayRow::new("N", vec![42, 43]),
        TaxiwayRow::new("RW27", vec![20, 21]),
        TaxiwayRow::new("Q", vec![30, 31]),
    ]
}

pub fn airport() -> TaxiwayGraph {
    TaxiwayGraph::build(&vertex_table(), &taxiway_table()).expect("fixture graph")
}

/// Sum of cached edge weights along consecutive ids; panics on a gap.
pub fn edge_sum(graph: &TaxiwayGraph, ids: &[VertexId]) -> f64 {
    ids.windows(2)
        .map(|pair| {
            graph
                .edge_weight(pair[0], pair[1])
                .unwrap_or_else(|| panic!("no edge between {} and {}", pair[0], pair[1]))
        })
        .sum()
}
