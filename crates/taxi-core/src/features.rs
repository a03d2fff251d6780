//! Geometric descriptors of a resolved path: length, turn count and sharpness.

use serde::{Deserialize, Serialize};

use crate::models::{PathStats, ResolvedPath, Vertex};
use crate::spatial::{bearing_deg, bearing_separation_deg, haversine_distance};

/// Direction changes at or below this many degrees are graph noise, not turns.
pub const DEFAULT_TURN_THRESHOLD_DEG: f64 = 10.0;

/// Legs shorter than this are treated as coincident points when measuring turns.
pub const DEFAULT_MIN_LEG_M: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub turn_threshold_deg: f64,
    pub min_leg_m: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            turn_threshold_deg: DEFAULT_TURN_THRESHOLD_DEG,
            min_leg_m: DEFAULT_MIN_LEG_M,
        }
    }
}

/// Computes [`PathStats`] from a resolved path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn extract(&self, path: &ResolvedPath) -> PathStats {
        let vertices = path.vertices();
        let length_m = path_length_m(vertices);

        let turns: Vec<f64> = deflection_angles(vertices, self.config.min_leg_m)
            .into_iter()
            .filter(|&angle| angle > self.config.turn_threshold_deg)
            .collect();

        let sharpness_deg = if turns.is_empty() {
            0.0
        } else {
            turns.iter().sum::<f64>() / turns.len() as f64
        };

        PathStats::new(length_m, turns.len(), sharpness_deg)
    }
}

/// Sum of great-circle distances between consecutive vertices.
pub fn path_length_m(vertices: &[Vertex]) -> f64 {
    vertices
        .windows(2)
        .map(|pair| haversine_distance(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon))
        .sum()
}

/// Direction change in degrees at every interior vertex, in path order.
///
/// Both bearings are taken from the interior vertex toward its neighbours, so
/// a reversed path yields the same magnitudes in reverse order. 0 means
/// straight on, 180 a full reversal.
pub fn deflection_angles(vertices: &[Vertex], min_leg_m: f64) -> Vec<f64> {
    let points = collapse_short_legs(vertices, min_leg_m);
    points
        .windows(3)
        .map(|w| {
            let (a, b, c) = (w[0], w[1], w[2]);
            let back = bearing_deg(b.lat, b.lon, a.lat, a.lon);
            let ahead = bearing_deg(b.lat, b.lon, c.lat, c.lon);
            180.0 - bearing_separation_deg(back, ahead)
        })
        .collect()
}

/// Collapse runs of near-coincident points so they contribute no bearing.
///
/// A run is a maximal stretch of consecutive legs each shorter than
/// `min_leg_m`. A run whose ends are also closer than `min_leg_m` becomes its
/// lowest-id vertex; a wider run keeps only its two ends. Both rules depend on
/// the run as a set, so a reversed path collapses to the same points.
fn collapse_short_legs(vertices: &[Vertex], min_leg_m: f64) -> Vec<Vertex> {
    let mut points: Vec<Vertex> = Vec::with_capacity(vertices.len());
    let mut start = 0;
    while start < vertices.len() {
        let mut end = start;
        while end + 1 < vertices.len()
            && vertices[end].distance_to(&vertices[end + 1]) < min_leg_m
        {
            end += 1;
        }

        let (first, last) = (vertices[start], vertices[end]);
        if start == end {
            points.push(first);
        } else if first.distance_to(&last) < min_leg_m {
            if let Some(lowest) = vertices[start..=end].iter().min_by_key(|v| v.id) {
                points.push(*lowest);
            }
        } else {
            points.push(first);
            points.push(last);
        }
        start = end + 1;
    }
    points
}
