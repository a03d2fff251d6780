//! Estimator capability and the encodings estimators consume.
//!
//! Learned estimators are opaque: anything that maps a [`PredictionInput`] to
//! a duration in seconds can be plugged into a [`crate::PredictionContext`].

use serde::{Deserialize, Serialize};

use crate::error::PredictorError;
use crate::models::{PathStats, ResolvedPath};
use crate::spatial::haversine_distance;

/// Everything an estimator may draw on for one request.
#[derive(Debug, Clone, Copy)]
pub struct PredictionInput<'a> {
    pub stats: &'a PathStats,
    pub path: &'a ResolvedPath,
}

impl<'a> PredictionInput<'a> {
    pub fn new(stats: &'a PathStats, path: &'a ResolvedPath) -> Self {
        Self { stats, path }
    }

    /// Global features: length in meters, turn count, sharpness in degrees.
    pub fn features(&self) -> [f64; 3] {
        self.stats.feature_vector()
    }

    /// Per-vertex encoding for graph-based estimators.
    pub fn encoding(&self) -> PathEncoding {
        PathEncoding::from_path(self.path)
    }
}

/// A duration estimator.
pub trait Predictor: Send + Sync {
    /// Whether the estimator's model is loaded and usable.
    fn is_loaded(&self) -> bool;

    /// Estimated taxi duration in seconds.
    fn predict(&self, input: &PredictionInput<'_>) -> Result<f64, PredictorError>;
}

/// Placeholder for an estimator whose model is not loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePredictor;

impl Predictor for UnavailablePredictor {
    fn is_loaded(&self) -> bool {
        false
    }

    fn predict(&self, _input: &PredictionInput<'_>) -> Result<f64, PredictorError> {
        Err(PredictorError::NotLoaded)
    }
}

/// One historical surface movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub phase: String,
    /// Ground speed in meters per second
    #[serde(alias = "Speed")]
    pub speed: f64,
    /// Movement duration in seconds
    pub time: f64,
}

const MIN_TAXI_SPEED_MPS: f64 = 1.0;
const MAX_TAXI_SPEED_MPS: f64 = 40.0;
const MIN_MOVEMENT_TIME_S: f64 = 1.0;

/// Statistical baseline: path length divided by a mean taxi speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSpeedModel {
    speed_mps: f64,
}

impl HistoricalSpeedModel {
    pub fn new(speed_mps: f64) -> Result<Self, PredictorError> {
        if !speed_mps.is_finite() || speed_mps <= 0.0 {
            return Err(PredictorError::InvalidModel(format!(
                "mean taxi speed must be positive, got {speed_mps}"
            )));
        }
        Ok(Self { speed_mps })
    }

    /// Mean speed over landing roll-outs with plausible taxi speeds.
    pub fn from_records(records: &[MovementRecord]) -> Result<Self, PredictorError> {
        let speeds: Vec<f64> = records
            .iter()
            .filter(|r| {
                r.phase.trim().eq_ignore_ascii_case("landing")
                    && r.speed > MIN_TAXI_SPEED_MPS
                    && r.speed < MAX_TAXI_SPEED_MPS
                    && r.time > MIN_MOVEMENT_TIME_S
            })
            .map(|r| r.speed)
            .collect();

        if speeds.is_empty() {
            return Err(PredictorError::InvalidModel(
                "no historical records pass the landing speed filter".to_string(),
            ));
        }
        let mean = speeds.iter().sum::<f64>() / speeds.len() as f64;
        tracing::info!(
            "Historical mean taxi speed {:.2} m/s from {} of {} records",
            mean,
            speeds.len(),
            records.len()
        );
        Self::new(mean)
    }

    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }
}

impl Predictor for HistoricalSpeedModel {
    fn is_loaded(&self) -> bool {
        true
    }

    fn predict(&self, input: &PredictionInput<'_>) -> Result<f64, PredictorError> {
        Ok(input.stats.length_m() / self.speed_mps)
    }
}

/// Path as a small graph: nodes in path order joined in both directions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathEncoding {
    /// `[lat, lon]` per node
    pub node_coords: Vec<[f64; 2]>,
    /// Directed edges as (source, target) node positions
    pub edge_index: Vec<(usize, usize)>,
    /// Haversine length of each directed edge, parallel to `edge_index`
    pub edge_length_m: Vec<f64>,
}

impl PathEncoding {
    pub fn from_path(path: &ResolvedPath) -> Self {
        let node_coords: Vec<[f64; 2]> = path.vertices().iter().map(|v| [v.lat, v.lon]).collect();
        let mut edge_index = Vec::with_capacity(node_coords.len().saturating_sub(1) * 2);
        let mut edge_length_m = Vec::with_capacity(edge_index.capacity());

        for (i, pair) in node_coords.windows(2).enumerate() {
            let length = haversine_distance(pair[0][0], pair[0][1], pair[1][0], pair[1][1]);
            edge_index.push((i, i + 1));
            edge_index.push((i + 1, i));
            edge_length_m.push(length);
            edge_length_m.push(length);
        }

        Self {
            node_coords,
            edge_index,
            edge_length_m,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_coords.len()
    }
}
