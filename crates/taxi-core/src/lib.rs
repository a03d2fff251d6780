//! Taxi-time core: route resolution and geometric features over an airport
//! surface graph, plus the adapter that feeds them to duration estimators.

pub mod error;
pub mod features;
pub mod graph;
pub mod models;
pub mod prediction;
pub mod predictor;
pub mod resolver;
pub mod route_parser;
pub mod spatial;
pub mod tables;

pub use error::{GraphConstructionError, PredictError, PredictorError, RouteError, TableError};
pub use features::{FeatureConfig, FeatureExtractor, DEFAULT_TURN_THRESHOLD_DEG};
pub use graph::{TaxiwayCategory, TaxiwayGraph, TaxiwaySummary};
pub use models::{
    DisconnectedSegmentWarning, EstimatorKind, EstimatorValues, ModelSelector, PathStats,
    PredictionResult, ResolvedPath, TaxiwayCode, TaxiwayRow, Vertex, VertexId,
};
pub use prediction::{AdapterConfig, PredictionContext};
pub use predictor::{
    HistoricalSpeedModel, MovementRecord, PathEncoding, PredictionInput, Predictor,
    UnavailablePredictor,
};
pub use resolver::{resolve_codes, resolve_route, shortest_path};
pub use route_parser::parse_route;
pub use spatial::haversine_distance;
