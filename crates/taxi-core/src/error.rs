//! Error taxonomy for graph construction, route resolution and prediction.

use thiserror::Error;

use crate::models::{EstimatorKind, ModelSelector, TaxiwayCode, VertexId};

/// Fatal at startup: the service must not run on a partially built graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphConstructionError {
    #[error("vertex table is empty")]
    NoVertices,
    #[error("duplicate vertex id {0}")]
    DuplicateVertex(VertexId),
    #[error("vertex {id} has missing or invalid coordinates ({lat}, {lon})")]
    InvalidCoordinates { id: VertexId, lat: f64, lon: f64 },
    #[error("taxiway '{ident}' references vertex {vertex} which is not in the vertex table")]
    DanglingVertex { ident: String, vertex: VertexId },
    #[error("taxiway '{ident}' needs at least two distinct vertices, got {count}")]
    DegenerateTaxiway { ident: String, count: usize },
    #[error("taxiway row has an empty ident")]
    EmptyIdent,
}

/// Failures turning a route string into a vertex path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("invalid route: {0}")]
    InvalidRoute(String),
    #[error("unknown taxiway '{code}'")]
    UnknownTaxiway { code: TaxiwayCode },
    #[error("no path on the surface graph between vertex {from} and vertex {to}")]
    NoConnectingPath { from: VertexId, to: VertexId },
}

/// A single estimator could not produce a value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictorError {
    #[error("estimator is not loaded")]
    NotLoaded,
    #[error("estimator produced a non-finite value ({0})")]
    NonFinite(f64),
    #[error("estimator did not answer within {0} ms")]
    TimedOut(u128),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("invalid estimator model: {0}")]
    InvalidModel(String),
}

/// Failures of the full predict pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("no estimator available for '{requested}': {}", format_failures(.failures))]
    ModelUnavailable {
        requested: ModelSelector,
        failures: Vec<(EstimatorKind, PredictorError)>,
    },
}

fn format_failures(failures: &[(EstimatorKind, PredictorError)]) -> String {
    failures
        .iter()
        .map(|(kind, err)| format!("{kind}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures reading the source tables.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("failure reading table {path}: {source}")]
    Csv { path: String, source: csv::Error },
    #[error("table {path} has no column matching '{column}'")]
    MissingColumn { path: String, column: &'static str },
    #[error("table {path} row {row}: {message}")]
    InvalidRow {
        path: String,
        row: usize,
        message: String,
    },
    #[error("table {path} contains no usable records")]
    Empty { path: String },
}
