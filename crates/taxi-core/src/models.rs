//! Core data models for taxi route resolution and prediction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::spatial::haversine_distance;

/// Identifier of a surface-graph vertex as it appears in the vertex table.
pub type VertexId = u32;

/// A surface-graph vertex. Immutable once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub lat: f64,
    pub lon: f64,
}

impl Vertex {
    pub fn new(id: VertexId, lat: f64, lon: f64) -> Self {
        Self { id, lat, lon }
    }

    /// Great-circle distance to another vertex in meters.
    pub fn distance_to(&self, other: &Vertex) -> f64 {
        haversine_distance(self.lat, self.lon, other.lat, other.lon)
    }
}

/// One row of the taxiway table: a polyline of vertices owned by a taxiway ident.
///
/// A two-vertex row is a single edge record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxiwayRow {
    pub ident: String,
    pub vertices: Vec<VertexId>,
}

impl TaxiwayRow {
    pub fn new(ident: impl Into<String>, vertices: impl Into<Vec<VertexId>>) -> Self {
        Self {
            ident: ident.into(),
            vertices: vertices.into(),
        }
    }
}

/// Canonical taxiway code, e.g. `C` or `AA`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxiwayCode(String);

impl TaxiwayCode {
    /// Wrap an already canonical code. Input is uppercased.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxiwayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaxiwayCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Non-fatal: two consecutive codes were not directly adjacent and the
/// segment was bridged with a shortest-path search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisconnectedSegmentWarning {
    pub from_code: TaxiwayCode,
    pub to_code: TaxiwayCode,
    pub from_vertex: VertexId,
    pub to_vertex: VertexId,
    /// Vertices strictly between the two representatives on the bridge
    pub inserted_vertices: usize,
    pub bridge_length_m: f64,
}

impl fmt::Display for DisconnectedSegmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} not directly adjacent (vertex {} -> {}), bridged through {} vertices over {:.1} m",
            self.from_code,
            self.to_code,
            self.from_vertex,
            self.to_vertex,
            self.inserted_vertices,
            self.bridge_length_m
        )
    }
}

/// A connected walk over the surface graph.
///
/// Every consecutive vertex pair is joined by a graph edge, and the walk is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPath {
    vertices: Vec<Vertex>,
    codes: Vec<TaxiwayCode>,
    warnings: Vec<DisconnectedSegmentWarning>,
}

impl ResolvedPath {
    pub(crate) fn new(
        vertices: Vec<Vertex>,
        codes: Vec<TaxiwayCode>,
        warnings: Vec<DisconnectedSegmentWarning>,
    ) -> Self {
        debug_assert!(!vertices.is_empty());
        Self {
            vertices,
            codes,
            warnings,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.iter().map(|v| v.id).collect()
    }

    /// Taxiway codes traversed, consecutive duplicates collapsed.
    pub fn codes(&self) -> &[TaxiwayCode] {
        &self.codes
    }

    pub fn warnings(&self) -> &[DisconnectedSegmentWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The same walk traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            vertices: self.vertices.iter().rev().copied().collect(),
            codes: self.codes.iter().rev().cloned().collect(),
            warnings: Vec::new(),
        }
    }

    /// Human-readable summary of the collapsed code sequence.
    pub fn label(&self) -> String {
        route_label(&self.codes)
    }
}

/// Join codes with an arrow, e.g. `C → F`.
pub fn route_label(codes: &[TaxiwayCode]) -> String {
    codes
        .iter()
        .map(TaxiwayCode::as_str)
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Geometric descriptors of a resolved path. Derived only by the feature extractor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathStats {
    length_m: f64,
    length_ft: f64,
    turn_count: usize,
    sharpness_deg: f64,
}

impl PathStats {
    pub(crate) fn new(length_m: f64, turn_count: usize, sharpness_deg: f64) -> Self {
        Self {
            length_m,
            length_ft: length_m * crate::spatial::FEET_PER_METER,
            turn_count,
            sharpness_deg,
        }
    }

    pub fn length_m(&self) -> f64 {
        self.length_m
    }

    pub fn length_ft(&self) -> f64 {
        self.length_ft
    }

    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    /// Mean absolute direction change over counted turns, 0 when there are none.
    pub fn sharpness_deg(&self) -> f64 {
        self.sharpness_deg
    }

    /// Global feature vector in estimator order: length, turns, sharpness.
    pub fn feature_vector(&self) -> [f64; 3] {
        [self.length_m, self.turn_count as f64, self.sharpness_deg]
    }
}

/// The two independent estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    /// Graph neural network over the path encoding
    Gnn,
    /// Random forest over the global feature vector
    Rf,
}

impl EstimatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            EstimatorKind::Gnn => "gnn",
            EstimatorKind::Rf => "rf",
        }
    }
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which estimators a prediction request asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSelector {
    Gnn,
    Rf,
    #[default]
    Ensemble,
}

impl ModelSelector {
    pub fn estimators(&self) -> &'static [EstimatorKind] {
        match self {
            ModelSelector::Gnn => &[EstimatorKind::Gnn],
            ModelSelector::Rf => &[EstimatorKind::Rf],
            ModelSelector::Ensemble => &[EstimatorKind::Gnn, EstimatorKind::Rf],
        }
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelSelector::Gnn => "gnn",
            ModelSelector::Rf => "rf",
            ModelSelector::Ensemble => "ensemble",
        })
    }
}

impl FromStr for ModelSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gnn" => Ok(ModelSelector::Gnn),
            "rf" => Ok(ModelSelector::Rf),
            "ensemble" => Ok(ModelSelector::Ensemble),
            other => Err(format!(
                "unknown model '{other}', expected one of gnn, rf, ensemble"
            )),
        }
    }
}

/// Per-estimator durations in seconds. Absent means the estimator was not
/// requested or did not produce a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EstimatorValues {
    pub gnn: Option<f64>,
    pub rf: Option<f64>,
}

impl EstimatorValues {
    pub fn get(&self, kind: EstimatorKind) -> Option<f64> {
        match kind {
            EstimatorKind::Gnn => self.gnn,
            EstimatorKind::Rf => self.rf,
        }
    }

    pub(crate) fn set(&mut self, kind: EstimatorKind, value: f64) {
        match kind {
            EstimatorKind::Gnn => self.gnn = Some(value),
            EstimatorKind::Rf => self.rf = Some(value),
        }
    }

    /// Present values in estimator order.
    pub fn iter(&self) -> impl Iterator<Item = (EstimatorKind, f64)> + '_ {
        [EstimatorKind::Gnn, EstimatorKind::Rf]
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|value| (kind, value)))
    }

    /// Arithmetic mean of the present values.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .iter()
            .fold((0.0, 0usize), |(sum, count), (_, v)| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }
}

/// Outcome of a prediction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub route_label: String,
    pub codes: Vec<TaxiwayCode>,
    pub estimates: EstimatorValues,
    /// Mean of the available estimates in seconds
    pub ensemble_s: f64,
    pub stats: PathStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_parses_case_insensitively() {
        assert_eq!("GNN".parse::<ModelSelector>(), Ok(ModelSelector::Gnn));
        assert_eq!(" rf ".parse::<ModelSelector>(), Ok(ModelSelector::Rf));
        assert_eq!(
            "Ensemble".parse::<ModelSelector>(),
            Ok(ModelSelector::Ensemble)
        );
        assert!("xgboost".parse::<ModelSelector>().is_err());
    }

    #[test]
    fn ensemble_requests_both_estimators() {
        assert_eq!(
            ModelSelector::Ensemble.estimators(),
            &[EstimatorKind::Gnn, EstimatorKind::Rf]
        );
        assert_eq!(ModelSelector::Rf.estimators(), &[EstimatorKind::Rf]);
    }

    #[test]
    fn estimator_values_mean_ignores_absent() {
        let mut values = EstimatorValues::default();
        assert_eq!(values.mean(), None);
        values.set(EstimatorKind::Rf, 120.0);
        assert_eq!(values.mean(), Some(120.0));
        values.set(EstimatorKind::Gnn, 100.0);
        assert_eq!(values.mean(), Some(110.0));
    }

    #[test]
    fn route_label_joins_with_arrow() {
        let codes = vec![TaxiwayCode::new("c"), TaxiwayCode::new("F")];
        assert_eq!(route_label(&codes), "C → F");
        assert_eq!(route_label(&[]), "");
    }

    #[test]
    fn path_stats_converts_feet() {
        let stats = PathStats::new(100.0, 2, 45.0);
        assert!((stats.length_ft() - 328.084).abs() < 1e-9);
        assert_eq!(stats.feature_vector(), [100.0, 2.0, 45.0]);
    }
}
