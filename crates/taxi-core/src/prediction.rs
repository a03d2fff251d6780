//! Prediction pipeline: parse → resolve → extract → predict.
//!
//! The pipeline is linear and fail-fast. A failure at any stage aborts the
//! request; partial estimator availability only narrows the ensemble.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{PredictError, PredictorError, RouteError};
use crate::features::{FeatureConfig, FeatureExtractor};
use crate::graph::TaxiwayGraph;
use crate::models::{
    EstimatorKind, EstimatorValues, ModelSelector, PathStats, PredictionResult, ResolvedPath,
};
use crate::predictor::{PredictionInput, Predictor, UnavailablePredictor};
use crate::resolver::resolve_route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Upper bound on a single estimator call in [`PredictionContext::predict_with_timeout`]
    pub predictor_timeout_ms: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            predictor_timeout_ms: 2_000,
        }
    }
}

/// Immutable per-process context: the surface graph plus estimator handles.
///
/// Built once at startup and passed explicitly to every request.
pub struct PredictionContext {
    graph: TaxiwayGraph,
    extractor: FeatureExtractor,
    gnn: Arc<dyn Predictor>,
    rf: Arc<dyn Predictor>,
    config: AdapterConfig,
}

impl PredictionContext {
    /// Context with both estimators unavailable.
    pub fn new(graph: TaxiwayGraph) -> Self {
        Self {
            graph,
            extractor: FeatureExtractor::default(),
            gnn: Arc::new(UnavailablePredictor),
            rf: Arc::new(UnavailablePredictor),
            config: AdapterConfig::default(),
        }
    }

    pub fn with_estimator(mut self, kind: EstimatorKind, predictor: Arc<dyn Predictor>) -> Self {
        match kind {
            EstimatorKind::Gnn => self.gnn = predictor,
            EstimatorKind::Rf => self.rf = predictor,
        }
        self
    }

    pub fn with_feature_config(mut self, config: FeatureConfig) -> Self {
        self.extractor = FeatureExtractor::new(config);
        self
    }

    pub fn with_adapter_config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn graph(&self) -> &TaxiwayGraph {
        &self.graph
    }

    pub fn estimator(&self, kind: EstimatorKind) -> &Arc<dyn Predictor> {
        match kind {
            EstimatorKind::Gnn => &self.gnn,
            EstimatorKind::Rf => &self.rf,
        }
    }

    /// Route string to connected vertex path.
    pub fn resolve_route(&self, route: &str) -> Result<ResolvedPath, RouteError> {
        resolve_route(route, &self.graph)
    }

    /// Geometric descriptors of a resolved path.
    pub fn compute_features(&self, path: &ResolvedPath) -> PathStats {
        self.extractor.extract(path)
    }

    /// Run the full pipeline, calling each requested estimator inline.
    pub fn predict(
        &self,
        route: &str,
        selector: ModelSelector,
    ) -> Result<PredictionResult, PredictError> {
        let path = self.resolve_route(route)?;
        let stats = self.compute_features(&path);
        let input = PredictionInput::new(&stats, &path);

        let outcomes = selector
            .estimators()
            .iter()
            .map(|&kind| (kind, run_estimator(self.estimator(kind).as_ref(), &input)))
            .collect();

        assemble(selector, &path, stats, outcomes)
    }

    /// Run the full pipeline with every estimator on the blocking pool under
    /// a shared deadline. An estimator that misses the deadline counts as
    /// unavailable for this request.
    pub async fn predict_with_timeout(
        self: Arc<Self>,
        route: &str,
        selector: ModelSelector,
    ) -> Result<PredictionResult, PredictError> {
        let path = Arc::new(self.resolve_route(route)?);
        let stats = self.compute_features(&path);

        let timeout = Duration::from_millis(self.config.predictor_timeout_ms);
        let deadline = tokio::time::Instant::now() + timeout;

        let handles: Vec<_> = selector
            .estimators()
            .iter()
            .map(|&kind| {
                let estimator = Arc::clone(self.estimator(kind));
                let path = Arc::clone(&path);
                let handle = tokio::task::spawn_blocking(move || {
                    run_estimator(estimator.as_ref(), &PredictionInput::new(&stats, &path))
                });
                (kind, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            let outcome = match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => Err(PredictorError::Inference(format!(
                    "estimator task failed: {join_err}"
                ))),
                Err(_) => Err(PredictorError::TimedOut(timeout.as_millis())),
            };
            outcomes.push((kind, outcome));
        }

        assemble(selector, &path, stats, outcomes)
    }
}

fn run_estimator(predictor: &dyn Predictor, input: &PredictionInput<'_>) -> Result<f64, PredictorError> {
    if !predictor.is_loaded() {
        return Err(PredictorError::NotLoaded);
    }
    let value = predictor.predict(input)?;
    if !value.is_finite() {
        return Err(PredictorError::NonFinite(value));
    }
    Ok(value)
}

fn assemble(
    selector: ModelSelector,
    path: &ResolvedPath,
    stats: PathStats,
    outcomes: Vec<(EstimatorKind, Result<f64, PredictorError>)>,
) -> Result<PredictionResult, PredictError> {
    let mut estimates = EstimatorValues::default();
    let mut failures = Vec::new();

    for (kind, outcome) in outcomes {
        match outcome {
            Ok(value) => estimates.set(kind, value),
            Err(err) => {
                tracing::warn!("Estimator {} unavailable: {}", kind, err);
                failures.push((kind, err));
            }
        }
    }

    let Some(ensemble_s) = estimates.mean() else {
        return Err(PredictError::ModelUnavailable {
            requested: selector,
            failures,
        });
    };

    tracing::debug!(
        "Predicted {:.1} s for {} ({} of {} estimators)",
        ensemble_s,
        path.label(),
        estimates.iter().count(),
        selector.estimators().len()
    );

    Ok(PredictionResult {
        route_label: path.label(),
        codes: path.codes().to_vec(),
        estimates,
        ensemble_s,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaxiwayRow, Vertex};
    use crate::spatial::offset_position;

    struct Fixed(f64);

    impl Predictor for Fixed {
        fn is_loaded(&self) -> bool {
            true
        }

        fn predict(&self, _input: &PredictionInput<'_>) -> Result<f64, PredictorError> {
            Ok(self.0)
        }
    }

    struct Failing;

    impl Predictor for Failing {
        fn is_loaded(&self) -> bool {
            true
        }

        fn predict(&self, _input: &PredictionInput<'_>) -> Result<f64, PredictorError> {
            Err(PredictorError::Inference("tensor shape mismatch".to_string()))
        }
    }

    struct Slow;

    impl Predictor for Slow {
        fn is_loaded(&self) -> bool {
            true
        }

        fn predict(&self, _input: &PredictionInput<'_>) -> Result<f64, PredictorError> {
            std::thread::sleep(Duration::from_millis(400));
            Ok(1.0)
        }
    }

    fn graph() -> TaxiwayGraph {
        let vertices: Vec<Vertex> = [(1, 0.0, 0.0), (2, 0.0, 100.0), (3, 100.0, 100.0)]
            .iter()
            .map(|&(id, n, e)| {
                let (lat, lon) = offset_position(40.85, -74.06, n, e);
                Vertex::new(id, lat, lon)
            })
            .collect();
        let rows = vec![TaxiwayRow::new("A", vec![1, 2]), TaxiwayRow::new("B", vec![2, 3])];
        TaxiwayGraph::build(&vertices, &rows).expect("build")
    }

    fn context(gnn: Arc<dyn Predictor>, rf: Arc<dyn Predictor>) -> PredictionContext {
        PredictionContext::new(graph())
            .with_estimator(EstimatorKind::Gnn, gnn)
            .with_estimator(EstimatorKind::Rf, rf)
    }

    #[test]
    fn ensemble_is_mean_of_both() {
        let ctx = context(Arc::new(Fixed(100.0)), Arc::new(Fixed(140.0)));
        let result = ctx.predict("A-B", ModelSelector::Ensemble).expect("predict");
        assert_eq!(result.estimates.gnn, Some(100.0));
        assert_eq!(result.estimates.rf, Some(140.0));
        assert_eq!(result.ensemble_s, 120.0);
        assert_eq!(result.route_label, "A → B");
    }

    #[test]
    fn single_selector_only_runs_that_estimator() {
        let ctx = context(Arc::new(Fixed(100.0)), Arc::new(Fixed(140.0)));
        let result = ctx.predict("A-B", ModelSelector::Rf).expect("predict");
        assert_eq!(result.estimates.gnn, None);
        assert_eq!(result.estimates.rf, Some(140.0));
        assert_eq!(result.ensemble_s, 140.0);
    }

    #[test]
    fn one_failure_degrades_ensemble() {
        let ctx = context(Arc::new(Failing), Arc::new(Fixed(90.0)));
        let result = ctx.predict("A-B", ModelSelector::Ensemble).expect("predict");
        assert_eq!(result.estimates.gnn, None);
        assert_eq!(result.ensemble_s, 90.0);
    }

    #[test]
    fn all_unavailable_is_an_error() {
        let ctx = PredictionContext::new(graph());
        let err = ctx.predict("A-B", ModelSelector::Ensemble).unwrap_err();
        match err {
            PredictError::ModelUnavailable {
                requested,
                failures,
            } => {
                assert_eq!(requested, ModelSelector::Ensemble);
                assert_eq!(failures.len(), 2);
                assert!(failures.iter().all(|(_, e)| *e == PredictorError::NotLoaded));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_finite_output_counts_as_failure() {
        let ctx = context(Arc::new(Fixed(f64::NAN)), Arc::new(Fixed(30.0)));
        let result = ctx.predict("A-B", ModelSelector::Ensemble).expect("predict");
        assert_eq!(result.estimates.gnn, None);
        assert_eq!(result.ensemble_s, 30.0);

        let err = ctx.predict("A-B", ModelSelector::Gnn).unwrap_err();
        assert!(matches!(err, PredictError::ModelUnavailable { .. }));
    }

    #[test]
    fn route_errors_abort_before_prediction() {
        let ctx = context(Arc::new(Fixed(1.0)), Arc::new(Fixed(1.0)));
        assert!(matches!(
            ctx.predict("A-Z", ModelSelector::Ensemble),
            Err(PredictError::Route(RouteError::UnknownTaxiway { .. }))
        ));
        assert!(matches!(
            ctx.predict("", ModelSelector::Ensemble),
            Err(PredictError::Route(RouteError::InvalidRoute(_)))
        ));
    }

    #[tokio::test]
    async fn slow_estimator_times_out_and_degrades() {
        let ctx = Arc::new(
            context(Arc::new(Slow), Arc::new(Fixed(75.0))).with_adapter_config(AdapterConfig {
                predictor_timeout_ms: 50,
            }),
        );
        let result = ctx
            .predict_with_timeout("A-B", ModelSelector::Ensemble)
            .await
            .expect("predict");
        assert_eq!(result.estimates.gnn, None);
        assert_eq!(result.estimates.rf, Some(75.0));
        assert_eq!(result.ensemble_s, 75.0);
    }

    #[tokio::test]
    async fn timed_prediction_matches_inline() {
        let ctx = Arc::new(context(Arc::new(Fixed(100.0)), Arc::new(Fixed(50.0))));
        let inline = ctx.predict("A-B", ModelSelector::Ensemble).expect("inline");
        let timed = Arc::clone(&ctx)
            .predict_with_timeout("A-B", ModelSelector::Ensemble)
            .await
            .expect("timed");
        assert_eq!(inline, timed);
    }
}
