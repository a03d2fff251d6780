//! CLI configuration from environment.

use std::env;
use std::path::PathBuf;

use taxi_core::{AdapterConfig, FeatureConfig, DEFAULT_TURN_THRESHOLD_DEG};

#[derive(Debug, Clone)]
pub struct Config {
    pub vertex_table: PathBuf,
    pub taxiway_table: PathBuf,
    pub turn_threshold_deg: f64,
    pub predictor_timeout_ms: u64,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            vertex_table: env::var("TAXI_VERTEX_TABLE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/vertices.csv")),
            taxiway_table: env::var("TAXI_TAXIWAY_TABLE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/taxiways.csv")),
            turn_threshold_deg: env::var("TAXI_TURN_THRESHOLD_DEG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TURN_THRESHOLD_DEG),
            predictor_timeout_ms: env::var("TAXI_PREDICTOR_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| AdapterConfig::default().predictor_timeout_ms),
            log_json: env::var("TAXI_LOG_JSON")
                .map(|s| matches!(s.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    pub fn feature_config(&self) -> FeatureConfig {
        FeatureConfig {
            turn_threshold_deg: self.turn_threshold_deg,
            ..FeatureConfig::default()
        }
    }

    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            predictor_timeout_ms: self.predictor_timeout_ms,
        }
    }
}
