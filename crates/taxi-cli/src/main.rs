//! Taxi-time CLI - resolve clearances and predict taxi durations from the static airport tables

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taxi_core::tables::{load_movement_records, load_taxiway_table, load_vertex_table};
use taxi_core::{
    EstimatorKind, HistoricalSpeedModel, ModelSelector, PredictionContext, Predictor,
    TaxiwayGraph,
};

use crate::config::Config;

/// Resolve taxi clearances and predict taxi time
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Vertex table CSV (overrides TAXI_VERTEX_TABLE)
    #[arg(long)]
    vertices: Option<PathBuf>,

    /// Taxiway table CSV (overrides TAXI_TAXIWAY_TABLE)
    #[arg(long)]
    taxiways: Option<PathBuf>,

    /// Turn threshold in degrees (overrides TAXI_TURN_THRESHOLD_DEG)
    #[arg(long)]
    turn_threshold: Option<f64>,

    /// Per-estimator timeout in milliseconds (overrides TAXI_PREDICTOR_TIMEOUT_MS)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every indexed taxiway code
    Taxiways,

    /// Resolve a route to its vertex path
    Resolve {
        /// Clearance text, e.g. "RW27-C3-C-F5-F"
        route: String,
    },

    /// Predict the taxi duration of a route
    Predict {
        /// Clearance text, e.g. "RW27-C3-C-F5-F"
        route: String,

        /// gnn, rf or ensemble
        #[arg(long, default_value_t = ModelSelector::Ensemble)]
        model: ModelSelector,

        /// Historical movements CSV used to fit the rf mean taxi speed
        #[arg(long)]
        history: Option<PathBuf>,

        /// Fixed mean taxi speed in m/s for the rf slot
        #[arg(long, conflicts_with = "history")]
        rf_speed_mps: Option<f64>,

        /// Fixed mean taxi speed in m/s for the gnn slot
        #[arg(long)]
        gnn_speed_mps: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::from_env();
    apply_overrides(&mut config, &args);

    init_tracing(config.log_json)?;
    tracing::debug!("Configuration: {:?}", config);

    let graph = load_graph(&config)?;

    match args.command {
        Command::Taxiways => {
            let summaries = graph.taxiway_summaries();
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                for s in summaries {
                    println!(
                        "{:<8} {:<8} {:>4} vertices {:>4} edges {:>9.1} m",
                        s.code.as_str(),
                        s.category,
                        s.vertex_count,
                        s.edge_count,
                        s.length_m
                    );
                }
            }
        }
        Command::Resolve { route } => {
            let path = taxi_core::resolve_route(&route, &graph)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&path)?);
            } else {
                println!("{}", path.label());
                let ids: Vec<String> = path.vertex_ids().iter().map(|id| id.to_string()).collect();
                println!("vertices: {}", ids.join(" "));
                for warning in path.warnings() {
                    println!("warning: {}", warning);
                }
            }
        }
        Command::Predict {
            route,
            model,
            history,
            rf_speed_mps,
            gnn_speed_mps,
        } => {
            let mut context = PredictionContext::new(graph)
                .with_feature_config(config.feature_config())
                .with_adapter_config(config.adapter_config());

            if let Some(rf) = rf_estimator(history, rf_speed_mps)? {
                context = context.with_estimator(EstimatorKind::Rf, rf);
            }
            if let Some(speed) = gnn_speed_mps {
                context = context.with_estimator(
                    EstimatorKind::Gnn,
                    Arc::new(HistoricalSpeedModel::new(speed)?),
                );
            }

            let context = Arc::new(context);
            let result = context.predict_with_timeout(&route, model).await?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.route_label);
                println!(
                    "length {:.1} m ({:.0} ft), {} turns, sharpness {:.1} deg",
                    result.stats.length_m(),
                    result.stats.length_ft(),
                    result.stats.turn_count(),
                    result.stats.sharpness_deg()
                );
                for (kind, value) in result.estimates.iter() {
                    println!("{:<8} {:>8.1} s", kind.name(), value);
                }
                println!("{:<8} {:>8.1} s", "ensemble", result.ensemble_s);
            }
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(path) = &args.vertices {
        config.vertex_table = path.clone();
    }
    if let Some(path) = &args.taxiways {
        config.taxiway_table = path.clone();
    }
    if let Some(threshold) = args.turn_threshold {
        config.turn_threshold_deg = threshold;
    }
    if let Some(timeout) = args.timeout_ms {
        config.predictor_timeout_ms = timeout;
    }
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("taxi_core=info".parse()?)
        .add_directive("taxi_cli=info".parse()?);

    // Logs go to stderr so stdout stays machine-readable.
    if json {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
    Ok(())
}

/// Any table or construction failure aborts startup.
fn load_graph(config: &Config) -> Result<TaxiwayGraph> {
    let vertices = load_vertex_table(&config.vertex_table)
        .with_context(|| format!("loading vertex table {}", config.vertex_table.display()))?;
    let rows = load_taxiway_table(&config.taxiway_table)
        .with_context(|| format!("loading taxiway table {}", config.taxiway_table.display()))?;
    TaxiwayGraph::build(&vertices, &rows).context("building taxiway graph")
}

fn rf_estimator(
    history: Option<PathBuf>,
    speed_mps: Option<f64>,
) -> Result<Option<Arc<dyn Predictor>>> {
    if let Some(path) = history {
        let records = load_movement_records(&path)
            .with_context(|| format!("loading movement history {}", path.display()))?;
        return Ok(Some(Arc::new(HistoricalSpeedModel::from_records(&records)?)));
    }
    match speed_mps {
        Some(speed) => Ok(Some(Arc::new(HistoricalSpeedModel::new(speed)?))),
        None => Ok(None),
    }
}
