//! SurvPlot server binary.
//!
//! Loads the configured dataset once at startup, normalises it, and serves
//! the survival analysis REST API (with Swagger UI) over the resulting
//! immutable cohort.

use std::path::Path;
use std::sync::Arc;

use api_rest::{router, AppState};
use chrono::Utc;
use survplot_core::{follow_up_cutoff_from_env_value, load_cohort, CoreConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the SurvPlot REST API server
///
/// # Environment Variables
/// - `SURVPLOT_ADDR`: server address (default: "0.0.0.0:3000")
/// - `SURVPLOT_DATASET`: path to the JSON dataset (default: "data/patients.json")
/// - `SURVPLOT_FOLLOW_UP_CUTOFF`: follow-up freshness cutoff as MM/DD/YYYY
///   (default: 02/01/2015)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the dataset file is missing or does not deserialise,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("survplot_run=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("SURVPLOT_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let dataset = std::env::var("SURVPLOT_DATASET").unwrap_or_else(|_| "data/patients.json".into());

    let dataset_path = Path::new(&dataset);
    if !dataset_path.is_file() {
        anyhow::bail!("Dataset file does not exist: {}", dataset_path.display());
    }

    let cutoff = follow_up_cutoff_from_env_value(std::env::var("SURVPLOT_FOLLOW_UP_CUTOFF").ok())?;
    let cfg = CoreConfig::new(Utc::now().date_naive(), cutoff)?;

    let cohort = load_cohort(dataset_path, &cfg)?;
    tracing::info!(
        "-- Loaded {} patients from {} ({} rejected, {} warnings)",
        cohort.patients.len(),
        dataset_path.display(),
        cohort.rejected.len(),
        cohort.warnings.len()
    );
    tracing::info!("-- Starting SurvPlot REST API on {}", addr);

    let state = AppState {
        cohort: Arc::new(cohort.patients),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
