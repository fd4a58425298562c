use std::io::Read;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod model;
mod service;

use app::AppState;
use model::Config;

/// Narrative from the command-line arguments, or stdin when none are given
fn read_narrative() -> std::io::Result<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return Ok(args.join(" "));
    }

    let mut narrative = String::new();
    std::io::stdin().read_to_string(&mut narrative)?;
    Ok(narrative)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Initialize tracing; stdout is reserved for the envelope
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize application");
            return ExitCode::FAILURE;
        }
    };

    let narrative = match read_narrative() {
        Ok(narrative) => narrative,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read narrative");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(categories = state.taxonomy.len(), "Classifying narrative");

    let envelope = state.orchestrator.classify(&narrative).await;

    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response envelope");
            ExitCode::FAILURE
        }
    }
}
