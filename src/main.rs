mod config;
mod error;
mod models;
mod scrapers;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use config::Settings;
use error::ScoutError;
use scrapers::network;
use scrapers::{ChromeBrowser, FilterInput, ListingSource, QueryTranslator, ReferenceData, StreetEasyScout};
use scrapers::types::FilterSpec;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Search StreetEasy listings through a headless browser
#[derive(Parser)]
#[command(name = "streeteasy-scout", version)]
struct Cli {
    #[command(flatten)]
    filter: FilterInput,

    #[command(flatten)]
    settings: Settings,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr; stdout carries the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings;

    let reference = ReferenceData::load(&settings.data_dir)?;
    let translator = Arc::new(QueryTranslator::new(reference, &settings.base_url));

    if settings.webui {
        run_server(settings, translator).await?;
        return Ok(ExitCode::SUCCESS);
    }

    run_once(&settings, translator, &cli.filter).await
}

async fn run_server(settings: Settings, translator: Arc<QueryTranslator>) -> Result<()> {
    let browser = Arc::new(ChromeBrowser::launch(&settings)?);
    info!("Launched browser");

    let source = StreetEasyScout::new(browser, Arc::clone(&translator))?;
    let state = server::AppState {
        translator,
        source: Arc::new(source),
        requests_log: settings.requests_log.clone(),
    };
    server::serve(settings.listen_addr(), state).await
}

/// Validation failures go straight to stderr, independent of the log filter.
fn resolve_or_report(translator: &QueryTranslator, input: &FilterInput, stderr: &mut impl Write) -> Option<FilterSpec> {
    match translator.resolve(input) {
        Ok(filter) => Some(filter),
        Err(e) => {
            error!("{}", e);
            let _ = writeln!(stderr, "{}", e);
            None
        }
    }
}

async fn run_once(settings: &Settings, translator: Arc<QueryTranslator>, input: &FilterInput) -> Result<ExitCode> {
    let Some(filter) = resolve_or_report(&translator, input, &mut std::io::stderr()) else {
        return Ok(ExitCode::FAILURE);
    };
    info!(?filter, "Launching browser");

    let browser = Arc::new(ChromeBrowser::launch(settings)?);
    let scout = StreetEasyScout::new(browser, Arc::clone(&translator))?;
    let report = scout.search(&filter).await;
    info!(url = %report.url, "{} search finished", scout.source_name());

    network::persist(&settings.requests_log, &report.exchanges).await?;
    info!(
        "💾 Saved {} requests to {}",
        report.exchanges.len(),
        settings.requests_log.display()
    );

    match report.outcome.and_then(|outcome| outcome.into_records()) {
        Ok(records) => {
            let json = serde_json::to_string(&records)?;
            println!("{}", json);
            tokio::fs::write(&settings.output, &json)
                .await
                .with_context(|| format!("Failed to write {}", settings.output.display()))?;
            info!("💾 Saved {} listings to {}", records.len(), settings.output.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ ScoutError::ChallengeDetected) => {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            error!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
