use crate::error::ScoutError;
use crate::models::ListingRecord;
use crate::scrapers::network;
use crate::scrapers::{FilterInput, ListingSource, QueryTranslator};
use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<QueryTranslator>,
    pub source: Arc<dyn ListingSource>,
    pub requests_log: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Records { records: Vec<ListingRecord> },
    Error { error: String },
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/request", get(handle_request))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn handle_request(
    State(state): State<AppState>,
    Query(input): Query<FilterInput>,
) -> (StatusCode, Json<SearchResponse>) {
    let filter = match state.translator.resolve(&input) {
        Ok(filter) => filter,
        Err(e) => {
            warn!("Rejected request: {}", e);
            return error_response(&e);
        }
    };

    let report = state.source.search(&filter).await;
    let records = report.outcome.and_then(|outcome| outcome.into_records());

    match records {
        Ok(records) => (StatusCode::OK, Json(SearchResponse::Records { records })),
        Err(e) => {
            if matches!(e, ScoutError::ChallengeDetected) {
                if let Err(write_err) = network::persist(&state.requests_log, &report.exchanges).await {
                    error!("{:#}", write_err);
                }
            }
            error_response(&e)
        }
    }
}

fn error_response(e: &ScoutError) -> (StatusCode, Json<SearchResponse>) {
    let status = match e {
        ScoutError::Validation(_) => StatusCode::BAD_REQUEST,
        ScoutError::ChallengeDetected => StatusCode::SERVICE_UNAVAILABLE,
        ScoutError::Navigation(_) => StatusCode::GATEWAY_TIMEOUT,
        ScoutError::Browser(_) | ScoutError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(SearchResponse::Error { error: e.to_string() }))
}
