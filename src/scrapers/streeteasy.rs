use crate::error::ScoutError;
use crate::models::SessionOutcome;
use crate::scrapers::extract::ResultExtractor;
use crate::scrapers::network::NetworkRecorder;
use crate::scrapers::query::QueryTranslator;
use crate::scrapers::session::run_session;
use crate::scrapers::traits::{BrowserHandle, ListingSource, SearchReport};
use crate::scrapers::types::FilterSpec;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// StreetEasy search over a shared browser; every search gets its own page
pub struct StreetEasyScout<B> {
    browser: Arc<B>,
    translator: Arc<QueryTranslator>,
    extractor: Arc<ResultExtractor>,
    client: Client,
}

impl<B: BrowserHandle + 'static> StreetEasyScout<B> {
    pub fn new(browser: Arc<B>, translator: Arc<QueryTranslator>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(browser, translator, client))
    }

    pub fn with_client(browser: Arc<B>, translator: Arc<QueryTranslator>, client: Client) -> Self {
        Self {
            browser,
            translator,
            extractor: Arc::new(ResultExtractor::new()),
            client,
        }
    }
}

#[async_trait]
impl<B: BrowserHandle + 'static> ListingSource for StreetEasyScout<B> {
    async fn search(&self, filter: &FilterSpec) -> SearchReport {
        let url = self.translator.build_url(filter);
        info!("url: {}", url);

        let recorder = NetworkRecorder::new(self.client.clone(), Handle::current());
        let browser = Arc::clone(&self.browser);
        let extractor = Arc::clone(&self.extractor);
        let session_recorder = Arc::clone(&recorder);
        let target = url.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            run_session(browser.as_ref(), &target, session_recorder, &extractor)
        })
        .await
        .unwrap_or_else(|e| Err(ScoutError::Session(e.to_string())));

        recorder.settle().await;
        let exchanges = recorder.exchanges();

        match &outcome {
            Ok(SessionOutcome::Success(records)) => {
                info!(requests = exchanges.len(), "Done: {} listings", records.len())
            }
            Ok(SessionOutcome::NoResults) => info!(requests = exchanges.len(), "Done: no results"),
            Ok(SessionOutcome::ChallengeDetected) => {
                warn!(requests = exchanges.len(), "Error: Received CAPTCHA")
            }
            Err(e) => warn!(requests = exchanges.len(), "Session failed: {}", e),
        }

        SearchReport {
            url,
            outcome,
            exchanges,
        }
    }

    fn source_name(&self) -> &'static str {
        "StreetEasy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::lookup::{LookupEntry, LookupTable, ReferenceData};
    use crate::scrapers::testing::{spawn_origin, FakeBrowser};
    use crate::scrapers::types::FilterInput;

    fn translator() -> Arc<QueryTranslator> {
        let reference = ReferenceData {
            areas: LookupTable::new(vec![LookupEntry { id: 100, name: "Manhattan".to_string() }]),
            ..Default::default()
        };
        Arc::new(QueryTranslator::new(reference, "https://streeteasy.com/"))
    }

    fn manhattan_rentals(translator: &QueryTranslator) -> FilterSpec {
        translator
            .resolve(&FilterInput {
                rent: true,
                locations: Some("Manhattan".to_string()),
                ..Default::default()
            })
            .unwrap()
    }

    #[tokio::test]
    async fn search_reports_url_outcome_and_exchanges() {
        let origin = spawn_origin().await;
        let browser = FakeBrowser::with_html(r#"<div class="listingCard"><a href="/rental/9">n</a></div>"#)
            .firing(vec![format!("{}/", origin), format!("{}/missing", origin)]);
        let translator = translator();
        let scout = StreetEasyScout::new(Arc::new(browser), Arc::clone(&translator)).unwrap();

        let report = scout.search(&manhattan_rentals(&translator)).await;

        assert_eq!(report.url, "https://streeteasy.com/for-rent/nyc/area:100");
        match report.outcome.unwrap() {
            SessionOutcome::Success(records) => assert_eq!(records[0].url.as_deref(), Some("/rental/9")),
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(report.exchanges.len(), 2);
        assert_eq!(report.exchanges.iter().filter(|e| e.success).count(), 1);
        assert_eq!(scout.source_name(), "StreetEasy");
    }

    #[tokio::test]
    async fn failed_session_still_returns_log() {
        let origin = spawn_origin().await;
        let browser = FakeBrowser::with_html("")
            .firing(vec![format!("{}/", origin)])
            .failing_navigation();
        let translator = translator();
        let scout = StreetEasyScout::new(Arc::new(browser), Arc::clone(&translator)).unwrap();

        let report = scout.search(&manhattan_rentals(&translator)).await;

        assert!(matches!(report.outcome, Err(ScoutError::Navigation(_))));
        assert_eq!(report.exchanges.len(), 1);
    }
}
