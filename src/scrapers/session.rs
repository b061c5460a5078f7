use crate::error::ScoutError;
use crate::models::SessionOutcome;
use crate::scrapers::extract::{ResultExtractor, CHALLENGE, LISTING_CARD, NO_RESULTS};
use crate::scrapers::network::NetworkRecorder;
use crate::scrapers::traits::{BrowserHandle, PageSession};
use scraper::Html;
use std::sync::Arc;
use tracing::{info, warn};

/// Drive one page through a search: observe, navigate, wait, classify.
/// The page is closed before returning, whatever the outcome.
pub fn run_session<B: BrowserHandle>(
    browser: &B,
    url: &str,
    recorder: Arc<NetworkRecorder>,
    extractor: &ResultExtractor,
) -> Result<SessionOutcome, ScoutError> {
    let page = browser.open_page()?;
    let outcome = drive(&page, url, recorder, extractor);
    if let Err(e) = page.close() {
        warn!("Failed to close page: {}", e);
    }
    outcome
}

fn drive<P: PageSession>(
    page: &P,
    url: &str,
    recorder: Arc<NetworkRecorder>,
    extractor: &ResultExtractor,
) -> Result<SessionOutcome, ScoutError> {
    page.observe_requests(recorder)?;

    info!("Opening StreetEasy");
    page.navigate(url)?;

    info!("Waiting for search results");
    page.wait_for_any(&results_ready_selector())?;

    let html = page.content()?;
    let document = Html::parse_document(&html);
    Ok(classify(&document, extractor))
}

/// Cards, an explicit empty-results marker, or a bot challenge
fn results_ready_selector() -> String {
    [LISTING_CARD, NO_RESULTS, CHALLENGE].join(", ")
}

/// A challenge wins over everything else; extraction only runs when cards exist.
pub fn classify(document: &Html, extractor: &ResultExtractor) -> SessionOutcome {
    if extractor.has_challenge(document) {
        warn!("Bot challenge detected");
        return SessionOutcome::ChallengeDetected;
    }
    if !extractor.has_listings(document) {
        info!(
            marker = extractor.has_no_results_marker(document),
            "No search results"
        );
        return SessionOutcome::NoResults;
    }

    info!("Parsing search results");
    let records = extractor.extract(document);
    info!("Parsed {} listings", records.len());
    SessionOutcome::Success(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::testing::{spawn_origin, FakeBrowser};
    use reqwest::Client;
    use tokio::runtime::Handle;

    const CARDS: &str = r#"<div class="listingCard"><a href="/rental/1" data-label-id="1-a">one</a></div>
        <div class="listingCard"><a href="/rental/2" data-label-id="2-b">two</a></div>"#;

    async fn run(browser: FakeBrowser) -> (Result<SessionOutcome, ScoutError>, Arc<NetworkRecorder>) {
        let recorder = NetworkRecorder::new(Client::new(), Handle::current());
        let session_recorder = Arc::clone(&recorder);
        let outcome = tokio::task::spawn_blocking(move || {
            run_session(&browser, "https://streeteasy.com/for-rent/nyc/area:100", session_recorder, &ResultExtractor::new())
        })
        .await
        .unwrap();
        recorder.settle().await;
        (outcome, recorder)
    }

    #[test]
    fn waits_on_all_three_states() {
        assert_eq!(results_ready_selector(), ".listingCard, .no_results, #px-captcha");
    }

    #[tokio::test]
    async fn listing_cards_become_success() {
        let browser = FakeBrowser::with_html(CARDS);
        let closed = browser.closed_flag();
        let (outcome, _) = run(browser).await;

        match outcome.unwrap() {
            SessionOutcome::Success(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[1].id.as_deref(), Some("2"));
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert!(closed.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn empty_marker_becomes_no_results() {
        let browser = FakeBrowser::with_html(r#"<div class="no_results">No listings</div>"#);
        let (outcome, _) = run(browser).await;
        assert_eq!(outcome.unwrap(), SessionOutcome::NoResults);
    }

    #[tokio::test]
    async fn challenge_wins_and_log_is_kept() {
        let origin = spawn_origin().await;
        let html = format!(r#"<div id="px-captcha"></div>{}"#, CARDS);
        let browser = FakeBrowser::with_html(&html).firing(vec![format!("{}/", origin)]);
        let (outcome, recorder) = run(browser).await;

        assert_eq!(outcome.unwrap(), SessionOutcome::ChallengeDetected);
        let exchanges = recorder.exchanges();
        assert_eq!(exchanges.len(), 1);
        assert!(exchanges[0].success);
    }

    #[tokio::test]
    async fn navigation_failure_propagates_and_closes_page() {
        let browser = FakeBrowser::with_html(CARDS).failing_navigation();
        let closed = browser.closed_flag();
        let (outcome, _) = run(browser).await;

        assert!(matches!(outcome, Err(ScoutError::Navigation(_))));
        assert!(closed.load(std::sync::atomic::Ordering::SeqCst));
    }
}
