use crate::error::ScoutError;
use crate::models::{NetworkExchange, SessionOutcome};
use crate::scrapers::network::NetworkRecorder;
use crate::scrapers::types::FilterSpec;
use async_trait::async_trait;
use std::sync::Arc;

/// A long-lived browser that hands out isolated pages
pub trait BrowserHandle: Send + Sync {
    type Page: PageSession;

    fn open_page(&self) -> Result<Self::Page, ScoutError>;
}

/// One page of the automation engine, used by a single session
pub trait PageSession {
    /// Install the request observer before navigation starts
    fn observe_requests(&self, recorder: Arc<NetworkRecorder>) -> Result<(), ScoutError>;

    /// Navigate and wait for the page load to settle
    fn navigate(&self, url: &str) -> Result<(), ScoutError>;

    /// Block until any element matching the selector list is present
    fn wait_for_any(&self, selectors: &str) -> Result<(), ScoutError>;

    /// Serialized HTML of the rendered document
    fn content(&self) -> Result<String, ScoutError>;

    fn close(&self) -> Result<(), ScoutError>;
}

/// Everything one search produced
#[derive(Debug)]
pub struct SearchReport {
    pub url: String,
    pub outcome: Result<SessionOutcome, ScoutError>,
    pub exchanges: Vec<NetworkExchange>,
}

/// Common seam for the one-shot and server adapters
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Run one search session; the exchange log is returned whatever the outcome
    async fn search(&self, filter: &FilterSpec) -> SearchReport;

    fn source_name(&self) -> &'static str;
}
