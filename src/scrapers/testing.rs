//! Test doubles: a scripted browser and a local origin server.

use crate::error::ScoutError;
use crate::models::ObservedRequest;
use crate::scrapers::network::NetworkRecorder;
use crate::scrapers::traits::{BrowserHandle, PageSession};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Serves `/` with 200 "origin ok" and `/missing` with 404 "no such page".
pub async fn spawn_origin() -> String {
    let app = Router::new()
        .route("/", get(|| async { "origin ok" }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "no such page") }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Hands out pages that render fixed HTML and fire fixed requests
#[derive(Clone)]
pub struct FakeBrowser {
    html: String,
    requests: Vec<String>,
    fail_navigation: bool,
    closed: Arc<AtomicBool>,
}

impl FakeBrowser {
    pub fn with_html(html: &str) -> Self {
        Self {
            html: html.to_string(),
            requests: Vec::new(),
            fail_navigation: false,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn firing(mut self, requests: Vec<String>) -> Self {
        self.requests = requests;
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl BrowserHandle for FakeBrowser {
    type Page = FakeBrowser;

    fn open_page(&self) -> Result<Self::Page, ScoutError> {
        Ok(self.clone())
    }
}

impl PageSession for FakeBrowser {
    fn observe_requests(&self, recorder: Arc<NetworkRecorder>) -> Result<(), ScoutError> {
        for url in &self.requests {
            recorder.observe(ObservedRequest {
                url: url.clone(),
                headers: json!({}),
                post_data: None,
            });
        }
        Ok(())
    }

    fn navigate(&self, _url: &str) -> Result<(), ScoutError> {
        if self.fail_navigation {
            return Err(ScoutError::Navigation("timed out after 30s".to_string()));
        }
        Ok(())
    }

    fn wait_for_any(&self, _selectors: &str) -> Result<(), ScoutError> {
        Ok(())
    }

    fn content(&self) -> Result<String, ScoutError> {
        Ok(self.html.clone())
    }

    fn close(&self) -> Result<(), ScoutError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
