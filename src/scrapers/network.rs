use crate::models::{NetworkExchange, ObservedRequest};
use anyhow::{Context, Result};
use reqwest::Client;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Replays every observed page request on a side channel and keeps the
/// resulting exchanges, in completion order, for the lifetime of one session.
pub struct NetworkRecorder {
    client: Client,
    runtime: Handle,
    exchanges: Arc<Mutex<Vec<NetworkExchange>>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl NetworkRecorder {
    pub fn new(client: Client, runtime: Handle) -> Arc<Self> {
        Arc::new(Self {
            client,
            runtime,
            exchanges: Arc::new(Mutex::new(Vec::new())),
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Start the side-channel fetch and return immediately. Safe to call from
    /// any thread, including the engine's event thread.
    pub fn observe(&self, request: ObservedRequest) {
        debug!(url = %request.url, "Intercepted request");
        let client = self.client.clone();
        let exchanges = Arc::clone(&self.exchanges);
        let task = self.runtime.spawn(async move {
            let exchange = fetch(&client, request).await;
            lock(&exchanges).push(exchange);
        });
        lock(&self.pending).push(task);
    }

    /// Wait for every side-channel fetch started so far
    pub async fn settle(&self) {
        loop {
            let tasks: Vec<_> = lock(&self.pending).drain(..).collect();
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    warn!("Side-channel fetch task failed: {}", e);
                }
            }
        }
    }

    pub fn exchanges(&self) -> Vec<NetworkExchange> {
        lock(&self.exchanges).clone()
    }
}

async fn fetch(client: &Client, request: ObservedRequest) -> NetworkExchange {
    let response = match client.get(&request.url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %request.url, "Side-channel fetch failed: {}", e);
            return NetworkExchange::failed(request, e.status().map(|s| s.as_u16()), e.to_string());
        }
    };

    let status = response.status();
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return NetworkExchange::failed(request, Some(status.as_u16()), e.to_string()),
    };

    if status.is_success() {
        NetworkExchange::succeeded(request, headers, body)
    } else {
        NetworkExchange::failed(request, Some(status.as_u16()), body)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Dump the exchange log as JSON
pub async fn persist(path: &Path, exchanges: &[NetworkExchange]) -> Result<()> {
    let json = serde_json::to_string(exchanges)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write request log {}", path.display()))
}
