// src/ingest/transport.rs
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::ingest::types::Transport;

/// reqwest-backed GET -> JSON.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pandemic-news-feed/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5).min(timeout))
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            // reqwest errors embed the URL, which carries the credential
            .map_err(|e| anyhow!("request failed: {}", e.without_url()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("http status {status}"));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| anyhow!("invalid json body: {}", e.without_url()))
    }
}

/// Lets one transport be shared between a runtime and its observers.
#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get_json(&self, url: &str) -> Result<Value> {
        (**self).get_json(url).await
    }
}

/// Canned responses keyed by exact URL; unknown URLs fail like a dead host.
/// Counts every call so tests can assert that no request was made.
#[derive(Default)]
pub struct StaticTransport {
    responses: HashMap<String, Value>,
    calls: AtomicUsize,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: Value) -> Self {
        self.responses.insert(url.to_string(), body);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused"))
    }
}
