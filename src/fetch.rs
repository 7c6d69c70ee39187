use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::StatusCode;
use spider_client::{RequestParams, Spider};
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::page::PageSnapshot;
use crate::settings::{Backend, Settings};

const BASE_BACKOFF_MS: u64 = 2000;
const MAX_BACKOFF_MS: u64 = 60_000;

/// A fetch session. Owned by the batch driver for one run and closed when
/// dropped.
#[async_trait]
pub trait PageSource: Send {
    async fn fetch(&mut self, url: &str) -> Result<PageSnapshot, FetchError>;
}

/// Open the session for the configured backend.
pub fn open(settings: &Settings) -> anyhow::Result<Box<dyn PageSource>> {
    Ok(match settings.backend {
        Backend::Http => Box::new(HttpSource::new(settings)?),
        Backend::Spider => {
            let api_key = std::env::var("SPIDER_API_KEY").map_err(|_| {
                anyhow::anyhow!("SPIDER_API_KEY environment variable must be set")
            })?;
            Box::new(SpiderSource::new(api_key, settings.max_retries)?)
        }
    })
}

fn retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff(attempt: u32) -> Duration {
    let ms = 2u64
        .checked_pow(attempt)
        .map_or(MAX_BACKOFF_MS, |f| BASE_BACKOFF_MS.saturating_mul(f));
    Duration::from_millis(ms.min(MAX_BACKOFF_MS))
}

// ── Plain HTTP ──

pub struct HttpSource {
    client: reqwest::Client,
    max_retries: u32,
    fetched: usize,
}

impl HttpSource {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9,en;q=0.8"));

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(HttpSource {
            client,
            max_retries: settings.max_retries,
            fetched: 0,
        })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&mut self, url: &str) -> Result<PageSnapshot, FetchError> {
        let start = Instant::now();
        let mut attempt = 0;
        let response = loop {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !retryable(status) || attempt == self.max_retries {
                break response;
            }
            let wait = backoff(attempt);
            warn!(
                "HTTP {} on {} (attempt {}/{}), backing off {:.1}s",
                status.as_u16(),
                url,
                attempt + 1,
                self.max_retries,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let html = response.text().await?;
        if html.trim().is_empty() {
            return Err(FetchError::Empty(url.to_string()));
        }

        self.fetched += 1;
        debug!(url, latency_ms = start.elapsed().as_millis() as u64, "fetched");
        Ok(PageSnapshot::from_html(url, html))
    }
}

impl Drop for HttpSource {
    fn drop(&mut self) {
        info!("Closing HTTP session after {} pages", self.fetched);
    }
}

// ── spider.cloud render API ──

pub struct SpiderSource {
    spider: Spider,
    max_retries: u32,
    fetched: usize,
}

impl SpiderSource {
    pub fn new(api_key: String, max_retries: u32) -> Result<Self, FetchError> {
        let spider = Spider::new(Some(api_key))
            .map_err(|e| FetchError::Render(format!("failed to create Spider client: {}", e)))?;
        Ok(SpiderSource {
            spider,
            max_retries,
            fetched: 0,
        })
    }

    async fn render_once(&self, url: &str) -> Result<PageSnapshot, FetchError> {
        let response = self
            .spider
            .scrape_url(url, Some(RequestParams::default()), "application/json")
            .await
            .map_err(|e| FetchError::Render(e.to_string()))?;
        snapshot_from_render(url, response)
    }
}

/// Pull the first `{content, status}` entry out of a render response.
fn snapshot_from_render(url: &str, value: serde_json::Value) -> Result<PageSnapshot, FetchError> {
    let parsed: serde_json::Value = match value.as_str() {
        Some(s) => serde_json::from_str(s).unwrap_or(value.clone()),
        None => value,
    };
    let first = parsed.as_array().and_then(|arr| arr.first());

    if let Some(status) = first
        .and_then(|obj| obj.get("status"))
        .and_then(|s| s.as_u64())
        .filter(|s| *s >= 400)
    {
        return Err(FetchError::Status {
            status: status as u16,
            url: url.to_string(),
        });
    }

    first
        .and_then(|obj| obj.get("content"))
        .and_then(|c| c.as_str())
        .filter(|c| !c.trim().is_empty())
        .map(|html| PageSnapshot::from_html(url, html))
        .ok_or_else(|| FetchError::Empty(url.to_string()))
}

fn render_retryable(err: &FetchError) -> bool {
    match err {
        FetchError::Status { status, .. } => *status == 429 || *status >= 500,
        FetchError::Render(e) => {
            e.contains("429") || e.contains("rate") || e.contains("502") || e.contains("503")
        }
        _ => false,
    }
}

#[async_trait]
impl PageSource for SpiderSource {
    async fn fetch(&mut self, url: &str) -> Result<PageSnapshot, FetchError> {
        for attempt in 0..self.max_retries {
            match self.render_once(url).await {
                Err(e) if render_retryable(&e) => {
                    let wait = backoff(attempt);
                    warn!(
                        "Rate limited on {} (attempt {}/{}), backing off {:.1}s",
                        url,
                        attempt + 1,
                        self.max_retries,
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                }
                result => {
                    self.fetched += result.is_ok() as usize;
                    return result;
                }
            }
        }
        let result = self.render_once(url).await;
        self.fetched += result.is_ok() as usize;
        result
    }
}

impl Drop for SpiderSource {
    fn drop(&mut self) {
        info!("Closing render session after {} pages", self.fetched);
    }
}
