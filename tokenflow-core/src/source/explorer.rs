// ====
// Explorer API Pager
// ====
// GET <base_url>?page=N until an empty page, a failed request or the page cap
// ====

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::errors::SourceError;
use super::{RecordSource, SourceBatch};
use crate::config::SourceSettings;
use tokenflow_common::data::RawRecord;

/// One page of explorer items. Implemented over HTTP in production and
/// scripted in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<Vec<Value>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct PageBody {
    #[serde(default)]
    items: Vec<Value>,
}

pub struct HttpPageFetcher {
    client: Client,
    base_url: String,
}

impl HttpPageFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, page: u32) -> Result<Vec<Value>, SourceError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("page", page)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body: PageBody = response.json().await?;
        Ok(body.items)
    }
}

pub struct ExplorerSource<F: PageFetcher> {
    fetcher: F,
    endpoint: String,
    max_pages: u32,
    page_delay: Duration,
}

impl ExplorerSource<HttpPageFetcher> {
    pub fn from_settings(settings: &SourceSettings) -> Result<Self, SourceError> {
        let fetcher = HttpPageFetcher::new(&settings.base_url, settings.request_timeout())?;
        Ok(Self::new(
            fetcher,
            &settings.base_url,
            settings.max_pages,
            settings.page_delay(),
        ))
    }
}

impl<F: PageFetcher> ExplorerSource<F> {
    pub fn new(fetcher: F, endpoint: impl Into<String>, max_pages: u32, page_delay: Duration) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
            max_pages,
            page_delay,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Sequential page loop, pages numbered from 1. Each page is requested
    /// once; there are no retries.
    pub async fn fetch_pages(&self) -> SourceBatch {
        let mut records: Vec<RawRecord> = Vec::new();

        for page in 1..=self.max_pages {
            match self.fetcher.fetch_page(page).await {
                Ok(items) if items.is_empty() => {
                    debug!("Page {} empty, {} records collected", page, records.len());
                    return SourceBatch::complete(records);
                }
                Ok(items) => {
                    debug!("Page {}: {} items", page, items.len());
                    records.extend(items.iter().map(RawRecord::from_json));
                }
                Err(e) => {
                    warn!(
                        "Stopping at page {} of {}: {} ({} records kept)",
                        page,
                        self.endpoint,
                        e,
                        records.len()
                    );
                    return SourceBatch::partial(records, format!("page {}: {}", page, e));
                }
            }

            if page < self.max_pages && !self.page_delay.is_zero() {
                sleep(self.page_delay).await;
            }
        }

        info!(
            "Page cap {} reached for {}, {} records collected",
            self.max_pages,
            self.endpoint,
            records.len()
        );
        SourceBatch::complete(records)
    }
}

#[async_trait]
impl<F: PageFetcher> RecordSource for ExplorerSource<F> {
    fn cache_key(&self) -> String {
        format!("explorer:{}:{}", self.endpoint, self.max_pages)
    }

    fn describe(&self) -> String {
        format!("explorer API {} (max {} pages)", self.endpoint, self.max_pages)
    }

    async fn fetch(&self) -> SourceBatch {
        self.fetch_pages().await
    }
}
