// src/ingest/fetch.rs
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use std::time::Duration;

use crate::ingest::error::FetchError;
use crate::ingest::types::PageSource;

/// Single-attempt HTTP fetcher with a spoofed browser identity.
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let classify = |e: reqwest::Error| {
            counter!("scrape_fetch_errors_total").increment(1);
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout.as_secs(),
                }
            } else {
                FetchError::Request {
                    url: url.to_string(),
                    source: e,
                }
            }
        };

        let resp = self.client.get(url).send().await.map_err(classify)?;
        let status = resp.status();
        if !status.is_success() {
            counter!("scrape_fetch_errors_total").increment(1);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().await.map_err(classify)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Serves one fixed document regardless of the requested URL.
pub struct StaticPage {
    pub html: String,
}

impl StaticPage {
    pub fn from_fixture(html: &str) -> Self {
        Self {
            html: html.to_string(),
        }
    }
}

#[async_trait]
impl PageSource for StaticPage {
    async fn fetch_page(&self, _url: &str) -> Result<String, FetchError> {
        Ok(self.html.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
