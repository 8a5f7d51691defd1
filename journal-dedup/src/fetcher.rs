use crate::document::FeedDocument;
use crate::traits::FeedSource;
use crate::types::{FeedError, FetchConfig, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_CHARSET, ACCEPT_LANGUAGE, CONNECTION};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Fetches feeds over HTTP. One request per call, no retries.
pub struct HttpFeedSource {
    client: Client,
    config: FetchConfig,
}

impl HttpFeedSource {
    pub fn new(config: FetchConfig) -> Result<Self> {
        // The publisher serves browsers more reliably than bots.
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("ISO-8859-1,utf-8;q=0.7,*;q=0.3"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!(
                "Feed request failed: {} returned HTTP {} {}",
                url,
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            );
            return Err(FeedError::Transport {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        const MB: u64 = 1024 * 1024;
        let limit = (self.config.max_feed_size_mb as u64).saturating_mul(MB);
        if let Some(content_length) = response.content_length() {
            if content_length > limit {
                return Err(FeedError::FeedTooLarge {
                    size_mb: content_length / MB,
                });
            }
        }

        let body = response.bytes().await?;
        let body_len = body.len() as u64;
        if body_len > limit {
            return Err(FeedError::FeedTooLarge {
                size_mb: body_len / MB,
            });
        }

        info!(
            "Fetched feed: {} ({} bytes in {}ms)",
            url,
            body.len(),
            start_time.elapsed().as_millis()
        );
        Ok(body.to_vec())
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<FeedDocument> {
        let body = self.fetch_bytes(url).await?;
        FeedDocument::parse(&body)
    }
}
