use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Page URL for a video identifier
pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL, video_id)
}

/// Text-over-HTTP collaborator used by the retrieval pipeline
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL and return the response body
    async fn get(&self, url: &str) -> Result<String>;
}

/// reqwest-backed client
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .with_context(|| format!("Invalid Accept-Language: {}", config.accept_language))?,
        );

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers);

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy.as_str())
                    .with_context(|| format!("Invalid proxy: {}", proxy))?,
            );
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request failed: {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error {}: {}", response.status(), url));
        }

        let body = response.text().await?;
        debug!("Downloaded {} characters from {}", body.len(), url);
        Ok(body)
    }
}
