pub mod document;

pub use document::{Document, Element};

use crate::config::Config;
use crate::core::error::{Result, VideoError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Maps well-known failure statuses onto the error taxonomy.
    pub fn check_status(self, url: &str) -> Result<Self> {
        match self.status {
            200..=299 => Ok(self),
            404 | 410 => Err(VideoError::NotFound),
            401 | 403 => Err(VideoError::Forbidden),
            status => Err(VideoError::Transport(format!(
                "unexpected status {} from {}",
                status, url
            ))),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Transport used by every extractor.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse>;

    /// Follows redirects for `url` and returns the final location.
    async fn resolve_redirect(&self, url: &str) -> Result<String>;
}

pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(HttpResponse { status, body })
    }

    async fn resolve_redirect(&self, url: &str) -> Result<String> {
        let target = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("http://{}", url)
        };

        let response = self.client.head(&target).send().await?;
        let location = response.url().to_string();
        debug!("HEAD {} -> {}", target, location);

        Ok(location)
    }
}

/// GETs `url`, maps the status, and decodes the JSON body.
pub async fn get_json<T: DeserializeOwned>(
    http: &dyn HttpClient,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<T> {
    http.get(url, headers).await?.check_status(url)?.json()
}

/// GETs `url` and returns the body of a successful response.
pub async fn get_text(http: &dyn HttpClient, url: &str) -> Result<String> {
    Ok(http.get(url, &[]).await?.check_status(url)?.body)
}
