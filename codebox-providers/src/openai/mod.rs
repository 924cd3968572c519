//! OpenAI code interpreter backends
//!
//! One [`OpenAI`] client implements both API generations: the Assistants
//! API ([`AssistantsBackend`](crate::AssistantsBackend)) and the Responses
//! API ([`ResponsesBackend`](crate::ResponsesBackend)).

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use codebox_core::config::{Config, DEFAULT_BASE_URL};

use crate::{Error, FilesBackend, HttpConfig, Result};

mod assistants;
mod responses;

const BETA_HEADER: &str = "openai-beta";
const ASSISTANTS_BETA: &str = "assistants=v2";

/// OpenAI API client
pub struct OpenAI {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
}

/// Any object that only matters for its id
#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

impl OpenAI {
    /// Create from API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create from environment variables (and `.env`)
    pub fn from_env() -> Result<Self> {
        Self::from_config(&Config::from_env()?)
    }

    /// Create from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::with_base_url(config.require_api_key()?, config.base_url.clone())?
            .with_poll_interval(config.assistants.poll_interval()))
    }

    /// Create with custom base URL (for proxies and test servers)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::with_http_config(api_key, base_url, &HttpConfig::default())
    }

    /// Create with custom base URL and HTTP settings
    pub fn with_http_config(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        http: &HttpConfig,
    ) -> Result<Self> {
        Ok(Self {
            client: http.build_client()?,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(1),
        })
    }

    /// Interval between run status polls when the server does not suggest one
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn build_headers(&self, beta: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Internal(e.to_string()))?,
        );
        if beta {
            headers.insert(BETA_HEADER, HeaderValue::from_static(ASSISTANTS_BETA));
        }
        Ok(headers)
    }

    /// Turn non-success statuses into errors
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::ProviderAuth(format!(
                "OpenAI API error {}: {}",
                status, text
            ))),
            _ => Err(Error::ProviderApi(format!(
                "OpenAI API error {}: {}",
                status, text
            ))),
        }
    }

    async fn post_json<T, R>(&self, path: &str, body: &T, beta: bool) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .headers(self.build_headers(beta)?)
            .json(body)
            .send()
            .await?;
        Self::parse(Self::check(response).await?).await
    }

    async fn get(&self, path: &str, beta: bool) -> Result<Response> {
        debug!(path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .headers(self.build_headers(beta)?)
            .send()
            .await?;
        Self::check(response).await
    }

    async fn get_bytes(&self, path: &str) -> Result<Bytes> {
        Ok(self.get(path, false).await?.bytes().await?)
    }

    async fn parse<R: DeserializeOwned>(response: Response) -> Result<R> {
        response
            .json()
            .await
            .map_err(|e| Error::ProviderApi(format!("Failed to parse OpenAI response: {}", e)))
    }
}

#[async_trait]
impl FilesBackend for OpenAI {
    async fn upload_file(&self, filename: &str, data: Bytes) -> Result<String> {
        let size = data.len();
        let form = Form::new()
            .text("purpose", "assistants")
            .part("file", Part::bytes(data.to_vec()).file_name(filename.to_string()));

        let response = self
            .client
            .post(self.url("/files"))
            .headers(self.build_headers(false)?)
            .multipart(form)
            .send()
            .await?;
        let file: IdObject = Self::parse(Self::check(response).await?).await?;
        debug!(file_id = %file.id, bytes = size, "Uploaded file");
        Ok(file.id)
    }
}

/// Common model constants
pub const GPT_4O: &str = "gpt-4o";
/// Default model of the Responses API client
pub const GPT_41: &str = "gpt-4.1";
