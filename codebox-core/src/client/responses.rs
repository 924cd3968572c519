//! Client for the stateless "response with container" API

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info, instrument, warn};

use super::{save_files, CodeInterpreter, UPLOAD_FILENAME};
use crate::config::{Config, ResponsesConfig};
use crate::error::{Error, Result};
use crate::extract::{extract_response, RunOutput};
use crate::prompt;
use crate::responses::{CodeRequest, ResponseBody, ResponsesBackend};
use crate::store::{FileStore, FileStoreConfig};

/// Code interpreter backed by one remote container
///
/// Every run is a single request; nothing is retried.
pub struct ResponsesClient<B: ResponsesBackend> {
    backend: B,
    settings: ResponsesConfig,
    store: FileStore,
    container_id: String,
}

impl<B: ResponsesBackend> ResponsesClient<B> {
    /// Create the remote container using `config`
    pub async fn new(backend: B, config: &Config) -> Result<Self> {
        Self::with_settings(backend, config.responses.clone(), config.file_store()).await
    }

    /// Create the remote container with explicit settings
    pub async fn with_settings(
        backend: B,
        settings: ResponsesConfig,
        store: FileStoreConfig,
    ) -> Result<Self> {
        let store = FileStore::new(store).await?;
        let container_id = backend.create_container(&settings.container_name).await?;
        info!(backend = backend.name(), %container_id, "Code interpreter container created");

        Ok(Self {
            backend,
            settings,
            store,
            container_id,
        })
    }

    /// Remote container id
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Local file store
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

fn check_response(response: &ResponseBody) -> Result<()> {
    if let Some(error) = &response.error {
        return Err(Error::provider_api(format!(
            "Response failed: {}: {}",
            error.code.as_deref().unwrap_or("unknown"),
            error.message.as_deref().unwrap_or("no message")
        )));
    }
    match response.status.as_deref() {
        Some("failed" | "cancelled" | "incomplete") => Err(Error::provider_api(format!(
            "Response ended with status {}",
            response.status.as_deref().unwrap_or_default()
        ))),
        _ => Ok(()),
    }
}

#[async_trait]
impl<B: ResponsesBackend> CodeInterpreter for ResponsesClient<B> {
    fn name(&self) -> &'static str {
        "responses"
    }

    async fn upload_file(&self, data: Bytes) -> Result<String> {
        let file_id = self.backend.upload_file(UPLOAD_FILENAME, data).await?;
        info!(%file_id, "File uploaded");
        Ok(file_id)
    }

    #[instrument(skip(self, code), fields(backend = self.backend.name(), container_id = %self.container_id))]
    async fn run(&self, code: &str) -> Result<RunOutput> {
        let request = CodeRequest {
            model: self.settings.model.clone(),
            prompt: prompt::responses_prompt(code),
            container_id: self.container_id.clone(),
        };
        let response = self.backend.create_response(&request).await?;
        debug!(response_id = response.id.as_deref().unwrap_or("-"), "Response received");
        check_response(&response)?;

        let Some(extracted) = extract_response(&response) else {
            warn!("Response carried no output list; no result extracted");
            return Ok(RunOutput::empty());
        };

        let container_id = self.container_id.as_str();
        let paths = save_files(&self.store, &extracted.file_ids, |file_id| async move {
            self.backend
                .container_file_content(container_id, &file_id)
                .await
        })
        .await?;

        Ok(RunOutput::new(extracted.text, paths))
    }
}
