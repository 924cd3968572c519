//! Client configuration
//!
//! Values come from [`Config::default`], a YAML file or the environment
//! (a `.env` file in the working directory is loaded first).
//!
//! ```yaml
//! base_url: https://api.openai.com/v1
//! files_dir: ./files
//! assistants:
//!   model: gpt-4o
//!   max_retries: 2
//! responses:
//!   model: gpt-4.1
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::driver::RetryPolicy;
use crate::error::{Error, Result};
use crate::prompt;
use crate::store::{FileStoreConfig, DEFAULT_FILES_DIR};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API key; usually taken from `OPENAI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Directory receiving downloaded files
    pub files_dir: PathBuf,
    /// Stateful client settings
    pub assistants: AssistantsConfig,
    /// Stateless client settings
    pub responses: ResponsesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            files_dir: PathBuf::from(DEFAULT_FILES_DIR),
            assistants: AssistantsConfig::default(),
            responses: ResponsesConfig::default(),
        }
    }
}

/// Settings of the stateful client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantsConfig {
    /// Model backing the assistant
    pub model: String,
    /// Assistant display name
    pub name: String,
    /// Assistant-level instructions
    pub instructions: String,
    /// Instructions sent with every run
    pub run_instructions: String,
    /// Retries after a failed run
    pub max_retries: u32,
    /// Seconds to wait before retrying a failed run
    pub retry_backoff_secs: u64,
    /// Interval between run status polls, unless the server suggests one
    pub poll_interval_ms: u64,
}

impl Default for AssistantsConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            name: prompt::ASSISTANT_NAME.to_string(),
            instructions: prompt::ASSISTANT_INSTRUCTIONS.to_string(),
            run_instructions: prompt::RUN_INSTRUCTIONS.to_string(),
            max_retries: 2,
            retry_backoff_secs: 3,
            poll_interval_ms: 1000,
        }
    }
}

impl AssistantsConfig {
    /// Retry policy for the run driver
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_secs(self.retry_backoff_secs),
        }
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Settings of the stateless client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponsesConfig {
    /// Model answering the requests
    pub model: String,
    /// Name of the container created at startup
    pub container_name: String,
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            container_name: "code-interpreter-example".to_string(),
        }
    }
}

impl Config {
    /// Build from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        if config.api_key.is_none() {
            return Err(Error::ProviderAuth("OPENAI_API_KEY not set".to_string()));
        }
        Ok(config)
    }

    /// Read a YAML file; the API key still comes from the environment when absent
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Self = serde_yaml_ng::from_str(&content)?;
        if config.api_key.is_none() {
            let _ = dotenvy::dotenv();
            config.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = var("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = var("CODEBOX_FILES_DIR") {
            self.files_dir = PathBuf::from(dir);
        }
        if let Some(retries) = var("CODEBOX_MAX_RETRIES") {
            self.assistants.max_retries = retries.trim().parse().map_err(|_| {
                Error::config(format!("CODEBOX_MAX_RETRIES is not a number: {retries}"))
            })?;
        }
        if let Some(model) = var("CODEBOX_ASSISTANTS_MODEL") {
            self.assistants.model = model;
        }
        if let Some(model) = var("CODEBOX_RESPONSES_MODEL") {
            self.responses.model = model;
        }
        Ok(())
    }

    /// The API key, or an authentication error when unset
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::ProviderAuth("OPENAI_API_KEY not set".to_string()))
    }

    /// File store settings
    pub fn file_store(&self) -> FileStoreConfig {
        FileStoreConfig::new(&self.files_dir)
    }
}
