//! Stateful "assistant + thread + run" remote API
//!
//! Payload types mirror the vendor's JSON. Message content is modeled with
//! optional fields throughout: a completed run's message is loosely typed and
//! the extractor folds missing pieces into an empty result instead of failing.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Remote file storage shared by both API generations
#[async_trait]
pub trait FilesBackend: Send + Sync {
    /// Upload a file for use by the code interpreter, returning its id
    async fn upload_file(&self, filename: &str, data: Bytes) -> Result<String>;
}

/// Parameters for creating the remote assistant
#[derive(Debug, Clone, Serialize)]
pub struct AssistantSpec {
    /// Display name
    pub name: String,
    /// Assistant-level instructions
    pub instructions: String,
    /// Model id
    pub model: String,
    /// Files the code interpreter tool starts with
    pub file_ids: Vec<String>,
}

/// Status of a remote run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting to start
    Queued,
    /// Executing
    InProgress,
    /// Waiting for tool outputs from the caller
    RequiresAction,
    /// Cancellation requested
    Cancelling,
    /// Cancelled
    Cancelled,
    /// Execution failed, see `last_error`
    Failed,
    /// Execution finished
    Completed,
    /// Ended early (token limits and similar)
    Incomplete,
    /// Timed out on the remote side
    Expired,
    /// Anything this client does not know about
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the remote side is still working on the run
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Queued | Self::InProgress | Self::Cancelling)
    }

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error attached to a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    /// Error code, e.g. `server_error`
    #[serde(default)]
    pub code: Option<String>,
    /// Human readable message
    #[serde(default)]
    pub message: Option<String>,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, "{code}: {message}"),
            (Some(code), None) => f.write_str(code),
            (None, Some(message)) => f.write_str(message),
            (None, None) => f.write_str("unknown error"),
        }
    }
}

/// A run as reported once it reached a terminal status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Run id
    pub id: String,
    /// Current status
    pub status: RunStatus,
    /// Error detail when the run failed
    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// A message in a thread
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadMessage {
    /// Message id
    #[serde(default)]
    pub id: Option<String>,
    /// Author role
    #[serde(default)]
    pub role: Option<String>,
    /// Ordered content blocks
    #[serde(default)]
    pub content: Option<Vec<ContentBlock>>,
    /// Files attached to the message
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

/// One content block of a message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentBlock {
    /// `text`, `image_file`, ...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Present on text blocks
    #[serde(default)]
    pub text: Option<TextBody>,
    /// Present on image blocks
    #[serde(default)]
    pub image_file: Option<FileRef>,
}

/// Body of a text block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBody {
    /// The text itself
    #[serde(default)]
    pub value: Option<String>,
    /// Inline annotations
    #[serde(default)]
    pub annotations: Option<Vec<Annotation>>,
}

/// Inline annotation on a text block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Annotation {
    /// `file_path`, `file_citation`, ...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Set on `file_path` annotations
    #[serde(default)]
    pub file_path: Option<FileRef>,
}

/// Reference to a remote file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileRef {
    /// Remote file id
    #[serde(default)]
    pub file_id: Option<String>,
}

/// Message attachment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attachment {
    /// Remote file id
    #[serde(default)]
    pub file_id: Option<String>,
}

/// Remote operations the stateful client needs
#[async_trait]
pub trait AssistantsBackend: FilesBackend {
    /// Name of the backend, for logging
    fn name(&self) -> &'static str;

    /// Create an assistant with the code interpreter tool enabled
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String>;

    /// Replace the whole code interpreter file list of an assistant
    async fn update_assistant_files(&self, assistant_id: &str, file_ids: &[String]) -> Result<()>;

    /// Create an empty thread
    async fn create_thread(&self) -> Result<String>;

    /// Append a user message to a thread
    async fn create_message(&self, thread_id: &str, content: &str) -> Result<()>;

    /// Start a run and wait until it leaves the pending states
    async fn create_and_poll_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: &str,
    ) -> Result<Run>;

    /// Most recent message of a thread, if any
    async fn latest_message(&self, thread_id: &str) -> Result<Option<ThreadMessage>>;

    /// Download the content of a remote file
    async fn file_content(&self, file_id: &str) -> Result<Bytes>;
}
