//! Stateless "single response with container" remote API

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::assistants::{FileRef, FilesBackend};
use crate::error::Result;

/// One code execution request
#[derive(Debug, Clone, Serialize)]
pub struct CodeRequest {
    /// Model id
    pub model: String,
    /// User prompt carrying the code
    pub prompt: String,
    /// Container the code interpreter runs in
    pub container_id: String,
}

/// Error object of a response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseError {
    /// Error code
    #[serde(default)]
    pub code: Option<String>,
    /// Error message
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of a created response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseBody {
    /// Response id
    #[serde(default)]
    pub id: Option<String>,
    /// `completed`, `failed`, `incomplete`, ...
    #[serde(default)]
    pub status: Option<String>,
    /// Set when the response failed
    #[serde(default)]
    pub error: Option<ResponseError>,
    /// Flat list of output items
    #[serde(default)]
    pub output: Option<Vec<OutputItem>>,
}

/// One item of a response's output list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputItem {
    /// `message`, `code_interpreter_call`, `tool_result`, ...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Content blocks of a message item
    #[serde(default)]
    pub content: Option<Vec<OutputContent>>,
    /// Tool that produced a tool result item
    #[serde(default)]
    pub tool_name: Option<String>,
    /// Files of a tool result item
    #[serde(default)]
    pub files: Option<Vec<FileRef>>,
}

/// Content block of a message output item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputContent {
    /// `output_text`, `refusal`, ...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Text of an `output_text` block
    #[serde(default)]
    pub text: Option<String>,
    /// Annotations of an `output_text` block
    #[serde(default)]
    pub annotations: Option<Vec<OutputAnnotation>>,
}

/// Annotation on an `output_text` block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputAnnotation {
    /// `container_file_citation`, `url_citation`, ...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Cited file id
    #[serde(default)]
    pub file_id: Option<String>,
    /// Container holding the cited file
    #[serde(default)]
    pub container_id: Option<String>,
    /// Original file name inside the container
    #[serde(default)]
    pub filename: Option<String>,
}

/// Remote operations the stateless client needs
#[async_trait]
pub trait ResponsesBackend: FilesBackend {
    /// Name of the backend, for logging
    fn name(&self) -> &'static str;

    /// Create a code interpreter container
    async fn create_container(&self, name: &str) -> Result<String>;

    /// Issue one request and wait for the full response
    async fn create_response(&self, request: &CodeRequest) -> Result<ResponseBody>;

    /// Download a file produced inside a container
    async fn container_file_content(&self, container_id: &str, file_id: &str) -> Result<Bytes>;
}
