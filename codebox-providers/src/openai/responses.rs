//! Responses API with a code interpreter container

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde_json::json;

use codebox_core::responses::{CodeRequest, ResponseBody};

use super::{IdObject, OpenAI};
use crate::{ResponsesBackend, Result};

#[derive(Debug, Serialize)]
struct CreateResponseRequest<'a> {
    model: &'a str,
    input: serde_json::Value,
    tools: serde_json::Value,
    tool_choice: &'static str,
}

impl<'a> From<&'a CodeRequest> for CreateResponseRequest<'a> {
    fn from(request: &'a CodeRequest) -> Self {
        Self {
            model: &request.model,
            input: json!([{
                "role": "user",
                "content": [{ "type": "input_text", "text": request.prompt }]
            }]),
            tools: json!([{
                "type": "code_interpreter",
                "container": request.container_id
            }]),
            tool_choice: "auto",
        }
    }
}

#[async_trait]
impl ResponsesBackend for OpenAI {
    fn name(&self) -> &'static str {
        "openai-responses"
    }

    async fn create_container(&self, name: &str) -> Result<String> {
        let container: IdObject = self
            .post_json("/containers", &json!({ "name": name }), false)
            .await?;
        Ok(container.id)
    }

    async fn create_response(&self, request: &CodeRequest) -> Result<ResponseBody> {
        self.post_json("/responses", &CreateResponseRequest::from(request), false)
            .await
    }

    async fn container_file_content(&self, container_id: &str, file_id: &str) -> Result<Bytes> {
        self.get_bytes(&format!("/containers/{container_id}/files/{file_id}/content"))
            .await
    }
}
