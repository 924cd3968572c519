//! Assistants API (threads and runs)

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use codebox_core::assistants::{AssistantSpec, Run, ThreadMessage};

use super::{IdObject, OpenAI};
use crate::{AssistantsBackend, Result};

const POLL_AFTER_HEADER: &str = "openai-poll-after-ms";

#[derive(Debug, Serialize)]
struct CreateAssistantRequest<'a> {
    name: &'a str,
    instructions: &'a str,
    model: &'a str,
    tools: serde_json::Value,
    tool_resources: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
    instructions: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

fn tool_resources(file_ids: &[String]) -> serde_json::Value {
    json!({ "code_interpreter": { "file_ids": file_ids } })
}

impl OpenAI {
    /// Poll interval suggested by the server, if any
    fn poll_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
        headers
            .get(POLL_AFTER_HEADER)?
            .to_str()
            .ok()?
            .parse()
            .ok()
            .map(Duration::from_millis)
    }
}

#[async_trait]
impl AssistantsBackend for OpenAI {
    fn name(&self) -> &'static str {
        "openai-assistants"
    }

    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String> {
        let request = CreateAssistantRequest {
            name: &spec.name,
            instructions: &spec.instructions,
            model: &spec.model,
            tools: json!([{ "type": "code_interpreter" }]),
            tool_resources: tool_resources(&spec.file_ids),
        };
        let assistant: IdObject = self.post_json("/assistants", &request, true).await?;
        Ok(assistant.id)
    }

    async fn update_assistant_files(&self, assistant_id: &str, file_ids: &[String]) -> Result<()> {
        let body = json!({ "tool_resources": tool_resources(file_ids) });
        let _: IdObject = self
            .post_json(&format!("/assistants/{assistant_id}"), &body, true)
            .await?;
        Ok(())
    }

    async fn create_thread(&self) -> Result<String> {
        let thread: IdObject = self.post_json("/threads", &json!({}), true).await?;
        Ok(thread.id)
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<()> {
        let request = CreateMessageRequest {
            role: "user",
            content,
        };
        let _: IdObject = self
            .post_json(&format!("/threads/{thread_id}/messages"), &request, true)
            .await?;
        Ok(())
    }

    async fn create_and_poll_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: &str,
    ) -> Result<Run> {
        let request = CreateRunRequest {
            assistant_id,
            instructions,
        };
        let mut run: Run = self
            .post_json(&format!("/threads/{thread_id}/runs"), &request, true)
            .await?;

        let mut interval = self.poll_interval;
        while run.status.is_pending() {
            tokio::time::sleep(interval).await;
            let response = self
                .get(&format!("/threads/{thread_id}/runs/{}", run.id), true)
                .await?;
            if let Some(suggested) = Self::poll_after(response.headers()) {
                interval = suggested;
            }
            run = Self::parse(response).await?;
            debug!(run_id = %run.id, status = %run.status, "Polled run");
        }

        Ok(run)
    }

    async fn latest_message(&self, thread_id: &str) -> Result<Option<ThreadMessage>> {
        let response = self
            .get(&format!("/threads/{thread_id}/messages?limit=1&order=desc"), true)
            .await?;
        let list: MessageList = Self::parse(response).await?;
        Ok(list.data.into_iter().next())
    }

    async fn file_content(&self, file_id: &str) -> Result<Bytes> {
        self.get_bytes(&format!("/files/{file_id}/content")).await
    }
}
