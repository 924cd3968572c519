//! Client for the stateful "assistant + thread + run" API

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use super::{save_files, CodeInterpreter, UPLOAD_FILENAME};
use crate::assistants::{AssistantSpec, AssistantsBackend};
use crate::config::{AssistantsConfig, Config};
use crate::driver::{RetryPolicy, RunDriver, Session};
use crate::error::Result;
use crate::extract::{extract_message, RunOutput};
use crate::prompt;
use crate::store::{FileStore, FileStoreConfig};

/// Code interpreter backed by one remote assistant and thread
///
/// The assistant lives as long as the client. The thread is replaced every
/// time a failed run is retried, so earlier conversation is discarded.
pub struct AssistantsClient<B: AssistantsBackend> {
    backend: B,
    settings: AssistantsConfig,
    policy: RetryPolicy,
    store: FileStore,
    assistant_id: String,
    session: Mutex<Session>,
    file_ids: Mutex<Vec<String>>,
}

impl<B: AssistantsBackend> AssistantsClient<B> {
    /// Create the remote assistant and thread using `config`
    pub async fn new(backend: B, config: &Config) -> Result<Self> {
        Self::with_settings(backend, config.assistants.clone(), config.file_store()).await
    }

    /// Create the remote assistant and thread with explicit settings
    pub async fn with_settings(
        backend: B,
        settings: AssistantsConfig,
        store: FileStoreConfig,
    ) -> Result<Self> {
        let store = FileStore::new(store).await?;
        let assistant_id = backend
            .create_assistant(&AssistantSpec {
                name: settings.name.clone(),
                instructions: settings.instructions.clone(),
                model: settings.model.clone(),
                file_ids: Vec::new(),
            })
            .await?;
        let thread_id = backend.create_thread().await?;
        info!(
            backend = backend.name(),
            %assistant_id,
            %thread_id,
            "Code interpreter session created"
        );

        Ok(Self {
            policy: settings.retry_policy(),
            backend,
            settings,
            store,
            session: Mutex::new(Session {
                assistant_id: assistant_id.clone(),
                thread_id,
            }),
            assistant_id,
            file_ids: Mutex::new(Vec::new()),
        })
    }

    /// Override the retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current remote session
    pub async fn session(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Files uploaded so far, in upload order
    pub async fn file_ids(&self) -> Vec<String> {
        self.file_ids.lock().await.clone()
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

#[async_trait]
impl<B: AssistantsBackend> CodeInterpreter for AssistantsClient<B> {
    fn name(&self) -> &'static str {
        "assistants"
    }

    async fn upload_file(&self, data: Bytes) -> Result<String> {
        let file_id = self.backend.upload_file(UPLOAD_FILENAME, data).await?;

        // The remote side only accepts the complete list
        let mut file_ids = self.file_ids.lock().await;
        file_ids.push(file_id.clone());
        self.backend
            .update_assistant_files(&self.assistant_id, &file_ids)
            .await?;
        info!(%file_id, total = file_ids.len(), "File attached to assistant");

        Ok(file_id)
    }

    #[instrument(skip(self, code), fields(backend = self.backend.name()))]
    async fn run(&self, code: &str) -> Result<RunOutput> {
        let prompt = prompt::assistants_prompt(code);

        let message = {
            let mut session = self.session.lock().await;
            RunDriver::new(&self.backend, &self.policy, &self.settings.run_instructions)
                .drive(&mut session, &prompt)
                .await?;
            self.backend.latest_message(&session.thread_id).await?
        };

        let Some(extracted) = extract_message(message.as_ref()) else {
            warn!("Completed run returned a malformed message; no result extracted");
            return Ok(RunOutput::empty());
        };

        let paths = save_files(&self.store, &extracted.file_ids, |file_id| async move {
            self.backend.file_content(&file_id).await
        })
        .await?;

        Ok(RunOutput::new(extracted.text, paths))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::assistants::{RunStatus, ThreadMessage};
    use crate::error::Error;
    use crate::mock::MockAssistants;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    async fn client(backend: MockAssistants, dir: &std::path::Path) -> AssistantsClient<MockAssistants> {
        let settings = AssistantsConfig {
            retry_backoff_secs: 0,
            ..Default::default()
        };
        AssistantsClient::with_settings(backend, settings, FileStoreConfig::new(dir))
            .await
            .unwrap()
    }

    fn reply(value: serde_json::Value) -> ThreadMessage {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_creates_assistant_and_thread() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("files");
        let client = client(MockAssistants::new(), &dir).await;

        assert!(dir.is_dir());
        let session = client.session().await;
        assert_eq!(session.assistant_id, "asst_1");
        assert_eq!(session.thread_id, "thread_1");

        let specs = client.backend().assistant_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "Python Code Runner");
        assert_eq!(specs[0].model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_upload_replaces_whole_file_list() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client(MockAssistants::new(), tmp.path()).await;

        let first = client.upload_file(Bytes::from_static(b"a,b\n1,2\n")).await.unwrap();
        let second = client.upload_file(Bytes::from_static(b"x\n")).await.unwrap();

        assert_eq!(client.file_ids().await, vec![first.clone(), second.clone()]);
        assert_eq!(
            client.backend().assistant_file_updates(),
            vec![vec![first.clone()], vec![first, second]]
        );
        assert_eq!(client.backend().uploads()[0].0, "upload");
    }

    #[tokio::test]
    async fn test_run_text_only() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = MockAssistants::new();
        backend.set_reply(reply(serde_json::json!({
            "content": [{"type": "text", "text": {"value": "4\n", "annotations": []}}],
            "attachments": []
        })));
        let client = client(backend, tmp.path()).await;

        let out = client.run("result = 2 + 2\nprint(result)").await.unwrap();
        assert_eq!(out, RunOutput::new("4\n", vec![]));

        let messages = client.backend().messages_in("thread_1");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("result = 2 + 2\nprint(result)"));
    }

    #[tokio::test]
    async fn test_run_downloads_each_file_once() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = MockAssistants::new();
        backend.add_file("file-abc", PNG);
        backend.add_file("file-csv", &b"a,b\n"[..]);
        backend.set_reply(reply(serde_json::json!({
            "content": [
                {"type": "image_file", "image_file": {"file_id": "file-abc"}},
                {"type": "text", "text": {"value": "saved", "annotations": [
                    {"type": "file_path", "file_path": {"file_id": "file-csv"}}
                ]}}
            ],
            "attachments": [{"file_id": "file-csv"}, {"file_id": "file-abc"}]
        })));
        let client = client(backend, tmp.path()).await;

        let out = client.run("plot()").await.unwrap();
        let paths = out.file_paths.unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("file-abc.png"));
        assert!(paths[1].ends_with("file-csv"));
        assert_eq!(std::fs::read(&paths[0]).unwrap(), PNG);
        assert_eq!(client.backend().calls().downloads, 2);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_empty_result() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = MockAssistants::new();
        backend.set_reply(reply(serde_json::json!({"id": "msg_1", "role": "assistant"})));
        let client = client(backend, tmp.path()).await;

        let out = client.run("print(1)").await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_missing_reply_is_empty_result() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client(MockAssistants::new(), tmp.path()).await;
        assert!(client.run("print(1)").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_runs_replace_thread() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = MockAssistants::new();
        backend.push_run(RunStatus::Failed, Some("server_error"));
        backend.push_run(RunStatus::Failed, Some("server_error"));
        backend.push_run(RunStatus::Failed, Some("still broken"));
        let client = client(backend, tmp.path())
            .await
            .with_retry_policy(RetryPolicy {
                max_retries: 2,
                backoff: Duration::ZERO,
            });

        let err = client.run("print(1)").await.unwrap_err();
        match err {
            Error::RunFailed { attempts, detail } => {
                assert_eq!(attempts, 3);
                assert_eq!(detail.as_deref(), Some("still broken"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let session = client.session().await;
        assert_eq!(session.assistant_id, "asst_1");
        assert_eq!(session.thread_id, "thread_3");
        assert_eq!(client.backend().calls().assistants, 1);
    }
}
