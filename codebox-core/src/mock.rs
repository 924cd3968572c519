//! In-memory backends for tests
//!
//! Both mocks answer from scripted state and count every remote call, so
//! tests can assert on the exact number of round trips.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::assistants::{
    AssistantSpec, AssistantsBackend, FilesBackend, Run, RunError, RunStatus, ThreadMessage,
};
use crate::error::{Error, Result};
use crate::responses::{CodeRequest, ResponseBody, ResponsesBackend};

/// Number of calls made to a mock backend, per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    /// Files uploaded
    pub uploads: usize,
    /// Files downloaded
    pub downloads: usize,
    /// Assistants created
    pub assistants: usize,
    /// Assistant file list replacements
    pub assistant_updates: usize,
    /// Threads created
    pub threads: usize,
    /// Messages appended
    pub messages: usize,
    /// Runs started
    pub runs: usize,
    /// Containers created
    pub containers: usize,
    /// Responses requested
    pub responses: usize,
}

#[derive(Default)]
struct AssistantsState {
    calls: Calls,
    runs: VecDeque<(RunStatus, Option<String>)>,
    reply: Option<ThreadMessage>,
    files: HashMap<String, Bytes>,
    uploads: Vec<(String, Bytes)>,
    assistant_specs: Vec<AssistantSpec>,
    assistant_files: Vec<Vec<String>>,
    messages: Vec<(String, String)>,
}

/// Scripted stand-in for the stateful API
#[derive(Default)]
pub struct MockAssistants {
    state: Mutex<AssistantsState>,
}

impl MockAssistants {
    /// Create a mock whose runs complete with an empty reply
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the terminal status of the next run; unscripted runs complete
    pub fn push_run(&self, status: RunStatus, error: Option<&str>) {
        self.state
            .lock()
            .runs
            .push_back((status, error.map(str::to_string)));
    }

    /// Message returned as the latest one of any thread
    pub fn set_reply(&self, message: ThreadMessage) {
        self.state.lock().reply = Some(message);
    }

    /// Register downloadable content for `file_id`
    pub fn add_file(&self, file_id: &str, data: impl Into<Bytes>) {
        self.state.lock().files.insert(file_id.to_string(), data.into());
    }

    /// Snapshot of the call counters
    pub fn calls(&self) -> Calls {
        self.state.lock().calls
    }

    /// Messages appended to `thread_id`, oldest first
    pub fn messages_in(&self, thread_id: &str) -> Vec<String> {
        self.state
            .lock()
            .messages
            .iter()
            .filter(|(thread, _)| thread == thread_id)
            .map(|(_, content)| content.clone())
            .collect()
    }

    /// Assistants created so far
    pub fn assistant_specs(&self) -> Vec<AssistantSpec> {
        self.state.lock().assistant_specs.clone()
    }

    /// Every file list the assistant was updated with, in order
    pub fn assistant_file_updates(&self) -> Vec<Vec<String>> {
        self.state.lock().assistant_files.clone()
    }

    /// Uploaded files as `(filename, content)`
    pub fn uploads(&self) -> Vec<(String, Bytes)> {
        self.state.lock().uploads.clone()
    }
}

#[async_trait]
impl FilesBackend for MockAssistants {
    async fn upload_file(&self, filename: &str, data: Bytes) -> Result<String> {
        let mut state = self.state.lock();
        state.calls.uploads += 1;
        state.uploads.push((filename.to_string(), data));
        Ok(format!("file-upload-{}", state.calls.uploads))
    }
}

#[async_trait]
impl AssistantsBackend for MockAssistants {
    fn name(&self) -> &'static str {
        "mock-assistants"
    }

    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String> {
        let mut state = self.state.lock();
        state.calls.assistants += 1;
        state.assistant_specs.push(spec.clone());
        Ok(format!("asst_{}", state.calls.assistants))
    }

    async fn update_assistant_files(&self, _assistant_id: &str, file_ids: &[String]) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.assistant_updates += 1;
        state.assistant_files.push(file_ids.to_vec());
        Ok(())
    }

    async fn create_thread(&self) -> Result<String> {
        let mut state = self.state.lock();
        state.calls.threads += 1;
        Ok(format!("thread_{}", state.calls.threads))
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.messages += 1;
        state
            .messages
            .push((thread_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn create_and_poll_run(
        &self,
        _thread_id: &str,
        _assistant_id: &str,
        _instructions: &str,
    ) -> Result<Run> {
        let mut state = self.state.lock();
        state.calls.runs += 1;
        let (status, error) = state
            .runs
            .pop_front()
            .unwrap_or((RunStatus::Completed, None));
        Ok(Run {
            id: format!("run_{}", state.calls.runs),
            status,
            last_error: error.map(|message| RunError {
                code: None,
                message: Some(message),
            }),
        })
    }

    async fn latest_message(&self, _thread_id: &str) -> Result<Option<ThreadMessage>> {
        Ok(self.state.lock().reply.clone())
    }

    async fn file_content(&self, file_id: &str) -> Result<Bytes> {
        let mut state = self.state.lock();
        state.calls.downloads += 1;
        state
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| Error::provider_api(format!("No such file: {file_id}")))
    }
}

#[derive(Default)]
struct ResponsesState {
    calls: Calls,
    responses: VecDeque<ResponseBody>,
    requests: Vec<CodeRequest>,
    files: HashMap<String, Bytes>,
}

/// Scripted stand-in for the stateless API
#[derive(Default)]
pub struct MockResponses {
    state: Mutex<ResponsesState>,
}

impl MockResponses {
    /// Create a mock answering with empty completed responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the body of the next response
    pub fn push_response(&self, body: ResponseBody) {
        self.state.lock().responses.push_back(body);
    }

    /// Register downloadable container content for `file_id`
    pub fn add_file(&self, file_id: &str, data: impl Into<Bytes>) {
        self.state.lock().files.insert(file_id.to_string(), data.into());
    }

    /// Snapshot of the call counters
    pub fn calls(&self) -> Calls {
        self.state.lock().calls
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CodeRequest> {
        self.state.lock().requests.clone()
    }
}

#[async_trait]
impl FilesBackend for MockResponses {
    async fn upload_file(&self, _filename: &str, _data: Bytes) -> Result<String> {
        let mut state = self.state.lock();
        state.calls.uploads += 1;
        Ok(format!("file-upload-{}", state.calls.uploads))
    }
}

#[async_trait]
impl ResponsesBackend for MockResponses {
    fn name(&self) -> &'static str {
        "mock-responses"
    }

    async fn create_container(&self, _name: &str) -> Result<String> {
        let mut state = self.state.lock();
        state.calls.containers += 1;
        Ok(format!("cntr_{}", state.calls.containers))
    }

    async fn create_response(&self, request: &CodeRequest) -> Result<ResponseBody> {
        let mut state = self.state.lock();
        state.calls.responses += 1;
        state.requests.push(request.clone());
        Ok(state.responses.pop_front().unwrap_or_else(|| ResponseBody {
            status: Some("completed".to_string()),
            output: Some(Vec::new()),
            ..Default::default()
        }))
    }

    async fn container_file_content(&self, _container_id: &str, file_id: &str) -> Result<Bytes> {
        let mut state = self.state.lock();
        state.calls.downloads += 1;
        state
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| Error::provider_api(format!("No such file: {file_id}")))
    }
}
