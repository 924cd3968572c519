//! Code interpreter clients
//!
//! [`AssistantsClient`] wraps the stateful API and retries failed runs on a
//! fresh thread. [`ResponsesClient`] wraps the stateless API with a single
//! request per run. Both download produced files into a [`FileStore`].

use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::extract::RunOutput;
use crate::store::FileStore;

pub mod assistants;
pub mod responses;

pub use assistants::AssistantsClient;
pub use responses::ResponsesClient;

/// File name sent with uploads
pub const UPLOAD_FILENAME: &str = "upload";

/// A client that runs Python code remotely
#[async_trait]
pub trait CodeInterpreter: Send + Sync {
    /// Name of the client, for logging
    fn name(&self) -> &'static str;

    /// Make a file available to the interpreter, returning its remote id
    async fn upload_file(&self, data: Bytes) -> Result<String>;

    /// Run `code` and collect its text output and produced files.
    ///
    /// A payload that cannot be interpreted yields [`RunOutput::empty`].
    async fn run(&self, code: &str) -> Result<RunOutput>;
}

/// Download every file in order and store it locally
async fn save_files<F, Fut>(store: &FileStore, file_ids: &[String], mut fetch: F) -> Result<Vec<String>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Bytes>>,
{
    let mut paths = Vec::with_capacity(file_ids.len());
    for file_id in file_ids {
        let data = fetch(file_id.clone()).await?;
        paths.push(store.persist(file_id, &data).await?);
    }
    Ok(paths)
}
