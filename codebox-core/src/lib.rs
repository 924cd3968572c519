//! # codebox core
//!
//! Run Python code through a hosted code interpreter and collect what it
//! prints and the files it produces.
//!
//! This crate provides:
//! - Clients (`client`) - the stateful assistants client and the stateless responses client
//! - Run driver (`driver`) - retry loop around a remote run
//! - Extraction (`extract`) - text and file ids from remote results
//! - File handling (`sniff`, `store`) - extension detection and local storage
//! - Tools (`tool`, `registry`) - the code interpreter as an agent tool
//! - Backend traits (`assistants`, `responses`) - the remote API seams

#![warn(missing_docs)]

pub mod assistants;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod logging;
pub mod mock;
pub mod prompt;
pub mod registry;
pub mod responses;
pub mod sniff;
pub mod store;
pub mod tool;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::assistants::{AssistantsBackend, FilesBackend, RunStatus};
    pub use crate::client::{AssistantsClient, CodeInterpreter, ResponsesClient};
    pub use crate::config::Config;
    pub use crate::driver::{RetryPolicy, Session};
    pub use crate::error::{Error, Result};
    pub use crate::extract::RunOutput;
    pub use crate::registry::{set_active_client, ClientRegistry};
    pub use crate::responses::ResponsesBackend;
    pub use crate::sniff::detect_extension;
    pub use crate::store::{FileStore, FileStoreConfig};
    pub use crate::tool::{CodeInterpreterTool, Tool, ToolDefinition, ToolSet};
}
