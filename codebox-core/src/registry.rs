//! Process-wide access to code interpreter clients
//!
//! Agent frameworks call tools on worker threads that do not carry the
//! caller's context, so the client a tool talks to is published here before
//! the first invocation. There are two ways to publish:
//!
//! - a single active slot ([`set_active_client`]) for one client per process
//! - a [`ClientRegistry`] keyed by session id when several agent sessions run
//!   side by side

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::client::CodeInterpreter;
use crate::error::{Error, Result};

static ACTIVE_CLIENT: LazyLock<RwLock<Option<Arc<dyn CodeInterpreter>>>> =
    LazyLock::new(|| RwLock::new(None));

static GLOBAL_REGISTRY: LazyLock<ClientRegistry> = LazyLock::new(ClientRegistry::new);

/// Publish the process-wide active client
pub fn set_active_client(client: Arc<dyn CodeInterpreter>) {
    let previous = ACTIVE_CLIENT.write().replace(client);
    if previous.is_some() {
        warn!("Replacing the active code interpreter client");
    }
}

/// The process-wide active client
pub fn active_client() -> Result<Arc<dyn CodeInterpreter>> {
    ACTIVE_CLIENT
        .read()
        .clone()
        .ok_or(Error::UninitializedClient { session: None })
}

/// Remove the process-wide active client, returning it
pub fn clear_active_client() -> Option<Arc<dyn CodeInterpreter>> {
    ACTIVE_CLIENT.write().take()
}

/// Registry shared by the whole process
pub fn global_registry() -> &'static ClientRegistry {
    &GLOBAL_REGISTRY
}

/// Clients keyed by agent session id
#[derive(Default)]
pub struct ClientRegistry {
    clients: DashMap<String, Arc<dyn CodeInterpreter>>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `client` for `session_id`, returning the client it replaces
    pub fn register(
        &self,
        session_id: impl Into<String>,
        client: Arc<dyn CodeInterpreter>,
    ) -> Option<Arc<dyn CodeInterpreter>> {
        let session_id = session_id.into();
        debug!(%session_id, client = client.name(), "Registering code interpreter client");
        self.clients.insert(session_id, client)
    }

    /// Client of `session_id`
    pub fn get(&self, session_id: &str) -> Result<Arc<dyn CodeInterpreter>> {
        self.clients
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::UninitializedClient {
                session: Some(session_id.to_string()),
            })
    }

    /// Remove the client of `session_id`
    pub fn remove(&self, session_id: &str) -> Option<Arc<dyn CodeInterpreter>> {
        self.clients.remove(session_id).map(|(_, client)| client)
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no session is registered
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
