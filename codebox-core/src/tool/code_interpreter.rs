//! Code Interpreter Tool

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::client::CodeInterpreter;
use crate::error::{Error, Result};
use crate::registry;
use crate::tool::{Tool, ToolDefinition};

const TOOL_NAME: &str = "code_interpreter_tool";

const DESCRIPTION: &str = "\
Runs Python code with the Code Interpreter.
- Suited for:
  - data processing and visualization with libraries such as pandas and matplotlib
  - calculations and statistical analysis
  - text analysis with natural language processing libraries
- The Code Interpreter has no internet access
  - it cannot read external websites or install new libraries
- Asking it to print the code it ran makes the result easier to verify
- It sometimes fixes slightly wrong code on its own

Returns a JSON pair [text, files]:
- text: text printed by the Code Interpreter (mostly the execution result)
- files: paths of files saved by the Code Interpreter, stored under `./files/`";

/// Arguments for the Code Interpreter tool
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CodeArgs {
    /// The Python code to execute
    pub code: String,
}

/// Where the tool finds its client at call time
#[derive(Clone)]
enum ClientSource {
    Active,
    Session(String),
    Fixed(Arc<dyn CodeInterpreter>),
}

/// A tool that runs Python code through a registered [`CodeInterpreter`]
#[derive(Clone)]
pub struct CodeInterpreterTool {
    source: ClientSource,
}

impl Default for CodeInterpreterTool {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeInterpreterTool {
    /// Use the process-wide active client (see [`registry::set_active_client`])
    pub fn new() -> Self {
        Self {
            source: ClientSource::Active,
        }
    }

    /// Use the client registered for `session_id` in the global registry
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            source: ClientSource::Session(session_id.into()),
        }
    }

    /// Use `client` directly
    pub fn with_client(client: Arc<dyn CodeInterpreter>) -> Self {
        Self {
            source: ClientSource::Fixed(client),
        }
    }

    fn client(&self) -> Result<Arc<dyn CodeInterpreter>> {
        match &self.source {
            ClientSource::Active => registry::active_client(),
            ClientSource::Session(id) => registry::global_registry().get(id),
            ClientSource::Fixed(client) => Ok(Arc::clone(client)),
        }
    }
}

#[async_trait]
impl Tool for CodeInterpreterTool {
    fn name(&self) -> String {
        TOOL_NAME.to_string()
    }

    async fn definition(&self) -> ToolDefinition {
        let parameters = serde_json::to_value(schemars::schema_for!(CodeArgs)).unwrap_or_else(|_| {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "The Python code to execute"
                    }
                },
                "required": ["code"]
            })
        });

        ToolDefinition {
            name: self.name(),
            description: DESCRIPTION.to_string(),
            parameters,
            parameters_ts: Some(
                "interface CodeArgs {\n  code: string; // The Python code to execute\n}".to_string(),
            ),
        }
    }

    async fn call(&self, arguments: &str) -> anyhow::Result<String> {
        let args: CodeArgs = serde_json::from_str(arguments)
            .map_err(|e| Error::tool_arguments(self.name(), format!("Invalid JSON arguments: {}", e)))?;

        let client = self.client()?;
        info!(client = client.name(), code = %args.code, "Executing code");

        let output = client.run(&args.code).await?;
        Ok(serde_json::to_string(&output)?)
    }
}
