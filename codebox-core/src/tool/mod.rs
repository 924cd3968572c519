//! Tool system for AI agents
//!
//! Provides the abstraction agent frameworks use to discover and call tools.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;

pub mod code_interpreter;

pub use code_interpreter::{CodeArgs, CodeInterpreterTool};

/// Definition of a tool that can be sent to the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool
    pub name: String,
    /// Description for the LLM
    pub description: String,
    /// JSON Schema for parameters
    pub parameters: serde_json::Value,
    /// TypeScript interface definition, for system prompts
    pub parameters_ts: Option<String>,
}

/// Trait for implementing tools that AI agents can call
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name of this tool
    fn name(&self) -> String;

    /// Get the tool definition for the LLM
    async fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given arguments (JSON string)
    async fn call(&self, arguments: &str) -> anyhow::Result<String>;
}

/// Name-keyed collection of tools
#[derive(Clone)]
pub struct ToolSet {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Cached definitions to avoid async calls during prompt generation
    cached_definitions: Arc<parking_lot::RwLock<HashMap<String, ToolDefinition>>>,
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolSet {
    /// Create an empty toolset
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            cached_definitions: Arc::new(parking_lot::RwLock::new(HashMap::new())),
        }
    }

    /// Add a tool to the set
    pub fn add<T: Tool + 'static>(&mut self, tool: T) -> &mut Self {
        self.tools.insert(tool.name(), Arc::new(tool));
        self
    }

    /// Add a shared tool to the set
    pub fn add_shared(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        self.tools.insert(tool.name(), tool);
        self
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    async fn cached_definition(&self, name: &str, tool: &Arc<dyn Tool>) -> ToolDefinition {
        // Guard must be dropped before awaiting
        let cached = { self.cached_definitions.read().get(name).cloned() };
        if let Some(def) = cached {
            return def;
        }
        let def = tool.definition().await;
        self.cached_definitions
            .write()
            .insert(name.to_string(), def.clone());
        def
    }

    /// Get all tool definitions, sorted by name
    pub async fn definitions(&self) -> Vec<ToolDefinition> {
        let mut sorted: Vec<_> = self.tools.iter().collect();
        sorted.sort_by_key(|(name, _)| *name);

        let mut defs = Vec::with_capacity(sorted.len());
        for (name, tool) in sorted {
            defs.push(self.cached_definition(name, tool).await);
        }
        defs
    }

    /// Render the tool definitions as a system prompt section
    pub async fn describe(&self) -> String {
        if self.tools.is_empty() {
            return String::new();
        }

        let mut content = String::from("## Tool Definitions (TypeScript)\n\n");
        content.push_str(
            "You have access to the following tools. Use them to fulfill the user's request.\n\n",
        );

        for def in self.definitions().await {
            content.push_str(&format!("### {}\n{}\n", def.name, def.description));
            if let Some(ts) = def.parameters_ts {
                content.push_str("```typescript\n");
                content.push_str(&ts);
                if !ts.ends_with('\n') {
                    content.push('\n');
                }
                content.push_str("```\n\n");
            } else {
                content.push_str("```json\n");
                content.push_str(&serde_json::to_string_pretty(&def.parameters).unwrap_or_default());
                content.push_str("\n```\n\n");
            }
        }
        content
    }

    /// Call a tool by name
    pub async fn call(&self, name: &str, arguments: &str) -> anyhow::Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        tool.call(arguments).await
    }

    /// Get the number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Iterate over tools
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<dyn Tool>)> {
        self.tools.iter()
    }
}

/// Builder for creating a ToolSet
pub struct ToolSetBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl Default for ToolSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolSetBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Add a tool
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    /// Add a shared tool
    pub fn shared_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Build the ToolSet
    pub fn build(self) -> ToolSet {
        let mut toolset = ToolSet::new();
        for tool in self.tools {
            toolset.add_shared(tool);
        }
        toolset
    }
}
