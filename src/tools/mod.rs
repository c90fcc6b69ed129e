pub mod math;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::ToolError;
use crate::message::ToolCallRequest;
use math::MathSolverTool;

/// Definition sent to the service so the model knows what tools are available.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolAdvertisement {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value, // JSON Schema
}

/// Every tool implements this trait.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses to call this tool.
    fn name(&self) -> &str;

    /// Human-readable description sent with the tool advertisement.
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's input parameters.
    fn schema(&self) -> Value;

    /// Execute the tool with already-parsed JSON arguments.
    async fn execute(&self, input: Value) -> Result<String>;
}

/// Holds all registered tools, which of them are enabled, and dispatches
/// calls by name.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    enabled: HashSet<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            enabled: HashSet::new(),
        }
    }

    /// Create a registry with all built-in tools, none enabled.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MathSolverTool));
        registry
    }

    /// Register a tool. Called during startup.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| &**t)
    }

    /// Enables a registered tool. Returns `false` for unknown names.
    pub fn enable(&mut self, name: &str) -> bool {
        if self.find(name).is_none() {
            return false;
        }
        self.enabled.insert(name.to_string());
        true
    }

    /// Disables a tool. Returns `false` if it was not enabled.
    pub fn disable(&mut self, name: &str) -> bool {
        self.enabled.remove(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    /// Names of all registered tools in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Advertisements for enabled tools, in registration order.
    ///
    /// An empty result means the request must omit its `tools` field.
    pub fn describe_enabled(&self) -> Vec<ToolAdvertisement> {
        self.tools
            .iter()
            .filter(|t| self.enabled.contains(t.name()))
            .map(|t| ToolAdvertisement {
                kind: "function",
                function: FunctionDefinition {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    parameters: t.schema(),
                },
            })
            .collect()
    }

    /// Look up a tool by name, parse its arguments, and execute it.
    pub async fn execute(&self, name: &str, arguments_text: &str) -> Result<String, ToolError> {
        let tool = self
            .find(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let input: Value = serde_json::from_str(arguments_text)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        tool.execute(input)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))
    }

    /// Runs an assembled tool call, folding every failure into result text.
    ///
    /// The service expects a tool-role reply to each call, so errors are
    /// reported through the same channel as successful results.
    pub async fn run(&self, call: &ToolCallRequest) -> String {
        match self.execute(&call.function_name, &call.arguments_text).await {
            Ok(result) => result,
            Err(err) => format!("Error: {}", err),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
