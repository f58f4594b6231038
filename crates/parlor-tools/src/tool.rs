// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry.
//!
//! The [`Tool`] trait defines the interface every external lookup implements.
//! The [`ToolRegistry`] validates arguments against each tool's JSON Schema,
//! dispatches invocations, and generates Anthropic-format tool definitions
//! for the LLM provider.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parlor_core::{ParlorError, ToolOutcome};
use tracing::{debug, warn};

/// Interface for a callable tool.
///
/// Every tool provides a name, description, JSON Schema for its parameters,
/// and an async `invoke` method. The registry validates the input against
/// the schema before `invoke` is called.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's unique name (used for lookup and API serialization).
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Returns the JSON Schema describing the tool's input parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Invokes the tool with schema-valid JSON input.
    ///
    /// Failures must be reported as [`ParlorError::ToolExecutionFailed`]
    /// carrying a human-readable cause.
    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, ParlorError>;
}

struct RegisteredTool {
    tool: Arc<dyn Tool>,
    validator: jsonschema::Validator,
}

/// Registry of available tools, indexed by name.
///
/// Built once at startup and shared read-only behind an `Arc`.
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Creates an empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool, compiling its parameter schema.
    ///
    /// A later registration with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ParlorError> {
        let schema = tool.parameters_schema();
        let validator = jsonschema::validator_for(&schema).map_err(|e| {
            ParlorError::Config(format!("invalid parameter schema for tool {}: {e}", tool.name()))
        })?;
        debug!(tool = tool.name(), "tool registered");
        self.tools
            .insert(tool.name().to_string(), RegisteredTool { tool, validator });
        Ok(())
    }

    /// Looks up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| Arc::clone(&entry.tool))
    }

    /// Returns (name, description) pairs for all registered tools, sorted by name.
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .tools
            .values()
            .map(|entry| (entry.tool.name(), entry.tool.description()))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }

    /// Returns Anthropic-format tool definitions for all registered tools.
    ///
    /// Each definition has the shape:
    /// ```json
    /// {
    ///   "name": "getWeather",
    ///   "description": "What the tool does",
    ///   "input_schema": { ... JSON Schema ... }
    /// }
    /// ```
    pub fn tool_definitions(&self) -> Vec<serde_json::Value> {
        let mut tools: Vec<&Arc<dyn Tool>> = self.tools.values().map(|entry| &entry.tool).collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "input_schema": t.parameters_schema(),
                })
            })
            .collect()
    }

    /// Validates and runs a tool, returning its raw result.
    ///
    /// Unknown names and schema mismatches fail with
    /// [`ParlorError::ToolInputInvalid`] before any executor runs.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ParlorError> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| ParlorError::ToolInputInvalid {
                tool: name.to_string(),
                message: format!("unknown tool `{name}`"),
            })?;

        let violations: Vec<String> = entry
            .validator
            .iter_errors(&arguments)
            .map(|e| e.to_string())
            .collect();
        if !violations.is_empty() {
            return Err(ParlorError::ToolInputInvalid {
                tool: name.to_string(),
                message: violations.join("; "),
            });
        }

        entry.tool.invoke(arguments).await.map_err(|e| match e {
            ParlorError::ToolExecutionFailed { .. } | ParlorError::ToolInputInvalid { .. } => e,
            other => ParlorError::tool_failed(name, other.to_string()),
        })
    }

    /// Runs a tool and folds any failure into a [`ToolOutcome::Failure`].
    ///
    /// Never returns an error: the outcome is handed back to the model so
    /// generation can continue.
    pub async fn execute(&self, name: &str, arguments: serde_json::Value) -> ToolOutcome {
        match self.dispatch(name, arguments).await {
            Ok(value) => ToolOutcome::Success(value),
            Err(e) => {
                warn!(tool = name, error = %e, "tool invocation failed");
                ToolOutcome::Failure(e.to_string())
            }
        }
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
