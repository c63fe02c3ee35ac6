/// Tool registry and dispatcher.
///
/// The registry holds the fixed table of tool definitions built at startup.
/// `call` resolves a tool by name, validates the raw arguments against its
/// schema, runs the handler and normalizes the outcome into a
/// `CallToolResult`. It keeps no per-call state.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{Instrument, debug, info_span, warn};

use crate::core::error::{DispatchError, ToolError};
use crate::core::protocol::{CallToolResult, ContentBlock, MCPTool};
use crate::core::schema::{ArgumentSchema, ValidatedArgs};

/// Execution logic of a single tool.
///
/// Handlers only ever see arguments that passed the tool's schema.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: ValidatedArgs) -> Result<Vec<ContentBlock>, ToolError>;
}

/// A tool as registered: protocol metadata, schema and handler.
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: ArgumentSchema,
    pub handler: Box<dyn ToolHandler>,
}

struct RegisteredTool {
    schema: ArgumentSchema,
    handler: Box<dyn ToolHandler>,
}

/// Registry of available MCP tools.
///
/// `tools` keeps registration order for `tools/list`; `handlers` serves
/// lookups for `tools/call`.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<MCPTool>,
    handlers: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A later registration under the same name replaces
    /// the earlier one in both the catalog and the handler table.
    pub fn register(&mut self, definition: ToolDefinition) {
        let ToolDefinition {
            name,
            description,
            schema,
            handler,
        } = definition;

        let tool = MCPTool {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: schema.to_json_schema(),
        };
        self.tools.retain(|t| t.name != name);
        self.tools.push(tool);
        self.handlers
            .insert(name.to_string(), RegisteredTool { schema, handler });
    }

    /// Tool catalog in registration order.
    pub fn tools(&self) -> &[MCPTool] {
        &self.tools
    }

    /// Dispatch one `tools/call`.
    ///
    /// Unknown tools and schema violations are returned as `DispatchError`
    /// without reaching a handler. Handler failures become an `isError`
    /// result carrying the failure message.
    pub async fn call(&self, name: &str, arguments: &Value) -> Result<CallToolResult, DispatchError> {
        let tool = self
            .handlers
            .get(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;

        let args = tool
            .schema
            .validate(arguments)
            .map_err(|source| DispatchError::InvalidArguments {
                tool: name.to_string(),
                source,
            })?;

        let span = info_span!("tool_call", tool = name);
        match tool.handler.handle(args).instrument(span).await {
            Ok(content) => {
                debug!(tool = name, blocks = content.len(), "tool call succeeded");
                Ok(CallToolResult::success(content))
            }
            Err(err) => {
                warn!(tool = name, error = %err, "tool call failed");
                Ok(CallToolResult::error(err.to_string()))
            }
        }
    }
}
