/// Error types for argument validation, tool execution and dispatch.
///
/// Auth failures are not represented here: the auth gate answers them with a
/// plain HTTP 401 before any of these types come into play.

use serde::Serialize;
use thiserror::Error;

/// A single schema violation for one argument field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Field name as it appears in the tool's input schema (empty for the
    /// argument object itself)
    pub field: String,
    /// Human-readable description of what is wrong
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// All violations found while validating one argument object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure raised by a tool handler.
///
/// Non-2xx statuses, transport errors and undecodable success bodies all
/// collapse into `Downstream`; the message is shown to the caller verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("{0}")]
    Downstream(String),

    #[error("Invalid validated arguments: {0}")]
    Arguments(String),
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        ToolError::Downstream(err.to_string())
    }
}

/// Failures the dispatcher reports at the JSON-RPC level rather than as an
/// `isError` tool result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: ValidationError,
    },
}
