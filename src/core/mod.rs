/// Core Server Framework Module
///
/// - auth.rs: hub-secret gate and CORS preflight
/// - config.rs: process configuration
/// - error.rs: validation, tool and dispatch errors
/// - protocol.rs: JSON-RPC envelope and content blocks
/// - registry.rs: tool registry and dispatcher
/// - schema.rs: declarative argument schemas
/// - server.rs: registry cache, MCP endpoint and HTTP server

pub mod auth;
pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod server;

#[cfg(test)]
pub mod test_support;
