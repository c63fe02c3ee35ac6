/// MCP Server Implementation
///
/// This module contains the HTTP side of the gateway:
/// - Application state and the lazily built, process-wide tool registry
/// - The JSON-RPC 2.0 endpoint and MCP method handlers
/// - Actix Web server setup

use actix_web::{
    App, HttpResponse, HttpServer,
    middleware::{Compress, DefaultHeaders, Logger, from_fn},
    web,
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::auth;
use crate::core::config::{GatewayConfig, ServerSettings};
use crate::core::error::DispatchError;
use crate::core::protocol::{MCPRequest, MCPResponse, PROTOCOL_VERSION, codes};
use crate::core::registry::ToolRegistry;
use crate::tools;

/// Observable lifecycle of the registry cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Unbuilt,
    Built,
}

impl RegistryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryState::Unbuilt => "unbuilt",
            RegistryState::Built => "built",
        }
    }
}

/// Process-wide tool registry, built on first use and reused afterwards.
///
/// Building is not locked. Two requests racing on an unbuilt cache may both
/// build; the first stored instance wins and later callers get it. Any two
/// builds are interchangeable since they come from the same config and client.
pub struct RegistryCache {
    cell: OnceLock<Arc<ToolRegistry>>,
    config: GatewayConfig,
    client: reqwest::Client,
    builds: AtomicUsize,
}

impl RegistryCache {
    pub fn new(config: GatewayConfig, client: reqwest::Client) -> Self {
        Self {
            cell: OnceLock::new(),
            config,
            client,
            builds: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> RegistryState {
        if self.cell.get().is_some() {
            RegistryState::Built
        } else {
            RegistryState::Unbuilt
        }
    }

    pub fn get_or_build(&self) -> Arc<ToolRegistry> {
        if let Some(registry) = self.cell.get() {
            return registry.clone();
        }

        let built = Arc::new(initialize_tools(&self.config, &self.client));
        let n = self.builds.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(builds = n, tools = built.tools().len(), "built tool registry");

        self.store(built)
    }

    /// Store a freshly built registry, or adopt the one stored first.
    fn store(&self, built: Arc<ToolRegistry>) -> Arc<ToolRegistry> {
        match self.cell.set(built.clone()) {
            Ok(()) => built,
            Err(_) => {
                debug!("registry already stored by a concurrent build");
                self.cell.get().cloned().unwrap_or(built)
            }
        }
    }

    /// Number of registry constructions so far.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

/// Application state shared across all worker threads in HTTP mode.
pub struct AppState {
    pub config: GatewayConfig,
    pub registry: RegistryCache,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: GatewayConfig, client: reqwest::Client) -> Self {
        Self {
            registry: RegistryCache::new(config.clone(), client),
            config,
        }
    }
}

/// Create the tool registry and register all tools.
///
/// Add new tool registrations here following the same pattern.
pub fn initialize_tools(config: &GatewayConfig, client: &reqwest::Client) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    tools::audio::register(&mut registry, &config.tts, client.clone());
    tools::image::register(&mut registry, &config.image, client.clone());
    tools::translate::register(&mut registry, &config.translate, client.clone());

    registry
}

/// Health check endpoint handler.
///
/// Reports whether the tool registry has been built yet; reading it here
/// never triggers a build.
async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": state.config.server.name,
        "registry": state.registry.state().as_str(),
        "registryBuilds": state.registry.build_count()
    }))
}

/// MCP JSON-RPC request handler.
///
/// Parses one JSON-RPC request, routes it to the matching MCP method and
/// answers with a JSON-RPC 2.0 response. Notifications get 202 with no body.
async fn mcp_handler(state: web::Data<AppState>, body: bytes::Bytes) -> HttpResponse {
    let registry = state.registry.get_or_build();

    let raw: Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "unparseable JSON-RPC request");
            return HttpResponse::Ok().json(MCPResponse::failure(
                None,
                codes::PARSE_ERROR,
                format!("Parse error: {e}"),
            ));
        }
    };

    // Valid JSON but not a request object; keep the id when there is one
    let id = raw.get("id").cloned();
    let req: MCPRequest = match serde_json::from_value(raw) {
        Ok(req) => req,
        Err(e) => {
            debug!(error = %e, "malformed JSON-RPC request");
            return HttpResponse::Ok().json(MCPResponse::failure(
                id,
                codes::INVALID_REQUEST,
                format!("Invalid Request: {e}"),
            ));
        }
    };

    if req.jsonrpc != "2.0" {
        return HttpResponse::Ok().json(MCPResponse::failure(
            req.id,
            codes::INVALID_REQUEST,
            "Invalid Request: jsonrpc must be \"2.0\"",
        ));
    }

    if req.id.is_none() {
        debug!(method = %req.method, "notification received");
        return HttpResponse::Accepted().finish();
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&state.config.server, req.id),
        "ping" => MCPResponse::success(req.id, json!({})),
        "tools/list" => handle_tools_list(&registry, req.id),
        "tools/call" => handle_tools_call(&registry, req.id, req.params).await,
        _ => MCPResponse::failure(
            req.id,
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    HttpResponse::Ok().json(response)
}

/// Handle MCP initialize method.
fn handle_initialize(server: &ServerSettings, id: Option<Value>) -> MCPResponse {
    MCPResponse::success(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": server.name,
                "version": server.version
            }
        }),
    )
}

/// Handle MCP tools/list method.
fn handle_tools_list(registry: &ToolRegistry, id: Option<Value>) -> MCPResponse {
    MCPResponse::success(id, json!({ "tools": registry.tools() }))
}

/// Handle MCP tools/call method.
///
/// Unknown tools map to "method not found", schema violations to "invalid
/// params" with the violation list as error data. Tool failures come back as
/// a normal result with `isError: true`.
async fn handle_tools_call(
    registry: &ToolRegistry,
    id: Option<Value>,
    params: Option<Value>,
) -> MCPResponse {
    let Some(params) = params else {
        return MCPResponse::failure(id, codes::INVALID_PARAMS, "Invalid params");
    };

    let Some(tool_name) = params.get("name").and_then(Value::as_str) else {
        return MCPResponse::failure(id, codes::INVALID_PARAMS, "Invalid params: missing tool name");
    };
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    match registry.call(tool_name, &arguments).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(value) => MCPResponse::success(id, value),
            Err(e) => {
                warn!(tool = tool_name, error = %e, "failed to serialize tool result");
                MCPResponse::failure(id, codes::INTERNAL_ERROR, e.to_string())
            }
        },
        Err(err) => {
            debug!(tool = tool_name, error = %err, "tool call rejected");
            let (code, data) = match &err {
                DispatchError::UnknownTool(_) => (codes::METHOD_NOT_FOUND, None),
                DispatchError::InvalidArguments { source, .. } => (
                    codes::INVALID_PARAMS,
                    serde_json::to_value(&source.violations).ok(),
                ),
            };
            MCPResponse::failure_with_data(id, code, err.to_string(), data)
        }
    }
}

/// Register the gateway routes. Middleware is applied by the caller.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/mcp", web::post().to(mcp_handler))
        .route("/", web::post().to(mcp_handler));
}

/// Run the gateway over HTTP.
///
/// The server is configured with:
/// - Worker threads: from config (CPU count capped at 16 by default)
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive: 30 seconds
/// - Request timeout: 30 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(config: GatewayConfig) -> std::io::Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let workers = config.server.workers;

    for name in config.missing_settings() {
        warn!(setting = name, "configuration value is not set");
    }

    info!(
        name = %config.server.name,
        version = %config.server.version,
        bind = %bind_addr,
        workers,
        "MCP gateway starting"
    );

    // Created once here so every worker shares the same registry cache
    let app_state = web::Data::new(AppState::new(config));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", auth::CORS_ALLOW_ORIGIN))
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            .wrap(from_fn(auth::auth_gate))
            .wrap(Compress::default())
            // Path only: the query string may hold the hub token
            .wrap(Logger::new("%m %U %s %Dms"))
            .configure(routes)
    })
    .workers(workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}
