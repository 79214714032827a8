//! Server transports.
//!
//! Two ways to expose the tools:
//!
//! * **stdio**: [`run_stdio`] speaks MCP over stdin/stdout, the usual setup
//!   for desktop MCP clients that spawn the server themselves.
//! * **HTTP**: [`run_http`] binds `[server].bind` and serves both the MCP
//!   Streamable HTTP endpoint and a plain JSON API.
//!
//! # HTTP endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `*`    | `/mcp` | MCP Streamable HTTP endpoint |
//! | `GET`  | `/tools/list` | List all tools with schemas |
//! | `POST` | `/tools/{name}` | Call a tool by name |
//! | `GET`  | `/health` | Health check (version, indexed chunks) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `upstream_error` (502),
//! `tool_error` (500).
//!
//! # Client configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "coolify": {
//!       "command": "coolify-mcp",
//!       "args": ["serve", "stdio"],
//!       "env": { "COOLIFY_BASE_URL": "https://coolify.example.com", "COOLIFY_ACCESS_TOKEN": "..." }
//!     }
//!   }
//! }
//! ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use rmcp::ServiceExt;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::mcp::McpBridge;
use crate::traits::{ToolContext, ToolInfo, ToolRegistry};

/// Shared application state passed to all route handlers.
///
/// Wrapped in `Arc` pieces so Axum can clone it cheaply per request.
#[derive(Clone)]
struct AppState {
    /// Docs engine, API client and configuration shared by every call.
    ctx: Arc<ToolContext>,
    /// Built-in tools, looked up by name on `POST /tools/{name}`.
    tools: Arc<ToolRegistry>,
}

/// Serve MCP over stdin/stdout until the client disconnects.
///
/// Logs go to stderr, so stdout carries nothing but JSON-RPC frames.
pub async fn run_stdio(config: &Config) -> anyhow::Result<()> {
    let bridge = McpBridge::from_config(config)?;
    info!("MCP server running on stdio");
    let service = bridge.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;
    Ok(())
}

/// Build the HTTP router over an existing context and registry.
///
/// The MCP service and the JSON API share the same context, so a docs
/// index loaded through one transport is visible through the other.
///
/// Exposed separately from [`run_http`] so tests can serve it on an
/// ephemeral port.
pub fn router(ctx: Arc<ToolContext>, tools: Arc<ToolRegistry>) -> Router {
    let bridge = McpBridge::new(ctx.clone(), tools.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(AppState { ctx, tools })
}

/// Serve the HTTP transports on `[server].bind` until the process exits.
///
/// # Errors
///
/// Fails when the context cannot be built or the address cannot be bound.
pub async fn run_http(config: &Config) -> anyhow::Result<()> {
    let ctx = Arc::new(ToolContext::from_config(config)?);
    let tools = Arc::new(ToolRegistry::with_builtins());
    let app = router(ctx, tools);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "MCP server listening on http://{}/mcp", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error envelope: `{ "error": { "code": ..., "message": ... } }`.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Machine-readable code plus a human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    /// One of `bad_request`, `not_found`, `upstream_error`, `tool_error`.
    code: String,
    /// Tool name followed by the underlying error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    /// HTTP status of the response.
    status: StatusCode,
    /// Value of `error.code` in the body.
    code: &'static str,
    /// Value of `error.message` in the body.
    message: String,
}

/// Renders the error envelope with the stored status.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Shorthand constructor for [`AppError`].
fn app_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> AppError {
    AppError {
        status,
        code,
        message: message.into(),
    }
}

/// Map a tool failure to an HTTP status by inspecting its message, so tools
/// can stay on plain `anyhow` errors.
///
/// Upstream failures are recognised first: their messages embed text from
/// the remote side (status lines, TLS errors, response bodies) that may
/// contain "not found" or "invalid".
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let msg = err.to_string();
    let message = format!("{}: {}", tool_name, msg);

    if msg.contains("failed to fetch documentation")
        || msg.contains("Coolify API error")
        || msg.contains("timed out")
    {
        app_error(StatusCode::BAD_GATEWAY, "upstream_error", message)
    } else if msg.contains("not found") {
        app_error(StatusCode::NOT_FOUND, "not_found", message)
    } else if msg.contains("must not be empty")
        || msg.contains("missing required parameter")
        || msg.contains("invalid")
        || msg.contains("not configured")
    {
        app_error(StatusCode::BAD_REQUEST, "bad_request", message)
    } else {
        app_error(StatusCode::INTERNAL_SERVER_ERROR, "tool_error", message)
    }
}

// ============ GET /health ============

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server answers.
    status: String,
    /// Crate version of the running binary.
    version: String,
    /// Documentation chunks indexed so far (0 until the first search).
    docs_chunks: usize,
    /// Number of registered tools.
    tools: usize,
}

/// Liveness probe. Never triggers a docs load.
async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        docs_chunks: state.ctx.docs().chunk_count(),
        tools: state.tools.tools().len(),
    })
}

// ============ GET /tools/list ============

/// Response body for `GET /tools/list`.
#[derive(Serialize)]
struct ToolListResponse {
    /// Descriptors in registration order.
    tools: Vec<ToolInfo>,
}

/// List every registered tool with its parameter schema.
async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo::from_tool(t.as_ref()))
        .collect();
    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// Call a tool by name with a JSON object body.
///
/// On success the tool output is wrapped as `{ "result": ... }`.
///
/// Returns `404` for unknown tools, `400` for parameter errors, `502` when
/// Coolify or the docs host fails, and `500` otherwise.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    if state.tools.find(&name).is_none() {
        return Err(app_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("no tool registered with name: {}", name),
        ));
    }

    let result = state
        .tools
        .call(&name, params, &state.ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_tool_error() {
        let e = classify_tool_error("search_docs", anyhow::anyhow!("query must not be empty"));
        assert_eq!(e.status, StatusCode::BAD_REQUEST);

        let e = classify_tool_error(
            "search_docs",
            anyhow::anyhow!("failed to fetch documentation: https://x returned HTTP 500"),
        );
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);
        assert_eq!(e.code, "upstream_error");

        let e = classify_tool_error(
            "list_servers",
            anyhow::anyhow!("Coolify API error 401 Unauthorized: {{}}"),
        );
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);

        let e = classify_tool_error(
            "search_docs",
            anyhow::anyhow!(
                "failed to fetch documentation: request to https://coolify.io/docs/llms-full.txt failed: invalid peer certificate: UnknownIssuer"
            ),
        );
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);
        assert_eq!(e.code, "upstream_error");

        let e = classify_tool_error(
            "get_application",
            anyhow::anyhow!("Coolify API error 404 Not Found: {{\"message\":\"Application not found.\"}}"),
        );
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);

        let e = classify_tool_error("get_application", anyhow::anyhow!("invalid uuid: ../x"));
        assert_eq!(e.status, StatusCode::BAD_REQUEST);

        let e = classify_tool_error("x", anyhow::anyhow!("tool not found: x"));
        assert_eq!(e.status, StatusCode::NOT_FOUND);

        let e = classify_tool_error("x", anyhow::anyhow!("boom"));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.message, "x: boom");
    }
}
