//! Tool trait, tool context, built-in tools, and the tool registry.
//!
//! Every callable operation (documentation search and the Coolify API
//! wrappers) implements [`Tool`] and lives in a [`ToolRegistry`]. Both
//! transports (the MCP bridge in [`crate::mcp`] and the REST endpoints in
//! [`crate::server`]) dispatch through the same registry.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                ToolRegistry                 │
//! │  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │ search_docs │  │ Coolify API tools    │  │
//! │  │ (DocsEngine)│  │ servers/apps/deploy  │  │
//! │  └─────────────┘  └──────────────────────┘  │
//! └──────────────────────┬──────────────────────┘
//!                        ▼
//!          McpBridge (stdio / HTTP)  ·  POST /tools/{name}
//! ```
//!
//! # Built-in tools
//!
//! | Tool | Mode | Backed by |
//! |------|------|-----------|
//! | `search_docs` | read | [`DocsEngine::search`] |
//! | `get_version` | read | `GET /api/v1/version` |
//! | `list_servers` | read | `GET /api/v1/servers` |
//! | `list_projects` | read | `GET /api/v1/projects` |
//! | `list_applications` | read | `GET /api/v1/applications` |
//! | `get_application` | read | `GET /api/v1/applications/{uuid}` |
//! | `get_application_logs` | read | `GET /api/v1/applications/{uuid}/logs` |
//! | `list_deployments` | read | `GET /api/v1/deployments` |
//! | `deploy_application` | write | `GET /api/v1/deploy?uuid=..&force=..` |
//! | `restart_application` | write | `GET /api/v1/applications/{uuid}/restart` |
//!
//! # Parameter handling
//!
//! Callers pass a JSON object. [`validate_params`] checks it against the
//! tool's schema (required keys, primitive types) and fills in declared
//! defaults before [`Tool::execute`] runs, so tools only re-check ranges and
//! non-emptiness.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::Config;
use crate::docs::DocsEngine;

/// Upper bound for the `limit` parameter of `search_docs`.
pub const MAX_SEARCH_LIMIT: u64 = 20;

/// Log lines returned by `get_application_logs` when `lines` is omitted.
const DEFAULT_LOG_LINES: u64 = 100;

/// Upper bound for the `lines` parameter of `get_application_logs`.
const MAX_LOG_LINES: u64 = 10_000;

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// An operation an agent can discover and call.
///
/// Implementations are stateless unit structs; everything they need at call
/// time (docs engine, API client, configuration) comes from the
/// [`ToolContext`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores, e.g. `"list_servers"`.
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// Whether the tool only reads state. Defaults to `true`.
    ///
    /// Surfaced to MCP clients as the `readOnlyHint` annotation.
    fn read_only(&self) -> bool {
        true
    }

    /// JSON Schema (`type: "object"`) describing the parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute with parameters already checked by [`validate_params`].
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Serializable tool descriptor for `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Tool name, used in `POST /tools/{name}`.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// `false` for tools that change state on the Coolify instance.
    pub read_only: bool,
    /// JSON Schema of the parameters.
    pub parameters: Value,
}

impl ToolInfo {
    /// Snapshot the descriptor of a registered tool.
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            read_only: tool.read_only(),
            parameters: tool.parameters_schema(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Shared services handed to every tool invocation.
///
/// Created once per server and shared behind `Arc`, so the documentation
/// index loaded by one call is reused by every later call.
pub struct ToolContext {
    config: Arc<Config>,
    docs: Arc<DocsEngine>,
    api: Arc<ApiClient>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, docs: Arc<DocsEngine>, api: Arc<ApiClient>) -> Self {
        Self { config, docs, api }
    }

    /// Build the docs engine and API client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(config.clone()),
            Arc::new(DocsEngine::from_config(config)?),
            Arc::new(ApiClient::new(&config.coolify)?),
        ))
    }

    /// The loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared documentation search engine.
    pub fn docs(&self) -> &DocsEngine {
        &self.docs
    }

    /// The Coolify API client.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter validation
// ═══════════════════════════════════════════════════════════════════════

/// Check `params` against a tool's schema and fill in declared defaults.
///
/// Verifies required keys and the primitive `type` of each supplied
/// property. Non-object params are treated as `{}`.
///
/// # Errors
///
/// - `missing required parameter: <name>` when a required key is absent.
/// - `invalid parameter '<name>': expected <type>, got <type>` on a type
///   mismatch.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let params_obj = params.as_object().cloned().unwrap_or_default();

    let properties = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let required: Vec<&str> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    for req_field in &required {
        if !params_obj.contains_key(*req_field) {
            bail!("missing required parameter: {}", req_field);
        }
    }

    let mut result = params_obj.clone();

    for (prop_name, prop_schema) in &properties {
        match params_obj.get(prop_name) {
            Some(value) => {
                if let Some(expected_type) = prop_schema.get("type").and_then(|t| t.as_str()) {
                    let type_ok = match expected_type {
                        "string" => value.is_string(),
                        "integer" => value.is_i64() || value.is_u64(),
                        "number" => value.is_number(),
                        "boolean" => value.is_boolean(),
                        _ => true,
                    };
                    if !type_ok {
                        bail!(
                            "invalid parameter '{}': expected {}, got {}",
                            prop_name,
                            expected_type,
                            json_type_name(value)
                        );
                    }
                }
            }
            None => {
                if let Some(default) = prop_schema.get("default") {
                    result.insert(prop_name.clone(), default.clone());
                }
            }
        }
    }

    Ok(Value::Object(result))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A string parameter that must be present and not blank.
fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    let value = params[key].as_str().unwrap_or("");
    if value.trim().is_empty() {
        bail!("{} must not be empty", key);
    }
    Ok(value)
}

/// An optional unsigned integer parameter constrained to `range`.
///
/// Absent or `null` yields `None`. Negative numbers, values outside the
/// range and values too large for `u64` are all rejected.
fn optional_u64_in(
    params: &Value,
    key: &str,
    range: std::ops::RangeInclusive<u64>,
) -> Result<Option<u64>> {
    let Some(value) = params.get(key).filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    match value.as_u64() {
        Some(n) if range.contains(&n) => Ok(Some(n)),
        _ => bail!(
            "invalid {} {}: must be between {} and {}",
            key,
            value,
            range.start(),
            range.end()
        ),
    }
}

fn no_params() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn uuid_params(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "uuid": { "type": "string", "description": description }
        },
        "required": ["uuid"]
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tools
// ═══════════════════════════════════════════════════════════════════════

/// Ranked search over the Coolify documentation.
///
/// The first call loads and indexes the documentation corpus; concurrent
/// first calls share that load. Returns the ranked results and the number
/// of indexed chunks.
///
/// # Parameters
///
/// | Name | Type | Required | Default |
/// |------|------|----------|---------|
/// | `query` | string | yes | |
/// | `limit` | integer (1-20) | no | `docs.default_limit` |
pub struct SearchDocsTool;

#[async_trait]
impl Tool for SearchDocsTool {
    fn name(&self) -> &str {
        "search_docs"
    }

    fn description(&self) -> &str {
        "Search the Coolify documentation and return ranked excerpts with links"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What to look for, e.g. 'docker compose environment variables'" },
                "limit": { "type": "integer", "description": "Max results (1-20, default from config)" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let limit = optional_u64_in(&params, "limit", 1..=MAX_SEARCH_LIMIT)?.map(|n| n as usize);

        let results = ctx.docs().search(query, limit).await?;

        Ok(json!({
            "results": results,
            "total_chunks": ctx.docs().chunk_count(),
        }))
    }
}

/// Version of the connected Coolify instance, plus the base URL it was
/// reached at.
pub struct GetVersionTool;

#[async_trait]
impl Tool for GetVersionTool {
    fn name(&self) -> &str {
        "get_version"
    }

    fn description(&self) -> &str {
        "Get the version of the connected Coolify instance"
    }

    fn parameters_schema(&self) -> Value {
        no_params()
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(json!({
            "version": ctx.api().version().await?,
            "base_url": ctx.config().coolify.base_url,
        }))
    }
}

/// Servers managed by the Coolify instance, as resource summaries.
pub struct ListServersTool;

#[async_trait]
impl Tool for ListServersTool {
    fn name(&self) -> &str {
        "list_servers"
    }

    fn description(&self) -> &str {
        "List servers managed by Coolify"
    }

    fn parameters_schema(&self) -> Value {
        no_params()
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(json!({ "servers": ctx.api().list_servers().await? }))
    }
}

/// Projects, as resource summaries.
pub struct ListProjectsTool;

#[async_trait]
impl Tool for ListProjectsTool {
    fn name(&self) -> &str {
        "list_projects"
    }

    fn description(&self) -> &str {
        "List Coolify projects"
    }

    fn parameters_schema(&self) -> Value {
        no_params()
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(json!({ "projects": ctx.api().list_projects().await? }))
    }
}

/// Applications with their status, as resource summaries.
pub struct ListApplicationsTool;

#[async_trait]
impl Tool for ListApplicationsTool {
    fn name(&self) -> &str {
        "list_applications"
    }

    fn description(&self) -> &str {
        "List applications with their status"
    }

    fn parameters_schema(&self) -> Value {
        no_params()
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(json!({ "applications": ctx.api().list_applications().await? }))
    }
}

/// Full application record, passed through unmodified.
pub struct GetApplicationTool;

#[async_trait]
impl Tool for GetApplicationTool {
    fn name(&self) -> &str {
        "get_application"
    }

    fn description(&self) -> &str {
        "Get the full configuration of an application"
    }

    fn parameters_schema(&self) -> Value {
        uuid_params("Application UUID")
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let uuid = required_str(&params, "uuid")?;
        ctx.api().get_application(uuid).await
    }
}

/// Recent container logs of an application.
///
/// # Parameters
///
/// | Name | Type | Required | Default |
/// |------|------|----------|---------|
/// | `uuid` | string | yes | |
/// | `lines` | integer (1-10000) | no | `100` |
pub struct GetApplicationLogsTool;

#[async_trait]
impl Tool for GetApplicationLogsTool {
    fn name(&self) -> &str {
        "get_application_logs"
    }

    fn description(&self) -> &str {
        "Fetch recent container logs of an application"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "uuid": { "type": "string", "description": "Application UUID" },
                "lines": { "type": "integer", "description": "Number of log lines", "default": DEFAULT_LOG_LINES }
            },
            "required": ["uuid"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let uuid = required_str(&params, "uuid")?;
        let lines = optional_u64_in(&params, "lines", 1..=MAX_LOG_LINES)?
            .unwrap_or(DEFAULT_LOG_LINES);
        ctx.api().application_logs(uuid, lines as u32).await
    }
}

/// Running and queued deployments, as resource summaries.
pub struct ListDeploymentsTool;

#[async_trait]
impl Tool for ListDeploymentsTool {
    fn name(&self) -> &str {
        "list_deployments"
    }

    fn description(&self) -> &str {
        "List running and queued deployments"
    }

    fn parameters_schema(&self) -> Value {
        no_params()
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(json!({ "deployments": ctx.api().list_deployments().await? }))
    }
}

/// Queue a deployment. Write tool.
///
/// `force` rebuilds without the build cache.
pub struct DeployApplicationTool;

#[async_trait]
impl Tool for DeployApplicationTool {
    fn name(&self) -> &str {
        "deploy_application"
    }

    fn description(&self) -> &str {
        "Trigger a deployment of an application"
    }

    fn read_only(&self) -> bool {
        false
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "uuid": { "type": "string", "description": "Application UUID" },
                "force": { "type": "boolean", "description": "Rebuild without cache", "default": false }
            },
            "required": ["uuid"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let uuid = required_str(&params, "uuid")?;
        let force = params["force"].as_bool().unwrap_or(false);
        ctx.api().deploy(uuid, force).await
    }
}

/// Restart an application's containers. Write tool.
pub struct RestartApplicationTool;

#[async_trait]
impl Tool for RestartApplicationTool {
    fn name(&self) -> &str {
        "restart_application"
    }

    fn description(&self) -> &str {
        "Restart an application"
    }

    fn read_only(&self) -> bool {
        false
    }

    fn parameters_schema(&self) -> Value {
        uuid_params("Application UUID")
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let uuid = required_str(&params, "uuid")?;
        ctx.api().restart_application(uuid).await
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Ordered collection of tools, looked up by name.
///
/// Registration order is the order tools are listed in `tools/list`, the
/// MCP `tools/list` response and the `tools` CLI command.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry with the documentation search and every Coolify API tool.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchDocsTool));
        registry.register(Box::new(GetVersionTool));
        registry.register(Box::new(ListServersTool));
        registry.register(Box::new(ListProjectsTool));
        registry.register(Box::new(ListApplicationsTool));
        registry.register(Box::new(GetApplicationTool));
        registry.register(Box::new(GetApplicationLogsTool));
        registry.register(Box::new(ListDeploymentsTool));
        registry.register(Box::new(DeployApplicationTool));
        registry.register(Box::new(RestartApplicationTool));
        registry
    }

    /// Register a tool. [`find`](Self::find) returns the first tool
    /// registered under a name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    /// All tools in registration order.
    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    /// Look up a tool by name.
    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Validate `params` and run the named tool.
    ///
    /// Fails with `tool not found: <name>` for unknown names, otherwise with
    /// whatever [`validate_params`] or the tool returns.
    pub async fn call(&self, name: &str, params: Value, ctx: &ToolContext) -> Result<Value> {
        let tool = self
            .find(name)
            .ok_or_else(|| anyhow::anyhow!("tool not found: {}", name))?;
        let params = validate_params(&tool.parameters_schema(), &params)?;
        tool.execute(params, ctx).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `tools` CLI command: print the registered tools.
pub fn list_tools() -> Result<()> {
    let registry = ToolRegistry::with_builtins();
    println!("{:<24} {:<6} DESCRIPTION", "TOOL", "MODE");
    for tool in registry.tools() {
        let mode = if tool.read_only() { "read" } else { "write" };
        println!("{:<24} {:<6} {}", tool.name(), mode, tool.description());
    }
    Ok(())
}
