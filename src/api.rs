//! Coolify REST API client.
//!
//! A thin `reqwest` wrapper over the `/api/v1` endpoints the tools use.
//! Every request carries the configured bearer token; list endpoints are
//! projected to [`ResourceSummary`] records to keep tool output small.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::config::CoolifyConfig;

/// Compact view of a Coolify resource (server, project, application, deployment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Project a JSON array of resources to summaries.
///
/// Deployments use `deployment_uuid` / `application_name` instead of
/// `uuid` / `name`; both spellings are accepted. Non-array input yields an
/// empty list.
pub fn summarize(items: &Value) -> Vec<ResourceSummary> {
    let field = |item: &Value, keys: &[&str]| {
        keys.iter()
            .find_map(|k| item.get(*k).and_then(Value::as_str))
            .map(str::to_string)
    };

    items
        .as_array()
        .map(|arr| {
            arr.iter()
                .map(|item| ResourceSummary {
                    uuid: field(item, &["uuid", "deployment_uuid"]),
                    name: field(item, &["name", "application_name"]),
                    status: field(item, &["status"]),
                    description: field(item, &["description"]),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Reject identifiers that could escape the path segment they are placed in.
fn check_uuid(uuid: &str) -> Result<&str> {
    let uuid = uuid.trim();
    if uuid.is_empty() {
        bail!("uuid must not be empty");
    }
    if !uuid.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        bail!("invalid uuid: {}", uuid);
    }
    Ok(uuid)
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &CoolifyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("coolify-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.access_token.clone(),
        })
    }

    /// Absolute URL for an `/api/v1` path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Coolify access token not configured (set COOLIFY_ACCESS_TOKEN or coolify.access_token)"
                )
            })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let url = self.endpoint(path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token()?)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Coolify API error {}: {}", status, body.trim());
        }

        Ok(response)
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self.get(path, query).await?;
        response
            .json()
            .await
            .with_context(|| format!("invalid JSON from {}", path))
    }

    pub async fn version(&self) -> Result<String> {
        let response = self.get("/version", &[]).await?;
        Ok(response.text().await?.trim().trim_matches('"').to_string())
    }

    pub async fn list_servers(&self) -> Result<Vec<ResourceSummary>> {
        Ok(summarize(&self.get_json("/servers", &[]).await?))
    }

    pub async fn list_projects(&self) -> Result<Vec<ResourceSummary>> {
        Ok(summarize(&self.get_json("/projects", &[]).await?))
    }

    pub async fn list_applications(&self) -> Result<Vec<ResourceSummary>> {
        Ok(summarize(&self.get_json("/applications", &[]).await?))
    }

    pub async fn get_application(&self, uuid: &str) -> Result<Value> {
        let uuid = check_uuid(uuid)?;
        self.get_json(&format!("/applications/{}", uuid), &[]).await
    }

    pub async fn application_logs(&self, uuid: &str, lines: u32) -> Result<Value> {
        let uuid = check_uuid(uuid)?;
        self.get_json(
            &format!("/applications/{}/logs", uuid),
            &[("lines", lines.to_string())],
        )
        .await
    }

    pub async fn list_deployments(&self) -> Result<Vec<ResourceSummary>> {
        Ok(summarize(&self.get_json("/deployments", &[]).await?))
    }

    pub async fn deploy(&self, uuid: &str, force: bool) -> Result<Value> {
        let uuid = check_uuid(uuid)?;
        self.get_json(
            "/deploy",
            &[("uuid", uuid.to_string()), ("force", force.to_string())],
        )
        .await
    }

    pub async fn restart_application(&self, uuid: &str) -> Result<Value> {
        let uuid = check_uuid(uuid)?;
        self.get_json(&format!("/applications/{}/restart", uuid), &[])
            .await
    }
}
