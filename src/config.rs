//! TOML configuration.
//!
//! Every section is optional; a missing section falls back to its defaults so
//! the server also runs without any config file. Environment variables are
//! applied on top of the file:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `COOLIFY_BASE_URL` | `coolify.base_url` |
//! | `COOLIFY_ACCESS_TOKEN` | `coolify.access_token` |
//! | `COOLIFY_DOCS_URL` | `docs.corpus_url` |

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/coolify-mcp.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub coolify: CoolifyConfig,
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CoolifyConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CoolifyConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            timeout_secs: default_api_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_api_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocsConfig {
    /// Location of the concatenated documentation corpus.
    #[serde(default = "default_corpus_url")]
    pub corpus_url: String,
    /// Base URL that page paths are joined to.
    #[serde(default = "default_site_url")]
    pub site_url: String,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            corpus_url: default_corpus_url(),
            site_url: default_site_url(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            default_limit: default_limit(),
        }
    }
}

fn default_corpus_url() -> String {
    "https://coolify.io/docs/llms-full.txt".to_string()
}
fn default_site_url() -> String {
    "https://coolify.io/docs".to_string()
}
fn default_fetch_timeout_secs() -> u64 {
    15
}
fn default_limit() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// All defaults, no file.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("COOLIFY_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.coolify.base_url = url;
        }
        if let Some(token) = lookup("COOLIFY_ACCESS_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.coolify.access_token = Some(token);
        }
        if let Some(url) = lookup("COOLIFY_DOCS_URL").filter(|v| !v.trim().is_empty()) {
            self.docs.corpus_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !is_http_url(&self.coolify.base_url) {
            anyhow::bail!(
                "coolify.base_url must be an http(s) URL, got '{}'",
                self.coolify.base_url
            );
        }
        if self.coolify.timeout_secs == 0 {
            anyhow::bail!("coolify.timeout_secs must be > 0");
        }
        if !is_http_url(&self.docs.corpus_url) {
            anyhow::bail!(
                "docs.corpus_url must be an http(s) URL, got '{}'",
                self.docs.corpus_url
            );
        }
        if self.docs.fetch_timeout_secs == 0 {
            anyhow::bail!("docs.fetch_timeout_secs must be > 0");
        }
        if self.docs.default_limit < 1 {
            anyhow::bail!("docs.default_limit must be >= 1");
        }
        Ok(())
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Parse config text without touching the environment.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    Ok(config)
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_PATH`] is
/// used when present and defaults otherwise. Environment overrides are
/// applied before validation.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            parse_config(&content)?
        }
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                let content = std::fs::read_to_string(default_path).with_context(|| {
                    format!("Failed to read config file: {}", default_path.display())
                })?;
                parse_config(&content)?
            } else {
                Config::minimal()
            }
        }
    };

    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}
