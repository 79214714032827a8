//! # coolify-mcp
//!
//! **An MCP tool server for the Coolify self-hosted PaaS.**
//!
//! Exposes the Coolify REST API as tools a language-model agent can call,
//! plus a documentation search tool backed by a lazily built, in-memory
//! full-text index of the Coolify docs.
//!
//! ## Architecture
//!
//! ```text
//!                   ┌────────────────┐
//!   MCP client ────▶│   McpBridge    │◀──── stdio / Streamable HTTP
//!                   └───────┬────────┘
//!                           ▼
//!                   ┌────────────────┐
//!                   │  ToolRegistry  │
//!                   └───┬────────┬───┘
//!                       ▼        ▼
//!              ┌────────────┐ ┌───────────┐
//!              │ DocsEngine │ │ ApiClient │──▶ Coolify /api/v1
//!              └─────┬──────┘ └───────────┘
//!                    ▼
//!     llms-full.txt ─▶ parse ─▶ index ─▶ rank ─▶ snippet
//! ```
//!
//! ## Documentation search
//!
//! The docs corpus is fetched on the first `search_docs` call, parsed into
//! page/section chunks, and indexed (see the `coolify-docs-core` crate).
//! Concurrent first calls share a single fetch; a failed fetch is retried by
//! the next call.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`docs`] | Fetch-once documentation search engine |
//! | [`api`] | Coolify REST API client |
//! | [`traits`] | `Tool` trait, built-in tools, `ToolRegistry` |
//! | [`mcp`] | MCP protocol bridge (rmcp `ServerHandler`) |
//! | [`server`] | stdio and HTTP transports |

pub mod api;
pub mod config;
pub mod docs;
pub mod mcp;
pub mod server;
pub mod traits;

pub use coolify_docs_core as docs_core;
