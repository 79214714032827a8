#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;

pub const SITE: &str = "https://coolify.io/docs";

/// Three-page corpus: installation, docker compose, 502 troubleshooting.
pub const CORPUS: &str = "---
url: /get-started/installation.md
description: >-
  Install Coolify on your own server with a single command.
---

# Installation

Coolify runs on any Linux server. Run the quick installation script as root
and open the dashboard on port 8000 once it finishes.

## Requirements

A server with at least 2 CPUs, 2 GB of memory and 30 GB of free disk space.

## Uninstall

Stop the containers and remove the /data/coolify directory to uninstall.

---

---
url: /knowledge-base/docker/compose.md
description: >-
  Deploy any Docker Compose file as a single Coolify resource.
---

# Docker Compose

Coolify reads your docker-compose.yml and deploys every service defined in it.

## Environment Variables

Environment variables declared in the compose file are detected and can be
edited in the Coolify UI. Shared variables can be referenced with the
SERVICE_ prefix syntax.

## Storage

Named volumes from the compose file are persisted across deployments.

---

---
url: /troubleshoot/applications/bad-gateway.md
description: >-
  Fix 502 Bad Gateway errors from the proxy.
---

# 502 Bad Gateway

The proxy answers with a 502 error when it cannot reach your application.

## Wrong Port

Make sure the exposed port matches the port your application listens on.
";

/// Serve `app` on an ephemeral localhost port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
