//! API documentation generator
//!
//! [`DocsPlugin`] installs a [`DocsCollector`] before routes are registered
//! and mounts the documentation endpoints under the configured docs path:
//!
//! - `GET {docs}` - browsable view for browsers, JSON otherwise
//! - `GET {docs}/json` - Swagger 2.0 document
//! - `GET {docs}/yaml` - the same document as YAML
//!
//! The snapshot behind them is materialized once, at readiness. Until then
//! the endpoints answer `503`.

pub mod schema;
pub mod snapshot;

pub use schema::RouteSchema;
pub use snapshot::{
    DocEntry, DocsCollector, DocsInfo, DocumentationSnapshot, ExternalDocs, Operation, Parameter,
    ResponseDoc,
};

use crate::app::AppBuilder;
use crate::autoload::MountPath;
use crate::error::{ApiError, ApiResult, StartupResult};
use crate::plugin::Plugin;
use async_trait::async_trait;
use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, Method};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Json;
use std::sync::{Arc, OnceLock};

/// Write-once holder for the materialized snapshot.
#[derive(Debug, Clone, Default)]
pub struct DocsSlot(Arc<OnceLock<Arc<DocumentationSnapshot>>>);

impl DocsSlot {
    pub fn get(&self) -> Option<Arc<DocumentationSnapshot>> {
        self.0.get().cloned()
    }

    /// Store the snapshot; returns `false` if one was already stored.
    pub(crate) fn fill(&self, snapshot: Arc<DocumentationSnapshot>) -> bool {
        self.0.set(snapshot).is_ok()
    }
}

/// Documentation generator plugin.
#[derive(Debug, Default)]
pub struct DocsPlugin {
    info: DocsInfo,
}

impl DocsPlugin {
    pub const NAME: &'static str = "docs";

    pub fn new(info: DocsInfo) -> Self {
        Self { info }
    }
}

#[derive(Clone)]
struct DocsState {
    slot: DocsSlot,
    title: Arc<str>,
    json_url: Arc<str>,
}

#[async_trait]
impl Plugin for DocsPlugin {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn register(self: Box<Self>, app: &mut AppBuilder) -> StartupResult<()> {
        let base = MountPath::parse_url(&app.config().docs_path)?;
        let json_path = base.child("json");
        let yaml_path = base.child("yaml");

        let state = DocsState {
            slot: DocsSlot::default(),
            title: Arc::from(self.info.title.as_str()),
            json_url: Arc::from(json_path.to_string()),
        };
        app.install_docs(DocsCollector::new(self.info), state.slot.clone())?;

        app.mount_internal(
            DocsPlugin::NAME,
            Method::GET,
            base.clone(),
            get(docs_index).with_state(state.clone()),
        )?;
        app.mount_internal(
            DocsPlugin::NAME,
            Method::GET,
            json_path,
            get(docs_json).with_state(state.clone()),
        )?;
        app.mount_internal(
            DocsPlugin::NAME,
            Method::GET,
            yaml_path,
            get(docs_yaml).with_state(state),
        )?;

        tracing::debug!(path = %base, "documentation endpoints mounted");
        Ok(())
    }
}

impl DocsState {
    fn snapshot(&self) -> ApiResult<Arc<DocumentationSnapshot>> {
        self.slot.get().ok_or(ApiError::DocsNotReady)
    }
}

async fn docs_index(State(state): State<DocsState>, headers: HeaderMap) -> ApiResult<Response> {
    let snapshot = state.snapshot()?;
    if wants_html(&headers) {
        return Ok(Html(render_ui(&state.title, &state.json_url)).into_response());
    }
    Ok(Json(snapshot.as_ref()).into_response())
}

async fn docs_json(State(state): State<DocsState>) -> ApiResult<Response> {
    let snapshot = state.snapshot()?;
    Ok(Json(snapshot.as_ref()).into_response())
}

async fn docs_yaml(State(state): State<DocsState>) -> ApiResult<Response> {
    let yaml = state.snapshot()?.to_yaml()?;
    Ok(([(CONTENT_TYPE, "application/x-yaml")], yaml).into_response())
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

fn render_ui(title: &str, json_url: &str) -> String {
    let title = escape_html(title);
    let json_url = escape_html(json_url);
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = function () {{
      window.ui = SwaggerUIBundle({{ url: "{json_url}", dom_id: "#swagger-ui" }});
    }};
  </script>
</body>
</html>
"##
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
