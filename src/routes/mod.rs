//! Built-in route modules
//!
//! These are ordinary route modules, registered through the same discovery
//! path as any other:
//!
//! - `index` - `GET /`, API information
//! - `health` - `GET /health`, liveness probe

pub mod health;

use crate::app::RouteScope;
use crate::autoload::{RouteModule, StaticRouteSource};
use crate::config::AppConfig;
use crate::docs::RouteSchema;
use crate::error::{ApiError, StartupResult};
use axum::http::{Method, Uri};
use axum::Json;
use serde_json::json;

/// The route table compiled into the binary.
pub fn builtin() -> StaticRouteSource {
    StaticRouteSource::new()
        .route("index", ApiInfo)
        .route("health", health::Health)
}

/// API version and base info
pub struct ApiInfo;

impl RouteModule for ApiInfo {
    fn register(&self, scope: &mut RouteScope<'_>, config: &AppConfig) -> StartupResult<()> {
        let docs = config.docs_path.clone();
        let schema = RouteSchema::new()
            .summary("API information")
            .tag("meta")
            .response(
                200,
                json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "version": { "type": "string" },
                        "docs": { "type": "string" }
                    }
                }),
            );
        scope.get(
            move || async move {
                Json(json!({
                    "name": "Twilio Segment Calculator API",
                    "version": env!("CARGO_PKG_VERSION"),
                    "docs": docs,
                }))
            },
            Some(schema),
        )?;
        Ok(())
    }
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound {
        method,
        path: uri.path().to_string(),
    }
}
