use crate::app::RouteScope;
use crate::autoload::RouteModule;
use crate::config::AppConfig;
use crate::docs::RouteSchema;
use crate::error::StartupResult;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

/// Liveness probe at `/health`.
pub struct Health;

impl RouteModule for Health {
    fn register(&self, scope: &mut RouteScope<'_>, _config: &AppConfig) -> StartupResult<()> {
        once_cell::sync::Lazy::force(&SERVER_START_TIME);

        let schema = RouteSchema::new()
            .summary("Liveness probe")
            .tag("meta")
            .response(
                200,
                json!({
                    "type": "object",
                    "description": "Server is running",
                    "properties": {
                        "status": { "type": "string" },
                        "timestamp": { "type": "string", "format": "date-time" },
                        "uptime_seconds": { "type": "integer" }
                    }
                }),
            );
        scope.get(health_check, Some(schema))?;
        Ok(())
    }
}

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check() -> impl IntoResponse {
    let uptime = SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
    }))
}
