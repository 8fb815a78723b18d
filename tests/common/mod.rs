//! Shared helpers for the integration tests
//!
//! Small route modules and request helpers used across test files.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::Path;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use segment_api::{AppConfig, RouteModule, RouteSchema, RouteScope, StartupResult};
use serde_json::{json, Value};

/// `GET` returning a fixed body.
pub struct Fixed(pub &'static str);

impl RouteModule for Fixed {
    fn register(&self, scope: &mut RouteScope<'_>, _config: &AppConfig) -> StartupResult<()> {
        let body = self.0;
        scope.get(move || async move { body }, Some(RouteSchema::new().summary(body)))?;
        Ok(())
    }
}

/// `GET` and `DELETE` on a parameterized path, echoing the `id` parameter.
pub struct UserById;

impl RouteModule for UserById {
    fn register(&self, scope: &mut RouteScope<'_>, _config: &AppConfig) -> StartupResult<()> {
        scope
            .get(
                |Path(id): Path<String>| async move { axum::Json(json!({ "id": id })) },
                Some(
                    RouteSchema::new()
                        .summary("Get user")
                        .params(json!({
                            "type": "object",
                            "properties": { "id": { "type": "string" } }
                        })),
                ),
            )?
            .delete(|Path(_id): Path<String>| async move { "deleted" }, None)?;
        Ok(())
    }
}

/// `GET` whose schema is hidden from documentation.
pub struct Hidden;

impl RouteModule for Hidden {
    fn register(&self, scope: &mut RouteScope<'_>, _config: &AppConfig) -> StartupResult<()> {
        scope.get(|| async { "hidden" }, Some(RouteSchema::new().hidden()))?;
        Ok(())
    }
}

/// A module that exports nothing usable.
pub struct Failing;

impl RouteModule for Failing {
    fn register(&self, scope: &mut RouteScope<'_>, _config: &AppConfig) -> StartupResult<()> {
        Err(segment_api::StartupError::MalformedRouteModule {
            location: scope.location().to_string(),
        })
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn empty_env() -> AppConfig {
    AppConfig::resolve_from(Vec::<(String, String)>::new())
}
