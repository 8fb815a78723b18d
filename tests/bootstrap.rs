//! Composition tests for the server factory
//!
//! These drive the composed router in-process with `oneshot`; no socket is
//! bound.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{body_bytes, body_json, empty_env, get, Failing, Fixed, Hidden, UserById};
use segment_api::autoload::AutoloadPlugin;
use segment_api::cors::CorsPlugin;
use segment_api::docs::DocsPlugin;
use segment_api::routes;
use segment_api::{
    build_app, AppBuilder, AppConfig, DocsScheme, MountPath, Plugin, PluginChain, StartupError,
    StaticRouteSource,
};
use std::sync::Arc;
use tower::ServiceExt;

fn sample_routes() -> StaticRouteSource {
    StaticRouteSource::new()
        .route("health", Fixed("ok"))
        .route("users/[id]", UserById)
}

#[tokio::test]
async fn test_docs_reflect_config_defaults() {
    let app = build_app(empty_env(), PluginChain::standard(routes::builtin()))
        .await
        .unwrap();

    let response = app.into_service().oneshot(get("/docs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let doc = body_json(response).await;
    assert_eq!(doc["host"], "localhost");
    assert_eq!(doc["schemes"], serde_json::json!(["http"]));
    assert_eq!(doc["swagger"], "2.0");
    assert_eq!(doc["info"]["title"], "Twilio Segment Calculator API");
    assert!(doc["paths"]["/health"]["get"].is_object());
}

#[tokio::test]
async fn test_docs_host_is_not_the_bind_address() {
    let config = AppConfig::resolve_from([
        ("LISTEN_ADDRESS", "127.0.0.1"),
        ("LISTEN_PORT", "4500"),
        ("SWAGGER_HOST", "api.example.com"),
        ("SWAGGER_SCHEME", "https"),
        ("SWAGGER_PATH", "/reference"),
    ]);
    assert_eq!(config.docs_scheme, DocsScheme::Https);

    let app = build_app(config, PluginChain::standard(sample_routes()))
        .await
        .unwrap();
    let response = app
        .into_service()
        .oneshot(get("/reference/json"))
        .await
        .unwrap();

    let doc = body_json(response).await;
    assert_eq!(doc["host"], "api.example.com");
    assert_eq!(doc["schemes"], serde_json::json!(["https"]));
}

#[tokio::test]
async fn test_docs_yaml_and_html_views() {
    let app = build_app(empty_env(), PluginChain::standard(sample_routes()))
        .await
        .unwrap();
    let service = app.into_service();

    let yaml = service.clone().oneshot(get("/docs/yaml")).await.unwrap();
    assert_eq!(yaml.status(), StatusCode::OK);
    assert_eq!(yaml.headers()[header::CONTENT_TYPE], "application/x-yaml");
    let text = String::from_utf8(body_bytes(yaml).await).unwrap();
    assert!(text.contains("host: localhost"));

    let html_request = Request::builder()
        .uri("/docs")
        .header(header::ACCEPT, "text/html")
        .body(Body::empty())
        .unwrap();
    let html = service.oneshot(html_request).await.unwrap();
    assert_eq!(html.status(), StatusCode::OK);
    let page = String::from_utf8(body_bytes(html).await).unwrap();
    assert!(page.contains("swagger-ui"));
    assert!(page.contains("/docs/json"));
}

#[tokio::test]
async fn test_snapshot_has_one_entry_per_route() {
    let source = sample_routes().route("internal", Hidden);
    let app = build_app(empty_env(), PluginChain::standard(source))
        .await
        .unwrap();

    let snapshot = app.snapshot().unwrap();
    // health GET, users/:id GET + DELETE; the hidden route and docs endpoints are left out
    assert_eq!(snapshot.operation_count(), 3);
    assert!(snapshot.operation("/users/{id}", &Method::DELETE).is_some());
    assert!(snapshot.paths.get("/internal").is_none());
    assert!(snapshot.paths.get("/docs").is_none());

    // Hidden from docs, still served
    let response = app.into_service().oneshot(get("/internal")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_module_paths_exclude_plugin_endpoints() {
    let app = build_app(empty_env(), PluginChain::standard(sample_routes()))
        .await
        .unwrap();

    let paths: Vec<String> = app.routes().module_paths().into_iter().collect();
    assert_eq!(paths, vec!["/health".to_string(), "/users/:id".to_string()]);
    assert!(app.routes().contains(&Method::GET, "/docs/json"));
}

#[tokio::test]
async fn test_param_route_and_trailing_slash() {
    let app = build_app(empty_env(), PluginChain::standard(sample_routes()))
        .await
        .unwrap();
    let service = app.into_service();

    let user = service.clone().oneshot(get("/users/42")).await.unwrap();
    assert_eq!(user.status(), StatusCode::OK);
    assert_eq!(body_json(user).await["id"], "42");

    let slash = service.oneshot(get("/health/")).await.unwrap();
    assert_eq!(slash.status(), StatusCode::OK);
    assert_eq!(body_bytes(slash).await, b"ok");
}

#[tokio::test]
async fn test_duplicate_route_fails_before_readiness() {
    let source = StaticRouteSource::new()
        .route("users", Fixed("a"))
        .route("users/index", Fixed("b"));

    let mut builder = AppBuilder::new(Arc::new(empty_env()));
    Box::new(DocsPlugin::default())
        .register(&mut builder)
        .await
        .unwrap();
    let err = Box::new(AutoloadPlugin::new(source))
        .register(&mut builder)
        .await
        .unwrap_err();

    assert!(matches!(err, StartupError::DuplicateRoute { ref path, .. } if path == "/users"));
    assert!(!builder.is_ready());
    assert!(builder.snapshot().is_none());

    let via_factory = build_app(
        empty_env(),
        PluginChain::standard(
            StaticRouteSource::new()
                .route("users", Fixed("a"))
                .route("users/index", Fixed("b")),
        ),
    )
    .await;
    assert!(matches!(via_factory, Err(StartupError::DuplicateRoute { .. })));
}

#[tokio::test]
async fn test_failing_module_aborts_the_chain() {
    let source = sample_routes().route("broken", Failing);
    let result = build_app(empty_env(), PluginChain::standard(source)).await;
    assert!(matches!(
        result,
        Err(StartupError::MalformedRouteModule { ref location }) if location == "broken"
    ));
}

#[tokio::test]
async fn test_snapshot_empty_until_ready_then_materialized_once() {
    let mut builder = AppBuilder::new(Arc::new(empty_env()));
    Box::new(DocsPlugin::default())
        .register(&mut builder)
        .await
        .unwrap();
    Box::new(AutoloadPlugin::new(sample_routes()))
        .register(&mut builder)
        .await
        .unwrap();

    assert_eq!(builder.documented_count(), 3);
    assert!(builder.snapshot().is_none());

    builder.ready().unwrap();
    let first = builder.snapshot().cloned().unwrap();
    assert_eq!(first.operation_count(), 3);

    // A second readiness signal does not rebuild the snapshot
    builder.ready().unwrap();
    let second = builder.snapshot().cloned().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let app = builder.freeze().unwrap();
    assert!(Arc::ptr_eq(app.snapshot().unwrap(), &first));
}

#[tokio::test]
async fn test_registration_closed_after_ready() {
    let mut builder = AppBuilder::new(Arc::new(empty_env()));
    builder.ready().unwrap();

    let mut scope = builder.scope("late", MountPath::from_key("late").unwrap());
    let err = scope.get(|| async { "late" }, None).unwrap_err();
    assert!(matches!(err, StartupError::RegistrationClosed { .. }));
}

#[tokio::test]
async fn test_docs_after_routes_is_rejected() {
    let chain = PluginChain::new()
        .with(CorsPlugin::default())
        .with(AutoloadPlugin::new(sample_routes()))
        .with(DocsPlugin::default());
    let result = build_app(empty_env(), chain).await;
    assert!(matches!(result, Err(StartupError::PluginOrder { plugin: "docs", .. })));
}

#[tokio::test]
async fn test_preflight_mirrors_origin_with_credentials() {
    let app = build_app(empty_env(), PluginChain::standard(sample_routes()))
        .await
        .unwrap();

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/users/7")
        .header(header::ORIGIN, "https://client.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.into_service().oneshot(preflight).await.unwrap();

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://client.example"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type");
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    assert!(methods.contains("DELETE"));
}

#[tokio::test]
async fn test_error_responses_carry_cors_headers() {
    let app = build_app(empty_env(), PluginChain::standard(sample_routes()))
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/missing")
        .header(header::ORIGIN, "https://client.example")
        .body(Body::empty())
        .unwrap();
    let response = app.into_service().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://client.example"
    );
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_builtin_routes() {
    let app = build_app(empty_env(), PluginChain::standard(routes::builtin()))
        .await
        .unwrap();
    let service = app.into_service();

    let info = body_json(service.clone().oneshot(get("/")).await.unwrap()).await;
    assert_eq!(info["docs"], "/docs");

    let health = body_json(service.oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_docs_at_root_collides_with_index_module() {
    let config = AppConfig::resolve_from([("SWAGGER_PATH", "/")]);
    let result = build_app(config, PluginChain::standard(routes::builtin())).await;
    assert!(matches!(
        result,
        Err(StartupError::DuplicateRoute { ref path, ref location, .. })
            if path == "/" && location == "index"
    ));
}
