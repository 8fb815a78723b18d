//! Directory-driven route discovery through the full plugin chain

mod common;

use common::{body_json, empty_env, get, Fixed, UserById};
use segment_api::{build_app, FsRouteSource, PluginChain, RouteCatalog, StartupError};
use std::fs;
use std::path::Path;
use tower::ServiceExt;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "").unwrap();
}

fn catalog() -> RouteCatalog {
    RouteCatalog::new()
        .with("health", Fixed("ok"))
        .with("users/[id]", UserById)
        .with("users/index", Fixed("all users"))
}

#[tokio::test]
async fn test_directory_tree_becomes_route_table() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "health.route");
    touch(dir.path(), "users/[id].route");

    let source = FsRouteSource::new(dir.path(), catalog());
    let app = build_app(empty_env(), PluginChain::standard(source))
        .await
        .unwrap();

    let paths: Vec<String> = app.routes().module_paths().into_iter().collect();
    assert_eq!(paths, vec!["/health".to_string(), "/users/:id".to_string()]);

    let snapshot = app.snapshot().unwrap();
    assert!(snapshot.paths.contains_key("/users/{id}"));

    let response = app.into_service().oneshot(get("/users/abc")).await.unwrap();
    assert_eq!(body_json(response).await["id"], "abc");
}

#[tokio::test]
async fn test_index_mounts_at_parent() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "users/index.route");
    touch(dir.path(), "users/[id].route");

    let source = FsRouteSource::new(dir.path(), catalog());
    let app = build_app(empty_env(), PluginChain::standard(source))
        .await
        .unwrap();

    let paths: Vec<String> = app.routes().module_paths().into_iter().collect();
    assert_eq!(paths, vec!["/users".to_string(), "/users/:id".to_string()]);
}

#[tokio::test]
async fn test_hidden_entries_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "health.route");
    touch(dir.path(), ".cache/stale.route");
    touch(dir.path(), ".gitkeep");

    let source = FsRouteSource::new(dir.path(), catalog());
    let app = build_app(empty_env(), PluginChain::standard(source))
        .await
        .unwrap();
    assert_eq!(app.routes().module_paths().len(), 1);
}

#[tokio::test]
async fn test_file_without_module_aborts_startup() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "health.route");
    touch(dir.path(), "orphan.route");

    let source = FsRouteSource::new(dir.path(), catalog());
    let result = build_app(empty_env(), PluginChain::standard(source)).await;
    assert!(matches!(
        result,
        Err(StartupError::MalformedRouteModule { ref location }) if location == "orphan.route"
    ));
}

#[tokio::test]
async fn test_missing_root_is_a_discovery_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = FsRouteSource::new(dir.path().join("nope"), catalog());
    let result = build_app(empty_env(), PluginChain::standard(source)).await;
    assert!(matches!(result, Err(StartupError::RouteDiscovery { .. })));
}
