//! Segment API Server - HTTP bootstrap for the Twilio Segment Calculator API
//!
//! This crate composes the HTTP server: it resolves configuration from the
//! environment, applies a fixed chain of plugins, discovers route modules,
//! and generates Swagger documentation once every route is known.
//!
//! # Bootstrap
//!
//! - **Configuration**: environment variables over built-in defaults, never failing
//! - **CORS**: origin mirrored, credentials allowed, on every response
//! - **Documentation**: Swagger 2.0, materialized at readiness
//! - **Route discovery**: directory layout mapped to URL paths
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use segment_api::{routes, AppConfig, PluginChain};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::resolve();
//!     let chain = PluginChain::standard(routes::builtin());
//!     let handle = segment_api::create_server(config, chain).await?;
//!     handle.run_until(segment_api::server::shutdown_signal()).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /docs` - Documentation (HTML or JSON by `Accept`)
//! - `GET /docs/json`, `GET /docs/yaml` - Swagger document

pub mod app;
pub mod autoload;
pub mod config;
pub mod cors;
pub mod docs;
pub mod error;
pub mod middleware;
pub mod plugin;
pub mod routes;
pub mod server;
pub mod telemetry;

pub use app::{App, AppBuilder, RouteScope};
pub use autoload::{
    FsRouteSource, MountPath, RouteCatalog, RouteModule, RouteSource, StaticRouteSource,
};
pub use config::{AppConfig, DocsScheme, Environment};
pub use docs::{DocumentationSnapshot, RouteSchema};
pub use error::{ApiError, ApiResult, StartupError, StartupResult};
pub use plugin::{Plugin, PluginChain};
pub use server::{build_app, create_server, ServerHandle};
