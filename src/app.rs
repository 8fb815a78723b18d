//! Server instance under construction and once frozen.
//!
//! [`AppBuilder`] holds the mutable registration state: the route table being
//! built, the documentation collector, and the response layers plugins have
//! asked for. [`AppBuilder::ready`] is the readiness barrier; after it no
//! route can be added, and [`AppBuilder::freeze`] turns the builder into an
//! immutable [`App`].

use crate::autoload::table::RouteTableBuilder;
use crate::autoload::{MountPath, RouteEntry, RouteOrigin, RouteTable};
use crate::config::AppConfig;
use crate::docs::{
    DocEntry, DocsCollector, DocsPlugin, DocsSlot, DocumentationSnapshot, RouteSchema,
};
use crate::error::{StartupError, StartupResult};
use crate::middleware::{log_requests, request_id};
use crate::routes::not_found;
use axum::handler::Handler;
use axum::http::Method;
use axum::middleware::from_fn;
use axum::routing::{on, MethodFilter, MethodRouter};
use axum::Router;
use std::fmt;
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

type RouterWrap = Box<dyn FnOnce(Router) -> Router + Send>;

/// Registration state of a server that is not serving yet.
pub struct AppBuilder {
    config: Arc<AppConfig>,
    table: RouteTableBuilder,
    docs: Option<DocsCollector>,
    docs_slot: Option<DocsSlot>,
    wraps: Vec<(&'static str, RouterWrap)>,
    applied: Vec<&'static str>,
    snapshot: Option<Arc<DocumentationSnapshot>>,
    ready: bool,
}

impl AppBuilder {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            table: RouteTableBuilder::default(),
            docs: None,
            docs_slot: None,
            wraps: Vec::new(),
            applied: Vec::new(),
            snapshot: None,
            ready: false,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_arc(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Plugins applied so far, in order.
    pub fn applied(&self) -> &[&'static str] {
        &self.applied
    }

    pub(crate) fn mark_applied(&mut self, plugin: &'static str) {
        self.applied.push(plugin);
    }

    pub fn route_count(&self) -> usize {
        self.table.len()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The snapshot, once the readiness barrier has been passed.
    pub fn snapshot(&self) -> Option<&Arc<DocumentationSnapshot>> {
        self.snapshot.as_ref()
    }

    /// Routes collected for documentation so far.
    pub fn documented_count(&self) -> usize {
        self.docs.as_ref().map_or(0, DocsCollector::len)
    }

    /// Wrap the finished router. Wraps registered first end up outermost.
    pub fn wrap<F>(&mut self, plugin: &'static str, wrap: F)
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.wraps.push((plugin, Box::new(wrap)));
    }

    /// Start collecting documentation. Must happen before any route module
    /// is mounted, or those routes would be missing from the snapshot.
    pub fn install_docs(&mut self, collector: DocsCollector, slot: DocsSlot) -> StartupResult<()> {
        let mounted_modules = self
            .table
            .entries()
            .iter()
            .any(|e| matches!(e.origin, RouteOrigin::Module(_)));
        if mounted_modules || self.docs.is_some() || self.ready {
            return Err(StartupError::PluginOrder {
                plugin: DocsPlugin::NAME,
                before: "route registration",
            });
        }
        self.docs = Some(collector);
        self.docs_slot = Some(slot);
        Ok(())
    }

    /// A registration scope bound to a route module's mount path.
    pub fn scope<'a>(&'a mut self, location: &'a str, base: MountPath) -> RouteScope<'a> {
        RouteScope {
            app: self,
            location,
            base,
        }
    }

    /// Mount an endpoint owned by a plugin; it is not documented.
    pub fn mount_internal(
        &mut self,
        plugin: &'static str,
        method: Method,
        path: MountPath,
        handler: MethodRouter,
    ) -> StartupResult<()> {
        self.insert(
            RouteEntry {
                method,
                path,
                origin: RouteOrigin::Plugin(plugin),
            },
            handler,
        )
    }

    fn mount_module(
        &mut self,
        location: &str,
        method: Method,
        path: MountPath,
        handler: MethodRouter,
        schema: Option<RouteSchema>,
    ) -> StartupResult<()> {
        self.insert(
            RouteEntry {
                method: method.clone(),
                path: path.clone(),
                origin: RouteOrigin::Module(location.to_string()),
            },
            handler,
        )?;
        if let Some(docs) = self.docs.as_mut() {
            docs.collect(DocEntry {
                method,
                path,
                schema,
            });
        }
        Ok(())
    }

    fn insert(&mut self, entry: RouteEntry, handler: MethodRouter) -> StartupResult<()> {
        if self.ready {
            return Err(StartupError::RegistrationClosed {
                method: entry.method,
                path: entry.path.to_string(),
            });
        }
        self.table.insert(entry, handler)
    }

    /// The readiness barrier.
    ///
    /// The first call closes registration and materializes documentation;
    /// later calls are no-ops.
    pub fn ready(&mut self) -> StartupResult<()> {
        if self.ready {
            tracing::trace!("readiness already reached");
            return Ok(());
        }
        self.ready = true;

        if let (Some(collector), Some(slot)) = (self.docs.take(), self.docs_slot.as_ref()) {
            let snapshot = Arc::new(collector.materialize(&self.config));
            tracing::info!(
                operations = snapshot.operation_count(),
                path = %self.config.docs_path,
                "API documentation generated"
            );
            if !slot.fill(snapshot.clone()) {
                return Err(StartupError::Plugin {
                    plugin: DocsPlugin::NAME,
                    message: "documentation materialized twice".to_string(),
                });
            }
            self.snapshot = Some(snapshot);
        }
        Ok(())
    }

    /// Freeze the route table and assemble the router.
    pub fn freeze(mut self) -> StartupResult<App> {
        self.ready()?;

        let (routes, router) = self.table.finish();
        let mut router = router.fallback(not_found);

        if self.config.environment.is_development() {
            router = router
                .layer(from_fn(log_requests))
                .layer(from_fn(request_id))
                .layer(TraceLayer::new_for_http());
        }
        for (plugin, wrap) in self.wraps.into_iter().rev() {
            tracing::trace!(plugin, "applying router layer");
            router = wrap(router);
        }

        Ok(App {
            config: self.config,
            router,
            routes: Arc::new(routes),
            snapshot: self.snapshot,
        })
    }
}

/// Where a route module registers its handlers.
pub struct RouteScope<'a> {
    app: &'a mut AppBuilder,
    location: &'a str,
    base: MountPath,
}

impl fmt::Debug for RouteScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteScope")
            .field("location", &self.location)
            .field("base", &self.base.to_string())
            .finish()
    }
}

impl RouteScope<'_> {
    /// The path this module mounts at.
    pub fn path(&self) -> &MountPath {
        &self.base
    }

    pub fn location(&self) -> &str {
        self.location
    }

    /// Register `handler` for `method` at this module's path.
    pub fn route<H, T>(
        &mut self,
        method: Method,
        handler: H,
        schema: Option<RouteSchema>,
    ) -> StartupResult<&mut Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| StartupError::UnsupportedMethod(method.clone()))?;
        self.app.mount_module(
            self.location,
            method,
            self.base.clone(),
            on(filter, handler),
            schema,
        )?;
        Ok(self)
    }

    pub fn get<H, T>(&mut self, handler: H, schema: Option<RouteSchema>) -> StartupResult<&mut Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(Method::GET, handler, schema)
    }

    pub fn post<H, T>(
        &mut self,
        handler: H,
        schema: Option<RouteSchema>,
    ) -> StartupResult<&mut Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(Method::POST, handler, schema)
    }

    pub fn put<H, T>(&mut self, handler: H, schema: Option<RouteSchema>) -> StartupResult<&mut Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(Method::PUT, handler, schema)
    }

    pub fn patch<H, T>(
        &mut self,
        handler: H,
        schema: Option<RouteSchema>,
    ) -> StartupResult<&mut Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(Method::PATCH, handler, schema)
    }

    pub fn delete<H, T>(
        &mut self,
        handler: H,
        schema: Option<RouteSchema>,
    ) -> StartupResult<&mut Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(Method::DELETE, handler, schema)
    }
}

/// A fully composed server that has passed readiness.
pub struct App {
    config: Arc<AppConfig>,
    router: Router,
    routes: Arc<RouteTable>,
    snapshot: Option<Arc<DocumentationSnapshot>>,
}

impl App {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    pub fn snapshot(&self) -> Option<&Arc<DocumentationSnapshot>> {
        self.snapshot.as_ref()
    }

    /// The request service; trailing slashes are ignored when matching.
    pub fn into_service(self) -> NormalizePath<Router> {
        NormalizePathLayer::trim_trailing_slash().layer(self.router)
    }
}
