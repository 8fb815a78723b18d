//! Route discovery
//!
//! Maps a directory tree of route modules onto a URL namespace without a
//! hand-written route list:
//!
//! - each directory and file stem becomes a path segment;
//! - `[name]` becomes the path parameter `name`;
//! - an `index` file mounts at its parent's path.
//!
//! Discovery feeds the [`AutoloadPlugin`], which registers every module with
//! the server before the readiness barrier.

pub mod mount;
pub mod source;
pub mod table;

pub use mount::{MountPath, Segment};
pub use source::{
    DiscoveredRoute, Discovery, FsRouteSource, RouteCatalog, RouteModule, RouteSource,
    StaticRouteSource,
};
pub use table::{RouteEntry, RouteOrigin, RouteTable};

use crate::app::AppBuilder;
use crate::error::{StartupError, StartupResult};
use crate::plugin::Plugin;
use async_trait::async_trait;

/// Registers every module a [`RouteSource`] yields.
pub struct AutoloadPlugin {
    source: Box<dyn RouteSource>,
}

impl AutoloadPlugin {
    pub const NAME: &'static str = "autoload";

    pub fn new(source: impl RouteSource) -> Self {
        Self {
            source: Box::new(source),
        }
    }
}

#[async_trait]
impl Plugin for AutoloadPlugin {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn register(self: Box<Self>, app: &mut AppBuilder) -> StartupResult<()> {
        let source = self.source;
        // The walk may touch the filesystem; keep it off the async workers.
        let discovered = tokio::task::spawn_blocking(move || {
            source.discover().collect::<StartupResult<Vec<_>>>()
        })
        .await
        .map_err(|err| StartupError::Plugin {
            plugin: AutoloadPlugin::NAME,
            message: err.to_string(),
        })??;

        let config = app.config_arc();
        for route in discovered {
            let before = app.route_count();
            let mut scope = app.scope(&route.location, route.mount.clone());
            route.module.register(&mut scope, &config)?;

            let added = app.route_count() - before;
            if added == 0 {
                tracing::warn!(location = %route.location, "route module registered no handlers");
            }
            tracing::debug!(
                location = %route.location,
                path = %route.mount,
                handlers = added,
                "mounted route module"
            );
        }
        Ok(())
    }
}
