//! Ordered server initializers
//!
//! A [`PluginChain`] is applied to the [`AppBuilder`] one step at a time, in
//! the order it was built, before the readiness barrier. Each step either
//! completes or aborts the whole bootstrap.

use crate::app::AppBuilder;
use crate::autoload::{AutoloadPlugin, RouteSource};
use crate::cors::CorsPlugin;
use crate::docs::DocsPlugin;
use crate::error::StartupResult;
use async_trait::async_trait;

/// A cross-cutting initializer applied to the server before it serves.
#[async_trait]
pub trait Plugin: Send {
    fn name(&self) -> &'static str;

    async fn register(self: Box<Self>, app: &mut AppBuilder) -> StartupResult<()>;
}

/// An explicit, ordered list of plugins.
#[derive(Default)]
pub struct PluginChain {
    steps: Vec<Box<dyn Plugin>>,
}

impl PluginChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The production order: cross-origin policy, documentation, routes.
    ///
    /// CORS comes first so its layer wraps every response, including errors;
    /// documentation comes before routes so it sees each route's schema.
    pub fn standard(routes: impl RouteSource) -> Self {
        Self::new()
            .with(CorsPlugin::default())
            .with(DocsPlugin::default())
            .with(AutoloadPlugin::new(routes))
    }

    pub fn with(mut self, plugin: impl Plugin + 'static) -> Self {
        self.steps.push(Box::new(plugin));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply every step in order; the first failure stops the chain.
    pub(crate) async fn apply(self, app: &mut AppBuilder) -> StartupResult<()> {
        for plugin in self.steps {
            let name = plugin.name();
            tracing::debug!(plugin = name, "registering plugin");
            if let Err(err) = plugin.register(app).await {
                tracing::error!(plugin = name, error = %err, "plugin registration failed");
                return Err(err);
            }
            app.mark_applied(name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoload::StaticRouteSource;

    #[test]
    fn test_standard_order() {
        let chain = PluginChain::standard(StaticRouteSource::new());
        assert_eq!(chain.names(), vec!["cors", "docs", "autoload"]);
    }
}
