//! Where route modules come from.
//!
//! A [`RouteSource`] yields every route module exactly once together with the
//! location it was found at. [`FsRouteSource`] walks a `routes` directory and
//! resolves each file against a [`RouteCatalog`] of compiled-in modules;
//! [`StaticRouteSource`] is the same table written out at build time.

use super::mount::MountPath;
use crate::app::RouteScope;
use crate::config::AppConfig;
use crate::error::{StartupError, StartupResult};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::{DirEntry, WalkDir};

/// A unit of business logic mounted at a location-derived path.
pub trait RouteModule: Send + Sync + 'static {
    /// Register this module's handlers. `scope` is already bound to the
    /// module's mount path.
    fn register(&self, scope: &mut RouteScope<'_>, config: &AppConfig) -> StartupResult<()>;
}

/// A route module paired with where it was found.
#[derive(Clone)]
pub struct DiscoveredRoute {
    /// Catalog key, e.g. `users/[id]`
    pub location: String,
    pub mount: MountPath,
    pub module: Arc<dyn RouteModule>,
}

impl fmt::Debug for DiscoveredRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveredRoute")
            .field("location", &self.location)
            .field("mount", &self.mount.to_string())
            .finish()
    }
}

pub type Discovery = Box<dyn Iterator<Item = StartupResult<DiscoveredRoute>> + Send>;

/// A one-shot supplier of route modules.
pub trait RouteSource: Send + 'static {
    /// Consume the source, yielding each route module once.
    fn discover(self: Box<Self>) -> Discovery;
}

/// Compiled-in route modules, keyed by location without extension.
#[derive(Clone, Default)]
pub struct RouteCatalog {
    modules: HashMap<String, Arc<dyn RouteModule>>,
}

impl RouteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, module: impl RouteModule) -> Self {
        self.modules.insert(key.into(), Arc::new(module));
        self
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn RouteModule>> {
        self.modules.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Walks a directory tree; every file below `root` must name a catalog entry.
pub struct FsRouteSource {
    root: PathBuf,
    catalog: RouteCatalog,
}

impl FsRouteSource {
    pub fn new(root: impl Into<PathBuf>, catalog: RouteCatalog) -> Self {
        Self {
            root: root.into(),
            catalog,
        }
    }
}

impl RouteSource for FsRouteSource {
    fn discover(self: Box<Self>) -> Discovery {
        let FsRouteSource { root, catalog } = *self;
        let walk = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        Box::new(walk.filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_file() => {
                Some(resolve_file(&root, &entry, &catalog))
            }
            Ok(_) => None,
            Err(err) => {
                let path = err.path().unwrap_or(&root).to_path_buf();
                Some(Err(StartupError::RouteDiscovery {
                    path,
                    source: err.into(),
                }))
            }
        }))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

fn resolve_file(
    root: &Path,
    entry: &DirEntry,
    catalog: &RouteCatalog,
) -> StartupResult<DiscoveredRoute> {
    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    let shown = relative.display().to_string();

    let mut parts = Vec::new();
    for component in relative.components() {
        let name = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| StartupError::InvalidPathSegment {
                location: shown.clone(),
                segment: component.as_os_str().to_string_lossy().into_owned(),
            })?;
        parts.push(name.to_string());
    }

    let stem = relative
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| StartupError::InvalidPathSegment {
            location: shown.clone(),
            segment: shown.clone(),
        })?
        .to_string();
    parts.pop();

    let location = if parts.is_empty() {
        stem.clone()
    } else {
        format!("{}/{stem}", parts.join("/"))
    };
    let mount = MountPath::from_parts(&parts, &stem, &location)?;
    let module = catalog
        .get(&location)
        .ok_or_else(|| StartupError::MalformedRouteModule {
            location: shown.clone(),
        })?;

    tracing::debug!(file = %shown, path = %mount, "discovered route module");
    Ok(DiscoveredRoute {
        location,
        mount,
        module,
    })
}

/// A route table listed at build time; keys follow the directory convention.
#[derive(Default)]
pub struct StaticRouteSource {
    entries: Vec<(String, Arc<dyn RouteModule>)>,
}

impl StaticRouteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, key: impl Into<String>, module: impl RouteModule) -> Self {
        self.entries.push((key.into(), Arc::new(module)));
        self
    }
}

impl RouteSource for StaticRouteSource {
    fn discover(self: Box<Self>) -> Discovery {
        Box::new(self.entries.into_iter().map(|(location, module)| {
            let mount = MountPath::from_key(&location)?;
            Ok(DiscoveredRoute {
                location,
                mount,
                module,
            })
        }))
    }
}

impl From<RouteCatalog> for StaticRouteSource {
    fn from(catalog: RouteCatalog) -> Self {
        let mut entries: Vec<_> = catalog.modules.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }
}
