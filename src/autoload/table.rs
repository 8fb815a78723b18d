use super::mount::{MountPath, Segment};
use crate::error::{StartupError, StartupResult};
use axum::http::Method;
use axum::routing::MethodRouter;
use axum::Router;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Who mounted a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOrigin {
    /// A discovered route module, by location
    Module(String),
    /// An endpoint owned by a plugin, by plugin name
    Plugin(&'static str),
}

impl RouteOrigin {
    fn label(&self) -> &str {
        match self {
            RouteOrigin::Module(location) => location,
            RouteOrigin::Plugin(name) => name,
        }
    }
}

/// One mounted method + path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub method: Method,
    pub path: MountPath,
    pub origin: RouteOrigin,
}

/// The frozen route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `method` is mounted at `path` (listing syntax, `/users/:id`).
    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.entries
            .iter()
            .any(|e| &e.method == method && e.path.to_string() == path)
    }

    /// Distinct paths mounted by route modules, in listing syntax.
    pub fn module_paths(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|e| matches!(e.origin, RouteOrigin::Module(_)))
            .map(|e| e.path.to_string())
            .collect()
    }
}

/// Accumulates routes during registration, rejecting ambiguous ones.
#[derive(Default)]
pub(crate) struct RouteTableBuilder {
    entries: Vec<RouteEntry>,
    handlers: BTreeMap<MountPath, MethodRouter>,
    // Parameter name claimed after a given prefix; the router cannot hold
    // two differently-named parameters at the same position.
    params: HashMap<String, String>,
}

impl RouteTableBuilder {
    pub(crate) fn insert(&mut self, entry: RouteEntry, handler: MethodRouter) -> StartupResult<()> {
        if self
            .entries
            .iter()
            .any(|e| e.method == entry.method && e.path == entry.path)
        {
            return Err(StartupError::DuplicateRoute {
                method: entry.method,
                path: entry.path.to_string(),
                location: entry.origin.label().to_string(),
            });
        }
        self.claim_params(&entry.path)?;

        let merged = match self.handlers.remove(&entry.path) {
            Some(existing) => existing.merge(handler),
            None => handler,
        };
        self.handlers.insert(entry.path.clone(), merged);
        self.entries.push(entry);
        Ok(())
    }

    fn claim_params(&mut self, path: &MountPath) -> StartupResult<()> {
        let mut prefix = String::new();
        let mut claims = Vec::new();
        for segment in path.segments() {
            match segment {
                Segment::Static(name) => {
                    prefix.push('/');
                    prefix.push_str(name);
                }
                Segment::Param(name) => {
                    if let Some(existing) = self.params.get(&prefix) {
                        if existing != name {
                            return Err(StartupError::ConflictingParam {
                                path: path.to_string(),
                                existing: existing.clone(),
                                found: name.clone(),
                            });
                        }
                    }
                    claims.push((prefix.clone(), name.clone()));
                    prefix.push_str("/{}");
                }
            }
        }
        self.params.extend(claims);
        Ok(())
    }

    pub(crate) fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn finish(self) -> (RouteTable, Router) {
        let router = self
            .handlers
            .into_iter()
            .fold(Router::new(), |router, (path, handler)| {
                router.route(&path.router_path(), handler)
            });
        (
            RouteTable {
                entries: self.entries,
            },
            router,
        )
    }
}
