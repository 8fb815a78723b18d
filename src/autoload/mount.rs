//! Mapping from route-module locations to URL paths.

use crate::error::{StartupError, StartupResult};
use std::fmt;

/// File stem that mounts at its parent directory's path.
const INDEX_STEM: &str = "index";

/// One URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Static(String),
    Param(String),
}

impl Segment {
    /// Parse a file-system segment: `[name]` marks a path parameter.
    pub fn parse(raw: &str, location: &str) -> StartupResult<Self> {
        let invalid = || StartupError::InvalidPathSegment {
            location: location.to_string(),
            segment: raw.to_string(),
        };

        if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let valid = !inner.is_empty()
                && inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            return if valid {
                Ok(Segment::Param(inner.to_string()))
            } else {
                Err(invalid())
            };
        }

        if raw.is_empty()
            || raw == "."
            || raw == ".."
            || raw.starts_with(':')
            || raw.starts_with('*')
            || raw.contains(['[', ']', '{', '}', '/', '?', '#'])
        {
            return Err(invalid());
        }
        Ok(Segment::Static(raw.to_string()))
    }
}

/// A URL path pattern derived from a route module's location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MountPath {
    segments: Vec<Segment>,
}

impl MountPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Derive a mount path from directory segments plus a file stem.
    ///
    /// An `index` stem contributes no segment, so `users/index` mounts at
    /// `/users`.
    pub fn from_parts<I, S>(dirs: I, stem: &str, location: &str) -> StartupResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut segments = dirs
            .into_iter()
            .map(|dir| Segment::parse(dir.as_ref(), location))
            .collect::<StartupResult<Vec<_>>>()?;
        if stem != INDEX_STEM {
            segments.push(Segment::parse(stem, location)?);
        }
        Ok(Self { segments })
    }

    /// Derive a mount path from a catalog key such as `users/[id]`.
    pub fn from_key(key: &str) -> StartupResult<Self> {
        let mut parts: Vec<&str> = key.split('/').collect();
        let stem = parts.pop().unwrap_or_default();
        Self::from_parts(parts, stem, key)
    }

    /// Parse a literal URL path (no parameters), e.g. a configured docs path.
    pub fn parse_url(path: &str) -> StartupResult<Self> {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|raw| match Segment::parse(raw, path)? {
                Segment::Param(_) => Err(StartupError::InvalidPathSegment {
                    location: path.to_string(),
                    segment: raw.to_string(),
                }),
                segment => Ok(segment),
            })
            .collect::<StartupResult<Vec<_>>>()?;
        Ok(Self { segments })
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Static(name.to_string()));
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    /// Path in router / Swagger syntax: `/users/{id}`.
    pub fn router_path(&self) -> String {
        self.render(|name| format!("{{{name}}}"))
    }

    fn render(&self, param: impl Fn(&str) -> String) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Static(name) => format!("/{name}"),
                Segment::Param(name) => format!("/{}", param(name)),
            })
            .collect()
    }
}

/// Listing syntax: `/users/:id`.
impl fmt::Display for MountPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(|name| format!(":{name}")))
    }
}
