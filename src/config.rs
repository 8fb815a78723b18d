//! Runtime configuration
//!
//! Every field is read from one environment variable and falls back to a
//! typed default when the variable is absent, empty, or malformed. Resolution
//! never fails; a bad value only affects its own field.
//!
//! | Variable         | Field            | Default     |
//! |------------------|------------------|-------------|
//! | `NODE_ENV`       | `environment`    | production  |
//! | `LISTEN_ADDRESS` | `listen_address` | 0.0.0.0     |
//! | `LISTEN_PORT`    | `listen_port`    | 3000        |
//! | `SWAGGER_HOST`   | `docs_host`      | localhost   |
//! | `SWAGGER_PATH`   | `docs_path`      | /docs       |
//! | `SWAGGER_SCHEME` | `docs_scheme`    | http        |

use ::config::{Config, Environment as EnvSource, Map};
use std::fmt;

const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0";
const DEFAULT_LISTEN_PORT: u16 = 3000;
const DEFAULT_DOCS_HOST: &str = "localhost";
const DEFAULT_DOCS_PATH: &str = "/docs";

/// Deployment environment, taken from `NODE_ENV`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
    Other(String),
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "development" => Environment::Development,
            "production" => Environment::Production,
            _ => Environment::Other(raw.to_string()),
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Other(name) => name,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheme advertised in the generated API documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocsScheme {
    #[default]
    Http,
    Https,
}

impl DocsScheme {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "http" => Some(DocsScheme::Http),
            "https" => Some(DocsScheme::Https),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocsScheme::Http => "http",
            DocsScheme::Https => "https",
        }
    }
}

impl fmt::Display for DocsScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Deployment environment; `Development` turns on request logging
    pub environment: Environment,

    /// Host to listen on
    pub listen_address: String,

    /// Port to listen on
    pub listen_port: u16,

    /// Host advertised in the API documentation
    pub docs_host: String,

    /// Mount point of the documentation endpoints
    pub docs_path: String,

    /// Scheme advertised in the API documentation
    pub docs_scheme: DocsScheme,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            docs_host: DEFAULT_DOCS_HOST.to_string(),
            docs_path: DEFAULT_DOCS_PATH.to_string(),
            docs_scheme: DocsScheme::default(),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub fn resolve() -> Self {
        Self::from_source(EnvSource::default())
    }

    /// Resolve configuration from an explicit set of variables instead of
    /// the process environment.
    pub fn resolve_from<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_source(EnvSource::default().source(Some(map)))
    }

    fn from_source(source: EnvSource) -> Self {
        let settings = match Config::builder().add_source(source).build() {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(error = %err, "environment could not be read, using defaults");
                return Self::default();
            }
        };

        let raw = |key: &str| {
            settings
                .get_string(key)
                .or_else(|_| settings.get_string(&key.to_ascii_uppercase()))
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            environment: raw("node_env")
                .map(|v| Environment::parse(&v))
                .unwrap_or(defaults.environment),
            listen_address: raw("listen_address").unwrap_or(defaults.listen_address),
            listen_port: raw("listen_port")
                .and_then(|v| parse_port(&v))
                .unwrap_or(defaults.listen_port),
            docs_host: raw("swagger_host").unwrap_or(defaults.docs_host),
            docs_path: raw("swagger_path")
                .map(|v| normalize_docs_path(&v))
                .unwrap_or(defaults.docs_path),
            docs_scheme: raw("swagger_scheme")
                .and_then(|v| DocsScheme::parse(&v))
                .unwrap_or(defaults.docs_scheme),
        }
    }

    /// `host:port` pair the listener binds to.
    pub fn bind_target(&self) -> (&str, u16) {
        (self.listen_address.as_str(), self.listen_port)
    }
}

/// Load a `.env` file from the working directory, if one exists. Variables
/// already present in the process environment are left untouched.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env file"),
    }
}

// Zero is not a usable listen port.
fn parse_port(raw: &str) -> Option<u16> {
    raw.parse::<u16>().ok().filter(|port| *port != 0)
}

fn normalize_docs_path(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
