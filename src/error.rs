use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

pub type StartupResult<T> = Result<T, StartupError>;

/// Fatal errors raised while composing or binding the server.
///
/// None of these are recovered in-process: the bootstrap aborts and the
/// error reaches `main`.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Invalid listen address {address}:{port}")]
    InvalidAddress {
        address: String,
        port: u16,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Route discovery failed at {}: {source}", path.display())]
    RouteDiscovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Route module `{location}` does not export a registration function")]
    MalformedRouteModule { location: String },

    #[error("Invalid path segment `{segment}` in `{location}`")]
    InvalidPathSegment { location: String, segment: String },

    #[error("Duplicate route {method} {path} declared by `{location}`")]
    DuplicateRoute {
        method: Method,
        path: String,
        location: String,
    },

    #[error("Route {path} names parameter `{found}` where `{existing}` is already mounted")]
    ConflictingParam {
        path: String,
        existing: String,
        found: String,
    },

    #[error("Unsupported route method {0}")]
    UnsupportedMethod(Method),

    #[error("Plugin `{plugin}` must be registered before `{before}`")]
    PluginOrder {
        plugin: &'static str,
        before: &'static str,
    },

    #[error("Cannot register {method} {path} after the server is ready")]
    RegistrationClosed { method: Method, path: String },

    #[error("Plugin `{plugin}` failed: {message}")]
    Plugin {
        plugin: &'static str,
        message: String,
    },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors answered over HTTP by the core and available to route modules.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Route {method}:{path} not found")]
    NotFound { method: Method, path: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("API documentation is not available yet")]
    DocsNotReady,

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DocsNotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::DocsNotReady => "DOCS_NOT_READY",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("JSON parse error: {err}"))
    }
}

impl From<serde_yaml::Error> for ApiError {
    fn from(err: serde_yaml::Error) -> Self {
        ApiError::Internal(format!("YAML render error: {err}"))
    }
}
