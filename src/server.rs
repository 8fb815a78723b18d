//! Server factory
//!
//! Composition happens in a fixed sequence:
//! 1. Create the builder around the resolved configuration
//! 2. Apply the plugin chain in order (CORS, docs, route discovery)
//! 3. Pass the readiness barrier, which materializes documentation once
//! 4. Freeze the route table and router
//! 5. Bind the listener and start serving
//!
//! Any failure before step 5 aborts the sequence; nothing is bound yet, and
//! whatever was built so far is dropped with the builder.

use crate::app::{App, AppBuilder};
use crate::autoload::RouteTable;
use crate::config::AppConfig;
use crate::docs::DocumentationSnapshot;
use crate::error::{StartupError, StartupResult};
use crate::plugin::PluginChain;
use axum::extract::Request;
use axum::ServiceExt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};

/// Compose the server without binding a socket.
pub async fn build_app(config: AppConfig, chain: PluginChain) -> StartupResult<App> {
    let mut builder = AppBuilder::new(Arc::new(config));
    chain.apply(&mut builder).await?;
    builder.ready()?;

    tracing::debug!(
        plugins = ?builder.applied(),
        routes = builder.route_count(),
        "server ready"
    );
    builder.freeze()
}

/// Compose the server, bind its listener, and start serving.
///
/// # Errors
///
/// Fails if a plugin fails, if route discovery meets an invalid or
/// duplicate route module, or if the listener cannot bind. All of these
/// are fatal.
///
/// # Example
///
/// ```rust,no_run
/// use segment_api::{create_server, routes, AppConfig, PluginChain};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = AppConfig::resolve();
///     let handle = create_server(config, PluginChain::standard(routes::builtin())).await?;
///     handle.run_until(segment_api::server::shutdown_signal()).await?;
///     Ok(())
/// }
/// ```
pub async fn create_server(config: AppConfig, chain: PluginChain) -> StartupResult<ServerHandle> {
    let app = build_app(config, chain).await?;

    let addr = resolve_bind_addr(app.config()).await?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!(
        addr = %local_addr,
        environment = %app.config().environment,
        routes = app.routes().len(),
        docs = %app.config().docs_path,
        "Server listening"
    );

    let routes = app.routes().clone();
    let snapshot = app.snapshot().cloned();
    let service = app.into_service();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        axum::serve(listener, ServiceExt::<Request>::into_make_service(service))
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    Ok(ServerHandle {
        local_addr,
        routes,
        snapshot,
        shutdown: shutdown_tx,
        task,
    })
}

async fn resolve_bind_addr(config: &AppConfig) -> StartupResult<SocketAddr> {
    let (host, port) = config.bind_target();
    let invalid = |source| StartupError::InvalidAddress {
        address: host.to_string(),
        port,
        source,
    };
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|err| invalid(Some(err)))?;
    addrs.next().ok_or_else(|| invalid(None))
}

/// A running server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    routes: Arc<RouteTable>,
    snapshot: Option<Arc<DocumentationSnapshot>>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<io::Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn snapshot(&self) -> Option<&Arc<DocumentationSnapshot>> {
        self.snapshot.as_ref()
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(self) -> io::Result<()> {
        let _ = self.shutdown.send(());
        flatten(self.task.await)
    }

    /// Wait for the serve task to end without requesting shutdown.
    pub async fn wait(self) -> io::Result<()> {
        // Dropping the sender would trigger graceful shutdown.
        let ServerHandle { shutdown, task, .. } = self;
        let result = flatten(task.await);
        drop(shutdown);
        result
    }

    /// Serve until `signal` resolves, then shut down gracefully.
    pub async fn run_until<F>(self, signal: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        let ServerHandle {
            shutdown, mut task, ..
        } = self;

        tokio::select! {
            result = &mut task => return flatten(result),
            _ = signal => {}
        }

        let _ = shutdown.send(());
        let result = flatten(task.await);
        tracing::info!("Server shutdown complete");
        result
    }
}

fn flatten(result: Result<io::Result<()>, JoinError>) -> io::Result<()> {
    result.map_err(io::Error::other)?
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
