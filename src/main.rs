//! Segment API Server
//!
//! Resolves configuration, composes the server, and serves until Ctrl+C or
//! SIGTERM. A startup failure exits with a non-zero status.

use segment_api::{config, create_server, routes, server, telemetry, AppConfig, PluginChain};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    let config = AppConfig::resolve();
    telemetry::init(&config);

    let chain = PluginChain::standard(routes::builtin());
    let handle = match create_server(config, chain).await {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(error = %err, "startup failed");
            return Err(err.into());
        }
    };

    handle.run_until(server::shutdown_signal()).await?;
    Ok(())
}
