//! Smart-reply service — binary entrypoint.
//! Loads config, initializes tracing and (optionally) metrics, then serves the Axum router.

use anyhow::Context;
use smart_reply_service::{build_app, config::ServiceConfig, logging, metrics::Metrics};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();

    let cfg = ServiceConfig::from_env()?;
    logging::init_tracing(cfg.log_format);

    let metrics = if cfg.metrics_enabled {
        Some(Metrics::init().context("install prometheus recorder")?)
    } else {
        None
    };

    let app = build_app(&cfg, metrics.as_ref())?;

    let addr = cfg.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(
        %addr,
        metrics = cfg.metrics_enabled,
        body_limit = cfg.body_limit_bytes,
        timeout_ms = cfg.request_timeout.as_millis() as u64,
        "smart-reply service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("smart-reply service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
