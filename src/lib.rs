// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod replies;
pub mod sentiment;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::ServiceConfig;
pub use crate::replies::{select_replies, ReplyBank, ReplySelector};
pub use crate::sentiment::{classify, SentimentClass, SentimentClassifier};

use axum::Router;

/// Build the full in-process app from environment config (no socket, no `/metrics`).
pub async fn app() -> anyhow::Result<Router> {
    let cfg = ServiceConfig::from_env()?;
    build_app(&cfg, None)
}

/// Router with the default classifier, the embedded reply bank and `cfg`'s transport limits.
pub fn build_app(cfg: &ServiceConfig, metrics: Option<&metrics::Metrics>) -> anyhow::Result<Router> {
    let state = AppState::builtin()?;
    Ok(api::router(state, cfg, metrics))
}
