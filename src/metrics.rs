use axum::{routing::get, Router};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::sentiment::SentimentClass;

pub const SENTIMENT_TOTAL: &str = "smart_reply_sentiment_total";
pub const REPLIES_TOTAL: &str = "smart_reply_replies_total";
pub const REPLY_COUNT: &str = "smart_reply_reply_count";
pub const REQUEST_ERRORS_TOTAL: &str = "smart_reply_request_errors_total";

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if a recorder is already installed.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        Ok(Self { handle })
    }

    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

// Recording helpers. Without an installed recorder these are no-ops.

pub fn record_sentiment(class: SentimentClass) {
    counter!(SENTIMENT_TOTAL, "sentiment" => class.as_str()).increment(1);
}

pub fn record_replies(n: usize) {
    counter!(REPLIES_TOTAL).increment(1);
    histogram!(REPLY_COUNT).record(n as f64);
}

pub fn record_request_error(endpoint: &'static str, status: u16) {
    counter!(REQUEST_ERRORS_TOTAL, "endpoint" => endpoint, "status" => status.to_string())
        .increment(1);
}
