// tests/metrics_http.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusBuilder;
use tower::ServiceExt;

use smart_reply_service::metrics::{self as app_metrics, Metrics};
use smart_reply_service::{build_app, SentimentClass, ServiceConfig};

#[tokio::test]
async fn metrics_route_renders_recorded_series() {
    // Local recorder: no global install, so tests stay independent.
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::with_local_recorder(&recorder, || {
        app_metrics::record_sentiment(SentimentClass::Negative);
        app_metrics::record_replies(2);
    });

    let m = Metrics::from_handle(handle);
    let app = build_app(&ServiceConfig::default(), Some(&m)).expect("build app");

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    let text = String::from_utf8(body.to_vec()).unwrap();
    for needle in [
        r#"smart_reply_sentiment_total{sentiment="negative"} 1"#,
        "smart_reply_replies_total",
        "smart_reply_reply_count",
    ] {
        assert!(text.contains(needle), "metrics exposition missing '{needle}'\n{text}");
    }
}

#[tokio::test]
async fn metrics_route_absent_when_disabled() {
    let app = build_app(&ServiceConfig::default(), None).expect("build app");
    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
