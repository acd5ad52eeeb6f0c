use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

use crate::config::ServiceConfig;
use crate::logging::anon_hash;
use crate::metrics::{self, Metrics};
use crate::replies::{ReplySelector, DEFAULT_REPLIES};
use crate::sentiment::{SentimentClass, SentimentClassifier};

pub const GENERATE_ENDPOINT: &str = "generate-replies";
pub const ANALYZE_ENDPOINT: &str = "analyze-sentiment";

const GENERATE_FAILURE: &str = "Failed to generate replies";
const ANALYZE_FAILURE: &str = "Failed to analyze sentiment";

#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<SentimentClassifier>,
    pub selector: Arc<ReplySelector>,
}

impl AppState {
    pub fn new(selector: ReplySelector) -> Self {
        Self {
            classifier: selector.classifier().clone(),
            selector: Arc::new(selector),
        }
    }

    /// Default classifier and the embedded reply bank.
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Self::new(ReplySelector::builtin()?))
    }
}

/// Every user-visible failure: `{"error": "<message>"}` with a matching status.
#[derive(Debug)]
pub enum ApiError {
    MissingField(&'static str),
    InvalidField(&'static str),
    Body { status: StatusCode, message: String },
    Internal(&'static str),
    Timeout,
    NotFound,
    MethodNotAllowed,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) | ApiError::InvalidField(_) => StatusCode::BAD_REQUEST,
            ApiError::Body { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::MissingField(f) => format!("Missing '{f}' in request body"),
            ApiError::InvalidField(f) => format!("Invalid '{f}' in request body"),
            ApiError::Body { message, .. } => message.clone(),
            ApiError::Internal(m) => (*m).to_string(),
            ApiError::Timeout => "Request timeout".to_string(),
            ApiError::NotFound => "Not found".to_string(),
            ApiError::MethodNotAllowed => "Method not allowed".to_string(),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rej: BytesRejection) -> Self {
        ApiError::Body {
            status: rej.status(),
            message: rej.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Build the service router: API routes, optional `/metrics`, JSON fallbacks and the
/// transport layers (body limit, timeout, CORS, tracing).
pub fn router(state: AppState, cfg: &ServiceConfig, metrics: Option<&Metrics>) -> Router {
    let mut app = Router::new()
        .route("/health", get(process_health))
        .route("/api/ai/health", get(ai_health))
        .route("/api/ai/generate-replies", post(generate_replies))
        .route("/api/ai/analyze-sentiment", post(analyze_sentiment))
        .with_state(state);

    if let Some(m) = metrics {
        app = app.merge(m.router());
    }

    app.fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(cfg.body_limit_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            cfg.request_timeout,
        ))
        .layer(middleware::map_response(json_timeout))
        .layer(CorsLayer::very_permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// The timeout layer answers with a bare 408; give it the usual JSON error body.
async fn json_timeout(res: Response) -> Response {
    if res.status() == StatusCode::REQUEST_TIMEOUT {
        warn!("request timed out");
        return ApiError::Timeout.into_response();
    }
    res
}

#[derive(Serialize)]
struct ProcessHealth {
    status: &'static str,
    timestamp: String,
    services: ServicesHealth,
}

#[derive(Serialize)]
struct ServicesHealth {
    ai_service: &'static str,
    text_processing: &'static str,
}

async fn process_health() -> Json<ProcessHealth> {
    Json(ProcessHealth {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        services: ServicesHealth {
            ai_service: "running",
            text_processing: "available",
        },
    })
}

async fn ai_health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[derive(Serialize)]
struct RepliesResp {
    replies: Vec<String>,
}

#[derive(Serialize)]
struct SentimentResp {
    sentiment: SentimentClass,
}

async fn generate_replies(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<RepliesResp>, ApiError> {
    handle_generate(&state, body)
        .map(Json)
        .map_err(|e| reject(GENERATE_ENDPOINT, e))
}

async fn analyze_sentiment(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SentimentResp>, ApiError> {
    handle_analyze(&state, body)
        .map(Json)
        .map_err(|e| reject(ANALYZE_ENDPOINT, e))
}

fn handle_generate(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
) -> Result<RepliesResp, ApiError> {
    let body = body?;
    let obj = parse_object(&body)?;
    let message = message_field(&obj)?;
    let requested = num_replies_field(&obj)?;

    let replies = guarded(GENERATE_ENDPOINT, GENERATE_FAILURE, || {
        state.selector.select_message(message, requested)
    })?;

    metrics::record_replies(replies.len());
    info!(
        id = ?message.map(anon_hash),
        requested,
        returned = replies.len(),
        "replies generated"
    );
    Ok(RepliesResp { replies })
}

fn handle_analyze(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
) -> Result<SentimentResp, ApiError> {
    let body = body?;
    let obj = parse_object(&body)?;
    let message = message_field(&obj)?;

    let sentiment = guarded(ANALYZE_ENDPOINT, ANALYZE_FAILURE, || {
        state.classifier.classify_message(message)
    })?;

    metrics::record_sentiment(sentiment);
    info!(id = ?message.map(anon_hash), %sentiment, "sentiment analyzed");
    Ok(SentimentResp { sentiment })
}

fn reject(endpoint: &'static str, e: ApiError) -> ApiError {
    let status = e.status();
    metrics::record_request_error(endpoint, status.as_u16());
    if status.is_server_error() {
        error!(endpoint, status = status.as_u16(), error = %e.message(), "request failed");
    } else {
        warn!(endpoint, status = status.as_u16(), error = %e.message(), "request rejected");
    }
    e
}

/// Core calls are total; a panic escaping them still becomes the endpoint's 500.
fn guarded<T>(
    endpoint: &'static str,
    failure: &'static str,
    f: impl FnOnce() -> T,
) -> Result<T, ApiError> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|_| {
        error!(endpoint, "core call panicked");
        ApiError::Internal(failure)
    })
}

/// Anything that is not a JSON object counts as a body without `message`.
fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(obj)) => Ok(obj),
        _ => Err(ApiError::MissingField("message")),
    }
}

/// `Ok(None)` when `message` is present but not a string.
fn message_field(obj: &Map<String, Value>) -> Result<Option<&str>, ApiError> {
    obj.get("message")
        .map(Value::as_str)
        .ok_or(ApiError::MissingField("message"))
}

/// Integer, float (truncated), or numeric string; absent or null means the default.
fn num_replies_field(obj: &Map<String, Value>) -> Result<i64, ApiError> {
    let invalid = ApiError::InvalidField("num_replies");
    match obj.get("num_replies") {
        None | Some(Value::Null) => Ok(DEFAULT_REPLIES),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or(invalid),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid),
        Some(_) => Err(invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn non_object_bodies_are_missing_message() {
        for raw in [&b"not json"[..], &b"[]"[..], &b"\"hi\""[..], &b""[..], &b"42"[..]] {
            let err = parse_object(raw).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.message(), "Missing 'message' in request body");
        }
    }

    #[test]
    fn message_field_distinguishes_missing_from_non_string() {
        assert!(message_field(&obj(json!({}))).is_err());
        assert_eq!(message_field(&obj(json!({"message": 5}))).unwrap(), None);
        assert_eq!(message_field(&obj(json!({"message": null}))).unwrap(), None);
        assert_eq!(
            message_field(&obj(json!({"message": "hi"}))).unwrap(),
            Some("hi")
        );
    }

    #[test]
    fn num_replies_coercions() {
        let n = |v: Value| num_replies_field(&obj(json!({ "num_replies": v })));
        assert_eq!(num_replies_field(&obj(json!({}))).unwrap(), DEFAULT_REPLIES);
        assert_eq!(n(Value::Null).unwrap(), DEFAULT_REPLIES);
        assert_eq!(n(json!(4)).unwrap(), 4);
        assert_eq!(n(json!(-2)).unwrap(), -2);
        assert_eq!(n(json!(2.9)).unwrap(), 2);
        assert_eq!(n(json!(" 5 ")).unwrap(), 5);
        assert_eq!(n(json!(u64::MAX)).unwrap(), i64::MAX);
    }

    #[test]
    fn num_replies_rejections() {
        let n = |v: Value| num_replies_field(&obj(json!({ "num_replies": v })));
        for bad in [json!("many"), json!("2.5"), json!(true), json!([3]), json!({"n": 3})] {
            let err = n(bad).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.message(), "Invalid 'num_replies' in request body");
        }
    }

    #[test]
    fn guarded_maps_panics_to_internal() {
        let err = guarded("test", "Failed to test", || -> u8 { panic!("boom") }).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to test");
        assert_eq!(guarded("test", "x", || 7).unwrap(), 7);
    }
}
