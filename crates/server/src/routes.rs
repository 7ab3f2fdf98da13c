use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::{observability, types::Health};
use service::{auth::AuthService, buckets::BucketService};
use store::Store;

pub mod auth;
pub mod buckets;

/// Shared handler state; both services are cheap clones over one store.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub buckets: BucketService,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { auth: AuthService::new(store.clone()), buckets: BucketService::new(store) }
    }
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> (StatusCode, String) {
    observability::encode_metrics()
}

/// Outcome label for the operations counter.
pub(crate) fn outcome(status: StatusCode) -> &'static str {
    match status.as_u16() {
        200..=299 => "ok",
        401 => "unauthorized",
        400..=499 => "rejected",
        _ => "error",
    }
}

/// Build the full application router: public probes and the four bucket/token endpoints.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics));

    let api = Router::new()
        .route("/authenticate", post(auth::authenticate))
        .route("/update", post(buckets::update))
        .route("/retrieve", post(buckets::retrieve))
        .route("/remove", post(buckets::remove))
        .with_state(state);

    public
        .merge(api)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
