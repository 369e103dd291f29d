//! HTTP route definitions and system endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::error;

use blogapi_server::handlers::{statistics, Statistics};
use blogapi_storage::BlogStore;

use super::state::AppState;
use super::{blogpost, comment};
use crate::errors::{ApiError, ApiResult};
use crate::middleware::{
    cors_layer, enforce_timeout, RequestIdLayer, RequestLoggingLayer, RequestMetrics, TimingLayer,
    TracingLayer,
};
use crate::observability::{metrics_handler, MetricsState};

/// Default request body size limit (1MB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Default time a request may take before it is answered with 408.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Name reported by `GET /`.
const SERVICE_NAME: &str = "Blog API";

/// Knobs of the middleware stack wrapped around the routes.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Maximum request body size in bytes.
    pub body_limit: usize,
    /// `None` disables the request timeout.
    pub request_timeout: Option<Duration>,
    /// Adds a permissive CORS layer.
    pub cors: bool,
    /// Where the Prometheus endpoint is mounted, when it is.
    pub metrics_path: String,
    /// Shared request counters updated by the timing layer.
    pub request_metrics: Arc<RequestMetrics>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            cors: true,
            metrics_path: "/metrics".to_string(),
            request_metrics: Arc::new(RequestMetrics::new()),
        }
    }
}

fn api_routes<S: BlogStore>() -> Router<Arc<AppState<S>>> {
    Router::new()
        // BlogPost
        .route(
            "/blogpost/",
            get(blogpost::list::<S>).post(blogpost::create::<S>),
        )
        .route("/blogpost/count/", get(blogpost::count::<S>))
        .route("/blogpost/paginated/", get(blogpost::paginated::<S>))
        .route("/blogpost/search/", get(blogpost::search::<S>))
        .route(
            "/blogpost/bulk/",
            post(blogpost::bulk_create::<S>).delete(blogpost::bulk_delete::<S>),
        )
        .route(
            "/blogpost/:blogpost_id/",
            get(blogpost::get::<S>)
                .put(blogpost::update::<S>)
                .delete(blogpost::delete::<S>),
        )
        .route(
            "/blogpost/methods/:method/",
            post(blogpost::invoke_method::<S>),
        )
        // Comment
        .route(
            "/comment/",
            get(comment::list::<S>).post(comment::create::<S>),
        )
        .route("/comment/count/", get(comment::count::<S>))
        .route("/comment/paginated/", get(comment::paginated::<S>))
        .route("/comment/search/", get(comment::search::<S>))
        .route(
            "/comment/bulk/",
            post(comment::bulk_create::<S>).delete(comment::bulk_delete::<S>),
        )
        .route(
            "/comment/:comment_id/",
            get(comment::get::<S>)
                .put(comment::update::<S>)
                .delete(comment::delete::<S>),
        )
        .route(
            "/comment/methods/:method/",
            post(comment::invoke_method::<S>),
        )
        // System
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check::<S>))
        .route("/statistics", get(get_statistics::<S>))
}

/// Creates the HTTP router with the default options and no `/metrics`.
pub fn create_router<S: BlogStore>(state: AppState<S>) -> Router {
    create_router_with_options(state, RouterOptions::default())
}

/// Creates the HTTP router with custom middleware options.
pub fn create_router_with_options<S: BlogStore>(
    state: AppState<S>,
    options: RouterOptions,
) -> Router {
    let router = api_routes::<S>().with_state(Arc::new(state));
    with_middleware(router, &options)
}

/// Creates the HTTP router plus the Prometheus endpoint at
/// `options.metrics_path`.
pub fn create_router_with_observability<S: BlogStore>(
    state: AppState<S>,
    metrics_state: MetricsState,
    options: RouterOptions,
) -> Router {
    let api_router = api_routes::<S>().with_state(Arc::new(state));

    let observability_router = Router::new()
        .route(&options.metrics_path, get(metrics_handler))
        .with_state(metrics_state);

    with_middleware(api_router.merge(observability_router), &options)
}

/// Wraps `router` in the middleware stack.
///
/// Layers run outermost first: CORS, request id, timing, tracing span,
/// request logging, body limit, timeout, then the route.
fn with_middleware(router: Router, options: &RouterOptions) -> Router {
    let mut router = router.fallback(fallback);

    if let Some(timeout) = options.request_timeout {
        router = router.layer(from_fn_with_state(timeout, enforce_timeout));
    }

    let router = router
        .layer(RequestBodyLimitLayer::new(options.body_limit))
        .layer(RequestLoggingLayer::new())
        .layer(TracingLayer::new())
        .layer(TimingLayer::new(Arc::clone(&options.request_metrics)))
        .layer(RequestIdLayer::new());

    if options.cors {
        router.layer(cors_layer())
    } else {
        router
    }
}

async fn fallback() -> ApiError {
    ApiError::not_found("Not Found")
}

// ============================================================
// System endpoints
// ============================================================

/// API information.
async fn root() -> impl IntoResponse {
    Json(json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

/// Liveness probe. Does not touch storage.
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "database": "connected",
    }))
}

/// Readiness probe: 200 once storage answers, 503 otherwise.
async fn readiness_check<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    match state.storage.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": { "storage": "ok" }
            })),
        ),
        Err(e) => {
            // Log the full error, but don't expose it
            error!(
                backend = state.storage.backend_name(),
                "Readiness check failed: storage unavailable: {}", e
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "checks": { "storage": "unavailable" }
                })),
            )
        }
    }
}

async fn get_statistics<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<Json<Statistics>> {
    Ok(Json(statistics(state.storage.as_ref()).await?))
}
