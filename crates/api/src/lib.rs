//! HTTP authorization service.
//!
//! Answers authorization requests against a policy registry, keeps recent
//! decisions in an in-memory audit log, and exposes structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use audit::{AuditDispatcher, AuditWorker, InMemoryAuditLog};
use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use policy::{PolicyEngine, RuleRegistry};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Audit records kept in memory for `GET /audit`.
pub const AUDIT_LOG_RETENTION: usize = 10_000;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub engine: PolicyEngine,
    pub audit_log: InMemoryAuditLog,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/authorize", post(routes::authorize::authorize))
        .route("/authorize/batch", post(routes::authorize::authorize_batch))
        .route("/audit", get(routes::audit::list))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state: an engine over `registry` whose decisions
/// are dispatched to an in-memory audit log through a queue of
/// `audit_capacity` records.
///
/// Must be called from within a Tokio runtime. The returned worker drains
/// the queue once the state is dropped.
pub fn create_default_state(
    registry: RuleRegistry,
    audit_capacity: usize,
) -> (Arc<AppState>, AuditWorker) {
    let audit_log = InMemoryAuditLog::with_retention(AUDIT_LOG_RETENTION);
    let (dispatcher, worker) = AuditDispatcher::spawn(audit_log.clone(), audit_capacity);
    let engine = PolicyEngine::new(registry).with_audit(Arc::new(dispatcher));

    let state = Arc::new(AppState { engine, audit_log });
    (state, worker)
}
