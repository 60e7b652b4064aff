//! Router assembly.
//!
//! The binary and the integration tests build the same application here;
//! they differ only in the session store they plug in.

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{Router, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::middleware::{SignedSessionLayer, request_id_middleware, security_headers_middleware};
use crate::routes;
use crate::state::AppState;

/// The full storefront application.
///
/// Layer order, outermost first: trace, request id, session, security
/// headers. Sentry layers are added by the binary around this router.
pub fn router<S>(state: AppState, sessions: SignedSessionLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let static_files = ServeDir::new(&state.config().static_dir);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", static_files)
        .layer(from_fn_with_state(state.clone(), security_headers_middleware))
        .layer(sessions)
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
