//! `GET /health`: liveness plus a probe of the project store.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    /// Whether the projects database answered a trivial query.
    pub project_store: bool,
}

/// 200 when the store answers, 503 otherwise. The body shape is the same
/// in both cases.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let project_store = match aoi_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "Project store health check failed");
            false
        }
    };

    let (code, status) = if project_store {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        code,
        Json(HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION"),
            project_store,
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
