use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::app::AppState;

/// `GET /api/v1/health`
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let timestamp = Utc::now().to_rfc3339();

    match state.health.ping().await {
        Ok(()) => axum::Json(serde_json::json!({
            "status": "ok",
            "database": "connected",
            "timestamp": timestamp,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(serde_json::json!({
                    "status": "error",
                    "database": "unreachable",
                    "timestamp": timestamp,
                })),
            )
                .into_response()
        }
    }
}
