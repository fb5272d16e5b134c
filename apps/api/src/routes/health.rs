use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/
/// Readiness probe for the frontend.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Resume Analyzer API Ready"
    }))
}

/// GET /api/health
/// Reports database connectivity. Always 200; the body carries the status.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => Json(json!({
            "status": "ok",
            "database": "connected",
            "timestamp": Utc::now().to_rfc3339(),
        })),
        Err(e) => Json(json!({
            "status": "error",
            "database": "disconnected",
            "error": e.to_string(),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    }
}
