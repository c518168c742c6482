use axum::{http::StatusCode, Json, response::IntoResponse};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "NIRD API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Missions, badges and leaderboards for sustainable school tech",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "auth": "/auth/login",
            "leaderboard": "/api/leaderboard",
            "badges": "/api/badges",
            "notifications": "/api/notifications"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
