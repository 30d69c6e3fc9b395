//! Health check and service banner handlers

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
}

pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "PhishGuard Detection API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "analyze": "POST /api/v1/analyze",
            "analyze_ws": "GET /ws/analyze",
            "health": "GET /health"
        }
    }))
}
