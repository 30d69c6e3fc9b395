//! WebSocket analysis with progress notifications
//!
//! Accepts one request JSON, streams named progress steps for UX, then
//! the result. Progress frames have no effect on the computed verdict.

use crate::handlers::analyze::run_analysis;
use crate::models::{AnalyzeRequest, AnalyzeResponse};
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use serde_json::json;
use std::time::Duration;

const PROGRESS_STEPS: &[(&str, u8)] = &[
    ("Initializing engine", 10),
    ("Scanning text", 30),
    ("Analyzing URLs", 60),
    ("Image processing", 80),
    ("Finalizing", 100),
];

/// GET /ws/analyze
pub async fn analyze_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle(socket, state))
}

async fn handle(mut socket: WebSocket, state: AppState) {
    let request = match socket.recv().await {
        Some(Ok(Message::Text(payload))) => {
            match serde_json::from_str::<AnalyzeRequest>(&payload) {
                Ok(request) => request,
                Err(e) => {
                    send_error(&mut socket, &format!("invalid request: {}", e)).await;
                    return;
                }
            }
        }
        _ => return,
    };

    for (step, percent) in PROGRESS_STEPS {
        let frame = json!({
            "type": "progress",
            "payload": { "step": step, "percent": percent }
        });
        if socket.send(Message::Text(frame.to_string())).await.is_err() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    match run_analysis(state.engine.clone(), request).await {
        Ok(verdict) => {
            let response = AnalyzeResponse::from(verdict);
            let frame = json!({ "type": "result", "payload": response });
            let _ = socket.send(Message::Text(frame.to_string())).await;
        }
        Err(e) => {
            tracing::error!("WS analysis error: {}", e);
            send_error(&mut socket, &e.to_string()).await;
        }
    }
}

async fn send_error(socket: &mut WebSocket, message: &str) {
    let frame = json!({ "type": "error", "payload": { "message": message } });
    let _ = socket.send(Message::Text(frame.to_string())).await;
}
