use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rag_initialized = state
        .rag
        .as_ref()
        .map(|rag| rag.is_initialized())
        .unwrap_or(false);

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "tariff": true,
            "rag": rag_initialized,
        },
        "endpoints": {
            "rag_health": "/api/chat/health",
            "tariff_health": "/api/tariff/health"
        }
    }))
}
