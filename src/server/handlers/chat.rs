use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::rag::{AskOptions, RagService};
use crate::state::AppState;

const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl AskRequest {
    fn validate(self) -> Result<(String, Option<String>, AskOptions), ApiError> {
        let message = self.message.trim().to_string();
        let length = message.chars().count();
        if length == 0 || length > MAX_MESSAGE_CHARS {
            return Err(ApiError::BadRequest(format!(
                "Invalid 'message': must be 1-{} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        let defaults = AskOptions::default();
        let max_tokens = self.max_tokens.unwrap_or(defaults.max_tokens);
        if !(100..=4000).contains(&max_tokens) {
            return Err(ApiError::BadRequest(
                "Invalid 'max_tokens': must be between 100 and 4000".to_string(),
            ));
        }
        let temperature = self.temperature.unwrap_or(defaults.temperature);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ApiError::BadRequest(
                "Invalid 'temperature': must be between 0 and 2".to_string(),
            ));
        }

        let session_id = self
            .session_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok((
            message,
            session_id,
            AskOptions {
                max_tokens,
                temperature,
            },
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentSearchRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub similarity_threshold: Option<f32>,
}

fn rag_service(state: &AppState) -> Result<&Arc<RagService>, ApiError> {
    state
        .rag
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("RAG service is not available".to_string()))
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (message, session_id, options) = payload.validate()?;
    let rag = rag_service(&state)?;
    let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let answer = rag.ask_question(&message, session_id, options).await?;
    Ok(Json(json!({
        "response": answer.response,
        "session_id": answer.session_id,
        "retrieved_chunks": answer.retrieved_chunks,
        "metadata": answer.metadata,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

pub async fn search_documents(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DocumentSearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Invalid 'query': cannot be empty".to_string()));
    }
    let limit = payload.limit.unwrap_or(5).clamp(1, 20);
    if let Some(threshold) = payload.similarity_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ApiError::BadRequest(
                "Invalid 'similarity_threshold': must be between 0 and 1".to_string(),
            ));
        }
    }

    let rag = rag_service(&state)?;
    let chunks = rag
        .search_documents(query, limit, payload.similarity_threshold)
        .await?;
    Ok(Json(json!({
        "query": query,
        "total_found": chunks.len(),
        "chunks": chunks,
    })))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = Utc::now().to_rfc3339();
    match &state.rag {
        Some(rag) => {
            let health = rag.health().await;
            Json(json!({
                "status": health.status,
                "services": health.services,
                "timestamp": timestamp,
            }))
        }
        None => Json(json!({
            "status": "unhealthy",
            "services": { "rag_service": "unavailable" },
            "timestamp": timestamp,
        })),
    }
}

pub async fn status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let rag = rag_service(&state)?;
    let status = rag.processing_status().await;
    Ok(Json(json!({
        "status": status.status,
        "documents_processed": status.documents_processed,
        "chunks_created": status.chunks_created,
        "vector_db_initialized": status.vector_db_initialized,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

pub async fn reload_documents(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let rag = rag_service(&state)?;
    let status = rag.reload_documents().await?;
    Ok(Json(json!({
        "message": "Documents reloaded successfully",
        "processing_status": status,
    })))
}
