use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::state::AppState;
use crate::tariff::service::CalculationOutcome;
use crate::tariff::validation::{
    validate_hts_number, CalculateRequest, HistoryQuery, ImportRequest, PageQuery, ProductRequest,
    SearchRequest,
};

#[derive(Debug, Serialize)]
struct CalculationResponse {
    #[serde(flatten)]
    outcome: CalculationOutcome,
    session_id: String,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    history_warning: Option<String>,
}

pub async fn calculate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CalculateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (inputs, session_id) = payload.validate()?;
    let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let report = state
        .tariff
        .calculate_duties(&inputs, Some(&session_id))
        .await?;

    Ok(Json(CalculationResponse {
        outcome: report.outcome,
        session_id,
        timestamp: Utc::now().to_rfc3339(),
        history_warning: report.history_warning,
    }))
}

pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Path(hts_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let hts_number = validate_hts_number(&hts_number)?;
    let product = state.tariff.lookup(&hts_number).await?;
    Ok(Json(product))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (query, limit) = payload.validate()?;
    let products = state.tariff.search(&query, limit).await?;
    Ok(Json(json!({
        "total_found": products.len(),
        "products": products,
        "query": query,
    })))
}

pub async fn upsert_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = payload.validate()?;
    let outcome = state.tariff.upsert_product(product).await?;
    let status = if outcome.was_inserted() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.into_product())))
}

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .tariff
        .list_products(page.limit(), page.offset())
        .await?;
    Ok(Json(products))
}

pub async fn import_csv(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let raw = payload.csv_file_path.trim();
    if raw.is_empty() {
        return Err(ApiError::BadRequest(
            "Invalid 'csv_file_path': cannot be empty".to_string(),
        ));
    }
    let path = state.paths.resolve(raw);
    let summary = state.tariff.import_csv_file(&path).await?;

    Ok(Json(json!({
        "imported": summary.imported,
        "updated": summary.updated,
        "errors": summary.errors,
        "total_processed": summary.total_processed,
        "message": format!(
            "Import completed: {} imported, {} updated, {} errors",
            summary.imported, summary.updated, summary.errors
        ),
    })))
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = query.session_id();
    let calculations = state.tariff.history(session_id, query.limit()).await?;
    Ok(Json(json!({
        "total_count": calculations.len(),
        "calculations": calculations,
        "session_id": session_id,
    })))
}

pub async fn countries(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let countries = state.tariff.countries().await?;
    Ok(Json(countries))
}

pub async fn statistics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.tariff.statistics().await?;
    Ok(Json(stats))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.tariff.health().await)
}
