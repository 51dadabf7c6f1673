use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, config, health, tariff};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
///
/// - `/health` and `/api/config`
/// - `/api/tariff/*`: duty calculation, product catalogue, import, history
/// - `/api/chat/*`: document question answering
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state);
    Router::new()
        .route("/health", get(health::health))
        .route("/api/config", get(config::get_config))
        .nest("/api/tariff", tariff_routes())
        .nest("/api/chat", chat_routes())
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn tariff_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/calculate", post(tariff::calculate))
        .route("/lookup/:hts_number", get(tariff::lookup))
        .route("/search", post(tariff::search))
        .route(
            "/products",
            get(tariff::list_products).post(tariff::upsert_product),
        )
        .route("/import-csv", post(tariff::import_csv))
        .route("/history", get(tariff::history))
        .route("/countries", get(tariff::countries))
        .route("/statistics", get(tariff::statistics))
        .route("/health", get(tariff::health))
}

fn chat_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ask", post(chat::ask))
        .route("/search", post(chat::search_documents))
        .route("/health", get(chat::health))
        .route("/status", get(chat::status))
        .route("/reload-documents", post(chat::reload_documents))
}

fn build_cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins = state
        .settings
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
