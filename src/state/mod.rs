use std::sync::Arc;

use crate::core::config::{AppPaths, AppSettings, ConfigService};
use crate::llm::{LlmProvider, OpenAiCompatibleProvider};
use crate::rag::{RagService, SqliteRagStore};
use crate::tariff::{SqliteTariffStore, TariffService};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes and background tasks.
///
/// The tariff service is always present. The RAG service is optional: when
/// its store or LLM provider cannot be built the chat routes answer 503 and
/// everything else keeps working.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: AppSettings,
    pub tariff: TariffService,
    pub rag: Option<Arc<RagService>>,
}

impl AppState {
    /// Loads configuration, opens the tariff database and wires the RAG pipeline.
    ///
    /// Document indexing is not started here; see [`AppState::spawn_rag_indexing`].
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let store = SqliteTariffStore::new(paths.as_ref())
            .await
            .map_err(|e| InitializationError::Tariff(e.into()))?;
        let tariff = TariffService::new(Arc::new(store), settings.tariff.clone());

        let rag = match build_rag(&paths, &settings).await {
            Ok(service) => Some(Arc::new(service)),
            Err(err) => {
                tracing::warn!("{}; chat endpoints are disabled", err);
                None
            }
        };

        Ok(Arc::new(Self::from_parts(paths, config, settings, tariff, rag)))
    }

    pub fn from_parts(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: AppSettings,
        tariff: TariffService,
        rag: Option<Arc<RagService>>,
    ) -> Self {
        Self {
            paths,
            config,
            settings,
            tariff,
            rag,
        }
    }

    /// Indexes documents in the background so startup is not blocked on embeddings.
    pub fn spawn_rag_indexing(&self) {
        let Some(rag) = self.rag.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = rag.initialize().await {
                tracing::warn!("RAG indexing failed: {}", err);
            }
        });
    }
}

async fn build_rag(
    paths: &AppPaths,
    settings: &AppSettings,
) -> Result<RagService, InitializationError> {
    let provider: Arc<dyn LlmProvider> = Arc::new(
        OpenAiCompatibleProvider::new(&settings.llm)
            .map_err(|e| InitializationError::Llm(e.into()))?,
    );
    if settings.llm.api_key.is_none() {
        tracing::warn!("No LLM API key configured; requests are sent without authorization");
    }

    let store = SqliteRagStore::new(paths)
        .await
        .map_err(|e| InitializationError::Rag(e.into()))?;

    Ok(RagService::new(
        Arc::new(store),
        provider,
        settings.rag.clone(),
    ))
}
