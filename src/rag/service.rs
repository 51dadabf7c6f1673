//! Question answering over the indexed tariff documents.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};

use super::engine::{load_documents, ChunkingEngine};
use super::store::{ChunkSearchResult, RagStore, StoredChunk};
use crate::core::config::settings::RagSettings;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

const EMBED_BATCH_SIZE: usize = 64;
const NO_CONTEXT: &str = "No relevant documents found.";

const SYSTEM_PROMPT: &str = "\
You are TariffBot, an intelligent assistant trained on U.S. International Trade Commission data.
You exist to help importers, analysts, and trade professionals quickly understand tariff rules, duty rates, and policy agreements.
You always provide clear, compliant, and factual answers grounded in official HTS documentation.

When given an HTS code and product information, you explain all applicable duties and cost components.
When asked about trade agreements (e.g., NAFTA, Israel FTA), you reference the relevant General Notes with citations.
If a query is ambiguous or unsupported, you politely defer or recommend reviewing the relevant HTS section manually.
You do not speculate or make policy interpretations. You clarify with precision and data.

Please provide accurate, helpful responses based on the context provided.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStatus {
    /// One of `not_started`, `processing`, `completed`, `failed`.
    pub status: String,
    pub documents_processed: usize,
    pub chunks_created: usize,
    pub vector_db_initialized: bool,
}

impl Default for ProcessingStatus {
    fn default() -> Self {
        Self {
            status: "not_started".to_string(),
            documents_processed: 0,
            chunks_created: 0,
            vector_db_initialized: false,
        }
    }
}

/// A chunk handed back to the caller alongside an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub metadata: Value,
    pub similarity_score: f32,
}

impl From<ChunkSearchResult> for RetrievedChunk {
    fn from(result: ChunkSearchResult) -> Self {
        Self {
            content: result.chunk.content,
            metadata: result.chunk.metadata.unwrap_or_else(|| json!({})),
            similarity_score: result.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub response: String,
    pub session_id: String,
    pub retrieved_chunks: Vec<RetrievedChunk>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagHealth {
    pub status: String,
    pub services: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct AskOptions {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.3,
        }
    }
}

pub struct RagService {
    store: Arc<dyn RagStore>,
    llm: Arc<dyn LlmProvider>,
    settings: RagSettings,
    chunker: ChunkingEngine,
    status: Arc<RwLock<ProcessingStatus>>,
    initialized: Arc<AtomicBool>,
    // Serializes initialize and reload.
    indexing: Mutex<()>,
}

impl RagService {
    pub fn new(store: Arc<dyn RagStore>, llm: Arc<dyn LlmProvider>, settings: RagSettings) -> Self {
        let chunker = ChunkingEngine::new((&settings).into());
        Self {
            store,
            llm,
            settings,
            chunker,
            status: Arc::new(RwLock::new(ProcessingStatus::default())),
            initialized: Arc::new(AtomicBool::new(false)),
            indexing: Mutex::new(()),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub async fn processing_status(&self) -> ProcessingStatus {
        self.status.read().await.clone()
    }

    /// Indexes the documents directory unless the store already has chunks.
    pub async fn initialize(&self) -> Result<(), ApiError> {
        let _guard = self.indexing.lock().await;
        tracing::info!("Initializing RAG service...");

        match self.load_documents().await {
            Ok(()) => {
                self.initialized.store(true, Ordering::SeqCst);
                tracing::info!("RAG service initialized successfully");
                Ok(())
            }
            Err(err) => {
                self.status.write().await.status = "failed".to_string();
                tracing::error!("Failed to initialize RAG service: {}", err);
                Err(err)
            }
        }
    }

    /// Drops every stored chunk and indexes the documents again.
    pub async fn reload_documents(&self) -> Result<ProcessingStatus, ApiError> {
        let _guard = self.indexing.lock().await;
        tracing::info!("Reloading documents...");

        self.initialized.store(false, Ordering::SeqCst);
        *self.status.write().await = ProcessingStatus::default();
        let removed = self.store.clear().await?;
        tracing::debug!("Removed {} stored chunks", removed);

        if let Err(err) = self.load_documents().await {
            self.status.write().await.status = "failed".to_string();
            tracing::error!("Error reloading documents: {}", err);
            return Err(err);
        }
        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!("Documents reloaded successfully");
        Ok(self.processing_status().await)
    }

    async fn load_documents(&self) -> Result<(), ApiError> {
        self.status.write().await.status = "processing".to_string();

        let existing = self.store.count().await?;
        if existing > 0 {
            tracing::info!("Found existing documents in vector DB: {}", existing);
            let mut status = self.status.write().await;
            status.status = "completed".to_string();
            status.chunks_created = existing;
            status.vector_db_initialized = true;
            return Ok(());
        }

        let dir = &self.settings.documents_dir;
        if !dir.is_dir() {
            return Err(ApiError::NotFound(format!(
                "Documents directory not found: {}",
                dir.display()
            )));
        }

        let documents = load_documents(dir).await.map_err(ApiError::internal)?;
        let chunks = self.chunker.chunk_documents(&documents);
        if chunks.is_empty() {
            tracing::warn!("No chunks created from {}", dir.display());
            let mut status = self.status.write().await;
            status.status = "completed".to_string();
            status.documents_processed = documents.len();
            status.vector_db_initialized = true;
            return Ok(());
        }

        tracing::info!(
            "Generating embeddings for {} chunks from {} documents",
            chunks.len(),
            documents.len()
        );
        let stored: Vec<StoredChunk> = chunks.into_iter().map(|c| c.into_stored()).collect();
        let chunk_count = stored.len();

        for batch in stored.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.llm.embed(&texts).await?;
            let items = batch.iter().cloned().zip(embeddings).collect();
            self.store.insert_batch(items).await?;
        }

        let mut status = self.status.write().await;
        *status = ProcessingStatus {
            status: "completed".to_string(),
            documents_processed: documents.len(),
            chunks_created: chunk_count,
            vector_db_initialized: true,
        };
        tracing::info!("Loaded {} chunks into vector database", chunk_count);
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<(), ApiError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(ApiError::ServiceUnavailable(
                "RAG service not initialized".to_string(),
            ))
        }
    }

    /// Chunks at or above `threshold`, best first.
    async fn retrieve(
        &self,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievedChunk>, ApiError> {
        let embedding = self
            .llm
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Internal("Embedding provider returned nothing".to_string()))?;

        let results = self.store.search(&embedding, limit).await?;
        Ok(results
            .into_iter()
            .filter(|r| r.score >= threshold)
            .map(RetrievedChunk::from)
            .collect())
    }

    pub async fn search_documents(
        &self,
        query: &str,
        limit: usize,
        similarity_threshold: Option<f32>,
    ) -> Result<Vec<RetrievedChunk>, ApiError> {
        self.ensure_initialized()?;
        let threshold = similarity_threshold.unwrap_or(self.settings.similarity_threshold);
        self.retrieve(query, limit, threshold).await
    }

    pub async fn ask_question(
        &self,
        question: &str,
        session_id: String,
        options: AskOptions,
    ) -> Result<ChatAnswer, ApiError> {
        self.ensure_initialized()?;
        let preview: String = question.chars().take(100).collect();
        tracing::info!("Processing question: {}...", preview);

        let chunks = self
            .retrieve(
                question,
                self.settings.max_chunks_for_context,
                self.settings.similarity_threshold,
            )
            .await?;

        let context = build_context(&chunks, self.settings.max_context_length);
        let mut request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(rag_prompt(question, &context)),
        ])
        .with_sampling(options.temperature, options.max_tokens);
        request.top_p = Some(0.9);

        let response = self.llm.chat(request).await?;
        tracing::info!("Generated response using {} chunks", chunks.len());

        Ok(ChatAnswer {
            metadata: json!({
                "llm_provider": self.llm.name(),
                "chunks_used": chunks.len(),
                "context_length": context.chars().count(),
                "question_length": question.chars().count(),
            }),
            response,
            session_id,
            retrieved_chunks: chunks,
        })
    }

    pub async fn health(&self) -> RagHealth {
        let mut services = BTreeMap::new();

        let llm_status = match self.llm.health_check().await {
            Ok(true) => "healthy".to_string(),
            Ok(false) => "unhealthy".to_string(),
            Err(err) => format!("unhealthy: {}", err),
        };
        services.insert(self.llm.name().to_string(), llm_status);

        let store_status = match self.store.count().await {
            Ok(_) => "healthy".to_string(),
            Err(err) => format!("unhealthy: {}", err),
        };
        services.insert("vector_db".to_string(), store_status);

        let rag_status = if self.is_initialized() {
            "healthy"
        } else {
            "not_initialized"
        };
        services.insert("rag_service".to_string(), rag_status.to_string());

        let status = if services.values().all(|s| s == "healthy") {
            "healthy"
        } else {
            "unhealthy"
        };
        RagHealth {
            status: status.to_string(),
            services,
        }
    }
}

/// Numbered context blocks, stopping before the total would exceed `max_len`.
fn build_context(chunks: &[RetrievedChunk], max_len: usize) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT.to_string();
    }

    let mut parts = Vec::new();
    let mut total = 0;
    for (i, chunk) in chunks.iter().enumerate() {
        let part = format!(
            "Document {} (Similarity: {:.3}):\n{}\n",
            i + 1,
            chunk.similarity_score,
            chunk.content
        );
        let len = part.chars().count();
        if total + len > max_len {
            break;
        }
        total += len;
        parts.push(part);
    }
    parts.join("\n---\n")
}

fn rag_prompt(question: &str, context: &str) -> String {
    format!(
        "Based on the following HTS documentation context, please answer the user's question accurately and thoroughly.\n\n\
         CONTEXT FROM HTS DOCUMENTS:\n{context}\n\n\
         USER QUESTION: {question}\n\n\
         Please provide a detailed answer based on the provided context. If the context doesn't contain enough information to fully answer the question, please say so and indicate what additional information might be needed. Always cite relevant sections or general notes when applicable.\n\n\
         ANSWER:"
    )
}
