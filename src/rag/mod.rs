//! Retrieval-augmented answers over the HTS reference documents.
//!
//! - `ChunkingEngine`: loads text/markdown documents and splits them into chunks
//! - `RagStore` / `SqliteRagStore`: chunk storage with cosine similarity search
//! - `RagService`: indexing lifecycle and question answering

pub mod engine;
pub mod service;
pub mod sqlite;
pub mod store;

pub use engine::{ChunkingConfig, ChunkingEngine, TextChunk};
pub use service::{AskOptions, ChatAnswer, ProcessingStatus, RagHealth, RagService, RetrievedChunk};
pub use sqlite::SqliteRagStore;
pub use store::{ChunkSearchResult, RagStore, StoredChunk};
