//! Document loading and chunking for the tariff knowledge base.
//!
//! Reads plain text and markdown files from the documents directory and
//! splits them into overlapping character windows, preferring to cut at a
//! sentence end near the tail of each window.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use super::store::StoredChunk;
use crate::core::config::settings::RagSettings;

const DOCUMENT_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

/// Chunking parameters, taken from the `rag` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive windows
    pub chunk_overlap: usize,
    /// Chunks shorter than this after trimming are dropped
    pub min_chunk_length: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_length: 50,
        }
    }
}

impl From<&RagSettings> for ChunkingConfig {
    fn from(settings: &RagSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            min_chunk_length: settings.min_chunk_length,
        }
    }
}

/// A text chunk with source information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    /// File name the chunk came from
    pub source: String,
    /// Character offset in the original document
    pub start_offset: usize,
    pub chunk_index: usize,
}

impl TextChunk {
    pub fn content_hash(&self) -> String {
        hex::encode(Sha256::digest(self.text.as_bytes()))
    }

    pub fn into_stored(self) -> StoredChunk {
        let content_hash = self.content_hash();
        StoredChunk {
            chunk_id: content_hash[..16].to_string(),
            metadata: Some(json!({
                "source": self.source,
                "chunk_index": self.chunk_index,
                "start_offset": self.start_offset,
                "content_hash": content_hash,
            })),
            content: self.text,
            source: self.source,
        }
    }
}

/// A loaded document before chunking.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub text: String,
}

pub struct ChunkingEngine {
    config: ChunkingConfig,
}

impl ChunkingEngine {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split text into overlapping chunks.
    pub fn split_into_chunks(&self, text: &str, source: &str) -> Vec<TextChunk> {
        let chunk_size = self.config.chunk_size.max(1);
        let step = chunk_size.saturating_sub(self.config.chunk_overlap).max(1);

        let chars: Vec<char> = text.chars().collect();
        let total_chars = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total_chars {
            let end = (start + chunk_size).min(total_chars);
            let window: String = chars[start..end].iter().collect();

            let cut = if end < total_chars {
                find_sentence_boundary(&window)
            } else {
                window.as_str()
            };
            let trimmed = cut.trim();

            if trimmed.chars().count() >= self.config.min_chunk_length {
                chunks.push(TextChunk {
                    text: trimmed.to_string(),
                    source: source.to_string(),
                    start_offset: start,
                    chunk_index: chunks.len(),
                });
            }

            if end == total_chars {
                break;
            }
            start += step;
        }

        chunks
    }

    pub fn chunk_documents(&self, documents: &[SourceDocument]) -> Vec<TextChunk> {
        documents
            .iter()
            .flat_map(|doc| self.split_into_chunks(&doc.text, &doc.name))
            .collect()
    }
}

/// Cuts at the last sentence end found in the final fifth of the window.
fn find_sentence_boundary(text: &str) -> &str {
    let sentence_endings = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

    let mut search_start = (text.len() * 80) / 100;
    while !text.is_char_boundary(search_start) {
        search_start += 1;
    }
    let search_text = &text[search_start..];

    sentence_endings
        .iter()
        .filter_map(|ending| search_text.rfind(ending).map(|pos| pos + ending.len()))
        .max()
        .map(|offset| &text[..search_start + offset])
        .unwrap_or(text)
}

/// Lists document files directly inside `dir`, sorted by name.
pub fn discover_documents(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Reads every document in `dir`; unreadable files are logged and skipped.
pub async fn load_documents(dir: &Path) -> std::io::Result<Vec<SourceDocument>> {
    let mut documents = Vec::new();
    for path in discover_documents(dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match tokio::fs::read_to_string(&path).await {
            Ok(text) if !text.trim().is_empty() => documents.push(SourceDocument { name, text }),
            Ok(_) => tracing::debug!("Skipping empty document {}", path.display()),
            Err(err) => tracing::warn!("Failed to read document {}: {}", path.display(), err),
        }
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(chunk_size: usize, chunk_overlap: usize, min_chunk_length: usize) -> ChunkingEngine {
        ChunkingEngine::new(ChunkingConfig {
            chunk_size,
            chunk_overlap,
            min_chunk_length,
        })
    }

    #[test]
    fn chunks_overlap_and_cover_the_text() {
        let text = "This is a test. ".repeat(20);
        let chunks = engine(100, 20, 1).split_into_chunks(&text, "notes.txt");

        assert!(chunks.len() >= 4);
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks[1].start_offset, 80);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 100));
        assert!(chunks[0].text.ends_with('.'));
        assert!(chunks.iter().enumerate().all(|(i, c)| c.chunk_index == i));
    }

    #[test]
    fn short_chunks_are_dropped() {
        let chunks = engine(100, 0, 50).split_into_chunks("Too short.", "a.md");
        assert!(chunks.is_empty());
    }

    #[test]
    fn boundary_search_respects_multibyte_text() {
        let text = "Rate is 4.5¢/kg. ".repeat(30);
        let chunks = engine(64, 8, 1).split_into_chunks(&text, "rates.txt");
        assert!(!chunks.is_empty());
    }

    #[test]
    fn stored_chunk_carries_hash_and_offsets() {
        let chunk = TextChunk {
            text: "General Note 3".to_string(),
            source: "notes.md".to_string(),
            start_offset: 40,
            chunk_index: 2,
        };
        let hash = chunk.content_hash();
        let stored = chunk.into_stored();

        assert_eq!(hash.len(), 64);
        assert_eq!(stored.chunk_id, hash[..16]);
        let metadata = stored.metadata.unwrap();
        assert_eq!(metadata["start_offset"], 40);
        assert_eq!(metadata["chunk_index"], 2);
        assert_eq!(metadata["content_hash"], hash);
    }

    #[tokio::test]
    async fn loads_only_text_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "# Chapter 1\nLive animals.").unwrap();
        std::fs::write(dir.path().join("a.txt"), "General notes.").unwrap();
        std::fs::write(dir.path().join("c.pdf"), "%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("empty.txt"), "  ").unwrap();

        let docs = load_documents(dir.path()).await.unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.md"]);
    }
}
