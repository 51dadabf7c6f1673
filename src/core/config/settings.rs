use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use super::paths::AppPaths;

/// Typed view over the merged YAML config, with defaults for every key.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub server: ServerSettings,
    pub rag: RagSettings,
    pub llm: LlmSettings,
    pub tariff: TariffSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RagSettings {
    pub documents_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_length: usize,
    pub max_chunks_for_context: usize,
    pub max_context_length: usize,
    pub similarity_threshold: f32,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TariffSettings {
    pub history_write_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("data"),
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_length: 50,
            max_chunks_for_context: 5,
            max_context_length: 4000,
            similarity_threshold: 0.7,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl Default for TariffSettings {
    fn default() -> Self {
        Self {
            history_write_timeout: Duration::from_millis(2000),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            rag: RagSettings::default(),
            llm: LlmSettings::default(),
            tariff: TariffSettings::default(),
        }
    }
}

impl AppSettings {
    /// Reads settings from an already validated config value.
    pub fn from_config(config: &Value, paths: &AppPaths) -> Self {
        let mut settings = AppSettings::default();

        if let Some(server) = config.get("server") {
            if let Some(host) = str_field(server, "host") {
                settings.server.host = host;
            }
            if let Some(port) = server.get("port").and_then(Value::as_u64) {
                settings.server.port = port as u16;
            }
            if let Some(origins) = server.get("allowed_origins").and_then(Value::as_array) {
                let origins: Vec<String> = origins
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect();
                if !origins.is_empty() {
                    settings.server.allowed_origins = origins;
                }
            }
        }
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
            settings.server.port = port;
        }

        let rag = config.get("rag");
        let documents_dir = rag
            .and_then(|r| str_field(r, "documents_dir"))
            .unwrap_or_else(|| "data".to_string());
        settings.rag.documents_dir = paths.resolve(&documents_dir);
        if let Some(rag) = rag {
            read_usize(rag, "chunk_size", &mut settings.rag.chunk_size);
            read_usize(rag, "chunk_overlap", &mut settings.rag.chunk_overlap);
            read_usize(rag, "min_chunk_length", &mut settings.rag.min_chunk_length);
            read_usize(
                rag,
                "max_chunks_for_context",
                &mut settings.rag.max_chunks_for_context,
            );
            read_usize(rag, "max_context_length", &mut settings.rag.max_context_length);
            if let Some(threshold) = rag.get("similarity_threshold").and_then(Value::as_f64) {
                settings.rag.similarity_threshold = threshold as f32;
            }
        }

        if let Some(llm) = config.get("llm") {
            if let Some(base_url) = str_field(llm, "base_url") {
                settings.llm.base_url = base_url;
            }
            settings.llm.api_key = str_field(llm, "api_key");
            if let Some(model) = str_field(llm, "chat_model") {
                settings.llm.chat_model = model;
            }
            if let Some(model) = str_field(llm, "embedding_model") {
                settings.llm.embedding_model = model;
            }
            if let Some(secs) = llm.get("request_timeout_secs").and_then(Value::as_u64) {
                settings.llm.request_timeout = Duration::from_secs(secs);
            }
        }
        if settings.llm.api_key.is_none() {
            settings.llm.api_key = env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        if let Some(ms) = config
            .get("tariff")
            .and_then(|t| t.get("history_write_timeout_ms"))
            .and_then(Value::as_u64)
        {
            settings.tariff.history_write_timeout = Duration::from_millis(ms);
        }

        settings
    }
}

fn str_field(section: &Value, key: &str) -> Option<String> {
    section
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn read_usize(section: &Value, key: &str, target: &mut usize) {
    if let Some(value) = section.get(key).and_then(Value::as_u64) {
        *target = value as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_paths() -> (tempfile::TempDir, AppPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_data_dir(dir.path().to_path_buf(), dir.path().join("data"));
        (dir, paths)
    }

    #[test]
    fn empty_config_yields_defaults() {
        let (dir, paths) = test_paths();
        let settings = AppSettings::from_config(&json!({}), &paths);

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.rag.chunk_size, 1000);
        assert_eq!(settings.rag.chunk_overlap, 200);
        assert_eq!(settings.rag.max_chunks_for_context, 5);
        assert_eq!(settings.rag.documents_dir, dir.path().join("data"));
        assert_eq!(settings.llm.chat_model, "gpt-4o-mini");
        assert_eq!(settings.tariff.history_write_timeout, Duration::from_millis(2000));
    }

    #[test]
    fn config_values_override_defaults() {
        let (_dir, paths) = test_paths();
        let settings = AppSettings::from_config(
            &json!({
                "server": { "host": "0.0.0.0", "allowed_origins": ["http://example.test"] },
                "rag": { "documents_dir": "/srv/hts", "similarity_threshold": 0.5, "chunk_size": 800 },
                "llm": { "base_url": "http://localhost:1234", "api_key": "sk-x", "chat_model": "local" },
                "tariff": { "history_write_timeout_ms": 250 }
            }),
            &paths,
        );

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.allowed_origins, vec!["http://example.test"]);
        assert_eq!(settings.rag.documents_dir, PathBuf::from("/srv/hts"));
        assert_eq!(settings.rag.chunk_size, 800);
        assert!((settings.rag.similarity_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(settings.llm.base_url, "http://localhost:1234");
        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-x"));
        assert_eq!(settings.llm.chat_model, "local");
        assert_eq!(settings.tariff.history_write_timeout, Duration::from_millis(250));
    }
}
