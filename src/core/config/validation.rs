use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_string_array_field(server, "server.allowed_origins", "allowed_origins")?;
    }

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_optional_string_field(rag, "rag.documents_dir", "documents_dir")?;
        validate_u64_field(rag, "rag.chunk_size", "chunk_size", 50, 100_000)?;
        validate_u64_field(rag, "rag.chunk_overlap", "chunk_overlap", 0, 50_000)?;
        validate_u64_field(rag, "rag.min_chunk_length", "min_chunk_length", 0, 10_000)?;
        validate_u64_field(rag, "rag.max_chunks_for_context", "max_chunks_for_context", 1, 100)?;
        validate_u64_field(rag, "rag.max_context_length", "max_context_length", 100, 1_000_000)?;
        validate_f64_field(rag, "rag.similarity_threshold", "similarity_threshold", -1.0, 1.0)?;

        if let (Some(size), Some(overlap)) = (
            rag.get("chunk_size").and_then(Value::as_u64),
            rag.get("chunk_overlap").and_then(Value::as_u64),
        ) {
            if overlap >= size {
                return Err(ApiError::BadRequest(
                    "Invalid config at 'rag.chunk_overlap': must be smaller than chunk_size"
                        .to_string(),
                ));
            }
        }
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        validate_optional_string_field(llm, "llm.chat_model", "chat_model")?;
        validate_optional_string_field(llm, "llm.embedding_model", "embedding_model")?;
        validate_u64_field(llm, "llm.request_timeout_secs", "request_timeout_secs", 1, 3_600)?;
    }

    if let Some(tariff) = expect_optional_object(root, "tariff")? {
        validate_u64_field(
            tariff,
            "tariff.history_write_timeout_ms",
            "history_write_timeout_ms",
            1,
            60_000,
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() && !value.is_null() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_empty_and_well_formed_config() {
        assert!(validate_config(&json!({})).is_ok());
        assert!(validate_config(&json!({
            "server": { "host": "0.0.0.0", "port": 8000, "allowed_origins": ["http://localhost:3000"] },
            "rag": { "chunk_size": 1000, "chunk_overlap": 200, "similarity_threshold": 0.7 },
            "llm": { "base_url": "http://localhost:1234", "api_key": null },
            "tariff": { "history_write_timeout_ms": 2000 }
        }))
        .is_ok());
    }

    #[test]
    fn rejects_wrong_types_with_path() {
        let err = validate_config(&json!({ "server": { "port": "eighty" } })).unwrap_err();
        assert!(err.to_string().contains("server.port"));

        let err = validate_config(&json!({ "rag": [] })).unwrap_err();
        assert!(err.to_string().contains("'rag'"));
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk() {
        let err = validate_config(&json!({ "rag": { "chunk_size": 100, "chunk_overlap": 100 } }))
            .unwrap_err();
        assert!(err.to_string().contains("rag.chunk_overlap"));
    }
}
