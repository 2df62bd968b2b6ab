use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    error::ExtractionError,
    model::{ExtractedFields, WeatherRecord},
    prompt::SYSTEM_PROMPT,
    provider::ChatCompletion,
};

/// Turns a prompt into a [`WeatherRecord`] via a chat-completion backend.
#[derive(Debug, Clone)]
pub struct Extractor {
    backend: Arc<dyn ChatCompletion>,
}

impl Extractor {
    pub fn new(backend: Arc<dyn ChatCompletion>) -> Self {
        Self { backend }
    }

    pub async fn extract(&self, prompt: &str) -> Result<WeatherRecord, ExtractionError> {
        let reply = self.backend.complete(SYSTEM_PROMPT, prompt).await?;
        let fields = parse_fields(&reply.content)?;

        let missing = fields.missing();
        if !missing.is_empty() {
            warn!(?missing, "model omitted fields, defaulting to Unknown");
        }
        if let Some(usage) = &reply.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "token usage"
            );
        }

        Ok(fields.into_record(reply.usage))
    }
}

/// Parses the model's reply. Fields stay `None` when absent, null, blank,
/// or not a scalar.
pub fn parse_fields(content: &str) -> Result<ExtractedFields, ExtractionError> {
    let value: Value =
        serde_json::from_str(content.trim()).map_err(ExtractionError::Malformed)?;
    let Value::Object(map) = value else {
        return Err(ExtractionError::NotAnObject);
    };

    Ok(ExtractedFields {
        location: field(&map, "location"),
        temperature: field(&map, "temperature"),
        humidity: field(&map, "humidity"),
        air_quality: field(&map, "air_quality"),
        condition: field(&map, "condition"),
    })
}

fn field(map: &Map<String, Value>, name: &str) -> Option<String> {
    match map.get(name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
