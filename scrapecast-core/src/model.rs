use serde::{Deserialize, Deserializer, Serialize};

use crate::error::WeatherError;

/// Sentinel used for any field the extraction step could not populate.
pub const UNKNOWN: &str = "Unknown";

/// A single lookup request: a free-text city name or postal code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    pub location: String,
}

impl WeatherQuery {
    /// Builds a query, rejecting blank locations.
    ///
    /// The location is kept exactly as given; it is used verbatim both as
    /// the cache key and as the search term.
    pub fn new(location: impl Into<String>) -> Result<Self, WeatherError> {
        let location = location.into();
        if location.trim().is_empty() {
            return Err(WeatherError::EmptyLocation);
        }
        Ok(Self { location })
    }
}

/// Structured weather result returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location: String,
    pub temperature: String,
    pub humidity: String,
    pub air_quality: String,
    pub condition: String,
    pub usage: Option<UsageMetrics>,
}

/// Fields as parsed from the model reply, before defaulting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub location: Option<String>,
    pub temperature: Option<String>,
    pub humidity: Option<String>,
    pub air_quality: Option<String>,
    pub condition: Option<String>,
}

impl ExtractedFields {
    pub const NAMES: [&'static str; 5] =
        ["location", "temperature", "humidity", "air_quality", "condition"];

    /// Applies the `"Unknown"` default to every missing field.
    pub fn into_record(self, usage: Option<UsageMetrics>) -> WeatherRecord {
        let or_unknown = |v: Option<String>| v.unwrap_or_else(|| UNKNOWN.to_string());

        WeatherRecord {
            location: or_unknown(self.location),
            temperature: or_unknown(self.temperature),
            humidity: or_unknown(self.humidity),
            air_quality: or_unknown(self.air_quality),
            condition: or_unknown(self.condition),
            usage,
        }
    }

    pub fn missing(&self) -> Vec<&'static str> {
        let present = [
            self.location.is_some(),
            self.temperature.is_some(),
            self.humidity.is_some(),
            self.air_quality.is_some(),
            self.condition.is_some(),
        ];
        Self::NAMES
            .iter()
            .zip(present)
            .filter(|(_, p)| !p)
            .map(|(name, _)| *name)
            .collect()
    }
}

/// Token accounting reported by the chat-completion backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetrics {
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt_tokens: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completion_tokens: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_tokens: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt_tokens_details: PromptTokensDetails,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completion_tokens_details: CompletionTokensDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTokensDetails {
    #[serde(default)]
    pub cached_tokens: Option<u64>,
    #[serde(default)]
    pub audio_tokens: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionTokensDetails {
    #[serde(default)]
    pub reasoning_tokens: Option<u64>,
    #[serde(default)]
    pub audio_tokens: Option<u64>,
    #[serde(default)]
    pub accepted_prediction_tokens: Option<u64>,
    #[serde(default)]
    pub rejected_prediction_tokens: Option<u64>,
}

// Some backends send `null` where OpenAI omits the field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_location_is_rejected() {
        assert!(matches!(WeatherQuery::new("   "), Err(WeatherError::EmptyLocation)));
        assert!(matches!(WeatherQuery::new(""), Err(WeatherError::EmptyLocation)));
    }

    #[test]
    fn location_is_kept_verbatim() {
        let q = WeatherQuery::new(" New York ").expect("non-empty");
        assert_eq!(q.location, " New York ");
    }

    #[test]
    fn missing_fields_default_to_unknown() {
        let fields = ExtractedFields {
            location: Some("Paris".into()),
            temperature: Some("18°C".into()),
            humidity: None,
            air_quality: Some("Good".into()),
            condition: None,
        };
        assert_eq!(fields.missing(), vec!["humidity", "condition"]);

        let record = fields.into_record(None);
        assert_eq!(record.location, "Paris");
        assert_eq!(record.temperature, "18°C");
        assert_eq!(record.humidity, UNKNOWN);
        assert_eq!(record.air_quality, "Good");
        assert_eq!(record.condition, UNKNOWN);
    }

    #[test]
    fn usage_tolerates_nulls_and_missing_details() {
        let usage: UsageMetrics = serde_json::from_str(
            r#"{"prompt_tokens":12,"completion_tokens":null,"total_tokens":12,"prompt_tokens_details":null}"#,
        )
        .unwrap();

        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.completion_tokens, 0);
        assert_eq!(usage.prompt_tokens_details, PromptTokensDetails::default());
        assert_eq!(usage.completion_tokens_details, CompletionTokensDetails::default());
    }

    #[test]
    fn record_serializes_null_usage() {
        let record = ExtractedFields::default().into_record(None);
        let value = serde_json::to_value(&record).unwrap();
        assert!(value["usage"].is_null());
        assert_eq!(value["air_quality"], "Unknown");
    }
}
