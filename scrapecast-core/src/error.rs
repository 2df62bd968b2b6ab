use thiserror::Error;

/// Message returned to callers for every upstream failure.
pub const OPAQUE_FAILURE: &str = "Failed to process weather data.";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("search request timed out")]
    Timeout,

    #[error("search request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("search request returned status {status}")]
    Status { status: u16 },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { FetchError::Timeout } else { FetchError::Http(err) }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("LLM backend reported an error (status {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("LLM reply contained no message content")]
    EmptyReply,

    #[error("LLM reply is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("LLM reply is JSON but not an object")]
    NotAnObject,
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ExtractionError::Timeout } else { ExtractionError::Http(err) }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Missing OpenAI API key.\n\
         Hint: set OPENAI_API_KEY or run `scrapecast configure`."
    )]
    MissingApiKey,

    #[error("Invalid configuration value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("location must not be empty")]
    EmptyLocation,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl WeatherError {
    /// Text safe to hand to an end user; upstream detail is never included.
    pub fn public_message(&self) -> &'static str {
        match self {
            WeatherError::EmptyLocation => "Location must not be empty.",
            WeatherError::Fetch(_) | WeatherError::Extraction(_) => OPAQUE_FAILURE,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, WeatherError::EmptyLocation)
    }
}
