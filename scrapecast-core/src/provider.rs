//! Upstream capabilities the pipeline depends on.
//!
//! Both are traits so the pipeline can be driven by in-memory doubles.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::{ExtractionError, FetchError},
    model::UsageMetrics,
};

pub mod openai;
pub mod search;

pub use openai::OpenAiClient;
pub use search::SearchPageFetcher;

/// Source of the search-results page for a location.
#[async_trait]
pub trait PageSource: Send + Sync + Debug {
    async fn fetch_html(&self, location: &str) -> Result<String, FetchError>;
}

/// Raw reply of a chat-completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    pub usage: Option<UsageMetrics>,
}

/// A chat-completion backend constrained to JSON output.
#[async_trait]
pub trait ChatCompletion: Send + Sync + Debug {
    async fn complete(&self, system: &str, user: &str) -> Result<ChatReply, ExtractionError>;
}
