//! Core library for `scrapecast`.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The upstream clients: search-results page and chat completion
//! - The extraction pipeline (fetch → snippets → prompt → LLM) and its cache
//! - Shared domain models (queries, records, token usage)
//!
//! It is used by `scrapecast-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod error;
pub mod extraction;
pub mod model;
pub mod prompt;
pub mod provider;
pub mod service;
pub mod snippet;

pub use config::{Config, PromptSource};
pub use error::{ConfigError, ExtractionError, FetchError, WeatherError};
pub use model::{UsageMetrics, WeatherQuery, WeatherRecord};
pub use provider::{ChatCompletion, PageSource};
pub use service::WeatherService;
