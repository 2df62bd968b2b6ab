use std::{num::NonZeroUsize, sync::Arc};
use tracing::{error, info, instrument};

use crate::{
    cache::ResponseCache,
    config::{Config, PromptSource},
    error::{ConfigError, WeatherError},
    extraction::Extractor,
    model::{WeatherQuery, WeatherRecord},
    prompt::build_prompt,
    provider::{ChatCompletion, OpenAiClient, PageSource, SearchPageFetcher},
    snippet::clean_html,
};

/// The fetch → extract → prompt → LLM pipeline behind a response cache.
pub struct WeatherService {
    pages: Arc<dyn PageSource>,
    extractor: Extractor,
    prompt_source: PromptSource,
    cache: ResponseCache,
}

impl WeatherService {
    pub fn new(
        pages: Arc<dyn PageSource>,
        llm: Arc<dyn ChatCompletion>,
        prompt_source: PromptSource,
        cache_capacity: NonZeroUsize,
    ) -> Self {
        Self {
            pages,
            extractor: Extractor::new(llm),
            prompt_source,
            cache: ResponseCache::new(cache_capacity),
        }
    }

    /// Builds the service with the real search and OpenAI clients.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;
        let api_key = config.api_key()?.to_string();

        let pages = SearchPageFetcher::new(&config.search)?;
        let llm = OpenAiClient::new(api_key, &config.openai)?;
        let capacity = NonZeroUsize::new(config.cache.max_entries).ok_or(ConfigError::Invalid {
            field: "cache.max_entries",
            reason: "must be greater than zero".to_string(),
        })?;

        Ok(Self::new(Arc::new(pages), Arc::new(llm), config.prompt_source, capacity))
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Looks up weather for `query`, serving repeated locations from cache.
    #[instrument(skip(self, query), fields(location = %query.location))]
    pub async fn lookup(&self, query: &WeatherQuery) -> Result<WeatherRecord, WeatherError> {
        self.cache
            .get_or_try_insert_with(&query.location, || self.run_pipeline(&query.location))
            .await
            .inspect_err(|e| error!(error = %e, "weather lookup failed"))
    }

    async fn run_pipeline(&self, location: &str) -> Result<WeatherRecord, WeatherError> {
        info!("cache miss, querying upstream");

        let html = self.pages.fetch_html(location).await?;

        let context = match self.prompt_source {
            PromptSource::Snippets => clean_html(&html),
            PromptSource::RawHtml => html,
        };
        if context.is_empty() {
            info!("no weather snippets found on page");
        }

        let prompt = build_prompt(location, &context);
        let record = self.extractor.extract(&prompt).await?;

        info!(
            resolved = %record.location,
            total_tokens = record.usage.as_ref().map(|u| u.total_tokens),
            "weather extracted"
        );
        Ok(record)
    }
}
