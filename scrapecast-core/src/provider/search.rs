use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use crate::{config::SearchConfig, error::FetchError};

use super::PageSource;

/// Fetches the HTML results page of a public search engine.
#[derive(Debug, Clone)]
pub struct SearchPageFetcher {
    url: String,
    http: Client,
}

impl SearchPageFetcher {
    pub fn new(config: &SearchConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { url: config.url.clone(), http })
    }
}

pub fn search_terms(location: &str) -> String {
    format!("{location} weather today")
}

#[async_trait]
impl PageSource for SearchPageFetcher {
    async fn fetch_html(&self, location: &str) -> Result<String, FetchError> {
        let query = search_terms(location);
        debug!(%query, url = %self.url, "fetching search results");

        let res = self
            .http
            .get(&self.url)
            .query(&[("t", "h_"), ("q", query.as_str())])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "search results request failed");
            return Err(FetchError::Status { status: status.as_u16() });
        }

        let body = res.text().await?;
        debug!(bytes = body.len(), "search results fetched");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> SearchConfig {
        SearchConfig { url: format!("{}/html/", server.uri()), ..SearchConfig::default() }
    }

    #[test]
    fn search_terms_append_weather_today() {
        assert_eq!(search_terms("New York"), "New York weather today");
    }

    #[tokio::test]
    async fn returns_body_with_browser_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("q", "Paris weather today"))
            .and(header_regex("user-agent", "^Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = SearchPageFetcher::new(&config_for(&server)).unwrap();
        let html = fetcher.fetch_html("Paris").await.expect("fetch succeeds");

        assert_eq!(html, "<html>ok</html>");
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = SearchPageFetcher::new(&config_for(&server)).unwrap();
        let err = fetcher.fetch_html("Paris").await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn slow_remote_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = SearchConfig { timeout_secs: 1, ..config_for(&server) };
        let fetcher = SearchPageFetcher::new(&config).unwrap();
        let err = fetcher.fetch_html("Paris").await.unwrap_err();

        assert!(matches!(err, FetchError::Timeout));
    }
}
