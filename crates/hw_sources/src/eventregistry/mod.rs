//! Event Registry recent-activity feed.
//!
//! One fetch calls the minute stream endpoint with the stored cursors, reads
//! the new cursors it reports, and then asks the article endpoint for the
//! full records of the returned URIs. Enrichment is best effort: when it
//! fails the sparse activity records are returned as they are.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use hw_core::{Article, ArticleSource, Error, FetchOutcome, FetchRequest, Result};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;

mod payload;
mod request;

use payload::{Record, RecentActivity};

pub const DEFAULT_BASE_URL: &str = "https://eventregistry.org";

/// Environment variables holding the API key, in order of preference.
pub const API_KEY_VARS: [&str; 2] = ["EVENT_REGISTRY_API_KEY", "NEWSAPI_API_KEY"];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Finds the Event Registry API key through `lookup` (normally the process
/// environment).
pub fn resolve_api_key<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    for name in API_KEY_VARS {
        if let Some(key) = lookup(name).filter(|key| !key.is_empty()) {
            if name != API_KEY_VARS[0] {
                debug!("Using {} as the Event Registry credential source", name);
            }
            return Ok(key);
        }
    }
    Err(Error::Configuration(
        "EVENT_REGISTRY_API_KEY is required to connect to Event Registry. \
         Provide the key via EVENT_REGISTRY_API_KEY or NEWSAPI_API_KEY."
            .to_string(),
    ))
}

pub struct EventRegistrySource {
    client: reqwest::Client,
    api_key: String,
    base_url: Url,
}

impl fmt::Debug for EventRegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistrySource")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl EventRegistrySource {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::Configuration(
                "EVENT_REGISTRY_API_KEY is required to connect to Event Registry.".to_string(),
            ));
        }

        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("hashwire/", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!("Initialising Event Registry client for {}", base_url);
        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.base_url.join(path)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Value>().await?)
    }

    async fn recent_activity(&self, request: &FetchRequest) -> Result<RecentActivity> {
        let params = request::recent_activity_params(request, &self.api_key);
        debug!("Requesting recent activity from Event Registry");

        let response = self
            .post_json(request::MINUTE_STREAM_PATH, &params)
            .await
            .map_err(|e| Error::Fetch(format!("Failed to fetch recent activity: {e}")))?;
        if let Some(message) = payload::api_error(&response) {
            return Err(Error::Fetch(format!("Event Registry rejected the request: {message}")));
        }

        Ok(payload::parse_recent_activity(&response))
    }

    async fn enrich(&self, activity: Vec<Record>) -> Vec<Record> {
        let uris: Vec<String> = activity.iter().filter_map(payload::record_uri).collect();
        if uris.is_empty() {
            return activity;
        }

        let params = request::article_details_params(&uris, &self.api_key);
        let response = match self.post_json(request::GET_ARTICLES_PATH, &params).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to enrich articles: {}", e);
                return activity;
            }
        };
        if let Some(message) = payload::api_error(&response) {
            warn!("Event Registry rejected the enrichment request: {}", message);
            return activity;
        }

        match payload::merge_details(activity.clone(), &response) {
            Some(merged) => merged,
            None => {
                warn!("Unexpected article enrichment payload from Event Registry");
                activity
            }
        }
    }
}

#[async_trait]
impl ArticleSource for EventRegistrySource {
    fn name(&self) -> &str {
        "Event Registry"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome> {
        let RecentActivity { records, cursors } = self.recent_activity(request).await?;

        if records.is_empty() {
            info!("No recent activity returned by Event Registry");
            return Ok(FetchOutcome {
                articles: Vec::new(),
                cursors,
            });
        }

        let enriched = self.enrich(records).await;
        info!("Retrieved {} enriched articles from recent activity", enriched.len());

        let articles: Vec<Article> = enriched.iter().map(payload::to_article).collect();
        Ok(FetchOutcome { articles, cursors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hw_core::FeedCursors;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> FetchRequest {
        FetchRequest {
            query: "bitcoin mining".to_string(),
            language: None,
            cursors: FeedCursors {
                news: Some("news-0".to_string()),
                ..FeedCursors::default()
            },
        }
    }

    fn activity_response() -> Value {
        json!({
            "recentActivityArticles": {
                "activity": [
                    {"uri": "uri-1", "title": "Original"},
                    {"title": "No uri here"}
                ],
                "newestUri": {"news": "news-1", "pr": "pr-1"}
            }
        })
    }

    async fn mount_activity(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/api/v1/minuteStreamArticles"))
            .and(body_partial_json(json!({
                "apiKey": "test-key",
                "recentActivityArticlesKeyword": "bitcoin mining",
                "recentActivityArticlesNewsUpdatesAfterUri": "news-0"
            })))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn test_resolve_api_key() {
        let env = HashMap::from([("NEWSAPI_API_KEY", "fallback"), ("EVENT_REGISTRY_API_KEY", "primary")]);
        let key = resolve_api_key(|name| env.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(key, "primary");

        let env = HashMap::from([("NEWSAPI_API_KEY", "fallback"), ("EVENT_REGISTRY_API_KEY", "")]);
        let key = resolve_api_key(|name| env.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(key, "fallback");

        let err = resolve_api_key(|_| None).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        assert!(matches!(EventRegistrySource::new(""), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let source = EventRegistrySource::new("secret-key").unwrap();
        let debug = format!("{source:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_fetch_enriches_and_reports_cursors() {
        let server = MockServer::start().await;
        mount_activity(&server, ResponseTemplate::new(200).set_body_json(activity_response())).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/article/getArticles"))
            .and(body_partial_json(json!({"articleUri": ["uri-1"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "articles": {"results": [{
                    "uri": "uri-1",
                    "title": "Detailed",
                    "body": "Fresh context",
                    "url": "https://example.com/1",
                    "concepts": [{"label": {"eng": "Bitcoin"}}]
                }]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = EventRegistrySource::with_base_url("test-key", &server.uri()).unwrap();
        let outcome = source.fetch(&request()).await.unwrap();

        assert_eq!(outcome.articles.len(), 2);
        assert_eq!(outcome.articles[0].title.as_deref(), Some("Detailed"));
        assert_eq!(outcome.articles[0].body.as_deref(), Some("Fresh context"));
        assert_eq!(outcome.articles[0].concepts.len(), 1);
        assert_eq!(outcome.articles[1].uri, None);
        assert_eq!(outcome.cursors.news.as_deref(), Some("news-1"));
        assert_eq!(outcome.cursors.blog, None);
        assert_eq!(outcome.cursors.press.as_deref(), Some("pr-1"));
    }

    #[tokio::test]
    async fn test_enrichment_failure_keeps_activity() {
        let server = MockServer::start().await;
        mount_activity(&server, ResponseTemplate::new(200).set_body_json(activity_response())).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/article/getArticles"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = EventRegistrySource::with_base_url("test-key", &server.uri()).unwrap();
        let outcome = source.fetch(&request()).await.unwrap();

        assert_eq!(outcome.articles[0].title.as_deref(), Some("Original"));
        assert_eq!(outcome.cursors.news.as_deref(), Some("news-1"));
    }

    #[tokio::test]
    async fn test_empty_activity_skips_enrichment() {
        let server = MockServer::start().await;
        mount_activity(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({
                "recentActivityArticles": {"activity": [], "newestUri": {"blog": "blog-1"}}
            })),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/article/getArticles"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let source = EventRegistrySource::with_base_url("test-key", &server.uri()).unwrap();
        let outcome = source.fetch(&request()).await.unwrap();

        assert!(outcome.articles.is_empty());
        assert_eq!(outcome.cursors.blog.as_deref(), Some("blog-1"));
    }

    #[tokio::test]
    async fn test_http_failure_is_a_fetch_error() {
        let server = MockServer::start().await;
        mount_activity(&server, ResponseTemplate::new(503)).await;

        let source = EventRegistrySource::with_base_url("test-key", &server.uri()).unwrap();
        let err = source.fetch(&request()).await.unwrap_err();

        assert!(matches!(err, Error::Fetch(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_api_error_payload_is_a_fetch_error() {
        let server = MockServer::start().await;
        mount_activity(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({"error": "Invalid API key"})),
        )
        .await;

        let source = EventRegistrySource::with_base_url("test-key", &server.uri()).unwrap();
        let err = source.fetch(&request()).await.unwrap_err();

        assert!(err.to_string().contains("Invalid API key"));
    }
}
