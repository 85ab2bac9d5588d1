use async_trait::async_trait;

use crate::checkpoint::FeedCursors;
use crate::types::Article;
use crate::Result;

#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub query: String,
    pub language: Option<String>,
    pub cursors: FeedCursors,
}

#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub articles: Vec<Article>,
    /// Cursors reported by the feed; only non-empty values are meaningful.
    pub cursors: FeedCursors,
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Returns the name of the news source
    fn name(&self) -> &str;

    /// Fetches articles published after the given cursors
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome>;
}
