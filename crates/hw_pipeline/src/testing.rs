use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use hw_core::{Article, ArticleSource, Error, FetchOutcome, FetchRequest, Poster, Result};

/// Records every post; texts containing one of `rejected` fail.
#[derive(Default)]
pub(crate) struct RecordingPoster {
    pub posts: Mutex<Vec<String>>,
    pub rejected: Vec<String>,
}

impl RecordingPoster {
    pub fn rejecting(marker: &str) -> Self {
        Self {
            rejected: vec![marker.to_string()],
            ..Self::default()
        }
    }

    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Poster for RecordingPoster {
    fn name(&self) -> &str {
        "recording"
    }

    async fn post(&self, text: &str) -> Result<()> {
        if self.rejected.iter().any(|marker| text.contains(marker.as_str())) {
            return Err(Error::Posting("403 Forbidden".to_string()));
        }
        self.posts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Returns queued fetch results in order, then empty outcomes.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    pub results: Mutex<VecDeque<Result<FetchOutcome>>>,
    pub requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedSource {
    pub fn new(results: Vec<Result<FetchOutcome>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            requests: Mutex::default(),
        }
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome> {
        self.requests.lock().unwrap().push(request.clone());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(FetchOutcome::default()))
    }
}

pub(crate) fn mining_article(uri: &str, title: &str) -> Article {
    Article::new(uri)
        .with_title(title)
        .with_body("Bitcoin mining difficulty climbs as miners add capacity")
        .with_url(format!("https://example.com/{uri}"))
}
