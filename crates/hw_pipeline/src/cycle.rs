use std::fmt;
use std::sync::Arc;

use hw_core::{
    Article, ArticleSource, Checkpoint, FeedCategory, FetchRequest, RelevanceMatcher, Result,
};

use crate::logging::Logger;
use crate::publisher::{PublishPolicy, PublishReport};

/// Outcome of a single fetch, filter and publish pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub relevant: usize,
    /// The fetch failed and the checkpoint was left untouched.
    pub fetch_failed: bool,
    pub cursors_advanced: Vec<FeedCategory>,
    pub publish: PublishReport,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fetch_failed {
            return write!(f, "fetch failed, nothing published");
        }
        write!(
            f,
            "{} fetched, {} relevant, {} posted, {} duplicate, {} failed",
            self.fetched,
            self.relevant,
            self.publish.posted,
            self.publish.skipped_duplicate,
            self.publish.failed
        )?;
        if self.publish.deferred > 0 {
            write!(f, ", {} deferred", self.publish.deferred)?;
        }
        Ok(())
    }
}

/// Fetches new articles, keeps the relevant ones and hands them to the
/// publish policy, updating the checkpoint in place.
pub struct PollCycle {
    source: Arc<dyn ArticleSource>,
    matcher: RelevanceMatcher,
    policy: PublishPolicy,
    query: String,
    language: Option<String>,
}

impl PollCycle {
    pub fn new(
        source: Arc<dyn ArticleSource>,
        matcher: RelevanceMatcher,
        policy: PublishPolicy,
        query: impl Into<String>,
    ) -> Self {
        Self {
            source,
            matcher,
            policy,
            query: query.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language.filter(|lang| !lang.trim().is_empty());
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn policy(&self) -> &PublishPolicy {
        &self.policy
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn filter_relevant(&self, articles: Vec<Article>) -> Vec<Article> {
        articles
            .into_iter()
            .filter(|article| self.matcher.is_relevant(article, &self.query))
            .collect()
    }

    pub async fn run_once(
        &self,
        checkpoint: &mut Checkpoint,
        dry_run: bool,
        log: &Logger,
    ) -> Result<CycleReport> {
        let request = FetchRequest {
            query: self.query.clone(),
            language: self.language.clone(),
            cursors: checkpoint.cursors(),
        };

        let outcome = match self.source.fetch(&request).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log.error(&format!("Failed to fetch articles from {}: {e}", self.source.name()));
                return Ok(CycleReport {
                    fetch_failed: true,
                    ..CycleReport::default()
                });
            }
        };

        let cursors_advanced = checkpoint.advance_cursors(&outcome.cursors);
        for category in &cursors_advanced {
            log.debug(&format!("Advanced {category} cursor"));
        }

        let fetched = outcome.articles.len();
        let relevant = self.filter_relevant(outcome.articles);
        log.info(&format!(
            "Fetched {fetched} articles from {}, {} relevant",
            self.source.name(),
            relevant.len()
        ));

        let publish = self.policy.publish(&relevant, checkpoint, dry_run, log).await?;

        Ok(CycleReport {
            fetched,
            relevant: relevant.len(),
            fetch_failed: false,
            cursors_advanced,
            publish,
        })
    }
}
