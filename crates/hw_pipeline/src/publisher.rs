//! At-most-once publishing of relevant articles.
//!
//! The policy walks the candidates in the order given, skips anything that
//! has no URI or was posted before, and records a URI in the checkpoint
//! only once the post succeeded. A failed post leaves the article eligible
//! for the next cycle.
//!
//! On the first run against a fresh checkpoint, with a non-zero bootstrap
//! cap, at most `bootstrap_cap` articles go out and the checkpoint is then
//! marked bootstrapped, even if nothing qualified. Candidates beyond the
//! cap are not recorded, so they are considered again next cycle.

use std::collections::HashSet;
use std::sync::Arc;

use hw_core::{format_post, Article, Checkpoint, Error, Poster, Result, POSTED_HISTORY_LIMIT};

use crate::logging::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishConfig {
    /// Posts allowed on the first run; `0` disables the cap.
    pub bootstrap_cap: usize,
    pub history_limit: usize,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            bootstrap_cap: 0,
            history_limit: POSTED_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Articles posted, or that would have been in a dry run.
    pub posted: usize,
    pub skipped_missing_uri: usize,
    pub skipped_duplicate: usize,
    pub failed: usize,
    /// Candidates left for a later cycle by the bootstrap cap.
    pub deferred: usize,
    pub bootstrap_completed: bool,
}

pub struct PublishPolicy {
    poster: Option<Arc<dyn Poster>>,
    config: PublishConfig,
}

impl PublishPolicy {
    pub fn new(poster: Option<Arc<dyn Poster>>, config: PublishConfig) -> Self {
        Self { poster, config }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    pub fn has_poster(&self) -> bool {
        self.poster.is_some()
    }

    /// Per-article messages go through `log`, so callers can tag them with
    /// the cycle number and a dry-run marker.
    pub async fn publish(
        &self,
        candidates: &[Article],
        checkpoint: &mut Checkpoint,
        dry_run: bool,
        log: &Logger,
    ) -> Result<PublishReport> {
        let poster = if dry_run {
            None
        } else {
            Some(self.poster.as_deref().ok_or_else(|| {
                Error::Configuration(
                    "A posting client is required when not running in dry-run mode.".to_string(),
                )
            })?)
        };

        let cap = self.config.bootstrap_cap;
        let is_bootstrap_run = cap > 0 && !checkpoint.bootstrap_completed;
        let mut posted_uris = checkpoint.posted_uris.clone();
        let mut history_updated = false;
        let mut report = PublishReport::default();

        for (index, article) in candidates.iter().enumerate() {
            let Some(uri) = article.identifier() else {
                log.debug(&format!("Skipping article without URI: {}", article.display_title()));
                report.skipped_missing_uri += 1;
                continue;
            };
            if posted_uris.iter().any(|posted| posted == uri) {
                log.debug(&format!("Skipping already-posted article {uri}"));
                report.skipped_duplicate += 1;
                continue;
            }
            if is_bootstrap_run && report.posted >= cap {
                log.info(&format!("Bootstrap mode: reached post limit of {cap}"));
                report.deferred = deferred_count(&candidates[index..], &posted_uris);
                break;
            }

            let text = format_post(article);
            let Some(poster) = poster else {
                log.info(&format!("Would post tweet: {text}"));
                report.posted += 1;
                continue;
            };

            log.info(&format!("Posting tweet for article {uri}"));
            if let Err(e) = poster.post(&text).await {
                log.error(&format!("Failed to post tweet for {uri}: {e}"));
                report.failed += 1;
                continue;
            }

            posted_uris.push(uri.to_string());
            if posted_uris.len() > self.config.history_limit {
                let excess = posted_uris.len() - self.config.history_limit;
                posted_uris.drain(..excess);
            }
            history_updated = true;
            report.posted += 1;
        }

        if is_bootstrap_run {
            checkpoint.bootstrap_completed = true;
            history_updated = true;
            report.bootstrap_completed = true;
            log.info(&format!(
                "Bootstrap mode completed after posting {} articles",
                report.posted
            ));
        }

        if !dry_run && history_updated {
            checkpoint.posted_uris = posted_uris;
        }

        Ok(report)
    }
}

/// Distinct candidates still waiting to go out: identified and not yet posted.
fn deferred_count(remaining: &[Article], posted_uris: &[String]) -> usize {
    remaining
        .iter()
        .filter_map(Article::identifier)
        .filter(|uri| !posted_uris.iter().any(|posted| posted == uri))
        .collect::<HashSet<_>>()
        .len()
}
