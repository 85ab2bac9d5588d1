use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Most recent posted identifiers kept for deduplication.
pub const POSTED_HISTORY_LIMIT: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedCategory {
    News,
    Blog,
    Press,
}

impl FeedCategory {
    pub const ALL: [FeedCategory; 3] = [FeedCategory::News, FeedCategory::Blog, FeedCategory::Press];
}

impl fmt::Display for FeedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedCategory::News => write!(f, "news"),
            FeedCategory::Blog => write!(f, "blog"),
            FeedCategory::Press => write!(f, "press"),
        }
    }
}

/// Per-category pagination cursors. `None` means "from the beginning".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedCursors {
    pub news: Option<String>,
    pub blog: Option<String>,
    pub press: Option<String>,
}

impl FeedCursors {
    pub fn get(&self, category: FeedCategory) -> Option<&str> {
        let value = match category {
            FeedCategory::News => &self.news,
            FeedCategory::Blog => &self.blog,
            FeedCategory::Press => &self.press,
        };
        value.as_deref().filter(|cursor| !cursor.is_empty())
    }

    fn slot(&mut self, category: FeedCategory) -> &mut Option<String> {
        match category {
            FeedCategory::News => &mut self.news,
            FeedCategory::Blog => &mut self.blog,
            FeedCategory::Press => &mut self.press,
        }
    }

    /// Copies every non-empty cursor from `reported`; absent or empty
    /// reported values never clear a cursor. Returns the categories that
    /// changed.
    pub fn advance(&mut self, reported: &FeedCursors) -> Vec<FeedCategory> {
        let mut advanced = Vec::new();
        for category in FeedCategory::ALL {
            if let Some(value) = reported.get(category) {
                let slot = self.slot(category);
                if slot.as_deref() != Some(value) {
                    *slot = Some(value.to_string());
                    advanced.push(category);
                }
            }
        }
        advanced
    }

    pub fn is_empty(&self) -> bool {
        FeedCategory::ALL.iter().all(|category| self.get(*category).is_none())
    }
}

/// Persisted bot state.
///
/// Field names match the on-disk JSON document. Keys this version does not
/// know about are kept in `extra` so a save never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(rename = "updatesAfterNewsUri", default)]
    pub news_cursor: Option<String>,
    #[serde(rename = "updatesAfterBlogUri", default)]
    pub blog_cursor: Option<String>,
    #[serde(rename = "updatesAfterPrUri", default)]
    pub press_cursor: Option<String>,
    #[serde(rename = "postedArticleUris", default)]
    pub posted_uris: Vec<String>,
    #[serde(rename = "bootstrapCompleted", default)]
    pub bootstrap_completed: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Checkpoint {
    pub fn cursors(&self) -> FeedCursors {
        FeedCursors {
            news: self.news_cursor.clone(),
            blog: self.blog_cursor.clone(),
            press: self.press_cursor.clone(),
        }
    }

    /// Moves the stored cursors forward to what the feed reported.
    pub fn advance_cursors(&mut self, reported: &FeedCursors) -> Vec<FeedCategory> {
        let mut cursors = self.cursors();
        let advanced = cursors.advance(reported);
        self.news_cursor = cursors.news;
        self.blog_cursor = cursors.blog;
        self.press_cursor = cursors.press;
        advanced
    }

    pub fn has_posted(&self, uri: &str) -> bool {
        self.posted_uris.iter().any(|posted| posted == uri)
    }
}
