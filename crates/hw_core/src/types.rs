use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNTITLED_ARTICLE: &str = "Untitled article";

/// A news article as returned by the fetch collaborator.
///
/// Every field is optional: the upstream API returns sparse activity
/// records and only fills them in after enrichment. An article without a
/// `uri` can still be scored for relevance but is never published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub uri: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
    pub permalink: Option<String>,
    #[serde(default)]
    pub concepts: Vec<Concept>,
    pub published_at: Option<DateTime<Utc>>,
    pub source_title: Option<String>,
}

impl Article {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_concept(mut self, label: ConceptLabel) -> Self {
        self.concepts.push(Concept { label: Some(label) });
        self
    }

    /// The publishing identity of the article, if it has a usable one.
    pub fn identifier(&self) -> Option<&str> {
        self.uri.as_deref().filter(|uri| !uri.is_empty())
    }

    /// Canonical link, falling back to the permalink.
    pub fn link(&self) -> Option<&str> {
        self.url
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| self.permalink.as_deref().filter(|url| !url.is_empty()))
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(UNTITLED_ARTICLE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub label: Option<ConceptLabel>,
}

impl Concept {
    pub fn english_label(&self) -> Option<&str> {
        self.label.as_ref().and_then(ConceptLabel::english)
    }
}

/// Topic label attached to an article, either keyed by language or flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConceptLabel {
    Localized(BTreeMap<String, String>),
    Plain(String),
}

impl ConceptLabel {
    pub const ENGLISH: &'static str = "eng";

    pub fn english(&self) -> Option<&str> {
        match self {
            ConceptLabel::Localized(labels) => labels.get(Self::ENGLISH).map(String::as_str),
            ConceptLabel::Plain(label) => Some(label.as_str()),
        }
    }

    pub fn localized(lang: &str, label: impl Into<String>) -> Self {
        ConceptLabel::Localized(BTreeMap::from([(lang.to_string(), label.into())]))
    }
}
