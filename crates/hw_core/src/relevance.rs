//! Keyword relevance filter.
//!
//! An article is on topic when the query phrase occurs verbatim in its text,
//! or when the text carries at least one subject term and one activity term.
//! Every check is a case-insensitive substring test over a single corpus
//! built from the title, the body and the English concept labels.

use crate::types::Article;

pub const BITCOIN_TERMS: &[&str] = &["bitcoin", "btc"];

pub const MINING_TERMS: &[&str] = &[
    "mining",
    "miner",
    "miners",
    "hashrate",
    "hash rate",
    "hashpower",
    "hash power",
    "difficulty",
    "asic",
    "asics",
    "rig",
    "rigs",
    "exahash",
    "terahash",
    "proof-of-work",
    "proof of work",
];

/// The two term groups used by the relaxed matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSets {
    pub subject: Vec<String>,
    pub activity: Vec<String>,
}

impl TermSets {
    pub fn new<S, A>(subject: S, activity: A) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        Self {
            subject: subject.into_iter().map(|t| t.as_ref().to_lowercase()).collect(),
            activity: activity.into_iter().map(|t| t.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn bitcoin_mining() -> Self {
        Self::new(BITCOIN_TERMS, MINING_TERMS)
    }
}

impl Default for TermSets {
    fn default() -> Self {
        Self::bitcoin_mining()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelevanceMatcher {
    terms: TermSets,
}

impl RelevanceMatcher {
    pub fn new(terms: TermSets) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &TermSets {
        &self.terms
    }

    pub fn is_relevant(&self, article: &Article, query: &str) -> bool {
        let corpus = searchable_text(article);

        let query = query.to_lowercase();
        if corpus.contains(&query) {
            return true;
        }

        contains_any(&corpus, &self.terms.subject) && contains_any(&corpus, &self.terms.activity)
    }
}

/// Lower-cased title, body and English concept labels joined by spaces.
fn searchable_text(article: &Article) -> String {
    let mut fields = vec![
        article.title.as_deref().unwrap_or_default(),
        article.body.as_deref().unwrap_or_default(),
    ];
    fields.extend(article.concepts.iter().filter_map(|c| c.english_label()));
    fields.join(" ").to_lowercase()
}

fn contains_any(corpus: &str, terms: &[String]) -> bool {
    terms.iter().any(|term| !term.is_empty() && corpus.contains(term.as_str()))
}
