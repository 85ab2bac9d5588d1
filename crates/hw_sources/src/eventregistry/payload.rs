//! Lenient decoding of Event Registry responses.
//!
//! The API is loosely typed, so responses are read as [`Value`] and every
//! field is picked out by hand. Anything with an unexpected shape is
//! treated as absent and logged; it never fails the fetch.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use hw_core::{Article, Concept, ConceptLabel, FeedCursors};
use serde_json::{Map, Value};
use tracing::warn;

pub(crate) type Record = Map<String, Value>;

#[derive(Debug, Default)]
pub(crate) struct RecentActivity {
    pub records: Vec<Record>,
    pub cursors: FeedCursors,
}

/// Error message the API embeds in an otherwise successful response.
pub(crate) fn api_error(response: &Value) -> Option<String> {
    response.get("error").map(|error| match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    })
}

pub(crate) fn parse_recent_activity(response: &Value) -> RecentActivity {
    let Some(section) = response.get("recentActivityArticles").filter(|s| s.is_object()) else {
        warn!("Unexpected activity payload returned by Event Registry");
        return RecentActivity::default();
    };

    let cursors = section.get("newestUri").map(parse_cursors).unwrap_or_default();

    let records = match section.get("activity") {
        Some(Value::Array(items)) => objects(items, "activity"),
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            warn!("Unexpected activity payload returned by Event Registry");
            Vec::new()
        }
    };

    RecentActivity { records, cursors }
}

fn parse_cursors(newest: &Value) -> FeedCursors {
    let cursor = |key: &str| newest.get(key).and_then(string_value);
    FeedCursors {
        news: cursor("news"),
        blog: cursor("blog"),
        press: cursor("pr"),
    }
}

fn objects(items: &[Value], what: &str) -> Vec<Record> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(record) => Some(record.clone()),
            _ => {
                warn!("Skipping malformed {} entry from Event Registry", what);
                None
            }
        })
        .collect()
}

/// Overlays detailed article records onto the matching activity records.
///
/// Returns `None` when the enrichment response does not have the expected
/// shape, in which case the caller keeps the activity records as they are.
pub(crate) fn merge_details(activity: Vec<Record>, response: &Value) -> Option<Vec<Record>> {
    let results = response.get("articles")?.get("results")?.as_array()?;

    let detailed_by_uri: HashMap<String, &Record> = results
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|record| Some((record_uri(record)?, record)))
        .collect();

    let merged = activity
        .into_iter()
        .map(|mut item| {
            let detailed = record_uri(&item).and_then(|uri| detailed_by_uri.get(&uri));
            if let Some(detailed) = detailed {
                item.extend(detailed.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            item
        })
        .collect();
    Some(merged)
}

pub(crate) fn record_uri(record: &Record) -> Option<String> {
    record
        .get("uri")
        .and_then(string_value)
        .filter(|uri| !uri.is_empty())
}

pub(crate) fn to_article(record: &Record) -> Article {
    let text = |key: &str| record.get(key).and_then(string_value);

    let concepts = match record.get("concepts") {
        Some(Value::Array(items)) => items.iter().filter_map(to_concept).collect(),
        _ => Vec::new(),
    };

    let published_at = text("dateTimePub")
        .or_else(|| text("dateTime"))
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let source_title = record
        .get("source")
        .and_then(|source| source.get("title"))
        .and_then(string_value);

    Article {
        uri: text("uri"),
        title: text("title"),
        body: text("body"),
        url: text("url"),
        permalink: text("permalink"),
        concepts,
        published_at,
        source_title,
    }
}

fn to_concept(entry: &Value) -> Option<Concept> {
    let label = match entry.get("label")? {
        Value::Object(labels) => {
            let labels: BTreeMap<String, String> = labels
                .iter()
                .filter_map(|(lang, label)| Some((lang.clone(), label.as_str()?.to_string())))
                .collect();
            ConceptLabel::Localized(labels)
        }
        Value::String(label) => ConceptLabel::Plain(label.clone()),
        _ => return None,
    };
    Some(Concept { label: Some(label) })
}

fn string_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
