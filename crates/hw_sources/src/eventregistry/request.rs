//! Request bodies for the Event Registry endpoints.

use hw_core::{FeedCategory, FetchRequest};
use serde_json::{json, Map, Value};

pub(crate) const MINUTE_STREAM_PATH: &str = "api/v1/minuteStreamArticles";
pub(crate) const GET_ARTICLES_PATH: &str = "api/v1/article/getArticles";

const RECENT_ACTIVITY_PREFIX: &str = "recentActivityArticles";
const ARTICLE_BODY_LEN: u32 = 400;
const MAX_ARTICLE_COUNT: usize = 100;

/// Request parameter carrying the cursor of a feed category.
pub(crate) fn cursor_param(category: FeedCategory) -> &'static str {
    match category {
        FeedCategory::News => "recentActivityArticlesNewsUpdatesAfterUri",
        FeedCategory::Blog => "recentActivityArticlesBlogsUpdatesAfterUri",
        FeedCategory::Press => "recentActivityArticlesPrUpdatesAfterUri",
    }
}

/// Article fields requested from both endpoints: title, a 400 character
/// body, url and concepts.
fn article_info(prefix: Option<&str>) -> Map<String, Value> {
    let flags = [
        ("includeArticleTitle", json!(true)),
        ("includeArticleBody", json!(true)),
        ("articleBodyLen", json!(ARTICLE_BODY_LEN)),
        ("includeArticleUrl", json!(true)),
        ("includeArticleConcepts", json!(true)),
        ("includeArticleAuthors", json!(false)),
        ("includeArticleCategories", json!(false)),
    ];

    flags
        .into_iter()
        .map(|(name, value)| {
            let key = match prefix {
                Some(prefix) => format!("{prefix}{}{}", name[..1].to_uppercase(), &name[1..]),
                None => name.to_string(),
            };
            (key, value)
        })
        .collect()
}

pub(crate) fn recent_activity_params(request: &FetchRequest, api_key: &str) -> Value {
    let mut params = Map::new();
    params.insert("apiKey".to_string(), json!(api_key));
    params.insert(
        format!("{RECENT_ACTIVITY_PREFIX}MaxArticleCount"),
        json!(MAX_ARTICLE_COUNT),
    );
    params.insert(format!("{RECENT_ACTIVITY_PREFIX}Keyword"), json!(request.query));

    if let Some(lang) = request.language.as_deref().filter(|lang| !lang.is_empty()) {
        params.insert("articleLang".to_string(), json!(lang));
    }

    for category in FeedCategory::ALL {
        if let Some(cursor) = request.cursors.get(category) {
            params.insert(cursor_param(category).to_string(), json!(cursor));
        }
    }

    params.extend(article_info(Some(RECENT_ACTIVITY_PREFIX)));
    Value::Object(params)
}

pub(crate) fn article_details_params(uris: &[String], api_key: &str) -> Value {
    let mut params = Map::new();
    params.insert("apiKey".to_string(), json!(api_key));
    params.insert("action".to_string(), json!("getArticles"));
    params.insert("resultType".to_string(), json!("articles"));
    params.insert("articleUri".to_string(), json!(uris));
    params.insert(
        "articlesCount".to_string(),
        json!(uris.len().min(MAX_ARTICLE_COUNT)),
    );
    params.extend(article_info(None));
    Value::Object(params)
}
