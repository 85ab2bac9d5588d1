use crate::types::Article;

/// Post length limit of the social platform, in characters.
pub const MAX_TWEET_LENGTH: usize = 280;
/// Longest body excerpt carried into a post, before the length check.
pub const SUMMARY_LIMIT: usize = 160;

const SEPARATOR: &str = " — ";
const ELLIPSIS: char = '…';

/// Builds the post text for an article: title, optional body excerpt and
/// link, shortened with an ellipsis when it does not fit.
///
/// Lengths are counted in characters. The link is kept verbatim at the end
/// whenever it can fit beside a one-character excerpt; a link too long for
/// that is left out.
pub fn format_post(article: &Article) -> String {
    let title = article.display_title().trim();
    let summary = summarize(article.body.as_deref().unwrap_or_default());
    let text = if summary.is_empty() {
        title.to_string()
    } else {
        format!("{title}{SEPARATOR}{summary}")
    };
    let url = article.link().unwrap_or_default();

    let candidate = if url.is_empty() {
        text.clone()
    } else {
        format!("{text} {url}").trim().to_string()
    };
    if char_len(&candidate) <= MAX_TWEET_LENGTH {
        return candidate;
    }

    let url = if char_len(url) + 2 > MAX_TWEET_LENGTH { "" } else { url };
    let available = if url.is_empty() {
        MAX_TWEET_LENGTH
    } else {
        MAX_TWEET_LENGTH - char_len(url) - 1
    };

    let mut truncated = take_chars(&text, available.saturating_sub(1))
        .trim_end()
        .to_string();
    if truncated.ends_with('.') {
        truncated.pop();
    }
    truncated.push(ELLIPSIS);

    if url.is_empty() {
        truncated
    } else {
        format!("{truncated} {url}").trim().to_string()
    }
}

fn summarize(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    take_chars(&collapsed, SUMMARY_LIMIT).trim_end().to_string()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn take_chars(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
