use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use hw_core::{Error, Poster, Result};
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::oauth::{self, OAuthKeys};

pub const DEFAULT_API_URL: &str = "https://api.twitter.com";

const TWEETS_PATH: &str = "2/tweets";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(15 * 60);
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

const ACCESS_SECRET_VAR: &str = "TWITTER_ACCESS_TOKEN_SECRET";
const LEGACY_ACCESS_SECRET_VAR: &str = "TWITTER_ACCESS_SECRET";

/// User-context credentials for posting.
#[derive(Clone)]
pub struct TwitterCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

impl TwitterCredentials {
    pub fn from_env(allow_missing: bool) -> Result<Option<Self>> {
        Self::from_lookup(|name| std::env::var(name).ok(), allow_missing)
    }

    /// Reads the credentials through `lookup`.
    ///
    /// With `allow_missing` (dry runs) incomplete credentials yield `None`;
    /// otherwise they are a configuration error naming every missing
    /// variable.
    pub fn from_lookup<F>(lookup: F, allow_missing: bool) -> Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let api_key = read("TWITTER_API_KEY");
        let api_secret = read("TWITTER_API_SECRET");
        let access_token = read("TWITTER_ACCESS_TOKEN");
        let mut access_token_secret = read(ACCESS_SECRET_VAR);
        let mut secret_var = ACCESS_SECRET_VAR;
        if access_token_secret.is_none() {
            if let Some(legacy) = read(LEGACY_ACCESS_SECRET_VAR) {
                debug!(
                    "Using {} as fallback for {}",
                    LEGACY_ACCESS_SECRET_VAR, ACCESS_SECRET_VAR
                );
                access_token_secret = Some(legacy);
                secret_var = LEGACY_ACCESS_SECRET_VAR;
            }
        }

        match (api_key, api_secret, access_token, access_token_secret) {
            (Some(api_key), Some(api_secret), Some(access_token), Some(access_token_secret)) => {
                Ok(Some(Self {
                    api_key,
                    api_secret,
                    access_token,
                    access_token_secret,
                }))
            }
            (api_key, api_secret, access_token, access_token_secret) => {
                let missing: Vec<&str> = [
                    ("TWITTER_API_KEY", api_key.is_none()),
                    ("TWITTER_API_SECRET", api_secret.is_none()),
                    ("TWITTER_ACCESS_TOKEN", access_token.is_none()),
                    (secret_var, access_token_secret.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, is_missing)| is_missing.then_some(name))
                .collect();
                let joined = missing.join(", ");

                if allow_missing {
                    info!("Skipping Twitter client initialisation; missing credentials: {}", joined);
                    return Ok(None);
                }
                Err(Error::Configuration(format!(
                    "Missing Twitter credentials: {joined}. Set the variables before running."
                )))
            }
        }
    }

    fn keys(&self) -> OAuthKeys<'_> {
        OAuthKeys {
            consumer_key: &self.api_key,
            consumer_secret: &self.api_secret,
            token: &self.access_token,
            token_secret: &self.access_token_secret,
        }
    }
}

/// Posts through the v2 create-post endpoint.
#[derive(Debug)]
pub struct TwitterPoster {
    client: reqwest::Client,
    credentials: TwitterCredentials,
    base_url: Url,
    max_rate_limit_wait: Duration,
}

impl TwitterPoster {
    pub fn new(credentials: TwitterCredentials) -> Result<Self> {
        Self::with_base_url(credentials, DEFAULT_API_URL)
    }

    pub fn with_base_url(credentials: TwitterCredentials, base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("hashwire/", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!("Initialising Twitter client for {}", base_url);
        Ok(Self {
            client,
            credentials,
            base_url,
            max_rate_limit_wait: MAX_RATE_LIMIT_WAIT,
        })
    }

    pub fn with_max_rate_limit_wait(mut self, wait: Duration) -> Self {
        self.max_rate_limit_wait = wait;
        self
    }

    async fn send(&self, text: &str) -> Result<reqwest::Response> {
        let url = self.base_url.join(TWEETS_PATH)?;
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp();
        let authorization = oauth::authorization_header(
            &self.credentials.keys(),
            "POST",
            url.as_str(),
            &[],
            &nonce,
            timestamp,
        )?;

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| Error::Posting(format!("Request to Twitter failed: {e}")))?;
        Ok(response)
    }
}

/// How long to wait before retrying a rate-limited request.
fn rate_limit_wait(headers: &HeaderMap, now: i64, cap: Duration) -> Duration {
    headers
        .get("x-rate-limit-reset")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<i64>().ok())
        .map(|reset| Duration::from_secs((reset - now).max(1) as u64))
        .unwrap_or(DEFAULT_RATE_LIMIT_WAIT)
        .min(cap)
}

#[async_trait]
impl Poster for TwitterPoster {
    fn name(&self) -> &str {
        "Twitter"
    }

    async fn post(&self, text: &str) -> Result<()> {
        let mut response = self.send(text).await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let wait = rate_limit_wait(
                response.headers(),
                chrono::Utc::now().timestamp(),
                self.max_rate_limit_wait,
            );
            warn!("Twitter rate limit reached, retrying in {}s", wait.as_secs());
            tokio::time::sleep(wait).await;
            response = self.send(text).await?;
        }

        let status = response.status();
        if status.is_success() {
            debug!("Twitter accepted post ({})", status);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Posting(format!("Twitter returned {status}: {body}")))
    }
}
