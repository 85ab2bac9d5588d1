use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use hw_core::{ArticleSource, Poster, RelevanceMatcher};
use hw_pipeline::{
    init_logging, parse_level, spawn_shutdown_listener, PollCycle, PollLoop, PublishConfig,
    PublishPolicy,
};
use hw_social::{TwitterCredentials, TwitterPoster};
use hw_sources::{resolve_api_key, EventRegistrySource};
use tracing::{error, info};

const DEFAULT_QUERY: &str = "bitcoin mining";

/// A poll interval such as `300`, `5m` or `1h15m30s`; a bare number is seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HumanDuration(Duration);

impl HumanDuration {
    fn unit_seconds(unit: char) -> Option<u64> {
        match unit {
            's' => Some(1),
            'm' => Some(60),
            'h' => Some(3600),
            'd' => Some(86_400),
            _ => None,
        }
    }
}

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let too_large = || format!("Duration is too large: {}", s.trim());
        let mut total: u64 = 0;
        let mut digits = String::new();
        let mut parts = 0;

        // A trailing space flushes a final unit-less number as seconds.
        for c in s.chars().chain(std::iter::once(' ')) {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            if c.is_whitespace() && digits.is_empty() {
                continue;
            }
            if digits.is_empty() {
                return Err(format!("Invalid character in duration: {}", c));
            }

            let unit = if c.is_whitespace() {
                1
            } else {
                Self::unit_seconds(c).ok_or_else(|| format!("Invalid duration unit: {}", c))?
            };
            let value: u64 = digits.parse().map_err(|_| too_large())?;
            total = value
                .checked_mul(unit)
                .and_then(|secs| total.checked_add(secs))
                .ok_or_else(too_large)?;
            digits.clear();
            parts += 1;
        }

        if parts == 0 {
            return Err("Duration must include a number".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total)))
    }
}

/// Posts Bitcoin mining news from Event Registry to X.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Keyword sent to Event Registry and matched as an exact phrase
    #[arg(long, env = "BOT_QUERY", default_value = DEFAULT_QUERY)]
    query: String,

    /// Where the bot checkpoint is kept
    #[arg(long, env = "BOT_STATE_PATH", default_value = "state.json")]
    state_file: PathBuf,

    /// Checkpoint backend: json or memory
    #[arg(long, default_value = "json")]
    storage: String,

    /// Restrict articles to one language code (e.g. eng)
    #[arg(long, env = "BOT_ARTICLE_LANG")]
    article_lang: Option<String>,

    /// Pause between polls in loop mode (e.g. 300, 5m, 1h15m)
    #[arg(long, env = "BOT_POLL_INTERVAL", default_value = "300")]
    poll_interval: HumanDuration,

    /// Keep polling until interrupted
    #[arg(long = "loop")]
    repeat: bool,

    /// Log the posts instead of sending them
    #[arg(long)]
    dry_run: bool,

    #[arg(long, env = "BOT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Posts allowed on the very first run; 0 disables the limit
    #[arg(long, env = "BOT_BOOTSTRAP_COUNT", default_value_t = 0)]
    bootstrap_count: usize,

    #[arg(long, default_value = hw_sources::DEFAULT_BASE_URL)]
    event_registry_url: String,

    #[arg(long, default_value = hw_social::DEFAULT_API_URL)]
    twitter_url: String,
}

impl Cli {
    fn effective_query(&self) -> &str {
        let query = self.query.trim();
        if query.is_empty() {
            DEFAULT_QUERY
        } else {
            query
        }
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn build_poster(cli: &Cli) -> anyhow::Result<Option<Arc<dyn Poster>>> {
    let Some(credentials) = TwitterCredentials::from_lookup(env_lookup, cli.dry_run)? else {
        return Ok(None);
    };
    let poster: Arc<dyn Poster> = Arc::new(
        TwitterPoster::with_base_url(credentials, &cli.twitter_url)
            .context("Failed to create the X client")?,
    );
    Ok(Some(poster))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let query = cli.effective_query().to_string();
    info!("Using query: {}", query);

    let api_key = resolve_api_key(env_lookup)?;
    let source: Arc<dyn ArticleSource> = Arc::new(
        EventRegistrySource::with_base_url(api_key, &cli.event_registry_url)
            .context("Failed to create the Event Registry client")?,
    );
    let poster = build_poster(&cli)?;
    let store = hw_storage::create_store(&cli.storage, &cli.state_file)?;

    let policy = PublishPolicy::new(
        poster,
        PublishConfig {
            bootstrap_cap: cli.bootstrap_count,
            ..PublishConfig::default()
        },
    );
    let cycle = PollCycle::new(source, RelevanceMatcher::default(), policy, query)
        .with_language(cli.article_lang.clone());
    let runner = PollLoop::new(cycle, store)
        .interval(cli.poll_interval.0)
        .repeat(cli.repeat)
        .dry_run(cli.dry_run);

    if cli.repeat {
        info!(
            "Running in loop mode with {}s interval",
            runner.poll_interval().as_secs()
        );
    }

    let cycles = runner.run(spawn_shutdown_listener()).await?;
    info!("Finished after {} cycle(s)", cycles);
    Ok(())
}

/// 2 for configuration problems, 1 for anything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<hw_core::Error>() {
        Some(hw_core::Error::Configuration(_)) => 2,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(parse_level(&cli.log_level));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
