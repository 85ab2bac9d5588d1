use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Once;

use tracing::Level;

static INIT: Once = Once::new();

/// Logs through `tracing` with a chain of fixed prefixes such as
/// `[cycle 3]` or `[DRY RUN]`.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: VecDeque<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            prefixes: VecDeque::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push_back(prefix.into());
        self
    }

    fn render(&self, message: &str) -> String {
        let prefix = self.prefixes.iter().map(|p| format!("{} ", p)).collect::<String>();
        format!("{}{}", prefix, message)
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}", self.render(message));
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}", self.render(message));
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}", self.render(message));
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}", self.render(message));
    }
}

/// Parses a log level name; unknown names fall back to `INFO`.
pub fn parse_level(name: &str) -> Level {
    match name.trim().to_ascii_lowercase().as_str() {
        "warning" => Level::WARN,
        "critical" | "fatal" => Level::ERROR,
        other => Level::from_str(other).unwrap_or(Level::INFO),
    }
}

pub fn init_logging(level: Level) {
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            tracing_subscriber::fmt().with_max_level(level).init();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_are_rendered_in_order() {
        let logger = Logger::new().with_prefix("[cycle 2]").with_prefix("[DRY RUN]");
        assert_eq!(logger.render("Would post"), "[cycle 2] [DRY RUN] Would post");
        assert_eq!(Logger::new().render("plain"), "plain");
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("INFO"), Level::INFO);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("WARNING"), Level::WARN);
        assert_eq!(parse_level("critical"), Level::ERROR);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }
}
