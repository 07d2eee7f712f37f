//! Structured logging setup
//!
//! Logs go to stderr through a `tracing` subscriber so that stdout only carries
//! the tool's progress messages. The level can be set programmatically, from
//! `FETCH_MELANGE_LOG_LEVEL`, or overridden wholesale with `RUST_LOG`.
//!
//! # Example
//!
//! ```no_run
//! use fetch_melange_source::util::logging;
//! use tracing::Level;
//!
//! logging::init_logging(logging::LoggingConfig::with_level(Level::DEBUG));
//! tracing::debug!(pipeline = "git-checkout", "Expanding pipeline template");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

const CRATE_TARGET: &str = "fetch_melange_source";

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target in logs
    pub include_target: bool,
}

impl Default for LoggingConfig {
    /// Errors only, plain text, with targets. Source extraction is quiet unless asked.
    fn default() -> Self {
        Self {
            level: Level::ERROR,
            use_json: false,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }
}

/// Parses a log level name, case-insensitively.
///
/// ```
/// use fetch_melange_source::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Some(Level::DEBUG));
/// assert_eq!(parse_level("WARN"), Some(Level::WARN));
/// assert_eq!(parse_level("noisy"), None);
/// ```
pub fn parse_level(level_str: &str) -> Option<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Installs the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();

        if env::var("RUST_LOG").is_err() {
            if let Ok(directive) = format!("{}={}", CRATE_TARGET, config.level).parse() {
                filter = filter.add_directive(directive);
            }
        }

        let layer = fmt::layer()
            .with_target(config.include_target)
            .with_writer(std::io::stderr);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init();
        } else {
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    });
}
