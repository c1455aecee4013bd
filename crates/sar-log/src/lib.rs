//! Structured logging setup (spec §10.1): one function, [`init`], installs
//! a global `tracing_subscriber` formatter from a [`LogConfig`].
//!
//! A deliberately small subset of the teacher's `nebula-log` surface — no
//! file rotation, no OpenTelemetry/Sentry export, no reload handle — just
//! the env-filter plus human/JSON formatting switch every subsystem's
//! `tracing::info!`/`warn!`/`debug!`/`error!` calls need somewhere to land.
//! Loader file-validation failures, registry reloads, version-detection
//! fallthroughs and step retries all go through those macros rather than
//! `println!`/`eprintln!`.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid log filter directive `{directive}`: {source}")]
    InvalidFilter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// What to log and how to format it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// An `EnvFilter` directive string, e.g. `"info"` or
    /// `"sar_executor=debug,warn"`.
    pub level: String,
    /// Emit one JSON object per event instead of a human-readable line.
    pub json: bool,
    /// Colorize human-readable output. Ignored when `json` is set.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            ansi: true,
        }
    }
}

/// Install a global `tracing` subscriber built from `config`.
///
/// Call once, at process start. A second call (or a test binary that has
/// already installed one) returns [`LogError::AlreadyInitialized`] rather
/// than panicking, so a host embedding this crate can call `init`
/// defensively.
pub fn init(config: &LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(&config.level).map_err(|source| LogError::InvalidFilter {
        directive: config.level.clone(),
        source,
    })?;

    let init_result = if config.json {
        let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);
        Registry::default().with(filter).with(fmt_layer).try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer().with_ansi(config.ansi).with_target(true);
        Registry::default().with(filter).with(fmt_layer).try_init()
    };

    init_result.map_err(|_| LogError::AlreadyInitialized)
}
