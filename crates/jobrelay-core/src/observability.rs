//! Logging setup and span helpers.

use std::str::FromStr;
use std::sync::Once;

use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::Error;

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs (for log-ingesting CI runners).
    Json,
    /// Human-readable logs.
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else if value.eq_ignore_ascii_case("pretty") {
            Ok(Self::Pretty)
        } else {
            Err(Error::configuration(format!(
                "unknown log format `{value}` (expected `pretty` or `json`)"
            )))
        }
    }
}

/// Initializes the logging subsystem.
///
/// Safe to call more than once; later calls are no-ops.
///
/// `RUST_LOG` controls levels and defaults to `info`.
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_target(false))
                    .init();
            }
        }
    });
}

/// Creates the span wrapping one dispatch.
#[must_use]
pub fn dispatch_span(project: &str, queue_path: &str, commit: &str) -> Span {
    tracing::info_span!(
        "dispatch",
        project = project,
        queue = queue_path,
        commit = commit,
    )
}
