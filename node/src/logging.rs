//! Subscriber setup for `basket-node`.
//!
//! Events go to stderr so stdout stays a clean JSON result. `--log-level`
//! applies to the basket crates only; dependencies (sled in particular)
//! stay at `warn`. A set `RUST_LOG` replaces the whole directive.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose events `--log-level` controls.
const BASKET_TARGETS: [&str; 3] = ["basket_node", "basket_protocol", "basket_contracts"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines with targets.
    #[default]
    Pretty,
    /// One JSON object per event, for log shippers.
    Json,
}

/// Builds the filter directive used when `RUST_LOG` is unset, e.g.
/// `warn,basket_node=debug,basket_protocol=debug,basket_contracts=debug`.
pub fn basket_directive(level: tracing::Level) -> String {
    let level = level.as_str().to_lowercase();
    let mut directive = String::from("warn");
    for target in BASKET_TARGETS {
        directive.push_str(&format!(",{target}={level}"));
    }
    directive
}

/// Installs the global subscriber. Must run once, before any command.
pub fn init_logging(level: tracing::Level, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(basket_directive(level)));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_file(false))
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    tracing::debug!(?format, %level, "logging initialized");
}
