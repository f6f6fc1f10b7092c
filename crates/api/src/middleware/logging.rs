//! Logging initialization.
//!
//! Output format comes from config (`json` for deployments, `pretty` for
//! local runs); `RUST_LOG` overrides the configured level entirely.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Filter directives applied when `RUST_LOG` is absent. Framework and
/// driver internals stay at warn so ingest-path logs dominate at debug.
fn default_directives(level: &str) -> String {
    format!("{level},tower_http=warn,hyper=warn,sqlx=warn")
}

/// Installs the global tracing subscriber.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.format == "pretty" {
        registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
    }
}
