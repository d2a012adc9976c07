//! Logging initialization.
//!
//! Supports JSON or human-readable output, an optional daily-rotated log
//! file, and `RUST_LOG` overrides on top of the configured default filter.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the non-blocking file writer alive for the program duration.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let registry = tracing_subscriber::registry().with(env_filter);

    let file_guard = if config.file_enabled {
        let appender =
            tracing_appender::rolling::daily(&config.file_directory, &config.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        if config.json {
            registry
                .with(fmt::layer().json().with_writer(writer))
                .with(fmt::layer().json())
                .init();
        } else {
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(fmt::layer())
                .init();
        }
        Some(guard)
    } else {
        if config.json {
            registry.with(fmt::layer().json()).init();
        } else {
            registry.with(fmt::layer()).init();
        }
        None
    };

    tracing::info!(
        json = config.json,
        file_enabled = config.file_enabled,
        environment = %config.deployment_environment,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
