//! # Logging
//!
//! Environment-aware console logging using the tracing ecosystem. Logs go to
//! stdout for the container runtime to collect.
//!
//! ## Configuration
//!
//! | Variable | Effect |
//! |---|---|
//! | `LOG_LEVEL` / `RUST_LOG` | filter directive, e.g. `info` or `order_dispatch=debug` |
//! | `ORDER_PIPELINE_ENV` / `APP_ENV` | `production` logs at `info`, anything else at `debug` |
//! | `LOG_FORMAT=json` | one JSON object per line instead of human-readable text |
//!
//! ANSI colors are only used when stdout is a terminal.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install the global subscriber
///
/// Safe to call more than once, and safe to call when another subscriber is
/// already installed (the existing one is kept).
pub fn init_tracing() {
    TRACING_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let use_ansi = IsTerminal::is_terminal(&std::io::stdout());
        let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

        let console_layer = if json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_filter(EnvFilter::new(&log_level))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(use_ansi)
                .with_filter(EnvFilter::new(&log_level))
                .boxed()
        };

        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        } else {
            tracing::info!(
                environment = %environment,
                log_level = %log_level,
                ansi_colors = use_ansi,
                json,
                "Console logging initialized"
            );
        }
    });
}

fn get_environment() -> String {
    std::env::var("ORDER_PIPELINE_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> String {
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        return level.to_lowercase();
    }
    if let Ok(level) = std::env::var("RUST_LOG") {
        return level.to_lowercase();
    }
    default_level(environment).to_string()
}

fn default_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}
