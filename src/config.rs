//! # Pipeline Configuration
//!
//! All settings are read once at startup. Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. Optional TOML file named by `ORDER_PIPELINE_CONFIG`
//! 3. Process environment (`MONGOURL`, `AMQPURL`, `TEAMNAME`, ...)
//!
//! Numeric tunables that fail to parse fall back to their defaults with a
//! warning rather than aborting startup.

use std::collections::HashMap;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::redact_url;
use crate::constants;
use crate::resilience::RetryPolicy;

pub const CONFIG_FILE_ENV: &str = "ORDER_PIPELINE_CONFIG";

const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(error: config::ConfigError) -> Self {
        Self::Load(error.to_string())
    }
}

/// Raw key/value view; every key is the lower-cased environment variable name
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    challengeappinsights_key: Option<String>,
    appinsights_key: Option<String>,
    mongourl: Option<String>,
    amqpurl: Option<String>,
    teamname: Option<String>,
    mongopool_limit: Option<String>,
    source: Option<String>,
    retry_max_attempts: Option<String>,
    retry_delay_ms: Option<String>,
    send_timeout_ms: Option<String>,
    store_connect_timeout_ms: Option<String>,
    otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Key of the mandatory telemetry collector
    pub challenge_insights_key: Option<String>,
    /// Key of the optional, team-provided telemetry collector
    pub custom_insights_key: Option<String>,
    pub store_url: String,
    pub bus_url: String,
    /// Team/tenant tag carried on every event and published envelope
    pub team_name: String,
    /// Hard cap on concurrent store sockets
    pub pool_limit: usize,
    /// Replacement for blank or placeholder order sources
    pub default_source: String,
    pub retry: RetryPolicy,
    pub send_timeout: Duration,
    pub store_connect_timeout: Duration,
    pub otlp_endpoint: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            challenge_insights_key: None,
            custom_insights_key: None,
            store_url: String::new(),
            bus_url: String::new(),
            team_name: String::new(),
            pool_limit: constants::store::DEFAULT_POOL_LIMIT,
            default_source: String::new(),
            retry: RetryPolicy::default(),
            send_timeout: Duration::from_millis(constants::bus::SEND_TIMEOUT_MS),
            store_connect_timeout: Duration::from_millis(constants::store::CONNECT_TIMEOUT_MS),
            otlp_endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load from the optional config file and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            info!(path = %path, "Loading configuration file");
            builder = builder.add_source(File::with_name(&path).required(true));
        }
        let raw: RawConfig = builder
            .add_source(Environment::default())
            .build()?
            .try_deserialize()?;
        Ok(Self::from_raw(raw))
    }

    /// Load from an explicit variable map instead of the process environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let raw: RawConfig = Config::builder()
            .add_source(Environment::default().source(Some(vars)))
            .build()?
            .try_deserialize()?;
        Ok(Self::from_raw(raw))
    }

    /// Load a TOML file, with `vars` layered on top
    pub fn from_file(path: &str, vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let raw: RawConfig = Config::builder()
            .add_source(File::with_name(path).required(true))
            .add_source(Environment::default().source(Some(vars)))
            .build()?
            .try_deserialize()?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let defaults = Self::default();

        let pool_limit = parse_or_default(
            "MONGOPOOL_LIMIT",
            raw.mongopool_limit.as_deref(),
            defaults.pool_limit,
        )
        .max(1);
        info!(
            pool_limit,
            "Store pool limit set to {}. Override with the MONGOPOOL_LIMIT environment variable", pool_limit
        );

        let max_attempts = parse_or_default(
            "RETRY_MAX_ATTEMPTS",
            raw.retry_max_attempts.as_deref(),
            defaults.retry.max_attempts(),
        );
        let retry_delay_ms = parse_or_default(
            "RETRY_DELAY_MS",
            raw.retry_delay_ms.as_deref(),
            defaults.retry.delay().as_millis() as u64,
        );
        let send_timeout_ms = parse_or_default(
            "SEND_TIMEOUT_MS",
            raw.send_timeout_ms.as_deref(),
            defaults.send_timeout.as_millis() as u64,
        );
        let connect_timeout_ms = parse_or_default(
            "STORE_CONNECT_TIMEOUT_MS",
            raw.store_connect_timeout_ms.as_deref(),
            defaults.store_connect_timeout.as_millis() as u64,
        );

        Self {
            challenge_insights_key: non_empty(raw.challengeappinsights_key),
            custom_insights_key: non_empty(raw.appinsights_key),
            store_url: raw.mongourl.unwrap_or_default(),
            bus_url: raw.amqpurl.unwrap_or_default(),
            team_name: raw.teamname.unwrap_or_default(),
            pool_limit,
            default_source: raw.source.unwrap_or_default(),
            retry: RetryPolicy::new(max_attempts, Duration::from_millis(retry_delay_ms)),
            send_timeout: Duration::from_millis(send_timeout_ms),
            store_connect_timeout: Duration::from_millis(connect_timeout_ms),
            otlp_endpoint: non_empty(raw.otlp_endpoint).unwrap_or(defaults.otlp_endpoint),
        }
    }

    /// Log every expected variable as set or missing, masking secrets
    pub fn report(&self) {
        report_variable("CHALLENGEAPPINSIGHTS_KEY", self.challenge_insights_key.as_deref().map(mask));
        report_variable("APPINSIGHTS_KEY", self.custom_insights_key.as_deref().map(mask));
        report_variable("MONGOURL", Some(redact_url(&self.store_url)).filter(|_| !self.store_url.is_empty()));
        report_variable("AMQPURL", Some(redact_url(&self.bus_url)).filter(|_| !self.bus_url.is_empty()));
        report_variable("TEAMNAME", Some(self.team_name.clone()).filter(|t| !t.is_empty()));
    }
}

fn report_variable(name: &str, value: Option<String>) {
    match value {
        Some(value) => info!(variable = name, value = %value, "Environment variable is set"),
        None => warn!(variable = name, "Environment variable has not been set"),
    }
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}****")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or_default<T>(name: &str, raw: Option<&str>, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %value, default = %default, "Unparsable value, using default");
            default
        }),
    }
}
