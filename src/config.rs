//! Application configuration.
//!
//! Settings come from environment variables (optionally via a `.env` file)
//! and can be overridden on the command line.

use std::env;
use std::time::Duration;

use tracing::Level;

use crate::client;
use crate::emitter::DEFAULT_EMIT_PERIOD;

pub const URL_VAR: &str = "BRAINCHAT_URL";
pub const EMIT_PERIOD_VAR: &str = "BRAINCHAT_EMIT_PERIOD_MS";
pub const CAPACITY_VAR: &str = "BRAINCHAT_CAPACITY";
pub const AUDIO_VAR: &str = "BRAINCHAT_AUDIO";
pub const LOG_LEVEL_VAR: &str = "RUST_LOG";

/// Upper bound for the event queue sizes.
pub const MAX_CAPACITY: usize = 1 << 16;

#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub capacity: usize,
    pub emit_period: Duration,
    pub audio_enabled: bool,
    pub output_device: Option<String>,
    pub log_level: Level,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid number for {var}: {value}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Emit period must be greater than zero")]
    InvalidPeriod,
    #[error("Queue capacity must be between 1 and {max}, got {0}", max = MAX_CAPACITY)]
    InvalidCapacity(u64),
}

impl Default for Config {
    fn default() -> Self {
        let client = client::Config::new();
        Self {
            url: client.url().to_string(),
            capacity: client.capacity(),
            emit_period: DEFAULT_EMIT_PERIOD,
            audio_enabled: true,
            output_device: None,
            log_level: Level::INFO,
        }
    }
}

impl Config {
    /// Loads configuration from the environment.
    ///
    // *   `BRAINCHAT_URL`: WebSocket endpoint of the service. Defaults to "ws://127.0.0.1:5000/ws".
    // *   `BRAINCHAT_EMIT_PERIOD_MS`: Milliseconds between signal samples. Defaults to 1000.
    // *   `BRAINCHAT_CAPACITY`: Size of the outbound and inbound event queues. Defaults to 1024.
    // *   `BRAINCHAT_AUDIO`: "0", "false" or "off" disables audio playback.
    // *   `RUST_LOG`: The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(URL_VAR) {
            config.url = url;
        }
        if let Some(value) = lookup(EMIT_PERIOD_VAR) {
            config.emit_period = parse_period(parse_number(EMIT_PERIOD_VAR, &value)?)?;
        }
        if let Some(value) = lookup(CAPACITY_VAR) {
            config.capacity = parse_capacity(parse_number(CAPACITY_VAR, &value)?)?;
        }
        if let Some(value) = lookup(AUDIO_VAR) {
            config.audio_enabled =
                !matches!(value.trim().to_lowercase().as_str(), "0" | "false" | "off" | "no");
        }

        let log_level_str = lookup(LOG_LEVEL_VAR).unwrap_or_else(|| "INFO".to_string());
        config.log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(config)
    }

    pub fn with_emit_period_ms(mut self, millis: u64) -> Result<Self, ConfigError> {
        self.emit_period = parse_period(millis)?;
        Ok(self)
    }

    pub fn client_config(&self) -> client::Config {
        client::Config::builder()
            .with_url(&self.url)
            .with_capacity(self.capacity)
            .build()
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}

fn parse_capacity(capacity: u64) -> Result<usize, ConfigError> {
    match usize::try_from(capacity) {
        Ok(capacity) if (1..=MAX_CAPACITY).contains(&capacity) => Ok(capacity),
        _ => Err(ConfigError::InvalidCapacity(capacity)),
    }
}

fn parse_period(millis: u64) -> Result<Duration, ConfigError> {
    if millis == 0 {
        return Err(ConfigError::InvalidPeriod);
    }
    Ok(Duration::from_millis(millis))
}
