//! services/bot/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::TimeDelta;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: String,
    pub transcription_model: String,
    pub transcription_language: String,
    pub extraction_model: String,
    pub bridge_url: String,
    /// Shared with the bridge; signs every webhook body (HMAC-SHA256).
    pub webhook_secret: String,
    /// Empty until the group id has been looked up with `!grupoid`.
    pub target_chat_id: String,
    pub allowed_senders: Vec<String>,
    pub cooldown: TimeDelta,
    pub min_text_report_chars: usize,
    pub audio_dir: PathBuf,
    pub intake_queue_capacity: usize,
}

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
        };

        // --- Server and Database Settings ---
        let bind_address = parse_var(
            "BIND_ADDRESS",
            lookup("BIND_ADDRESS"),
            SocketAddr::from(([0, 0, 0, 0], 3000)),
        )?;
        let database_url = required("DATABASE_URL")?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- AI Provider Settings ---
        let openai_api_key = required("OPENAI_API_KEY")?;
        let transcription_model =
            lookup("TRANSCRIPTION_MODEL").unwrap_or_else(|| "whisper-1".to_string());
        let transcription_language =
            lookup("TRANSCRIPTION_LANGUAGE").unwrap_or_else(|| "es".to_string());
        let extraction_model =
            lookup("EXTRACTION_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        // --- Chat Settings ---
        let bridge_url = required("BRIDGE_URL")?.trim_end_matches('/').to_string();
        let webhook_secret = required("WEBHOOK_SECRET")?;
        let target_chat_id = lookup("TARGET_CHAT_ID")
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        let allowed_senders = lookup("ALLOWED_SENDERS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // --- Pipeline Settings ---
        let cooldown_secs: u32 = parse_var("COOLDOWN_SECS", lookup("COOLDOWN_SECS"), 60)?;
        let min_text_report_chars =
            parse_var("MIN_TEXT_REPORT_CHARS", lookup("MIN_TEXT_REPORT_CHARS"), 20)?;
        let audio_dir = lookup("AUDIO_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./audios"));
        let intake_queue_capacity: usize =
            parse_var("INTAKE_QUEUE_CAPACITY", lookup("INTAKE_QUEUE_CAPACITY"), 64)?;
        if intake_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "INTAKE_QUEUE_CAPACITY".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            transcription_model,
            transcription_language,
            extraction_model,
            bridge_url,
            webhook_secret,
            target_chat_id,
            allowed_senders,
            cooldown: TimeDelta::seconds(i64::from(cooldown_secs)),
            min_text_report_chars,
            audio_dir,
            intake_queue_capacity,
        })
    }
}
