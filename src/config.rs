//! Process configuration, read once at startup.
//!
//! Missing credentials or malformed values abort startup before the
//! listener binds; nothing here is re-read at request time.

use crate::llm::config::LlmConfig;
use crate::llm::types::LlmError;
use crate::services::intake::IntakeVariant;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub variant: IntakeVariant,
    pub session_idle_secs: u64,
    pub cookie_secure: bool,
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Build the full configuration from environment variables.
    ///
    /// - `PORT`: default 3000
    /// - `DOCAI_VARIANT`: `detailed` (default) or `concerns`
    /// - `SESSION_IDLE_SECS`: default 3600, must be positive
    /// - `COOKIE_SECURE`: boolean, default false
    /// - plus everything [`LlmConfig::from_lookup`] reads
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the API key is missing or any value is
    /// malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let llm = LlmConfig::from_lookup(&lookup)?;

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                message: format!("'{raw}' is not a port number"),
            })?,
            None => DEFAULT_PORT,
        };

        let variant = match lookup("DOCAI_VARIANT") {
            Some(raw) => IntakeVariant::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "DOCAI_VARIANT",
                message: format!("'{raw}' (expected 'detailed' or 'concerns')"),
            })?,
            None => IntakeVariant::Detailed,
        };

        let session_idle_secs = match lookup("SESSION_IDLE_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "SESSION_IDLE_SECS",
                    message: format!("'{raw}' is not a positive number of seconds"),
                })?,
            None => DEFAULT_SESSION_IDLE_SECS,
        };

        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "COOKIE_SECURE",
                message: format!("'{raw}' is not a boolean"),
            })?,
            None => false,
        };

        Ok(Self { port, variant, session_idle_secs, cookie_secure, llm })
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
