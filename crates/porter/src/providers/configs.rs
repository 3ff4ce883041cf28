use std::env;

use crate::errors::{PorterError, PorterResult};

pub const DEFAULT_HOST: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_MAX_TOKENS: i32 = 1000;

pub trait ProviderConfig {
    /// Load configuration from environment variables
    fn from_env() -> PorterResult<Self>
    where
        Self: Sized;

    /// Helper function to get environment variables with error handling
    fn get_env(key: &str, required: bool, default: Option<String>) -> PorterResult<Option<String>> {
        match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) if !required => Ok(default),
            Err(env::VarError::NotPresent) => Err(PorterError::Config(format!(
                "environment variable '{key}' is required but not set"
            ))),
            Err(e) => Err(PorterError::Config(e.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: i32,
}

impl AnthropicConfig {
    pub fn new(host: String, api_key: String, model: String, max_tokens: i32) -> Self {
        Self {
            host,
            api_key,
            model,
            max_tokens,
        }
    }
}

impl ProviderConfig for AnthropicConfig {
    fn from_env() -> PorterResult<Self> {
        let api_key = Self::get_env("ANTHROPIC_API_KEY", true, None)?
            .ok_or_else(|| PorterError::Config("ANTHROPIC_API_KEY is not set".to_string()))?;

        let host = Self::get_env("ANTHROPIC_HOST", false, Some(DEFAULT_HOST.to_string()))?
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let model = Self::get_env("ANTHROPIC_MODEL", false, Some(DEFAULT_MODEL.to_string()))?
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_tokens = match Self::get_env("ANTHROPIC_MAX_TOKENS", false, None)? {
            Some(raw) => raw.parse().map_err(|_| {
                PorterError::Config(format!("ANTHROPIC_MAX_TOKENS is not a number: '{raw}'"))
            })?,
            None => DEFAULT_MAX_TOKENS,
        };

        Ok(Self::new(host, api_key, model, max_tokens))
    }
}
