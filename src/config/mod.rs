//! Server configuration from environment variables.

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::core::orchestrator::OrchestratorConfig;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// All deployment-level settings.
///
/// Provider keys may be empty: the session layer decides what that means
/// (generation becomes a fatal init error, voice in/out degrade).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub groq_api_key: String,
    pub groq_model: String,
    pub deepgram_api_key: String,
    pub openai_api_key: String,
    pub tts_voice: String,
    pub user_pause_ms: u64,
    pub products_path: PathBuf,
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    /// Load configuration from the environment, reading a `.env` file
    /// first if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let groq_api_key = env_or("GROQ_API_KEY", "");
        if groq_api_key.is_empty() {
            warn!("GROQ_API_KEY is not set, sessions will fail to initialize");
        }

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parsed("PORT", 8000)?,
            groq_api_key,
            groq_model: env_or("GROQ_MODEL", "llama-3.3-70b-versatile"),
            deepgram_api_key: env_or("DEEPGRAM_API_KEY", ""),
            openai_api_key: env_or("OPENAI_API_KEY", ""),
            tts_voice: env_or("OPENAI_TTS_VOICE", "alloy"),
            user_pause_ms: env_parsed("USER_PAUSE_MS", 700)?,
            products_path: PathBuf::from(env_or("PRODUCTS_PATH", "data/products.json")),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            user_pause_ms: self.user_pause_ms,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            "HOST",
            "PORT",
            "GROQ_API_KEY",
            "GROQ_MODEL",
            "DEEPGRAM_API_KEY",
            "OPENAI_API_KEY",
            "OPENAI_TTS_VOICE",
            "USER_PAUSE_MS",
            "PRODUCTS_PATH",
        ] {
            unsafe { env::remove_var(name) };
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_when_unset() {
        clear_env();
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.user_pause_ms, 700);
        assert_eq!(config.tts_voice, "alloy");
        assert_eq!(config.products_path, PathBuf::from("data/products.json"));
    }

    #[test]
    #[serial]
    fn overrides_are_read() {
        clear_env();
        unsafe {
            env::set_var("PORT", "9100");
            env::set_var("USER_PAUSE_MS", "450");
            env::set_var("OPENAI_TTS_VOICE", "nova");
        }
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.user_pause_ms, 450);
        assert_eq!(config.tts_voice, "nova");
        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_port_is_an_error() {
        clear_env();
        unsafe { env::set_var("PORT", "not-a-port") };
        assert!(ServerConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn short_pause_is_clamped_by_orchestrator_config() {
        clear_env();
        unsafe { env::set_var("USER_PAUSE_MS", "10") };
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(
            config.orchestrator().pause(),
            tokio::time::Duration::from_millis(100)
        );
        clear_env();
    }
}
