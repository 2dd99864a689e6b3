//! Application configuration.
//!
//! Built once at start-up from the environment (a `.env` file is honored) and
//! shared read-only as `Arc<AppConfig>` by the chat actor, the orchestrator and
//! the resource selector.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;
use validator::Validate;

use crate::error::AppError;
use crate::fs_manager::PortablePathManager;
use crate::telemetry::LogFormat;

pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GEO_URL: &str = "https://ipapi.co/json/";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Haven, a warm and supportive journaling companion. \
Listen carefully, reflect the user's feelings back to them, and ask gentle open questions. \
Draw on evidence-based approaches such as cognitive behavioral therapy and mindfulness when helpful. \
Keep replies concise and conversational. You are not a therapist and never diagnose; \
if the user may be in danger, encourage them to contact local emergency services or a crisis line.";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Bearer credential for the chat service. Absent means every turn falls back.
    #[serde(skip_serializing)]
    pub chat_api_key: Option<String>,
    #[validate(url)]
    pub chat_endpoint: String,
    #[validate(length(min = 1))]
    pub chat_model: String,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    #[validate(range(min = 1, max = 32768))]
    pub max_tokens: u32,
    /// Prior messages sent with each request.
    #[validate(range(min = 1, max = 100))]
    pub history_window: usize,
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
    #[validate(length(min = 1))]
    pub system_prompt: String,
    #[validate(url)]
    pub geolocation_url: String,
    /// ISO 3166-1 alpha-2 code used when geolocation fails.
    #[validate(length(equal = 2))]
    pub default_country: String,
    pub data_dir: PathBuf,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chat_api_key: None,
            chat_endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 800,
            history_window: 10,
            request_timeout_secs: 30,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            geolocation_url: DEFAULT_GEO_URL.to_string(),
            default_country: "US".to_string(),
            data_dir: PortablePathManager::data_dir(),
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, raw: String) -> Result<T, AppError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", name, raw)))
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Reads `.env` (if present) and the `HAVEN_*` variables, then validates.
    pub fn from_env() -> Result<Self, AppError> {
        dotenv::dotenv().ok();
        Self::from_process_env()
    }

    /// Same as [`AppConfig::from_env`] without touching `.env`.
    pub fn from_process_env() -> Result<Self, AppError> {
        let mut config = Self::default();

        config.chat_api_key = non_empty("HAVEN_CHAT_API_KEY").or_else(|| non_empty("OPENAI_API_KEY"));
        if let Some(v) = non_empty("HAVEN_CHAT_ENDPOINT") {
            config.chat_endpoint = v;
        }
        if let Some(v) = non_empty("HAVEN_CHAT_MODEL") {
            config.chat_model = v;
        }
        if let Some(v) = non_empty("HAVEN_CHAT_TEMPERATURE") {
            config.temperature = parse_var("HAVEN_CHAT_TEMPERATURE", v)?;
        }
        if let Some(v) = non_empty("HAVEN_CHAT_MAX_TOKENS") {
            config.max_tokens = parse_var("HAVEN_CHAT_MAX_TOKENS", v)?;
        }
        if let Some(v) = non_empty("HAVEN_HISTORY_WINDOW") {
            config.history_window = parse_var("HAVEN_HISTORY_WINDOW", v)?;
        }
        if let Some(v) = non_empty("HAVEN_CHAT_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_var("HAVEN_CHAT_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = non_empty("HAVEN_SYSTEM_PROMPT") {
            config.system_prompt = v;
        }
        if let Some(v) = non_empty("HAVEN_GEO_URL") {
            config.geolocation_url = v;
        }
        if let Some(v) = non_empty("HAVEN_DEFAULT_COUNTRY") {
            config.default_country = v.trim().to_uppercase();
        }
        if let Some(v) = non_empty("HAVEN_DATA_DIR") {
            config.data_dir = PathBuf::from(v);
        }
        if let Some(v) = non_empty("HAVEN_LOG_FORMAT") {
            config.log_format = parse_var("HAVEN_LOG_FORMAT", v)?;
        }

        config.validate()?;
        info!(
            endpoint = %config.chat_endpoint,
            model = %config.chat_model,
            credential = config.has_credential(),
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn has_credential(&self) -> bool {
        self.chat_api_key.is_some()
    }

    /// SQLite file holding the persisted records.
    pub fn db_path(&self) -> PathBuf {
        PortablePathManager::db_file(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: &[&str] = &[
        "HAVEN_CHAT_API_KEY",
        "OPENAI_API_KEY",
        "HAVEN_CHAT_ENDPOINT",
        "HAVEN_CHAT_MODEL",
        "HAVEN_CHAT_TEMPERATURE",
        "HAVEN_CHAT_MAX_TOKENS",
        "HAVEN_HISTORY_WINDOW",
        "HAVEN_CHAT_TIMEOUT_SECS",
        "HAVEN_SYSTEM_PROMPT",
        "HAVEN_GEO_URL",
        "HAVEN_DEFAULT_COUNTRY",
        "HAVEN_DATA_DIR",
        "HAVEN_LOG_FORMAT",
    ];

    fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
        ALL_VARS.iter().map(|k| (*k, None)).collect()
    }

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_tokens, 800);
        assert_eq!(config.history_window, 10);
    }

    #[test]
    fn test_from_env_defaults_without_credential() {
        temp_env::with_vars(cleared(), || {
            let config = AppConfig::from_process_env().unwrap();
            assert!(!config.has_credential());
            assert_eq!(config.chat_endpoint, DEFAULT_CHAT_ENDPOINT);
        });
    }

    #[test]
    fn test_from_env_overrides() {
        let mut vars = cleared();
        vars.retain(|(k, _)| {
            !matches!(
                *k,
                "HAVEN_CHAT_API_KEY" | "HAVEN_CHAT_MODEL" | "HAVEN_DEFAULT_COUNTRY" | "HAVEN_LOG_FORMAT"
            )
        });
        vars.push(("HAVEN_CHAT_API_KEY", Some("sk-test")));
        vars.push(("HAVEN_CHAT_MODEL", Some("local-model")));
        vars.push(("HAVEN_DEFAULT_COUNTRY", Some("gb")));
        vars.push(("HAVEN_LOG_FORMAT", Some("json")));
        temp_env::with_vars(vars, || {
            let config = AppConfig::from_process_env().unwrap();
            assert_eq!(config.chat_api_key.as_deref(), Some("sk-test"));
            assert_eq!(config.chat_model, "local-model");
            assert_eq!(config.default_country, "GB");
            assert_eq!(config.log_format, LogFormat::Json);
        });
    }

    #[test]
    fn test_openai_key_fallback() {
        let mut vars = cleared();
        vars.retain(|(k, _)| *k != "OPENAI_API_KEY");
        vars.push(("OPENAI_API_KEY", Some("sk-fallback")));
        temp_env::with_vars(vars, || {
            let config = AppConfig::from_process_env().unwrap();
            assert_eq!(config.chat_api_key.as_deref(), Some("sk-fallback"));
        });
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let mut vars = cleared();
        vars.retain(|(k, _)| *k != "HAVEN_CHAT_TEMPERATURE");
        vars.push(("HAVEN_CHAT_TEMPERATURE", Some("5.0")));
        temp_env::with_vars(vars, || {
            assert!(matches!(
                AppConfig::from_process_env(),
                Err(AppError::Validation(_))
            ));
        });
    }

    #[test]
    fn test_unparseable_number_rejected() {
        let mut vars = cleared();
        vars.retain(|(k, _)| *k != "HAVEN_CHAT_MAX_TOKENS");
        vars.push(("HAVEN_CHAT_MAX_TOKENS", Some("lots")));
        temp_env::with_vars(vars, || {
            assert!(matches!(
                AppConfig::from_process_env(),
                Err(AppError::Config(_))
            ));
        });
    }

    #[test]
    fn test_api_key_never_serialized() {
        let config = AppConfig {
            chat_api_key: Some("secret".into()),
            ..AppConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
