//! Configuration management
//!
//! Settings are resolved in the following order:
//! 1. Environment variables
//! 2. `reply-gateway.toml` configuration file
//! 3. Default values
//!
//! Inside the configuration file `${VAR_NAME}` is expanded from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::Error;

/// Default configuration file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "reply-gateway.toml";

/// LLM Provider type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Messages API
    Claude,
    /// OpenAI-compatible chat completions API
    #[default]
    OpenAi,
}

impl LlmProvider {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "claude" | "anthropic" => LlmProvider::Claude,
            _ => LlmProvider::OpenAi,
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key
    #[serde(default)]
    pub api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API provider
    #[serde(default)]
    pub provider: LlmProvider,

    /// Base URL (optional, for custom endpoints)
    pub base_url: Option<String>,

    /// Hard limit for a single completion call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum tokens in a generated reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            provider: LlmProvider::OpenAi,
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Port for the HTTP server
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Path to SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// How often a session's stored history is cleared
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvictionConfig {
    /// Fixed interval between evictions, in seconds
    #[serde(default = "default_eviction_interval_secs")]
    pub interval_secs: u64,

    /// Cron expression; takes precedence over `interval_secs` when set
    #[serde(default)]
    pub cron: Option<String>,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_eviction_interval_secs(),
            cron: None,
        }
    }
}

impl EvictionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptConfig {
    /// Persona template file; the built-in template is used when unset
    pub template_path: Option<String>,
}

/// Main configuration for reply-gateway
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub eviction: EvictionConfig,

    #[serde(default)]
    pub prompt: PromptConfig,
}

fn default_model() -> String {
    "gpt-5".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u64 {
    1024
}

fn default_api_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "data/reply-gateway.db".to_string()
}

fn default_eviction_interval_secs() -> u64 {
    24 * 60 * 60
}

impl Config {
    /// Expand `${VAR_NAME}` occurrences from the environment.
    ///
    /// Unknown variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides();
        cfg.validate()?;

        Ok(cfg)
    }

    /// Parse configuration from TOML text (environment variables are expanded first)
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded = Self::expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load from `reply-gateway.toml` when present, otherwise from the environment only
    pub fn load() -> crate::Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Override settings with environment variables
    fn apply_env_overrides(&mut self) {
        // OPEN_API_KEY is accepted for deployments carried over from older setups
        for key in ["OPEN_API_KEY", "OPENAI_API_KEY", "LLM_API_KEY"] {
            if let Ok(api_key) = std::env::var(key) {
                if !api_key.is_empty() {
                    self.llm.api_key = api_key;
                }
            }
        }

        if let Ok(model) = std::env::var("LLM_MODEL") {
            if !model.is_empty() {
                self.llm.model = model;
            }
        }

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            if !provider.is_empty() {
                self.llm.provider = LlmProvider::parse(&provider);
            }
        }

        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            if !base_url.is_empty() {
                self.llm.base_url = Some(base_url);
            }
        }

        if let Some(secs) = env_parse("LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = secs;
        }
        if let Some(tokens) = env_parse("LLM_MAX_TOKENS") {
            self.llm.max_tokens = tokens;
        }

        if let Some(port) = env_parse("PORT") {
            self.api.port = port;
        }
        if let Some(port) = env_parse("API_PORT") {
            self.api.port = port;
        }

        if let Ok(path) = std::env::var("DB_PATH") {
            self.history.db_path = path;
        }

        if let Some(secs) = env_parse("EVICTION_INTERVAL_SECS") {
            self.eviction.interval_secs = secs;
        }
        if let Ok(cron) = std::env::var("EVICTION_CRON") {
            if !cron.is_empty() {
                self.eviction.cron = Some(cron);
            }
        }

        if let Ok(path) = std::env::var("PROMPT_TEMPLATE_PATH") {
            if !path.is_empty() {
                self.prompt.template_path = Some(path);
            }
        }
    }

    /// Reject settings the gateway cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.llm.api_key.is_empty() {
            return Err(Error::Config(
                "LLM_API_KEY (or OPENAI_API_KEY) not set".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::Config("llm.timeout_secs must be positive".to_string()));
        }
        if self.eviction.cron.is_none() && self.eviction.interval_secs == 0 {
            return Err(Error::Config(
                "eviction.interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a numeric override; a set but malformed value is logged and ignored
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value, keeping the configured one", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_default() {
        let config = LlmConfig::default();
        assert_eq!(config.model, "gpt-5");
        assert_eq!(config.provider, LlmProvider::OpenAi);
        assert!(config.api_key.is_empty());
        assert!(config.base_url.is_none());
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_api_config_default() {
        assert_eq!(ApiConfig::default().port, 8080);
    }

    #[test]
    fn test_eviction_config_default() {
        let config = EvictionConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(86_400));
        assert!(config.cron.is_none());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(LlmProvider::parse("anthropic"), LlmProvider::Claude);
        assert_eq!(LlmProvider::parse("Claude"), LlmProvider::Claude);
        assert_eq!(LlmProvider::parse("openai"), LlmProvider::OpenAi);
        assert_eq!(LlmProvider::parse("glm"), LlmProvider::OpenAi);
    }

    #[test]
    fn test_expand_env_vars() {
        unsafe {
            std::env::set_var("RG_CONFIG_TEST_VAR", "test_value");
        }

        let result = Config::expand_env_vars("prefix_${RG_CONFIG_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");

        let result = Config::expand_env_vars("prefix_${RG_CONFIG_MISSING_VAR}_suffix");
        assert_eq!(result, "prefix__suffix");

        unsafe {
            std::env::remove_var("RG_CONFIG_TEST_VAR");
        }
    }

    #[test]
    fn test_env_parse() {
        unsafe {
            std::env::set_var("RG_CONFIG_TEST_PORT", " 9100 ");
            std::env::set_var("RG_CONFIG_TEST_BAD_PORT", "eighty");
        }

        assert_eq!(env_parse::<u16>("RG_CONFIG_TEST_PORT"), Some(9100));
        assert_eq!(env_parse::<u16>("RG_CONFIG_TEST_BAD_PORT"), None);
        assert_eq!(env_parse::<u16>("RG_CONFIG_TEST_UNSET_PORT"), None);

        unsafe {
            std::env::remove_var("RG_CONFIG_TEST_PORT");
            std::env::remove_var("RG_CONFIG_TEST_BAD_PORT");
        }
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        assert_eq!(Config::expand_env_vars("no_vars_here $HOME"), "no_vars_here $HOME");
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
[llm]
provider = "claude"
model = "claude-sonnet-4-20250514"
api_key = "test_key"
timeout_secs = 15

[api]
port = 9000

[history]
db_path = "/tmp/history.db"

[eviction]
interval_secs = 100
cron = "0 0 4 * * *"

[prompt]
template_path = "prompts/custom.md"
"#;

        let config = Config::from_toml_str(toml_content).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Claude);
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
        assert_eq!(config.llm.api_key, "test_key");
        assert_eq!(config.llm.timeout_secs, 15);
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.history.db_path, "/tmp/history.db");
        assert_eq!(config.eviction.interval_secs, 100);
        assert_eq!(config.eviction.cron.as_deref(), Some("0 0 4 * * *"));
        assert_eq!(config.prompt.template_path.as_deref(), Some("prompts/custom.md"));
    }

    #[test]
    fn test_toml_sections_optional() {
        let config = Config::from_toml_str("[llm]\napi_key = \"k\"\n").unwrap();
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.eviction.interval_secs, 86_400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_key_and_zero_interval() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.llm.api_key = "k".to_string();
        config.eviction.interval_secs = 0;
        assert!(config.validate().is_err());

        config.eviction.cron = Some("0 0 4 * * *".to_string());
        assert!(config.validate().is_ok());
    }
}
