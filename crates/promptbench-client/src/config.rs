//! Client configuration.
//!
//! Configuration can be loaded from:
//! - TOML files (default: ~/.config/promptbench/client.toml)
//! - Environment variables (PROMPTBENCH_* prefixed)
//!
//! TOML files may reference environment variables as `${VAR_NAME}`.
//!
//! # Example
//!
//! ```toml
//! [client]
//! base_url = "https://harness.internal/api"
//! request_timeout_secs = 15
//! max_concurrent_fetches = 4
//! history_days = 30
//! page_size = 25
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use promptbench_core::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Values given on the command line. `Some` fields replace loaded values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub history_days: Option<u32>,
    pub page_size: Option<usize>,
}

/// Settings for talking to the harness API and presenting results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the harness API, e.g. `http://localhost:8000`.
    #[serde(default = "ClientConfig::default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "ClientConfig::default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Maximum number of history fetches in flight at once.
    #[serde(default = "ClientConfig::default_max_concurrent")]
    pub max_concurrent_fetches: usize,
    /// Default history look-back window in days.
    #[serde(default = "ClientConfig::default_history_days")]
    pub history_days: u32,
    /// Default rows per page for list output.
    #[serde(default = "ClientConfig::default_page_size")]
    pub page_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            request_timeout_secs: Self::default_request_timeout(),
            max_concurrent_fetches: Self::default_max_concurrent(),
            history_days: Self::default_history_days(),
            page_size: Self::default_page_size(),
        }
    }
}

impl ClientConfig {
    fn default_base_url() -> String {
        defaults::API_URL.to_string()
    }

    fn default_request_timeout() -> u64 {
        defaults::REQUEST_TIMEOUT_SECS
    }

    fn default_max_concurrent() -> usize {
        defaults::MAX_CONCURRENT_FETCHES
    }

    fn default_history_days() -> u32 {
        defaults::HISTORY_DAYS
    }

    fn default_page_size() -> usize {
        defaults::PAGE_SIZE
    }

    /// Get the default config file path.
    ///
    /// Returns: ~/.config/promptbench/client.toml
    pub fn default_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        path.push("promptbench");
        path.push("client.toml");
        path
    }

    /// Load, apply command-line overrides, then validate the result.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> ConfigResult<Self> {
        let mut config = Self::load_from(path)?;
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path` if given, else from the default path if it
    /// exists, else from environment variables.
    ///
    /// The result is not validated; see [`ClientConfig::resolve`].
    pub fn load_from(path: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = path {
            info!("Loading client config from: {}", path.display());
            return Self::read_file(path);
        }

        let path = Self::default_config_path();
        if path.exists() {
            info!("Loading client config from: {}", path.display());
            Self::read_file(&path)
        } else {
            debug!(
                "Config file not found at {}, using environment variables",
                path.display()
            );
            Ok(Self::from_env())
        }
    }

    /// Replace loaded values with the ones set in `overrides`.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        if let Some(days) = overrides.history_days {
            self.history_days = days;
        }
        if let Some(page_size) = overrides.page_size {
            self.page_size = page_size;
        }
    }

    /// Load and validate configuration from a TOML file with a `[client]` table.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let content = Self::substitute_env_vars(&content);

        #[derive(Deserialize)]
        struct TomlRoot {
            #[serde(default)]
            client: Option<ClientConfig>,
        }

        let root: TomlRoot = toml::from_str(&content)?;
        Ok(root.client.unwrap_or_default())
    }

    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to defaults.
    pub fn from_env() -> Self {
        let base_url =
            env::var("PROMPTBENCH_API_URL").unwrap_or_else(|_| Self::default_base_url());
        let request_timeout_secs = env::var("PROMPTBENCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(Self::default_request_timeout);
        let max_concurrent_fetches = env::var("PROMPTBENCH_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(Self::default_max_concurrent);
        let history_days = env::var("PROMPTBENCH_HISTORY_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(Self::default_history_days);
        let page_size = env::var("PROMPTBENCH_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(Self::default_page_size);

        Self {
            base_url,
            request_timeout_secs,
            max_concurrent_fetches,
            history_days,
            page_size,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "base_url cannot be empty".to_string(),
            ));
        }

        // Basic URL validation
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.max_concurrent_fetches == 0 {
            return Err(ConfigError::Validation(
                "max_concurrent_fetches must be greater than zero".to_string(),
            ));
        }

        if self.history_days == 0 {
            return Err(ConfigError::Validation(
                "history_days must be greater than zero".to_string(),
            ));
        }

        if !defaults::PAGE_SIZE_OPTIONS.contains(&self.page_size) {
            return Err(ConfigError::Validation(format!(
                "page_size must be one of {:?}, got: {}",
                defaults::PAGE_SIZE_OPTIONS,
                self.page_size
            )));
        }

        Ok(())
    }

    /// Substitute environment variables in the format ${VAR_NAME}.
    fn substitute_env_vars(content: &str) -> String {
        let Ok(re) = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") else {
            return content.to_string();
        };
        re.replace_all(content, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}
