use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pushover: PushoverConfig,
    #[serde(default)]
    pub notification: NotificationOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PushoverConfig {
    #[serde(default = "default_push_enabled")]
    pub enabled: bool,
    #[serde(default = "default_user_key_env")]
    pub user_key_env: String,
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,
    #[serde(default)]
    pub user_key: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Optional Pushover message parameters, passed through verbatim. Unset
/// values are omitted from the outbound request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotificationOptions {
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_title: Option<String>,
    #[serde(default)]
    pub priority: i8,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub html: bool,
    #[serde(default)]
    pub retry: Option<u32>,
    #[serde(default)]
    pub expire: Option<u32>,
    #[serde(default)]
    pub callback: Option<String>,
}

impl Default for PushoverConfig {
    fn default() -> Self {
        Self {
            enabled: default_push_enabled(),
            user_key_env: default_user_key_env(),
            api_token_env: default_api_token_env(),
            user_key: None,
            api_token: None,
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read the config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse the YAML in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(String),
}

impl Config {
    /// Loads the file when it exists; otherwise falls back to defaults so
    /// the tool runs with nothing but environment credentials.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pushover.endpoint.trim().is_empty() {
            return Err(ConfigError::Validation(
                "pushover.endpoint must not be empty".to_string(),
            ));
        }
        if self.pushover.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "pushover.timeout_secs must be >= 1".to_string(),
            ));
        }
        if self.pushover.user_key_env.trim().is_empty() {
            return Err(ConfigError::Validation(
                "pushover.user_key_env must not be empty".to_string(),
            ));
        }
        if self.pushover.api_token_env.trim().is_empty() {
            return Err(ConfigError::Validation(
                "pushover.api_token_env must not be empty".to_string(),
            ));
        }
        if !(-2..=2).contains(&self.notification.priority) {
            return Err(ConfigError::Validation(
                "notification.priority must be within -2..2".to_string(),
            ));
        }
        if self.notification.priority == 2
            && (self.notification.retry.is_none() || self.notification.expire.is_none())
        {
            return Err(ConfigError::Validation(
                "notification.retry and notification.expire are required for priority 2"
                    .to_string(),
            ));
        }

        Ok(())
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

const fn default_push_enabled() -> bool {
    true
}

fn default_user_key_env() -> String {
    "PUSHOVER_USR".to_string()
}

fn default_api_token_env() -> String {
    "PUSHOVER_APP".to_string()
}

fn default_endpoint() -> String {
    "https://api.pushover.net/1/messages.json".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}
