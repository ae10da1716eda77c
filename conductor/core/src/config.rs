//! Widget Configuration
//!
//! Settings for the chat widget, loaded in layers:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`$XDG_CONFIG_HOME/chatline/config.toml`, or an explicit path)
//! 3. Environment variables (`CHATLINE_BASE_URL`, `CHATLINE_TIMEOUT_SECS`,
//!    `CHATLINE_MAX_MESSAGE_CHARS`)
//! 4. Caller overrides (CLI flags)
//!
//! # Example
//!
//! ```toml
//! base_url = "https://careers.example"
//! welcome_message = "Hi! Ask me about open roles."
//! suggestions = ["Show me remote jobs", "Find a mentor"]
//! request_timeout_secs = 30
//! stale_response_policy = "append"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lifecycle::StaleResponsePolicy;
use crate::store::DEFAULT_TIME_FORMAT;

/// Apology shown in place of a reply when the chat request fails
pub const DEFAULT_APOLOGY: &str =
    "I'm sorry, I couldn't process your request. Please try again later.";

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },
    /// A value is out of range or malformed
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Where the configuration came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// No file; built-in defaults
    Defaults,
    /// Loaded from this file
    File(PathBuf),
}

/// Chat widget settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Root URL of the chat service
    pub base_url: String,
    /// Path of the chat endpoint
    pub chat_path: String,
    /// Path of the feedback endpoint
    pub feedback_path: String,
    /// First entry of every conversation; survives a clear
    pub welcome_message: String,
    /// Reply shown when a chat request fails
    pub apology_message: String,
    /// Suggestion controls offered to the user
    pub suggestions: Vec<String>,
    /// `chrono` strftime format for message times
    pub time_format: String,
    /// Maximum characters per message (0 = unlimited)
    pub max_message_chars: usize,
    /// Chat request timeout in seconds (none = wait for the transport)
    pub request_timeout_secs: Option<u64>,
    /// What to do with a reply that arrives after a clear
    pub stale_response_policy: StaleResponsePolicy,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            chat_path: "/api/chat".to_string(),
            feedback_path: "/api/feedback".to_string(),
            welcome_message: "Hi! I can help you find jobs, events and mentorship programs. \
                              What are you looking for today?"
                .to_string(),
            apology_message: DEFAULT_APOLOGY.to_string(),
            suggestions: vec![
                "Show me remote jobs".to_string(),
                "Upcoming career events".to_string(),
                "How do I find a mentor?".to_string(),
            ],
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            max_message_chars: 2000,
            request_timeout_secs: None,
            stale_response_policy: StaleResponsePolicy::default(),
        }
    }
}

impl WidgetConfig {
    /// Chat request timeout, if configured
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Apply overrides on top of the current values
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref base_url) = overrides.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.request_timeout_secs = Some(secs);
        }
        if let Some(max) = overrides.max_message_chars {
            self.max_message_chars = max;
        }
    }

    /// Check values that would otherwise fail later
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.apology_message.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "apology_message",
                reason: "must not be empty".to_string(),
            });
        }
        if self.time_format.is_empty()
            || StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error))
        {
            return Err(ConfigError::InvalidValue {
                field: "time_format",
                reason: format!("`{}` is not a valid strftime format", self.time_format),
            });
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.suggestions.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "suggestions",
                reason: "suggestions must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

/// Values that take precedence over the file
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Chat service root URL
    pub base_url: Option<String>,
    /// Request timeout in seconds
    pub request_timeout_secs: Option<u64>,
    /// Maximum characters per message
    pub max_message_chars: Option<usize>,
}

impl ConfigOverrides {
    /// Read overrides from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through `lookup`, which maps a variable name to its value
    ///
    /// A numeric variable that is set but does not parse is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            base_url: lookup("CHATLINE_BASE_URL"),
            request_timeout_secs: parse_var(
                &lookup,
                "CHATLINE_TIMEOUT_SECS",
                "request_timeout_secs",
            )?,
            max_message_chars: parse_var(
                &lookup,
                "CHATLINE_MAX_MESSAGE_CHARS",
                "max_message_chars",
            )?,
        })
    }

    /// Combine with `other`, whose values win
    #[must_use]
    pub fn merge(self, other: ConfigOverrides) -> Self {
        Self {
            base_url: other.base_url.or(self.base_url),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            max_message_chars: other.max_message_chars.or(self.max_message_chars),
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, field: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim().parse().map(Some).map_err(|e| {
        tracing::warn!(variable = name, value = %raw, error = %e, "Unparsable environment override");
        ConfigError::InvalidValue {
            field,
            reason: format!("{name}=`{raw}`: {e}"),
        }
    })
}

/// Default config file location
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chatline").join("config.toml"))
}

/// Parse a config file (no overrides, no validation)
pub fn load_config_from_path(path: &Path) -> Result<WidgetConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the configuration
///
/// An explicit path must exist. Without one, the default location is used if
/// present, otherwise built-in defaults. `overrides` are applied last and the
/// result is validated.
pub fn load_config(
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<(WidgetConfig, ConfigSource), ConfigError> {
    let (mut config, source) = match explicit {
        Some(path) => (load_config_from_path(path)?, ConfigSource::File(path.to_path_buf())),
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => (load_config_from_path(&path)?, ConfigSource::File(path)),
            None => (WidgetConfig::default(), ConfigSource::Defaults),
        },
    };

    config.apply_overrides(overrides);
    config.validate()?;

    tracing::debug!(source = ?source, base_url = %config.base_url, "Configuration loaded");
    Ok((config, source))
}
