//! Configuration - Global options and per-source rules.
//!
//! Read from TOML with camelCase keys:
//!
//! ```toml
//! maxTries = 2
//! loadingClass = "is-loading"
//! delay = 50
//! loadingSrc = "/img/spinner.gif"
//!
//! [[rules]]
//! match = "*.example.com/*"
//! maxTries = 5
//! lazyLoad = false
//! ```
//!
//! Every key is optional. Rule fields left unset fall back to the global value.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Debounce window used when neither a rule nor the global config sets one.
pub const DEFAULT_DELAY_MS: u64 = 100;

/// Global options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Attempts per source before it is marked as failed.
    pub max_tries: u32,
    pub loading_class: String,
    pub error_class: String,
    pub success_class: String,
    /// Scroll debounce window in milliseconds.
    pub delay: Option<u64>,
    pub batch_size: Option<usize>,
    /// Source displayed while the real one loads.
    pub loading_src: Option<String>,
    /// Source displayed once the real one failed.
    pub error_src: Option<String>,
    pub lazy_load: bool,
    pub rules: Vec<RuleConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tries: 1,
            loading_class: "loading".to_string(),
            error_class: "error".to_string(),
            success_class: "success".to_string(),
            delay: None,
            batch_size: None,
            loading_src: None,
            error_src: None,
            lazy_load: true,
            rules: Vec::new(),
        }
    }
}

/// One rule as written in the config.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleConfig {
    /// Glob matched against the whole source string.
    #[serde(rename = "match")]
    pub pattern: String,
    pub max_tries: Option<u32>,
    pub delay: Option<u64>,
    pub batch_size: Option<usize>,
    pub loading_src: Option<String>,
    pub error_src: Option<String>,
    pub lazy_load: Option<bool>,
}

impl RuleConfig {
    /// A rule matching `pattern` with every field inherited.
    pub fn matching(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), rules = config.rules.len(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tries == 0 {
            return Err(ConfigError::InvalidValue {
                option: "maxTries",
                reason: "must be at least 1".to_string(),
            });
        }
        for rule in &self.rules {
            if rule.pattern.is_empty() {
                return Err(ConfigError::InvalidValue {
                    option: "rules.match",
                    reason: "must not be empty".to_string(),
                });
            }
            if rule.max_tries == Some(0) {
                return Err(ConfigError::InvalidValue {
                    option: "rules.maxTries",
                    reason: format!("must be at least 1 in rule `{}`", rule.pattern),
                });
            }
            if rule.batch_size == Some(0) {
                return Err(ConfigError::InvalidValue {
                    option: "rules.batchSize",
                    reason: format!("must be at least 1 in rule `{}`", rule.pattern),
                });
            }
        }
        if self.batch_size == Some(0) {
            return Err(ConfigError::InvalidValue {
                option: "batchSize",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
