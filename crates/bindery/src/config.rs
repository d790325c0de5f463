//! Binder configuration.
//!
//! Configuration is layered: defaults, then an optional TOML document, then
//! environment variables of the form `BINDERY__KEY`.
//!
//! ```toml
//! max_body_size = 2097152
//! fail_fast = false
//! multipart_max_fields = 50
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "BINDERY";

/// Default body size limit (1 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default number of multipart parts read before failing.
pub const DEFAULT_MULTIPART_MAX_FIELDS: usize = 100;

/// Settings shared by every pass of a [`Binder`](crate::Binder).
///
/// # Example
///
/// ```rust
/// use bindery::BinderConfig;
///
/// let config = BinderConfig::from_toml_str("fail_fast = false").unwrap();
/// assert!(!config.fail_fast);
/// assert_eq!(config.max_body_size, 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BinderConfig {
    /// Largest body, in bytes, the body pass accepts.
    pub max_body_size: usize,
    /// Initial fail-fast mode of fluent binders.
    pub fail_fast: bool,
    /// Largest number of multipart parts read.
    pub multipart_max_fields: usize,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            fail_fast: true,
            multipart_max_fields: DEFAULT_MULTIPART_MAX_FIELDS,
        }
    }
}

impl BinderConfig {
    /// Parses a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `BINDERY__*` environment variables over `self`.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_env_vars(std::env::vars())
    }

    /// Applies `BINDERY__*` pairs from `vars` over `self`.
    ///
    /// Pairs without the prefix are ignored; unknown keys under the prefix
    /// are rejected.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let key = key.as_ref();
            if key
                .strip_prefix(ENV_PREFIX)
                .is_some_and(|rest| rest.starts_with("__"))
            {
                self.apply_env_var(key, value.as_ref())?;
            }
        }
        self.validate()?;
        Ok(self)
    }

    fn apply_env_var(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let name = key
            .strip_prefix(ENV_PREFIX)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        match name {
            "MAX_BODY_SIZE" => {
                self.max_body_size = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            "FAIL_FAST" => {
                self.fail_fast = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            "MULTIPART_MAX_FIELDS" => {
                self.multipart_max_fields = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            _ => return Err(ConfigError::env_parse_error(key, "unknown configuration key")),
        }
        Ok(())
    }

    /// Rejects limits that would refuse every request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_body_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.multipart_max_fields == 0 {
            return Err(ConfigError::InvalidValue {
                field: "multipart_max_fields".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
