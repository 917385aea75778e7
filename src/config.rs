//! Configuration loaded from the environment.
//!
//! A `.env` file in the working directory is read first (if present), then
//! the process environment. Every setting has a default except the OAuth
//! token, which is only required by commands that reach the network.

use std::time::Duration;

use secrecy::SecretString;

use crate::batch::OnErrorMode;
use crate::error::ConfigError;

const DEFAULT_SLIDES_BASE_URL: &str = "https://slides.googleapis.com/v1/presentations";
const DEFAULT_TRANSLATE_BASE_URL: &str =
    "https://translation.googleapis.com/language/translate/v2";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_OPERATIONS: usize = 100;

/// Top-level configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub slides: SlidesConfig,
    pub translate: TranslateConfig,
    pub batch: BatchConfig,
}

/// Settings for the Slides API client.
#[derive(Debug, Clone)]
pub struct SlidesConfig {
    /// Base URL for presentation resources (no trailing slash needed).
    pub base_url: String,
    /// OAuth bearer token. Never logged.
    pub oauth_token: Option<SecretString>,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for SlidesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SLIDES_BASE_URL.to_string(),
            oauth_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Settings for the Translation API client.
#[derive(Debug, Clone)]
pub struct TranslateConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TRANSLATE_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Limits and defaults for orchestration runs.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Largest accepted operation list.
    pub max_operations: usize,
    /// Mode used when a request leaves `on_error` unset.
    pub default_on_error: OnErrorMode,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_operations: DEFAULT_MAX_OPERATIONS,
            default_on_error: OnErrorMode::Stop,
        }
    }
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = match lookup("SLIDES_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_value("SLIDES_REQUEST_TIMEOUT_SECS", &raw)?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let slides = SlidesConfig {
            base_url: lookup("SLIDES_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SLIDES_BASE_URL.to_string()),
            oauth_token: lookup("GOOGLE_OAUTH_TOKEN")
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
            timeout,
        };

        let translate = TranslateConfig {
            base_url: lookup("TRANSLATE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TRANSLATE_BASE_URL.to_string()),
            timeout,
        };

        let max_operations = match lookup("BATCH_MAX_OPERATIONS") {
            Some(raw) => parse_value::<usize>("BATCH_MAX_OPERATIONS", &raw)?,
            None => DEFAULT_MAX_OPERATIONS,
        };
        if max_operations == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BATCH_MAX_OPERATIONS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let default_on_error = match lookup("BATCH_DEFAULT_ON_ERROR") {
            Some(raw) => raw
                .parse::<OnErrorMode>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "BATCH_DEFAULT_ON_ERROR".to_string(),
                    message,
                })?,
            None => OnErrorMode::Stop,
        };

        Ok(Self {
            slides,
            translate,
            batch: BatchConfig {
                max_operations,
                default_on_error,
            },
        })
    }

    /// The OAuth token, or an error naming the variable to set.
    pub fn require_token(&self) -> Result<SecretString, ConfigError> {
        self.slides
            .oauth_token
            .clone()
            .ok_or_else(|| ConfigError::Missing {
                key: "GOOGLE_OAUTH_TOKEN".to_string(),
            })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.slides.base_url, DEFAULT_SLIDES_BASE_URL);
        assert_eq!(config.slides.timeout, Duration::from_secs(30));
        assert!(config.slides.oauth_token.is_none());
        assert_eq!(config.batch.max_operations, 100);
        assert_eq!(config.batch.default_on_error, OnErrorMode::Stop);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SLIDES_API_BASE_URL", "http://127.0.0.1:9000/v1/presentations"),
            ("GOOGLE_OAUTH_TOKEN", "ya29.token"),
            ("SLIDES_REQUEST_TIMEOUT_SECS", "5"),
            ("BATCH_MAX_OPERATIONS", "10"),
            ("BATCH_DEFAULT_ON_ERROR", "Continue"),
        ]))
        .unwrap();

        assert_eq!(config.slides.base_url, "http://127.0.0.1:9000/v1/presentations");
        assert_eq!(
            config.slides.oauth_token.as_ref().unwrap().expose_secret(),
            "ya29.token"
        );
        assert_eq!(config.translate.timeout, Duration::from_secs(5));
        assert_eq!(config.batch.max_operations, 10);
        assert_eq!(config.batch.default_on_error, OnErrorMode::Continue);
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup_from(&[("BATCH_MAX_OPERATIONS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "BATCH_MAX_OPERATIONS"));

        let err = Config::from_lookup(lookup_from(&[("BATCH_MAX_OPERATIONS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = Config::from_lookup(lookup_from(&[("BATCH_DEFAULT_ON_ERROR", "abort")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "BATCH_DEFAULT_ON_ERROR"));
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let config = Config::from_lookup(lookup_from(&[("GOOGLE_OAUTH_TOKEN", "  ")])).unwrap();
        assert!(config.slides.oauth_token.is_none());
        assert!(matches!(
            config.require_token(),
            Err(ConfigError::Missing { .. })
        ));
    }
}
