//! Client configuration and its resolution order.
//!
//! Each setting resolves explicit value → environment variable → default.
//! Resolution never fails: a missing API key is only reported when a call
//! that needs one is made.

use std::time::Duration;

pub const API_KEY_ENV: &str = "KAIZEN_API_KEY";
pub const BASE_URL_ENV: &str = "KAIZEN_BASE_URL";
pub const TIMEOUT_ENV: &str = "KAIZEN_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://api.kaizenaisystems.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Caller-supplied overrides. Unset fields fall back to the environment.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}

/// Resolved, immutable configuration of one client instance.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl ClientConfig {
    /// Resolve `options` against the process environment.
    pub fn resolve(options: ClientOptions) -> Self {
        Self::resolve_with(options, |name| std::env::var(name).ok())
    }

    /// Resolve `options` using `lookup` in place of the process environment.
    pub fn resolve_with<F>(options: ClientOptions, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = non_empty(options.api_key).or_else(|| non_empty(lookup(API_KEY_ENV)));

        let base_url = non_empty(options.base_url)
            .or_else(|| non_empty(lookup(BASE_URL_ENV)))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = options
            .timeout
            .or_else(|| {
                lookup(TIMEOUT_ENV).and_then(|raw| match raw.trim().parse::<f64>() {
                    Ok(secs) if secs.is_finite() && secs > 0.0 => {
                        Some(Duration::from_secs_f64(secs))
                    }
                    _ => {
                        tracing::warn!(value = %raw, "ignoring invalid {TIMEOUT_ENV}");
                        None
                    }
                })
            })
            .unwrap_or(DEFAULT_TIMEOUT);

        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Same configuration with a different key. Used by the default-client slot.
    pub(crate) fn with_api_key(&self, key: &str) -> Self {
        Self {
            api_key: non_empty(Some(key.to_string())),
            ..self.clone()
        }
    }

    pub(crate) fn with_base_url(&self, url: &str) -> Self {
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ClientConfig::resolve_with(ClientOptions::default(), no_env);
        assert_eq!(config.api_key(), None);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn environment_fills_missing_options() {
        let env = |name: &str| match name {
            API_KEY_ENV => Some("env-key".to_string()),
            BASE_URL_ENV => Some("http://localhost:9000/".to_string()),
            TIMEOUT_ENV => Some("2.5".to_string()),
            _ => None,
        };
        let config = ClientConfig::resolve_with(ClientOptions::default(), env);
        assert_eq!(config.api_key(), Some("env-key"));
        assert_eq!(config.base_url(), "http://localhost:9000");
        assert_eq!(config.timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn explicit_options_beat_environment() {
        let env = |_: &str| Some("from-env".to_string());
        let options = ClientOptions {
            api_key: Some("explicit".to_string()),
            base_url: Some("http://example.test".to_string()),
            timeout: Some(Duration::from_secs(3)),
        };
        let config = ClientConfig::resolve_with(options, env);
        assert_eq!(config.api_key(), Some("explicit"));
        assert_eq!(config.base_url(), "http://example.test");
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let options = ClientOptions {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        let config = ClientConfig::resolve_with(options, no_env);
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn invalid_timeout_env_is_ignored() {
        let env = |name: &str| (name == TIMEOUT_ENV).then(|| "soon".to_string());
        let config = ClientConfig::resolve_with(ClientOptions::default(), env);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn debug_redacts_key() {
        let options = ClientOptions {
            api_key: Some("secret".to_string()),
            ..Default::default()
        };
        let rendered = format!("{:?}", ClientConfig::resolve_with(options, no_env));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
