//! Chat client configuration, loaded once from the environment and passed down explicitly

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::ConfigResponse;

/// Default base URL of the research backend
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";

/// Default local inference endpoint
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://127.0.0.1:8080/invocations";

/// 30 minutes
const DEFAULT_TIMEOUT_MS: u64 = 1_800_000;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;

/// Configuration errors are reported all at once so a misconfigured deployment can be fixed in one pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more settings failed validation
    #[error("Configuration validation failed:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

/// Endpoints, timing and headers used by the chat client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the research backend (serves `/api/research` and `/api/config`)
    pub app_url: Url,
    pub local_endpoint: Url,
    pub remote_endpoint: Option<Url>,
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Extra attempts after the first one, for retryable failures only
    pub max_retries: u32,
    /// Base delay of the exponential backoff
    pub retry_delay: Duration,
    pub headers: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_url: Url::parse(DEFAULT_APP_URL).expect("default app URL is valid"),
            local_endpoint: Url::parse(DEFAULT_LOCAL_ENDPOINT)
                .expect("default local endpoint is valid"),
            remote_endpoint: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            headers: default_headers(),
        }
    }
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())])
}

impl AppConfig {
    /// Loads the configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing every invalid variable
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, which maps a variable name to its value
    ///
    /// Unset and blank variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing every invalid variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();
        let mut problems = Vec::new();

        let app_url = get("APP_URL").map_or(Some(defaults.app_url), |value| {
            parse_url(&value, "APP_URL", &mut problems)
        });
        let local_endpoint = get("LOCAL_ENDPOINT").map_or(Some(defaults.local_endpoint), |value| {
            parse_url(&value, "LOCAL_ENDPOINT", &mut problems)
        });
        let remote_endpoint =
            get("REMOTE_ENDPOINT").and_then(|value| parse_url(&value, "REMOTE_ENDPOINT", &mut problems));

        let timeout = get("REQUEST_TIMEOUT").map_or(Some(DEFAULT_TIMEOUT_MS), |value| {
            parse_positive(&value, "REQUEST_TIMEOUT", &mut problems)
        });
        let max_retries = get("MAX_RETRIES").map_or(Some(DEFAULT_MAX_RETRIES), |value| {
            let parsed = value.trim().parse::<u32>().ok();
            if parsed.is_none() {
                problems.push(format!(
                    "MAX_RETRIES must be a non-negative integer, got: {value}"
                ));
            }
            parsed
        });
        let retry_delay = get("RETRY_DELAY").map_or(Some(DEFAULT_RETRY_DELAY_MS), |value| {
            parse_positive(&value, "RETRY_DELAY", &mut problems)
        });

        let mut headers = default_headers();
        if let Some(raw) = get("REQUEST_HEADERS") {
            match parse_headers(&raw) {
                Ok(extra) => headers.extend(extra),
                Err(problem) => problems.push(problem),
            }
        }

        match (app_url, local_endpoint, timeout, max_retries, retry_delay) {
            (Some(app_url), Some(local_endpoint), Some(timeout), Some(max_retries), Some(retry_delay))
                if problems.is_empty() =>
            {
                let config = Self {
                    app_url,
                    local_endpoint,
                    remote_endpoint,
                    timeout: Duration::from_millis(timeout),
                    max_retries,
                    retry_delay: Duration::from_millis(retry_delay),
                    headers,
                };
                config.validate()?;
                Ok(config)
            }
            _ => Err(ConfigError::Invalid(problems)),
        }
    }

    /// Checks invariants of an already-built configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the timeout or retry delay is zero,
    /// or an endpoint is not an HTTP(S) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        for (name, url) in [
            ("APP_URL", Some(&self.app_url)),
            ("LOCAL_ENDPOINT", Some(&self.local_endpoint)),
            ("REMOTE_ENDPOINT", self.remote_endpoint.as_ref()),
        ] {
            if let Some(url) = url {
                if !matches!(url.scheme(), "http" | "https") {
                    problems.push(format!("{name} must be an http(s) URL, got: {url}"));
                }
            }
        }
        if self.timeout.is_zero() {
            problems.push("Timeout must be greater than 0".to_string());
        }
        if self.retry_delay.is_zero() {
            problems.push("Retry delay must be greater than 0".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    /// URL of the research proxy route on the backend
    #[must_use]
    pub fn research_url(&self) -> Url {
        self.app_url
            .join("/api/research")
            .unwrap_or_else(|_| self.app_url.clone())
    }

    /// Projects the configuration onto the `GET /api/config` body
    #[must_use]
    pub fn to_response(&self) -> ConfigResponse {
        ConfigResponse {
            app_url: self.app_url.to_string(),
            local_endpoint: self.local_endpoint.to_string(),
            remote_endpoint: self
                .remote_endpoint
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            request_timeout: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            max_retries: self.max_retries,
            retry_delay: u64::try_from(self.retry_delay.as_millis()).unwrap_or(u64::MAX),
            request_headers: self.headers.clone(),
        }
    }

    /// Rebuilds and validates a configuration received from `GET /api/config`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if any field fails validation
    pub fn from_response(response: ConfigResponse) -> Result<Self, ConfigError> {
        let mut problems = Vec::new();
        let app_url = parse_url(&response.app_url, "appUrl", &mut problems);
        let local_endpoint = parse_url(&response.local_endpoint, "localEndpoint", &mut problems);
        let remote_endpoint = if response.remote_endpoint.trim().is_empty() {
            None
        } else {
            parse_url(&response.remote_endpoint, "remoteEndpoint", &mut problems)
        };

        let (Some(app_url), Some(local_endpoint)) = (app_url, local_endpoint) else {
            return Err(ConfigError::Invalid(problems));
        };
        if !problems.is_empty() {
            return Err(ConfigError::Invalid(problems));
        }

        let headers = if response.request_headers.is_empty() {
            default_headers()
        } else {
            response.request_headers
        };

        let config = Self {
            app_url,
            local_endpoint,
            remote_endpoint,
            timeout: Duration::from_millis(response.request_timeout),
            max_retries: response.max_retries,
            retry_delay: Duration::from_millis(response.retry_delay),
            headers,
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_url(value: &str, field: &str, problems: &mut Vec<String>) -> Option<Url> {
    let url = Url::parse(value.trim()).ok();
    if url.is_none() {
        problems.push(format!("{field} must be a valid URL, got: {value}"));
    }
    url
}

fn parse_positive(value: &str, field: &str, problems: &mut Vec<String>) -> Option<u64> {
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Some(parsed),
        _ => {
            problems.push(format!("{field} must be a positive integer, got: {value}"));
            None
        }
    }
}

fn parse_headers(raw: &str) -> Result<BTreeMap<String, String>, String> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| format!("Invalid JSON format for REQUEST_HEADERS: {e}"))?;

    let serde_json::Value::Object(map) = value else {
        return Err("REQUEST_HEADERS must be a valid JSON object".to_string());
    };

    map.into_iter()
        .map(|(name, value)| match value {
            serde_json::Value::String(value) => Ok((name, value)),
            other => Err(format!(
                "REQUEST_HEADERS value for {name} must be a string, got: {other}"
            )),
        })
        .collect()
}
