//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};

const DEFAULT_AWS_REGION: &str = "us-east-1";
const DEFAULT_PORT: u16 = 3000;

/// Application environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development | Self::Staging)
    }

    /// Port the server listens on, from `PORT`
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but not a valid port number
    pub fn port() -> Result<u16, std::num::ParseIntError> {
        env::var("PORT").map_or(Ok(DEFAULT_PORT), |p| p.trim().parse())
    }

    /// AWS region for the agent runtime, from `AWS_REGION`
    #[must_use]
    pub fn aws_region() -> String {
        env::var("AWS_REGION")
            .ok()
            .filter(|region| !region.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string())
    }

    /// ARN of the research agent runtime, if configured
    #[must_use]
    pub fn agent_runtime_arn() -> Option<String> {
        env::var("BEDROCK_AGENT_RUNTIME_ARN")
            .ok()
            .filter(|arn| !arn.trim().is_empty())
    }

    /// Optional endpoint qualifier for the agent runtime
    #[must_use]
    pub fn agent_qualifier() -> Option<String> {
        env::var("BEDROCK_AGENT_QUALIFIER").ok()
    }

    /// AWS configuration with retry and timeout settings
    ///
    /// Research queries can run for most of the request budget, so only the
    /// connection phase gets a short timeout.
    pub async fn aws_config() -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .connect_timeout(Duration::from_secs(10))
            .build();

        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(Self::aws_region()))
            .retry_config(retry_config)
            .timeout_config(timeout_config)
            .load()
            .await
    }
}
