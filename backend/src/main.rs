use std::sync::Arc;
use std::time::Duration;

use common_types::AppConfig;
use research_backend::{
    agent_runtime::{AgentRuntime, BedrockAgentRuntime},
    research::ResearchService,
    server,
    types::{AuthConfig, Environment},
};
use tracing_subscriber::{fmt, EnvFilter};

/// Timeout for the identity provider discovery check
const DISCOVERY_TIMEOUT_SECS: u64 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env();

    // Configure logging format based on environment
    // Use JSON format for staging/production (Datadog), regular format for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt()
                .json()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
        }
        Environment::Development => {
            fmt().with_env_filter(EnvFilter::from_default_env()).init();
        }
    }

    let app_config = Arc::new(AppConfig::from_env()?);

    let runtime: Option<Arc<dyn AgentRuntime>> = match Environment::agent_runtime_arn() {
        Some(arn) => {
            let client = aws_sdk_bedrockagentcore::Client::new(&Environment::aws_config().await);
            Some(Arc::new(BedrockAgentRuntime::new(
                client,
                arn,
                Environment::agent_qualifier(),
            )))
        }
        None => {
            tracing::warn!("BEDROCK_AGENT_RUNTIME_ARN is not set, research queries will fail");
            None
        }
    };
    let research_service = Arc::new(ResearchService::new(runtime));

    let auth_settings = AuthConfig::from_env().map(Arc::new);
    if let Err(e) = &auth_settings {
        tracing::warn!("Sign-in is not configured: {e}");
    }

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(DISCOVERY_TIMEOUT_SECS))
        .build()?;

    server::start(
        environment,
        app_config,
        research_service,
        auth_settings,
        http_client,
    )
    .await
}
