//! Research queries against the hosted agent

use std::sync::Arc;
use std::time::{Duration, Instant};

use common_types::AgentHealthStatus;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::agent_runtime::{unwrap_agent_payload, AgentRuntime, AgentRuntimeError};

/// Budget for one agent call, just under the 30 minute request budget
pub const AGENT_TIMEOUT: Duration = Duration::from_secs(29 * 60);

/// Query sent by [`ResearchService::health_check`]
pub const HEALTH_CHECK_QUERY: &str = "health check";

/// Why a research query produced no answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResearchError {
    /// No agent runtime ARN was configured
    #[error("BEDROCK_AGENT_RUNTIME_ARN environment variable is required")]
    NotConfigured,
    /// The agent did not answer within the budget
    #[error("Bedrock Agent request timeout after 29 minutes")]
    Timeout,
    /// The runtime call failed
    #[error(transparent)]
    Agent(AgentRuntimeError),
    /// The agent answered with no text
    #[error("No content received from Bedrock Agent")]
    EmptyResponse,
}

impl From<AgentRuntimeError> for ResearchError {
    fn from(err: AgentRuntimeError) -> Self {
        match err {
            AgentRuntimeError::Timeout => Self::Timeout,
            other => Self::Agent(other),
        }
    }
}

/// Forwards queries to the agent and unwraps its replies
pub struct ResearchService {
    runtime: Option<Arc<dyn AgentRuntime>>,
    timeout: Duration,
}

impl ResearchService {
    /// A service without a runtime answers every call with [`ResearchError::NotConfigured`]
    #[must_use]
    pub const fn new(runtime: Option<Arc<dyn AgentRuntime>>) -> Self {
        Self {
            runtime,
            timeout: AGENT_TIMEOUT,
        }
    }

    /// Overrides [`AGENT_TIMEOUT`]
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether an agent runtime is set up
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.runtime.is_some()
    }

    /// Sends `query` to the agent and returns the answer text
    ///
    /// # Errors
    ///
    /// - [`ResearchError::NotConfigured`] when no agent runtime is set up
    /// - [`ResearchError::Timeout`] when the agent does not answer within the budget
    /// - [`ResearchError::Agent`] when the runtime call fails
    /// - [`ResearchError::EmptyResponse`] when the reply has no text
    pub async fn invoke(&self, query: &str) -> Result<String, ResearchError> {
        let runtime = self.runtime.as_ref().ok_or(ResearchError::NotConfigured)?;
        let payload = json!({ "prompt": query }).to_string().into_bytes();

        let started = Instant::now();
        let reply = tokio::time::timeout(self.timeout, runtime.invoke(payload))
            .await
            .map_err(|_| ResearchError::Timeout)??;

        let decoded = String::from_utf8_lossy(&reply);
        if decoded.trim().is_empty() {
            return Err(ResearchError::EmptyResponse);
        }

        let content = unwrap_agent_payload(&decoded);
        debug!(format = ?content.format, "Unwrapped agent reply");
        if content.text.is_empty() {
            return Err(ResearchError::EmptyResponse);
        }

        info!(
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            reply_bytes = reply.len(),
            "Research query answered"
        );

        Ok(content.text)
    }

    /// Probes the agent with a fixed query
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::NotConfigured`] when no agent runtime is set up.
    /// Failed probes are reported as [`AgentHealthStatus::Unhealthy`].
    pub async fn health_check(&self) -> Result<AgentHealthStatus, ResearchError> {
        if !self.is_configured() {
            return Err(ResearchError::NotConfigured);
        }

        match self.invoke(HEALTH_CHECK_QUERY).await {
            Ok(_) => Ok(AgentHealthStatus::Healthy),
            Err(e) => {
                warn!("Research agent health check failed: {e}");
                Ok(AgentHealthStatus::Unhealthy)
            }
        }
    }
}
