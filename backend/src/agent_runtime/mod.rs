//! Client for the hosted research agent

mod unwrap;

use std::fmt::Debug;

use aws_sdk_bedrockagentcore::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::Blob,
    Client,
};
use thiserror::Error;

pub use unwrap::{unwrap_agent_payload, PayloadFormat, UnwrappedContent};

/// Errors from invoking the agent runtime
///
/// The display text is safe to hand to end users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentRuntimeError {
    /// The caller's credentials may not invoke the agent
    #[error("Access denied. Please check your AWS credentials and Bedrock Agent permissions.")]
    AccessDenied,
    /// No agent runtime behind the configured ARN
    #[error("Bedrock Agent not found. Please verify the Agent Runtime ARN is correct and the agent is deployed.")]
    NotFound,
    /// The runtime rejected the payload or parameters
    #[error("Invalid request parameters. The payload format or agent configuration may be incorrect.")]
    InvalidRequest,
    /// The agent itself failed
    #[error("Runtime error from Bedrock Agent. Please check the agent configuration and deployment status.")]
    Runtime,
    /// The SDK gave up waiting
    #[error("Bedrock Agent request timeout")]
    Timeout,
    /// Dispatch failed or the reply could not be read
    #[error("{0}")]
    Transport(String),
    /// Any other service error, with its message
    #[error("{0}")]
    Service(String),
}

impl AgentRuntimeError {
    /// Classifies a service error by its AWS error code
    #[must_use]
    pub fn from_code(code: Option<&str>, message: String) -> Self {
        match code {
            Some("AccessDeniedException") => Self::AccessDenied,
            Some("ResourceNotFoundException") => Self::NotFound,
            Some("ValidationException") => Self::InvalidRequest,
            Some("RuntimeClientError") => Self::Runtime,
            _ => Self::Service(message),
        }
    }

    fn from_sdk<E, R>(err: &SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: Debug,
    {
        match err {
            SdkError::TimeoutError(_) => Self::Timeout,
            SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
                Self::Transport(DisplayErrorContext(err).to_string())
            }
            _ => {
                let message = err
                    .message()
                    .map_or_else(|| DisplayErrorContext(err).to_string(), str::to_string);
                Self::from_code(err.code(), message)
            }
        }
    }
}

/// The hosted agent the research route forwards queries to
#[async_trait::async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Sends `payload` to the agent and returns its raw reply
    async fn invoke(&self, payload: Vec<u8>) -> Result<Vec<u8>, AgentRuntimeError>;
}

/// [`AgentRuntime`] backed by AWS Bedrock Agent Core
pub struct BedrockAgentRuntime {
    client: Client,
    agent_runtime_arn: String,
    qualifier: Option<String>,
}

impl BedrockAgentRuntime {
    /// Creates the runtime client. Empty or `DEFAULT` qualifiers are not sent.
    #[must_use]
    pub fn new(client: Client, agent_runtime_arn: String, qualifier: Option<String>) -> Self {
        let qualifier = qualifier
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty() && q != "DEFAULT");

        Self {
            client,
            agent_runtime_arn,
            qualifier,
        }
    }
}

#[async_trait::async_trait]
impl AgentRuntime for BedrockAgentRuntime {
    async fn invoke(&self, payload: Vec<u8>) -> Result<Vec<u8>, AgentRuntimeError> {
        let output = self
            .client
            .invoke_agent_runtime()
            .agent_runtime_arn(&self.agent_runtime_arn)
            .set_qualifier(self.qualifier.clone())
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| AgentRuntimeError::from_sdk(&e))?;

        let body = output
            .response
            .collect()
            .await
            .map_err(|e| AgentRuntimeError::Transport(e.to_string()))?;

        Ok(body.into_bytes().to_vec())
    }
}

/// Scripted runtime for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::{AgentRuntime, AgentRuntimeError};

    /// Replays canned replies and records the payloads it was sent
    #[derive(Default)]
    pub struct MockAgentRuntime {
        replies: Mutex<VecDeque<Result<Vec<u8>, AgentRuntimeError>>>,
        delay: Option<Duration>,
        payloads: Mutex<Vec<Vec<u8>>>,
    }

    impl MockAgentRuntime {
        /// Replays `replies` in order, one per call
        #[must_use]
        pub fn new(replies: impl IntoIterator<Item = Result<Vec<u8>, AgentRuntimeError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                ..Self::default()
            }
        }

        /// Replies with `text` once
        #[must_use]
        pub fn replying(text: &str) -> Self {
            Self::new([Ok(text.as_bytes().to_vec())])
        }

        /// Fails once with `err`
        #[must_use]
        pub fn failing(err: AgentRuntimeError) -> Self {
            Self::new([Err(err)])
        }

        /// Waits `delay` before every reply
        #[must_use]
        pub const fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Payloads received so far, decoded as UTF-8
        ///
        /// # Panics
        ///
        /// If the lock is poisoned
        #[must_use]
        pub fn payloads(&self) -> Vec<String> {
            self.payloads
                .lock()
                .unwrap()
                .iter()
                .map(|p| String::from_utf8_lossy(p).into_owned())
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl AgentRuntime for MockAgentRuntime {
        async fn invoke(&self, payload: Vec<u8>) -> Result<Vec<u8>, AgentRuntimeError> {
            self.payloads.lock().unwrap().push(payload);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentRuntimeError::Service("no reply scripted".to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_error_codes_map_to_user_messages() {
        let err = AgentRuntimeError::from_code(Some("ResourceNotFoundException"), String::new());
        assert_eq!(err, AgentRuntimeError::NotFound);
        assert_eq!(
            err.to_string(),
            "Bedrock Agent not found. Please verify the Agent Runtime ARN is correct and the agent is deployed."
        );

        assert_eq!(
            AgentRuntimeError::from_code(Some("AccessDeniedException"), String::new()),
            AgentRuntimeError::AccessDenied
        );
        assert_eq!(
            AgentRuntimeError::from_code(Some("ValidationException"), String::new()),
            AgentRuntimeError::InvalidRequest
        );
        assert_eq!(
            AgentRuntimeError::from_code(Some("RuntimeClientError"), String::new()),
            AgentRuntimeError::Runtime
        );
    }

    #[test]
    fn test_unknown_code_keeps_service_message() {
        let err = AgentRuntimeError::from_code(
            Some("ThrottlingException"),
            "Rate exceeded".to_string(),
        );
        assert_eq!(err.to_string(), "Rate exceeded");
    }

    #[test]
    fn test_default_qualifier_is_dropped() {
        let config = aws_sdk_bedrockagentcore::Config::builder()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new("us-east-1"))
            .build();
        let client = Client::from_conf(config);

        for qualifier in [None, Some(String::new()), Some("DEFAULT".to_string())] {
            let runtime = BedrockAgentRuntime::new(client.clone(), "arn".to_string(), qualifier);
            assert_eq!(runtime.qualifier, None);
        }

        let runtime = BedrockAgentRuntime::new(client, "arn".to_string(), Some(" v2 ".to_string()));
        assert_eq!(runtime.qualifier.as_deref(), Some("v2"));
    }
}
