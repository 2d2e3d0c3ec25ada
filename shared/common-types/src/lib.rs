//! Wire types shared by the research backend and the chat client

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

mod config;

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use config::{AppConfig, ConfigError, DEFAULT_APP_URL, DEFAULT_LOCAL_ENDPOINT};

/// Source tag the research proxy puts on every successful reply
pub const RESEARCH_SOURCE: &str = "bedrock-agent";

/// Request body for the local and remote chat endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChatRequest {
    pub prompt: String,
}

/// Response body returned by the local and remote chat endpoints
///
/// A well-formed reply carries `response`; an application-level failure carries `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Request body for `POST /api/research`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResearchRequest {
    pub query: String,
}

/// Successful reply of `POST /api/research`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResearchResponse {
    /// Unwrapped agent output
    pub content: String,
    /// RFC 3339 time the reply was produced
    pub timestamp: String,
    pub source: String,
}

/// Health of the agent runtime as seen by `GET /api/research`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AgentHealthStatus {
    Healthy,
    Unhealthy,
    Error,
}

/// Body of `GET /api/research`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResearchHealthResponse {
    pub status: AgentHealthStatus,
    pub service: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `GET /api/config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub app_url: String,
    pub local_endpoint: String,
    /// Empty when no remote endpoint is configured
    pub remote_endpoint: String,
    /// Per-attempt timeout in milliseconds
    pub request_timeout: u64,
    pub max_retries: u32,
    /// Base backoff delay in milliseconds
    pub retry_delay: u64,
    pub request_headers: BTreeMap<String, String>,
}

/// Client-safe OIDC settings returned by `GET /api/auth/config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuthConfigResponse {
    pub authority: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub logout_uri: String,
    /// Hosted logout URL that returns the user to `logout_uri`
    pub logout_url: String,
    pub domain: String,
    pub scope: String,
    pub response_type: String,
    #[serde(rename = "automaticSilentRenew")]
    pub automatic_silent_renew: bool,
    #[serde(rename = "loadUserInfo")]
    pub load_user_info: bool,
}

/// Summary of the identity provider's discovery document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OidcDiscoveryResponse {
    pub success: bool,
    pub issuer: Option<String>,
    pub authorization_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
}
