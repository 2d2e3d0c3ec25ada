use std::sync::Arc;

use aide::axum::IntoApiResponse;
use axum::{http::StatusCode, Extension, Json};
use chrono::{SecondsFormat, Utc};
use common_types::{AgentHealthStatus, ResearchHealthResponse, ResearchResponse, RESEARCH_SOURCE};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    research::ResearchService,
    types::{AppError, JsonBody},
};

/// Research query
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResearchBody {
    /// Question for the research agent, a non-empty string
    #[serde(default)]
    pub query: Value,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Ask the research agent
///
/// Forwards the query to the hosted agent and returns its answer. Agent
/// calls can take up to 29 minutes.
///
/// # Errors
///
/// - `400 BAD_REQUEST` - `query` is missing or not a string
/// - `408 REQUEST_TIMEOUT` - the agent did not answer in time
/// - `500 INTERNAL_SERVER_ERROR` - the agent is not configured or the call failed
pub async fn query(
    Extension(service): Extension<Arc<ResearchService>>,
    JsonBody(body): JsonBody<ResearchBody>,
) -> Result<Json<ResearchResponse>, AppError> {
    let query = body
        .query
        .as_str()
        .filter(|query| !query.is_empty())
        .ok_or_else(|| AppError::bad_request("Query is required and must be a string"))?;

    let content = service.invoke(query).await?;

    Ok(Json(ResearchResponse {
        content,
        timestamp: now(),
        source: RESEARCH_SOURCE.to_string(),
    }))
}

/// Research agent health
///
/// Sends a probe query to the agent. Responds `500` with status `error` when
/// the agent is not configured.
pub async fn agent_health(
    Extension(service): Extension<Arc<ResearchService>>,
) -> impl IntoApiResponse {
    let (status_code, status, error) = match service.health_check().await {
        Ok(status) => (StatusCode::OK, status, None),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            AgentHealthStatus::Error,
            Some(e.to_string()),
        ),
    };

    (
        status_code,
        Json(ResearchHealthResponse {
            status,
            service: RESEARCH_SOURCE.to_string(),
            timestamp: now(),
            error,
        }),
    )
}
