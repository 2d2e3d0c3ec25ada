use axum::{Extension, Json};
use common_types::{AuthConfigResponse, OidcDiscoveryResponse};
use serde::Deserialize;

use crate::types::{AppError, AuthSettings};

/// Fields of the discovery document the route reports
#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    issuer: Option<String>,
    authorization_endpoint: Option<String>,
    token_endpoint: Option<String>,
}

/// Sign-in configuration
///
/// The client-safe OIDC settings. Responds `500` when any `COGNITO_*`
/// variable is missing.
#[allow(clippy::unused_async)]
pub async fn get_auth_config(
    Extension(auth): Extension<AuthSettings>,
) -> Result<Json<AuthConfigResponse>, AppError> {
    Ok(Json(auth?.to_response()))
}

/// Identity provider check
///
/// Fetches the provider's OIDC discovery document to confirm the authority is reachable.
pub async fn discovery(
    Extension(auth): Extension<AuthSettings>,
    Extension(http): Extension<reqwest::Client>,
) -> Result<Json<OidcDiscoveryResponse>, AppError> {
    let auth = auth.map_err(|e| {
        tracing::warn!("Discovery requested without sign-in settings: {e}");
        AppError::internal("No authority configured", false)
    })?;

    let response = http.get(auth.discovery_url()).send().await.map_err(|e| {
        tracing::warn!("Discovery request failed: {e}");
        AppError::internal("Network error fetching discovery document", true)
    })?;

    if !response.status().is_success() {
        tracing::warn!("Discovery document returned {}", response.status());
        return Err(AppError::internal("Failed to fetch discovery document", true));
    }

    let document = response.json::<DiscoveryDocument>().await.map_err(|e| {
        tracing::warn!("Invalid discovery document: {e}");
        AppError::internal("Failed to fetch discovery document", true)
    })?;

    Ok(Json(OidcDiscoveryResponse {
        success: true,
        issuer: document.issuer,
        authorization_endpoint: document.authorization_endpoint,
        token_endpoint: document.token_endpoint,
    }))
}
