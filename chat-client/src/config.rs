//! Loading the client configuration from the research backend

use std::time::Duration;

use common_types::{AppConfig, ConfigResponse};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::transport::Transport;

/// Upper bound on the config fetch, whatever the configured request timeout
const CONFIG_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches `GET {app_url}/api/config`, falling back to `fallback` when the backend
/// is unreachable, too slow or serves an invalid configuration.
///
/// The fetch is bounded by the smaller of `fallback.timeout` and ten seconds.
pub async fn load_config(transport: &dyn Transport, fallback: AppConfig) -> AppConfig {
    let Ok(url) = fallback.app_url.join("/api/config") else {
        return fallback;
    };
    let budget = fallback.timeout.min(CONFIG_FETCH_TIMEOUT);

    let response = match timeout(budget, transport.get(url.clone())).await {
        Ok(Ok(response)) if response.is_success() => response,
        Ok(Ok(response)) => {
            warn!(%url, status = response.status, "Config route failed, using local configuration");
            return fallback;
        }
        Ok(Err(e)) => {
            warn!(%url, error = %e, "Backend unreachable, using local configuration");
            return fallback;
        }
        Err(_) => {
            warn!(%url, ?budget, "Config route timed out, using local configuration");
            return fallback;
        }
    };

    let config = serde_json::from_str::<ConfigResponse>(&response.body)
        .map_err(|e| e.to_string())
        .and_then(|body| AppConfig::from_response(body).map_err(|e| e.to_string()));

    match config {
        Ok(config) => {
            info!(%url, "Loaded configuration from backend");
            config
        }
        Err(e) => {
            warn!(%url, error = %e, "Invalid configuration from backend, using local configuration");
            fallback
        }
    }
}
