use std::sync::Arc;

use axum::{Extension, Json};
use common_types::{AppConfig, ConfigResponse};

/// Client configuration
///
/// Endpoints, timeout and retry policy the chat client should use, so that
/// clients share one source of configuration.
#[allow(clippy::unused_async)]
pub async fn get_config(Extension(config): Extension<Arc<AppConfig>>) -> Json<ConfigResponse> {
    Json(config.to_response())
}
