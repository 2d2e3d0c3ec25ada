use std::sync::Arc;
use std::time::Duration;

use aide::openapi::OpenApi;
use axum::Extension;
use common_types::AppConfig;
use datadog_tracing::axum::{shutdown_signal, OtelAxumLayer, OtelInResponseLayer};
use tokio::net::TcpListener;

use crate::research::ResearchService;
use crate::routes;
use crate::types::{AuthSettings, Environment};

/// Longest a request may take, sized for slow research queries
pub const REQUEST_BUDGET: Duration = Duration::from_secs(30 * 60);

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    environment: Environment,
    app_config: Arc<AppConfig>,
    research_service: Arc<ResearchService>,
    auth_settings: AuthSettings,
    http_client: reqwest::Client,
) -> anyhow::Result<()> {
    let mut openapi = OpenApi::default();

    let router = routes::handler()
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(app_config))
        .layer(Extension(research_service))
        .layer(Extension(auth_settings))
        .layer(Extension(http_client))
        // Include trace context as header into the response
        .layer(OtelInResponseLayer)
        // Start OpenTelemetry trace on incoming request
        .layer(OtelAxumLayer::default())
        .layer(tower_http::timeout::TimeoutLayer::new(REQUEST_BUDGET));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], Environment::port()?));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 Research Backend started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}
