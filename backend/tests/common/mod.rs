// Not every util is used in every test, so we allow dead code
#![allow(unused_imports, dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Extension, Router};
use common_types::AppConfig;
use research_backend::{
    agent_runtime::{mock::MockAgentRuntime, AgentRuntime},
    research::ResearchService,
    routes,
    types::{AuthConfig, AuthConfigError, AuthSettings, Environment},
};
use tower::ServiceExt;

/// Initialises test logging
pub fn setup_test_env() {
    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Sign-in settings pointing at `authority`
pub fn auth_settings(authority: &str) -> AuthSettings {
    let vars = HashMap::from([
        ("COGNITO_AUTHORITY", authority.to_string()),
        ("COGNITO_CLIENT_ID", "test-client".to_string()),
        ("COGNITO_REDIRECT_URI", "http://localhost:3000/auth-callback".to_string()),
        ("COGNITO_LOGOUT_URI", "http://localhost:3000".to_string()),
        ("COGNITO_DOMAIN", "https://research-test.auth.us-east-1.amazoncognito.com".to_string()),
        ("COGNITO_SCOPE", "openid email".to_string()),
    ]);
    AuthConfig::from_lookup(|name| vars.get(name).cloned()).map(Arc::new)
}

/// Router with a scripted agent runtime
pub struct TestSetup {
    pub router: Router,
    pub runtime: Option<Arc<MockAgentRuntime>>,
}

impl TestSetup {
    /// Router whose agent replies from `runtime`
    pub fn new(runtime: MockAgentRuntime) -> Self {
        let runtime = Arc::new(runtime);
        let service = ResearchService::new(Some(runtime.clone()));
        Self::build(service, auth_settings("https://issuer.example.com"), Some(runtime))
    }

    /// Router without an agent runtime or sign-in settings
    pub fn unconfigured() -> Self {
        Self::build(
            ResearchService::new(None),
            Err(AuthConfigError::Missing(vec!["COGNITO_AUTHORITY"])),
            None,
        )
    }

    pub fn with_service(service: ResearchService, auth: AuthSettings) -> Self {
        Self::build(service, auth, None)
    }

    fn build(
        service: ResearchService,
        auth: AuthSettings,
        runtime: Option<Arc<MockAgentRuntime>>,
    ) -> Self {
        setup_test_env();

        let router = routes::handler()
            .layer(Extension(Environment::Development))
            .layer(Extension(Arc::new(AppConfig::default())))
            .layer(Extension(Arc::new(service)))
            .layer(Extension(auth))
            .layer(Extension(reqwest::Client::new()))
            .into();

        Self { router, runtime }
    }

    pub fn payloads(&self) -> Vec<String> {
        self.runtime
            .as_ref()
            .map(|runtime| runtime.payloads())
            .unwrap_or_default()
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_raw_post_request(route, payload.to_string()).await
    }

    pub async fn send_raw_post_request(
        &self,
        route: &str,
        body: String,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(body))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn parse_response_body(
        &self,
        response: Response,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
        use http_body_util::BodyExt;

        let body = response.into_body().collect().await?.to_bytes();
        let json = serde_json::from_slice(&body)?;
        Ok(json)
    }
}
