mod auth;
mod config;
mod docs;
mod health;
mod research;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};

/// Creates the router with all handler routes
#[must_use]
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler))
        .api_route(
            "/api/research",
            post(research::query).get(research::agent_health),
        )
        .api_route("/api/config", get(config::get_config))
        .api_route("/api/auth/config", get(auth::get_auth_config))
        .api_route("/api/auth/discovery", get(auth::discovery))
}
