//! Research proxy and configuration server

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Hosted research agent client and reply unwrapping
pub mod agent_runtime;

/// Research queries against the agent
pub mod research;

/// HTTP routes
pub mod routes;

/// Server startup
pub mod server;

/// Environment, errors and extractors
pub mod types;
