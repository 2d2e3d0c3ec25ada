mod auth;
mod environment;
mod error;
mod extractors;

pub use auth::{AuthConfig, AuthConfigError, AuthSettings};
pub use environment::Environment;
pub use error::{ApiErrorResponse, AppError};
pub use extractors::JsonBody;
