//! Hosted sign-in (OIDC) settings served to clients

use std::env;
use std::sync::Arc;

use common_types::AuthConfigResponse;
use thiserror::Error;
use url::form_urlencoded;

/// Variables that must all be set for sign-in to be available
const REQUIRED_VARS: [&str; 6] = [
    "COGNITO_AUTHORITY",
    "COGNITO_CLIENT_ID",
    "COGNITO_REDIRECT_URI",
    "COGNITO_LOGOUT_URI",
    "COGNITO_DOMAIN",
    "COGNITO_SCOPE",
];

/// Sign-in settings as loaded at startup
pub type AuthSettings = Result<Arc<AuthConfig>, AuthConfigError>;

/// Sign-in settings could not be loaded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthConfigError {
    /// Unset or blank variables, in declaration order
    #[error("Missing required authentication environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Sign-in settings read from the `COGNITO_*` variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// OIDC issuer, `COGNITO_AUTHORITY`
    pub authority: String,
    /// App client id, `COGNITO_CLIENT_ID`
    pub client_id: String,
    /// Where the provider sends the user after sign-in
    pub redirect_uri: String,
    /// Where the provider sends the user after sign-out
    pub logout_uri: String,
    /// Hosted UI base URL, `COGNITO_DOMAIN`
    pub domain: String,
    /// Space-separated scopes
    pub scope: String,
}

impl AuthConfig {
    /// Reads the settings from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`AuthConfigError::Missing`] if any variable is unset or blank
    pub fn from_env() -> Result<Self, AuthConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the settings through `lookup`
    ///
    /// # Errors
    ///
    /// Returns [`AuthConfigError::Missing`] naming every unset or blank variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = Vec::with_capacity(REQUIRED_VARS.len());
        let mut missing = Vec::new();

        for name in REQUIRED_VARS {
            match lookup(name).filter(|value| !value.trim().is_empty()) {
                Some(value) => values.push(value),
                None => missing.push(name),
            }
        }

        let [authority, client_id, redirect_uri, logout_uri, domain, scope] =
            <[String; 6]>::try_from(values).map_err(|_| AuthConfigError::Missing(missing))?;

        Ok(Self {
            authority,
            client_id,
            redirect_uri,
            logout_uri,
            domain,
            scope,
        })
    }

    /// The client-safe view, with the fixed OIDC flow settings
    #[must_use]
    pub fn to_response(&self) -> AuthConfigResponse {
        AuthConfigResponse {
            authority: self.authority.clone(),
            client_id: self.client_id.clone(),
            redirect_uri: self.redirect_uri.clone(),
            logout_uri: self.logout_uri.clone(),
            logout_url: self.logout_url(),
            domain: self.domain.clone(),
            scope: self.scope.clone(),
            response_type: "code".to_string(),
            automatic_silent_renew: true,
            load_user_info: true,
        }
    }

    /// Hosted logout URL that returns the user to `logout_uri`
    #[must_use]
    pub fn logout_url(&self) -> String {
        let logout_uri: String = form_urlencoded::byte_serialize(self.logout_uri.as_bytes()).collect();
        format!(
            "{}/logout?client_id={}&logout_uri={logout_uri}",
            self.domain.trim_end_matches('/'),
            self.client_id
        )
    }

    /// Location of the provider's OIDC discovery document
    #[must_use]
    pub fn discovery_url(&self) -> String {
        format!(
            "{}/.well-known/openid-configuration",
            self.authority.trim_end_matches('/')
        )
    }
}
