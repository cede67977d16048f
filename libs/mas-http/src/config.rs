use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Default User-Agent string for requests
pub const DEFAULT_USER_AGENT: &str = concat!("mas-http/", env!("CARGO_PKG_VERSION"));

/// Default OAuth client used for the password grant
pub const DEFAULT_CLIENT_ID: &str = "sas.ec";

/// Default response body limit (10 MB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Transport security mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportSecurity {
    /// Only `https://` base URLs are accepted
    #[default]
    TlsOnly,
    /// `http://` is accepted as well; intended for mock servers and local gateways
    AllowInsecureHttp,
}

/// How the session authenticates against the service.
#[derive(Debug, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credentials {
    /// No `Authorization` header is sent
    #[default]
    None,
    /// Pre-issued bearer token
    Token { token: SecretString },
    /// Username/password exchanged for a bearer token on first use
    Password {
        username: String,
        password: SecretString,
        #[serde(default = "default_client_id")]
        client_id: String,
    },
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_owned()
}

/// Session configuration.
///
/// Deserializable so binaries can layer it from files and environment;
/// durations use humantime notation (`"30s"`, `"2m"`).
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Service base URL, e.g. `https://viya.example.com`
    pub base_url: String,

    pub credentials: Credentials,

    /// Timeout for a single request (default: 30s)
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,

    /// Maximum response body size in bytes
    pub max_body_size: usize,

    pub user_agent: String,

    pub transport: TransportSecurity,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            credentials: Credentials::None,
            request_timeout: Duration::from_secs(30),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::TlsOnly,
        }
    }
}

impl SessionConfig {
    /// Configuration for `base_url` with all other settings defaulted.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.with_credentials(Credentials::Token {
            token: SecretString::from(token.into()),
        })
    }

    #[must_use]
    pub fn with_password(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.with_credentials(Credentials::Password {
            username: username.into(),
            password: SecretString::from(password.into()),
            client_id: default_client_id(),
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Accept `http://` base URLs (testing only).
    #[must_use]
    pub fn allow_insecure_http(mut self) -> Self {
        self.transport = TransportSecurity::AllowInsecureHttp;
        self
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}
