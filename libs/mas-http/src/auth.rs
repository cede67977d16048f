//! Bearer token handling for [`HttpSession`].

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method, Request};
use http_body_util::Full;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::Credentials;
use crate::error::TransportError;
use crate::session::{HttpSession, ensure_success};

/// Token endpoint of the logon service, relative to the base URL
pub const TOKEN_PATH: &str = "/SASLogon/oauth/token";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

impl HttpSession {
    /// `Authorization` header for the configured credentials.
    ///
    /// Password credentials are exchanged once; concurrent first callers
    /// wait on the same exchange.
    pub(crate) async fn authorization(&self) -> Result<Option<HeaderValue>, TransportError> {
        match &self.credentials {
            Credentials::None => Ok(None),
            Credentials::Token { token } => bearer(token).map(Some),
            Credentials::Password {
                username,
                password,
                client_id,
            } => {
                let token = self
                    .token
                    .get_or_try_init(|| self.request_token(username, password, client_id))
                    .await?;
                bearer(token).map(Some)
            }
        }
    }

    #[tracing::instrument(skip_all, fields(username = %username, client_id = %client_id))]
    async fn request_token(
        &self,
        username: &str,
        password: &SecretString,
        client_id: &str,
    ) -> Result<SecretString, TransportError> {
        let form = serde_urlencoded::to_string([
            ("grant_type", "password"),
            ("username", username),
            ("password", password.expose_secret()),
        ])?;

        let client_auth = general_purpose::STANDARD.encode(format!("{client_id}:"));
        let mut client_auth = HeaderValue::try_from(format!("Basic {client_auth}"))?;
        client_auth.set_sensitive(true);

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.url_for(TOKEN_PATH)?)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(AUTHORIZATION, client_auth)
            .body(Full::new(Bytes::from(form)))?;

        let (status, body) = self.exchange(request).await?;
        ensure_success(&Method::POST, TOKEN_PATH, status, &body)?;

        let response: TokenResponse = serde_json::from_slice(&body)?;
        if let Some(token_type) = response.token_type.as_deref()
            && !token_type.eq_ignore_ascii_case("bearer")
        {
            return Err(TransportError::Auth(format!(
                "unsupported token type '{token_type}'"
            )));
        }
        if response.access_token.is_empty() {
            return Err(TransportError::Auth("empty access token".to_owned()));
        }

        tracing::info!("session authenticated");
        Ok(SecretString::from(response.access_token))
    }
}

fn bearer(token: &SecretString) -> Result<HeaderValue, TransportError> {
    let mut value = HeaderValue::try_from(format!("Bearer {}", token.expose_secret()))?;
    value.set_sensitive(true);
    Ok(value)
}
