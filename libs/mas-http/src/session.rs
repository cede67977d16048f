use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{HeaderValue, Method, Request, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use mas_restobj::RestObj;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};
use url::Url;

use crate::config::{Credentials, SessionConfig, TransportSecurity};
use crate::error::TransportError;
use crate::tls::build_https_connector;
use crate::transport::RestTransport;

/// Maximum number of body characters kept in error messages
pub(crate) const ERROR_BODY_PREVIEW_LIMIT: usize = 256;

const JSON: &str = "application/json";

type HyperClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Authenticated HTTP session against one service host.
///
/// The session is the explicit context handle every client operation goes
/// through: it owns the base URL, the credentials, the pooled connections and
/// the bearer token obtained for those credentials. The token is acquired on
/// the first request and reused afterwards.
///
/// `HttpSession` is `Send + Sync`; share it behind an `Arc<dyn RestTransport>`.
pub struct HttpSession {
    client: HyperClient,
    base: String,
    origin: url::Origin,
    pub(crate) credentials: Credentials,
    pub(crate) token: OnceCell<secrecy::SecretString>,
    timeout: Duration,
    max_body_size: usize,
    user_agent: HeaderValue,
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("base", &self.base)
            .field("credentials", &self.credentials)
            .field("authenticated", &self.token.initialized())
            .field("timeout", &self.timeout)
            .field("max_body_size", &self.max_body_size)
            .finish_non_exhaustive()
    }
}

impl HttpSession {
    /// Build a session from configuration.
    ///
    /// No network traffic happens here; authentication is deferred to the
    /// first request.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or uses a scheme the
    /// transport security mode rejects, or if TLS setup fails.
    pub fn new(config: SessionConfig) -> Result<Self, TransportError> {
        let base = validate_base_url(&config.base_url, config.transport)?;
        let origin = parse_url(&base)?.origin();

        if config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                base_url = %base,
                "insecure HTTP enabled; use only for testing with mock servers"
            );
        }

        let https = build_https_connector(config.transport)?;
        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .build::<_, Full<Bytes>>(https);

        let user_agent = HeaderValue::try_from(config.user_agent.as_str())?;

        Ok(Self {
            client,
            base,
            origin,
            credentials: config.credentials,
            token: OnceCell::new(),
            timeout: config.request_timeout,
            max_body_size: config.max_body_size,
            user_agent,
        })
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Absolute URL for a service path.
    ///
    /// Absolute `http(s)://` hrefs (as found in resource links) pass through
    /// only when they share the base URL's origin; the session's credentials
    /// are never sent to another host.
    ///
    /// # Errors
    /// [`TransportError::InvalidUri`] for an unparsable or foreign href.
    pub(crate) fn url_for(&self, path: &str) -> Result<String, TransportError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            if parse_url(path)?.origin() != self.origin {
                return Err(TransportError::InvalidUri {
                    url: path.to_owned(),
                    reason: format!("not on the session host {}", self.base),
                });
            }
            Ok(path.to_owned())
        } else if path.starts_with('/') {
            Ok(format!("{}{path}", self.base))
        } else {
            Ok(format!("{}/{path}", self.base))
        }
    }

    /// Build and send one request, returning status and the size-limited body.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<(StatusCode, Bytes), TransportError> {
        let mut builder = Request::builder()
            .method(method)
            .uri(self.url_for(path)?)
            .header(ACCEPT, JSON)
            .header(USER_AGENT, self.user_agent.clone());

        if let Some(auth) = self.authorization().await? {
            builder = builder.header(AUTHORIZATION, auth);
        }

        let request = match body {
            Some(bytes) => builder.header(CONTENT_TYPE, JSON).body(Full::new(bytes))?,
            None => builder.body(Full::new(Bytes::new()))?,
        };

        self.exchange(request).await
    }

    /// Execute a prepared request under the session timeout.
    pub(crate) async fn exchange(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<(StatusCode, Bytes), TransportError> {
        let limit = self.max_body_size;
        let exchange = async {
            let response = self.client.request(request).await?;
            let status = response.status();
            let body = Limited::new(response.into_body(), limit)
                .collect()
                .await
                .map_err(|e| {
                    if e.downcast_ref::<LengthLimitError>().is_some() {
                        TransportError::BodyTooLarge { limit }
                    } else {
                        TransportError::Transport(e)
                    }
                })?
                .to_bytes();
            Ok::<_, TransportError>((status, body))
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
    }
}

#[async_trait]
impl RestTransport for HttpSession {
    #[instrument(skip_all, fields(method = "GET", path = %path))]
    async fn get(&self, path: &str) -> Result<Option<RestObj>, TransportError> {
        let (status, body) = self.send(Method::GET, path, None).await?;
        debug!(status = %status, bytes = body.len(), "response received");

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        ensure_success(&Method::GET, path, status, &body)?;
        decode(&body).map(Some)
    }

    #[instrument(skip_all, fields(method = "POST", path = %path))]
    async fn post(&self, path: &str, body: &Value) -> Result<RestObj, TransportError> {
        let payload = Bytes::from(serde_json::to_vec(body)?);
        let (status, body) = self.send(Method::POST, path, Some(payload)).await?;
        debug!(status = %status, bytes = body.len(), "response received");

        ensure_success(&Method::POST, path, status, &body)?;
        decode(&body)
    }

    #[instrument(skip_all, fields(method = "DELETE", path = %path))]
    async fn delete(&self, path: &str) -> Result<(), TransportError> {
        let (status, body) = self.send(Method::DELETE, path, None).await?;
        debug!(status = %status, "response received");

        ensure_success(&Method::DELETE, path, status, &body)
    }
}

fn parse_url(raw: &str) -> Result<Url, TransportError> {
    Url::parse(raw).map_err(|e| TransportError::InvalidUri {
        url: raw.to_owned(),
        reason: e.to_string(),
    })
}

fn validate_base_url(raw: &str, transport: TransportSecurity) -> Result<String, TransportError> {
    let url = parse_url(raw)?;

    match (url.scheme(), transport) {
        ("https", _) | ("http", TransportSecurity::AllowInsecureHttp) => {}
        ("http", TransportSecurity::TlsOnly) => {
            return Err(TransportError::InvalidScheme {
                scheme: "http".to_owned(),
                reason: "HTTPS is required; enable insecure HTTP explicitly for testing".to_owned(),
            });
        }
        (other, _) => {
            return Err(TransportError::InvalidScheme {
                scheme: other.to_owned(),
                reason: "only http and https are supported".to_owned(),
            });
        }
    }

    if url.host_str().is_none() {
        return Err(TransportError::InvalidUri {
            url: raw.to_owned(),
            reason: "missing host".to_owned(),
        });
    }

    Ok(url.as_str().trim_end_matches('/').to_owned())
}

pub(crate) fn ensure_success(
    method: &Method,
    path: &str,
    status: StatusCode,
    body: &Bytes,
) -> Result<(), TransportError> {
    if status.is_success() {
        return Ok(());
    }
    Err(TransportError::HttpStatus {
        method: method.clone(),
        path: path.to_owned(),
        status,
        body_preview: body_preview(body),
    })
}

fn body_preview(body: &Bytes) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(ERROR_BODY_PREVIEW_LIMIT)
        .collect()
}

fn decode(body: &Bytes) -> Result<RestObj, TransportError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RestObj::new());
    }
    Ok(RestObj::from_slice(body)?)
}
