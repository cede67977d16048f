#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! REST transport for the Micro Analytic Score client
//!
//! This crate provides:
//! - [`RestTransport`], the three-verb contract (`get` / `post` / `delete`)
//!   the client is written against
//! - [`HttpSession`], a hyper-based implementation with rustls TLS, pooled
//!   connections, per-request timeouts and response size limits
//! - Bearer authentication from a pre-issued token or a password grant
//!   exchanged lazily on the first request
//!
//! # Example
//!
//! ```ignore
//! use mas_http::{HttpSession, RestTransport, SessionConfig};
//! use std::sync::Arc;
//!
//! let session = HttpSession::new(
//!     SessionConfig::new("https://viya.example.com").with_password("sasdemo", "Orion123"),
//! )?;
//! let transport: Arc<dyn RestTransport> = Arc::new(session);
//!
//! // 404 is `None`, not an error
//! let module = transport.get("/microanalyticScore/modules/scoring").await?;
//! ```

mod auth;
mod config;
mod error;
mod session;
mod tls;
mod transport;

pub use auth::TOKEN_PATH;
pub use config::{
    Credentials, DEFAULT_CLIENT_ID, DEFAULT_MAX_BODY_SIZE, DEFAULT_USER_AGENT, SessionConfig,
    TransportSecurity,
};
pub use error::TransportError;
pub use session::HttpSession;
pub use transport::RestTransport;
