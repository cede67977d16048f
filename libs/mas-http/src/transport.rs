//! Transport contract consumed by the Micro Analytic Score client.

use async_trait::async_trait;
use mas_restobj::RestObj;
use serde_json::Value;

use crate::error::TransportError;

/// Minimal REST surface the client needs from a session.
///
/// Paths are service-relative (`/microanalyticScore/modules/...`) and may
/// carry a query string. Implementations own base URL, authentication and
/// timeouts; callers pass the handle explicitly instead of relying on an
/// ambient session.
///
/// Implementations are `Send + Sync` and hold no per-call state, so one
/// handle can be shared across concurrent callers behind an `Arc`.
#[async_trait]
pub trait RestTransport: Send + Sync {
    /// Fetch a resource.
    ///
    /// Returns `Ok(None)` when the server answers 404.
    ///
    /// # Errors
    /// Any other non-2xx status, network failure or undecodable body.
    async fn get(&self, path: &str) -> Result<Option<RestObj>, TransportError>;

    /// Create a resource or invoke an action with a JSON body.
    ///
    /// An empty 2xx body is returned as an empty [`RestObj`].
    ///
    /// # Errors
    /// Any non-2xx status, network failure or undecodable body.
    async fn post(&self, path: &str, body: &Value) -> Result<RestObj, TransportError>;

    /// Delete a resource.
    ///
    /// # Errors
    /// Any non-2xx status (404 included) or network failure.
    async fn delete(&self, path: &str) -> Result<(), TransportError>;
}
