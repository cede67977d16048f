//! Test doubles shared by the domain tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mas_http::{RestTransport, TransportError};
use mas_restobj::RestObj;
use parking_lot::Mutex;
use serde_json::Value;

use crate::config::MicroAnalyticScoreConfig;
use crate::domain::service::MicroAnalyticScore;

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(String),
    Post(String, Value),
    Delete(String),
}

/// Canned reply for one path; anything unregistered is a 404.
#[derive(Clone)]
enum Reply {
    Json(Value),
    Status(u16),
}

/// In-memory [`RestTransport`] keyed by exact path, recording every call.
#[derive(Default)]
pub struct MockTransport {
    gets: HashMap<String, Reply>,
    posts: HashMap<String, Reply>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(mut self, path: &str, body: Value) -> Self {
        self.gets.insert(path.to_owned(), Reply::Json(body));
        self
    }

    pub fn on_get_status(mut self, path: &str, status: u16) -> Self {
        self.gets.insert(path.to_owned(), Reply::Status(status));
        self
    }

    pub fn on_post(mut self, path: &str, body: Value) -> Self {
        self.posts.insert(path.to_owned(), Reply::Json(body));
        self
    }

    pub fn on_post_status(mut self, path: &str, status: u16) -> Self {
        self.posts.insert(path.to_owned(), Reply::Status(status));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn posts(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Post(path, body) => Some((path, body)),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    fn status_error(method: http::Method, path: &str, status: u16) -> TransportError {
        TransportError::HttpStatus {
            method,
            path: path.to_owned(),
            status: http::StatusCode::from_u16(status).unwrap(),
            body_preview: String::new(),
        }
    }
}

#[async_trait]
impl RestTransport for MockTransport {
    async fn get(&self, path: &str) -> Result<Option<RestObj>, TransportError> {
        self.calls.lock().push(Call::Get(path.to_owned()));
        match self.gets.get(path) {
            Some(Reply::Json(body)) => Ok(Some(RestObj::from_value(body.clone())?)),
            Some(Reply::Status(status)) => {
                Err(Self::status_error(http::Method::GET, path, *status))
            }
            None => Ok(None),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<RestObj, TransportError> {
        self.calls
            .lock()
            .push(Call::Post(path.to_owned(), body.clone()));
        match self.posts.get(path) {
            Some(Reply::Json(reply)) => Ok(RestObj::from_value(reply.clone())?),
            Some(Reply::Status(status)) => {
                Err(Self::status_error(http::Method::POST, path, *status))
            }
            None => Ok(RestObj::new()),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), TransportError> {
        self.calls.lock().push(Call::Delete(path.to_owned()));
        Ok(())
    }
}

pub fn client(transport: &Arc<MockTransport>) -> MicroAnalyticScore {
    MicroAnalyticScore::new(transport.clone(), &MicroAnalyticScoreConfig::default())
}

/// Captures formatted messages of events at or above a level.
pub mod logs {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    pub struct Capture {
        pub messages: Arc<Mutex<Vec<(Level, String)>>>,
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Capture {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.messages.lock().push((*event.metadata().level(), visitor.0));
        }
    }

    struct MessageVisitor(String);

    impl tracing::field::Visit for MessageVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    /// Install a capturing subscriber for the current thread.
    pub fn capture() -> (Capture, tracing::subscriber::DefaultGuard) {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }
}
