#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use httpmock::prelude::*;
use mas_http::{HttpSession, RestTransport, SessionConfig, TOKEN_PATH, TransportError};
use serde_json::json;

fn session(server: &MockServer, config: SessionConfig) -> HttpSession {
    let config = SessionConfig {
        base_url: server.base_url(),
        ..config
    };
    HttpSession::new(config.allow_insecure_http()).unwrap()
}

#[tokio::test]
async fn test_get_returns_remote_object() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/microanalyticScore/modules/scoring")
            .header("accept", "application/json");
        then.status(200)
            .json_body(json!({"id": "scoring", "stepIds": ["score"], "extra": {"k": 1}}));
    });

    let session = session(&server, SessionConfig::default());
    let module = session
        .get("/microanalyticScore/modules/scoring")
        .await
        .unwrap()
        .expect("module should exist");

    m.assert();
    assert_eq!(module.get_str("id"), Some("scoring"));
    assert!(module.get_object("extra").is_some());
}

#[tokio::test]
async fn test_get_not_found_is_none() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(Method::GET).path("/microanalyticScore/modules/spam");
        then.status(404).json_body(json!({"errorCode": 404}));
    });

    let session = session(&server, SessionConfig::default());
    let result = session.get("/microanalyticScore/modules/spam").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_get_server_error_propagates() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(Method::GET).path("/microanalyticScore/modules");
        then.status(503).body("maintenance");
    });

    let session = session(&server, SessionConfig::default());
    let err = session.get("/microanalyticScore/modules").await.unwrap_err();
    match err {
        TransportError::HttpStatus {
            status,
            body_preview,
            ..
        } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body_preview, "maintenance");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_post_sends_json_and_bearer_token() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(Method::POST)
            .path("/microanalyticScore/modules")
            .header("authorization", "Bearer abc123")
            .header("content-type", "application/json")
            .json_body(json!({"type": "text/x-python", "scope": "public", "source": "x"}));
        then.status(201).json_body(json!({"id": "created"}));
    });

    let session = session(&server, SessionConfig::default().with_token("abc123"));
    let created = session
        .post(
            "/microanalyticScore/modules",
            &json!({"type": "text/x-python", "scope": "public", "source": "x"}),
        )
        .await
        .unwrap();

    m.assert();
    assert_eq!(created.get_str("id"), Some("created"));
}

#[tokio::test]
async fn test_post_empty_body_is_empty_object() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(Method::POST).path("/action");
        then.status(204);
    });

    let session = session(&server, SessionConfig::default());
    let result = session.post("/action", &json!({})).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_delete() {
    let server = MockServer::start();
    let ok = server.mock(|when, then| {
        when.method(Method::DELETE).path("/microanalyticScore/modules/old");
        then.status(204);
    });
    let _missing = server.mock(|when, then| {
        when.method(Method::DELETE).path("/microanalyticScore/modules/gone");
        then.status(404);
    });

    let session = session(&server, SessionConfig::default());
    session.delete("/microanalyticScore/modules/old").await.unwrap();
    ok.assert();

    // delete does not swallow 404
    let err = session
        .delete("/microanalyticScore/modules/gone")
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
}

#[tokio::test]
async fn test_password_grant_fetched_once() {
    let server = MockServer::start();
    let token = server.mock(|when, then| {
        when.method(Method::POST)
            .path(TOKEN_PATH)
            .header("authorization", "Basic c2FzLmVjOg==")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("grant_type=password&username=sasdemo&password=Orion123");
        then.status(200)
            .json_body(json!({"access_token": "tok-1", "token_type": "bearer", "expires_in": 3600}));
    });
    let modules = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/microanalyticScore/modules")
            .header("authorization", "Bearer tok-1");
        then.status(200).json_body(json!({"items": [], "count": 0}));
    });

    let session = session(
        &server,
        SessionConfig::default().with_password("sasdemo", "Orion123"),
    );
    session.get("/microanalyticScore/modules").await.unwrap();
    session.get("/microanalyticScore/modules").await.unwrap();

    token.assert_hits(1);
    modules.assert_hits(2);
}

#[tokio::test]
async fn test_password_grant_rejected() {
    let server = MockServer::start();
    let _token = server.mock(|when, then| {
        when.method(Method::POST).path(TOKEN_PATH);
        then.status(401).json_body(json!({"error": "invalid_grant"}));
    });

    let session = session(
        &server,
        SessionConfig::default().with_password("sasdemo", "wrong"),
    );
    let err = session.get("/microanalyticScore/modules").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
}

#[tokio::test]
async fn test_unsupported_token_type() {
    let server = MockServer::start();
    let _token = server.mock(|when, then| {
        when.method(Method::POST).path(TOKEN_PATH);
        then.status(200)
            .json_body(json!({"access_token": "tok", "token_type": "mac"}));
    });

    let session = session(
        &server,
        SessionConfig::default().with_password("sasdemo", "Orion123"),
    );
    let err = session.get("/anything").await.unwrap_err();
    assert!(matches!(err, TransportError::Auth(_)));
}

#[tokio::test]
async fn test_body_size_limit() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(Method::GET).path("/large");
        then.status(200).body("x".repeat(4096));
    });

    let session = session(&server, SessionConfig::default().with_max_body_size(1024));
    let err = session.get("/large").await.unwrap_err();
    assert!(matches!(err, TransportError::BodyTooLarge { limit: 1024 }));
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(Method::GET).path("/slow");
        then.status(200)
            .delay(Duration::from_millis(500))
            .json_body(json!({}));
    });

    let session = session(
        &server,
        SessionConfig::default().with_timeout(Duration::from_millis(50)),
    );
    let err = session.get("/slow").await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout(_)));
}

#[tokio::test]
async fn test_absolute_links_stay_on_session_host() {
    let server = MockServer::start();
    let other = MockServer::start();
    let local = server.mock(|when, then| {
        when.method(Method::DELETE)
            .path("/microanalyticScore/modules/old")
            .header("authorization", "Bearer test-token");
        then.status(204);
    });
    let foreign = other.mock(|when, then| {
        when.path("/microanalyticScore/modules/old");
        then.status(204);
    });

    let session = session(&server, SessionConfig::default().with_token("test-token"));

    session
        .delete(&server.url("/microanalyticScore/modules/old"))
        .await
        .unwrap();
    local.assert();

    let err = session
        .delete(&other.url("/microanalyticScore/modules/old"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::InvalidUri { .. }));
    foreign.assert_hits(0);
}
