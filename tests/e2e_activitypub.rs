//! E2E tests for ActivityPub actor endpoints and request gates

mod common;

use common::{ACTIVITY_JSON, TestServer};
use serde_json::Value;

#[tokio::test]
async fn test_actor_document() {
    let server = TestServer::with_users(&["alice"]).await;

    let response = server.get_activity("/users/alice").await;

    assert_eq!(response.status(), 200);
    let headers = response.headers();
    assert_eq!(headers["content-type"], ACTIVITY_JSON);
    assert_eq!(headers["cache-control"], "no-cache");
    assert_eq!(headers["pragma"], "no-cache");

    let json: Value = response.json().await.unwrap();
    let actor = "https://test.example.com/users/alice";
    assert_eq!(json["type"], "Person");
    assert_eq!(json["id"], actor);
    assert_eq!(json["preferredUsername"], "alice");
    assert_eq!(json["inbox"], format!("{actor}/inbox"));
    assert_eq!(json["outbox"], format!("{actor}/outbox"));
    assert_eq!(json["followers"], format!("{actor}/followers"));
    assert_eq!(json["following"], format!("{actor}/following"));
    assert_eq!(json["publicKey"]["id"], format!("{actor}#main-key"));
    assert_eq!(json["publicKey"]["owner"], actor);
    assert_eq!(json["publicKey"]["publicKeyPem"], "test_public_key");
    assert_eq!(json["@context"][0], "https://www.w3.org/ns/activitystreams");
    assert_eq!(json["@context"][1], "https://w3id.org/security/v1");
}

#[tokio::test]
async fn test_actor_with_ld_json_profile() {
    let server = TestServer::with_users(&["alice"]).await;

    let response = server
        .client
        .get(&server.url("/users/alice"))
        .header(
            "Accept",
            r#"application/ld+json; profile="https://www.w3.org/ns/activitystreams""#,
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_actor_requires_activity_accept() {
    let server = TestServer::with_users(&["alice"]).await;

    for accept in [None, Some("application/json"), Some("application/ld+json")] {
        let mut request = server.client.get(&server.url("/users/alice"));
        if let Some(accept) = accept {
            request = request.header("Accept", accept);
        }
        let response = request.send().await.unwrap();

        assert_eq!(response.status(), 417, "accept {accept:?}");
    }
}

#[tokio::test]
async fn test_unknown_actor_is_not_found() {
    let server = TestServer::with_users(&["alice"]).await;

    for path in [
        "/users/mallory",
        "/users/mallory/followers",
        "/users/mallory/following",
        "/users/mallory/outbox",
    ] {
        let response = server.get_activity(path).await;
        assert_eq!(response.status(), 404, "path {path}");
    }
}

#[tokio::test]
async fn test_gate_runs_before_actor_lookup() {
    let server = TestServer::with_users(&["alice"]).await;

    let response = server
        .client
        .get(&server.url("/users/mallory"))
        .header("Accept", "text/html")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 417);
}

#[tokio::test]
async fn test_gate_applies_to_collections() {
    let server = TestServer::with_users(&["alice"]).await;

    for path in [
        "/users/alice/followers",
        "/users/alice/following",
        "/users/alice/outbox?page=1",
    ] {
        let response = server
            .client
            .get(&server.url(path))
            .header("Accept", "text/html")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 417, "path {path}");
    }
}

#[tokio::test]
async fn test_actor_created_after_startup() {
    let server = TestServer::new().await;

    assert_eq!(server.get_activity("/users/bob").await.status(), 404);
    server.create_actor("bob").await;
    assert_eq!(server.get_activity("/users/bob").await.status(), 200);
}
